use shared::error::ApiFailure;
use thiserror::Error;

pub type PortalResult<T> = std::result::Result<T, PortalError>;

#[derive(Debug, Clone, Error)]
pub enum PortalError {
    /// Input rejected locally; no request was sent.
    #[error("{0}")]
    Validation(String),
    /// The backend answered `success: false`; the message is shown verbatim.
    #[error("{message}")]
    Rejected {
        message: String,
        requires_verification: bool,
    },
    #[error("{operation} failed: {detail}")]
    Transport {
        operation: &'static str,
        detail: String,
    },
    #[error("{operation} failed: {detail}")]
    Decode {
        operation: &'static str,
        detail: String,
    },
    #[error("no action is awaiting confirmation")]
    NothingPending,
}

impl PortalError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
            requires_verification: false,
        }
    }

    pub fn transport(operation: &'static str, detail: impl ToString) -> Self {
        Self::Transport {
            operation,
            detail: detail.to_string(),
        }
    }

    pub fn decode(operation: &'static str, detail: impl ToString) -> Self {
        Self::Decode {
            operation,
            detail: detail.to_string(),
        }
    }

    /// True for failures raised before any request left the client.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NothingPending)
    }

    pub fn requires_verification(&self) -> bool {
        matches!(
            self,
            Self::Rejected {
                requires_verification: true,
                ..
            }
        )
    }

    /// Fills in an operation-specific text when the server rejected without one.
    pub fn or_message(self, fallback: &str) -> Self {
        match self {
            Self::Rejected {
                message,
                requires_verification,
            } if message.trim().is_empty() => Self::Rejected {
                message: fallback.to_string(),
                requires_verification,
            },
            other => other,
        }
    }
}

impl From<ApiFailure> for PortalError {
    fn from(value: ApiFailure) -> Self {
        Self::Rejected {
            message: value.message,
            requires_verification: value.requires_verification,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_failures_render_generic_prefix_with_detail() {
        let err = PortalError::transport("Upload", "connection refused");
        assert_eq!(err.to_string(), "Upload failed: connection refused");
        assert!(!err.is_local());
    }

    #[test]
    fn empty_rejection_takes_fallback_text() {
        let err = PortalError::from(ApiFailure::new("")).or_message("Failed to delete account");
        assert_eq!(err.to_string(), "Failed to delete account");

        let kept = PortalError::rejected("Email already exists").or_message("Failed to update user");
        assert_eq!(kept.to_string(), "Email already exists");
    }
}
