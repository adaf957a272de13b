use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status fields present on every response body of the portal API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiStatus {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub requires_verification: bool,
}

impl ApiStatus {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            requires_verification: false,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            requires_verification: false,
        }
    }
}

/// A `success: false` reply. `message` is empty when the server sent none.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ApiFailure {
    pub message: String,
    pub requires_verification: bool,
}

impl ApiFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            requires_verification: false,
        }
    }
}

impl From<ApiStatus> for ApiFailure {
    fn from(value: ApiStatus) -> Self {
        Self {
            message: value.message.unwrap_or_default(),
            requires_verification: value.requires_verification,
        }
    }
}

impl From<ApiFailure> for ApiStatus {
    fn from(value: ApiFailure) -> Self {
        Self {
            success: false,
            message: Some(value.message),
            requires_verification: value.requires_verification,
        }
    }
}
