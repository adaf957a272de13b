use serde::{Deserialize, Serialize};

use crate::domain::{Account, AnimationClip, AvatarImage, Role};

/// Body-less success reply; carries the server's human-readable message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Ack {
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }

    pub fn message_or(&self, fallback: &str) -> String {
        self.message
            .clone()
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| fallback.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub redirect: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub fullname: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyEmailRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub user: Account,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdateRequest {
    pub fullname: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilePictureResponse {
    pub profile_picture: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarListResponse {
    pub avatars: Vec<AvatarImage>,
}

/// Selection values are sent as the strings the selectors hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateAnimationRequest {
    pub avatar_id: String,
    pub expression_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedAnimation {
    pub animation_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationListResponse {
    pub animations: Vec<AnimationClip>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionUpdateRequest {
    pub plan: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountListResponse {
    pub users: Vec<Account>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AdminAccountUpdate {
    Suspend,
    Activate,
    Edit { fullname: String, email: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_update_serializes_with_action_tag() {
        let edit = AdminAccountUpdate::Edit {
            fullname: "Ana Lee".to_string(),
            email: "ana@x.com".to_string(),
        };
        let value = serde_json::to_value(&edit).expect("json");
        assert_eq!(
            value,
            serde_json::json!({"action": "edit", "fullname": "Ana Lee", "email": "ana@x.com"})
        );
        let suspend = serde_json::to_value(AdminAccountUpdate::Suspend).expect("json");
        assert_eq!(suspend, serde_json::json!({"action": "suspend"}));
    }

    #[test]
    fn ack_prefers_server_message() {
        assert_eq!(Ack::with_message("Profile updated").message_or("ok"), "Profile updated");
        assert_eq!(Ack::default().message_or("ok"), "ok");
    }
}
