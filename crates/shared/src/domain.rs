use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(UserId);
id_newtype!(AvatarId);
id_newtype!(AnimationId);

/// Access tier of an account. Values outside the known set are kept
/// verbatim so they can be rendered instead of rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    User,
    Subscriber,
    Admin,
    Unknown(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::User => "user",
            Role::Subscriber => "subscriber",
            Role::Admin => "admin",
            Role::Unknown(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Role::Unknown(_))
    }

    /// Landing route the backend redirects to after a successful login.
    pub fn dashboard_path(&self) -> Option<&'static str> {
        match self {
            Role::User => Some("/user"),
            Role::Subscriber => Some("/subscriber"),
            Role::Admin => Some("/admin"),
            Role::Unknown(_) => None,
        }
    }

    /// Maps a dashboard route (`/admin`, `.../subscriber.html`, ...) back to a role.
    pub fn from_dashboard_path(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        if trimmed == "/admin" || path.contains("admin.html") {
            Some(Role::Admin)
        } else if trimmed == "/subscriber" || path.contains("subscriber.html") {
            Some(Role::Subscriber)
        } else if trimmed == "/user" || path.contains("user.html") {
            Some(Role::User)
        } else {
            None
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Unknown(String::new())
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "user" => Role::User,
            "subscriber" => Role::Subscriber,
            "admin" => Role::Admin,
            _ => Role::Unknown(value),
        }
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        match value {
            Role::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SubscriptionStatus {
    Active,
    Inactive,
    Suspended,
    Unknown(String),
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Inactive => "inactive",
            SubscriptionStatus::Suspended => "suspended",
            SubscriptionStatus::Unknown(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, SubscriptionStatus::Unknown(_))
    }

    pub fn is_suspended(&self) -> bool {
        matches!(self, SubscriptionStatus::Suspended)
    }
}

impl Default for SubscriptionStatus {
    fn default() -> Self {
        SubscriptionStatus::Unknown(String::new())
    }
}

impl From<String> for SubscriptionStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "active" => SubscriptionStatus::Active,
            "inactive" => SubscriptionStatus::Inactive,
            "suspended" => SubscriptionStatus::Suspended,
            _ => SubscriptionStatus::Unknown(value),
        }
    }
}

impl From<SubscriptionStatus> for String {
    fn from(value: SubscriptionStatus) -> Self {
        match value {
            SubscriptionStatus::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub user_id: UserId,
    pub fullname: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub subscription_status: SubscriptionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Account {
    pub fn created_date(&self) -> Option<NaiveDate> {
        self.created_at.as_deref().and_then(parse_timestamp_date)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarImage {
    pub avatar_id: AvatarId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub avatar_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationClip {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation_id: Option<AnimationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_id: Option<AvatarId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression_name: Option<String>,
    pub animation_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl AnimationClip {
    pub fn label(&self) -> &str {
        self.expression_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or("Custom")
    }

    pub fn created_date(&self) -> Option<NaiveDate> {
        self.created_at.as_deref().and_then(parse_timestamp_date)
    }
}

/// Accepts RFC 3339, RFC 2822 (what the backend's JSON encoder emits for
/// datetimes) and plain `YYYY-MM-DD HH:MM:SS`.
pub fn parse_timestamp_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.date_naive());
    }
    if let Ok(parsed) = DateTime::parse_from_rfc2822(raw) {
        return Some(parsed.date_naive());
    }
    // RFC 2822 parsing rejects the "GMT" zone name on some inputs.
    if let Some(stripped) = raw.strip_suffix(" GMT") {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(stripped, "%a, %d %b %Y %H:%M:%S") {
            return Some(parsed.date());
        }
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map(|parsed| parsed.date())
        .ok()
}
