//! Client-side core of the avatar animation portal: role dashboards, their
//! controllers, and the HTTP contract with the account/media backend.

pub mod admin;
pub mod animation_job;
pub mod auth;
pub mod config;
pub mod confirm;
pub mod context;
pub mod dashboard;
pub mod error;
pub mod events;
pub mod media;
pub mod notifier;
pub mod profile;
pub mod session;
pub mod subscription;
pub mod transport;
pub mod validation;

pub use auth::{AuthController, LoginOutcome};
pub use config::{load_settings, PortalSettings};
pub use confirm::Confirmation;
pub use context::PortalContext;
pub use dashboard::{InitReport, MediaSuite, RoleDashboard};
pub use error::{PortalError, PortalResult};
pub use events::{Navigation, PortalEvent};
pub use notifier::{Notice, NoticeKind, Notifier, TracingNotifier};
pub use transport::{HttpPortalApi, PortalApi};
pub use validation::UploadFile;

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
