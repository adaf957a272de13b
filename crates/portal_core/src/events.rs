//! State-change events published by the controllers. Rendering code
//! subscribes to these instead of being mutated from business logic.

use std::time::Duration;

use shared::domain::{AnimationClip, AvatarImage};

use crate::{
    admin::AccountRow, animation_job::JobState, notifier::Notice, profile::PasswordFormState,
    profile::ProfileView,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub path: String,
    pub delay: Duration,
}

impl Navigation {
    pub fn immediate(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(path: impl Into<String>, delay: Duration) -> Self {
        Self {
            path: path.into(),
            delay,
        }
    }
}

#[derive(Debug, Clone)]
pub enum PortalEvent {
    ProfileLoaded(ProfileView),
    ProfileEditToggled {
        editing: bool,
    },
    ProfilePictureChanged {
        url: String,
    },
    PasswordFormChanged(PasswordFormState),
    AvatarsReplaced(Vec<AvatarImage>),
    AnimationsReplaced(Vec<AnimationClip>),
    JobStateChanged(JobState),
    AccountsReplaced {
        rows: Vec<AccountRow>,
        filter: Option<String>,
    },
    ConfirmationRequested {
        prompt: &'static str,
    },
    NavigationRequested(Navigation),
    Notice(Notice),
}
