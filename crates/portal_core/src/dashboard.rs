//! Role-specific composition. Every dashboard shares the profile and session
//! controllers; the media suite, plan changes and account administration are
//! layered on per role.

use shared::domain::Role;
use tracing::{info, warn};

use crate::{
    admin::AdminUserController,
    animation_job::{AnimationJobController, AnimationPreview},
    context::PortalContext,
    error::{PortalError, PortalResult},
    media::{AnimationHistory, AvatarController},
    profile::ProfileController,
    session::SessionController,
    subscription::SubscriptionController,
};

/// Avatars, animation history and the generation job that feeds it.
pub struct MediaSuite {
    pub avatars: AvatarController,
    pub animations: AnimationHistory,
    pub job: AnimationJobController,
}

impl MediaSuite {
    pub fn new(ctx: PortalContext) -> Self {
        Self {
            avatars: AvatarController::new(ctx.clone()),
            animations: AnimationHistory::new(ctx.clone()),
            job: AnimationJobController::new(ctx),
        }
    }

    pub async fn generate(
        &mut self,
        avatar_id: &str,
        expression_id: &str,
    ) -> PortalResult<AnimationPreview> {
        self.job
            .generate(&mut self.animations, avatar_id, expression_id)
            .await
    }

    async fn load(&mut self) -> (PortalResult<()>, PortalResult<()>) {
        futures::join!(self.avatars.refresh(), self.animations.refresh())
    }
}

/// Outcome of the initial loads. Components the role does not own are `None`.
#[derive(Debug)]
pub struct InitReport {
    pub profile: PortalResult<()>,
    pub avatars: Option<PortalResult<()>>,
    pub animations: Option<PortalResult<()>>,
    pub accounts: Option<PortalResult<()>>,
}

impl InitReport {
    pub fn failures(&self) -> Vec<&PortalError> {
        std::iter::once(&self.profile)
            .chain(self.avatars.iter())
            .chain(self.animations.iter())
            .chain(self.accounts.iter())
            .filter_map(|result| result.as_ref().err())
            .collect()
    }

    pub fn is_clean(&self) -> bool {
        self.failures().is_empty()
    }
}

pub struct RoleDashboard {
    role: Role,
    pub profile: ProfileController,
    pub session: SessionController,
    pub media: Option<MediaSuite>,
    pub subscription: Option<SubscriptionController>,
    pub admin: Option<AdminUserController>,
}

impl RoleDashboard {
    /// `None` for roles without a dashboard.
    pub fn for_role(ctx: PortalContext, role: Role) -> Option<Self> {
        let (media, subscription, admin) = match role {
            Role::User => (Some(MediaSuite::new(ctx.clone())), None, None),
            Role::Subscriber => (
                Some(MediaSuite::new(ctx.clone())),
                Some(SubscriptionController::new(ctx.clone())),
                None,
            ),
            Role::Admin => (
                None,
                Some(SubscriptionController::new(ctx.clone())),
                Some(AdminUserController::new(ctx.clone())),
            ),
            Role::Unknown(ref raw) => {
                warn!(role = %raw, "no dashboard for role");
                return None;
            }
        };
        Some(Self {
            role,
            profile: ProfileController::new(ctx.clone()),
            session: SessionController::new(ctx),
            media,
            subscription,
            admin,
        })
    }

    /// Picks the dashboard from the route the page was served under.
    pub fn for_route(ctx: PortalContext, path: &str) -> Option<Self> {
        Role::from_dashboard_path(path).and_then(|role| Self::for_role(ctx, role))
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    /// Runs every owned controller's initial load concurrently. Each failure
    /// has already been reported by its controller; none aborts the others.
    pub async fn init(&mut self) -> InitReport {
        let Self {
            role,
            profile,
            media,
            admin,
            ..
        } = self;

        let media_load = async {
            match media.as_mut() {
                Some(media) => Some(media.load().await),
                None => None,
            }
        };
        let admin_load = async {
            match admin.as_mut() {
                Some(admin) => Some(admin.load_all().await),
                None => None,
            }
        };
        let (profile, media, accounts) =
            futures::join!(profile.load_profile(), media_load, admin_load);
        let (avatars, animations) = media.unzip();

        let report = InitReport {
            profile,
            avatars,
            animations,
            accounts,
        };
        info!(%role, failures = report.failures().len(), "dashboard initialised");
        report
    }
}

#[cfg(test)]
#[path = "tests/dashboard_tests.rs"]
mod tests;
