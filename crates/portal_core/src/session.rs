use tracing::{info, warn};

use crate::{
    context::PortalContext,
    events::{Navigation, PortalEvent},
};

pub const LOGIN_PATH: &str = "/login";

/// Ends the current session. Shared by every dashboard.
#[derive(Clone)]
pub struct SessionController {
    ctx: PortalContext,
}

impl SessionController {
    pub fn new(ctx: PortalContext) -> Self {
        Self { ctx }
    }

    /// Redirects to the login view only when the backend confirmed the
    /// logout. Failures are logged and otherwise ignored.
    pub async fn logout(&self) -> Option<Navigation> {
        match self.ctx.api().logout().await {
            Ok(_) => {
                info!("session closed");
                let navigation = Navigation::immediate(LOGIN_PATH);
                self.ctx
                    .publish(PortalEvent::NavigationRequested(navigation.clone()));
                Some(navigation)
            }
            Err(err) => {
                warn!(%err, "logout failed");
                None
            }
        }
    }
}
