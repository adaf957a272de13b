use shared::protocol::SubscriptionUpdateRequest;
use tracing::info;

use crate::{
    context::PortalContext, error::PortalResult, notifier::NoticeKind,
    validation::require_filled,
};

pub struct SubscriptionController {
    ctx: PortalContext,
}

impl SubscriptionController {
    pub fn new(ctx: PortalContext) -> Self {
        Self { ctx }
    }

    pub async fn change_plan(&self, plan: &str) -> PortalResult<()> {
        let result = async {
            require_filled(plan, "Please select a plan")?;
            self.ctx
                .api()
                .update_subscription(&SubscriptionUpdateRequest {
                    plan: plan.trim().to_string(),
                })
                .await
        }
        .await;
        let ack = self
            .ctx
            .surface(result, "Failed to update subscription")?;
        info!(plan = plan.trim(), "subscription plan changed");
        self.ctx.notify(
            NoticeKind::Success,
            ack.message_or("Subscription updated successfully"),
        );
        Ok(())
    }
}
