use shared::protocol::GenerateAnimationRequest;
use tracing::{debug, info};

use crate::{
    context::PortalContext,
    error::PortalResult,
    events::PortalEvent,
    media::AnimationHistory,
    notifier::NoticeKind,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationPreview {
    pub animation_path: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum JobState {
    #[default]
    Idle,
    Requesting {
        request: GenerateAnimationRequest,
    },
    Previewing {
        preview: AnimationPreview,
    },
}

impl JobState {
    fn name(&self) -> &'static str {
        match self {
            JobState::Idle => "idle",
            JobState::Requesting { .. } => "requesting",
            JobState::Previewing { .. } => "previewing",
        }
    }
}

/// Single-round-trip generation: the backend holds the reply until the
/// artifact exists, so there is no polling and no retry.
pub struct AnimationJobController {
    ctx: PortalContext,
    state: JobState,
}

impl AnimationJobController {
    pub fn new(ctx: PortalContext) -> Self {
        Self {
            ctx,
            state: JobState::Idle,
        }
    }

    pub fn state(&self) -> &JobState {
        &self.state
    }

    pub fn preview(&self) -> Option<&AnimationPreview> {
        match &self.state {
            JobState::Previewing { preview } => Some(preview),
            _ => None,
        }
    }

    fn transition(&mut self, next: JobState) {
        debug!(from = self.state.name(), to = next.name(), "generation job");
        self.state = next;
        self.ctx
            .publish(PortalEvent::JobStateChanged(self.state.clone()));
    }

    /// Runs one generation. On success the new clip is previewed and the
    /// history list is refreshed so it shows up there too.
    pub async fn generate(
        &mut self,
        history: &mut AnimationHistory,
        avatar_id: &str,
        expression_id: &str,
    ) -> PortalResult<AnimationPreview> {
        let request = GenerateAnimationRequest {
            avatar_id: avatar_id.trim().to_string(),
            expression_id: expression_id.trim().to_string(),
        };
        if let Err(err) = history.validate(&request) {
            self.ctx.notify(NoticeKind::Error, err.to_string());
            return Err(err);
        }

        self.transition(JobState::Requesting {
            request: request.clone(),
        });
        match history.submit(request).await {
            Ok(created) => {
                let preview = AnimationPreview {
                    url: self.ctx.settings().media_url(&created.animation_path),
                    animation_path: created.animation_path,
                };
                info!(path = %preview.animation_path, "animation ready");
                self.transition(JobState::Previewing {
                    preview: preview.clone(),
                });
                let _ = history.refresh().await;
                Ok(preview)
            }
            Err(err) => {
                self.transition(JobState::Idle);
                Err(err)
            }
        }
    }

    /// Drops the preview; the clip itself stays in the history list.
    pub fn dismiss_preview(&mut self) -> bool {
        if !matches!(self.state, JobState::Previewing { .. }) {
            return false;
        }
        self.transition(JobState::Idle);
        true
    }
}

#[cfg(test)]
#[path = "tests/animation_job_tests.rs"]
mod tests;
