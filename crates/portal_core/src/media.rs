//! Per-account media collections: uploaded avatar images and generated
//! animation clips. Both follow the same list/upload/delete contract and the
//! local list is only ever replaced wholesale by a fresh fetch.

use std::fmt;

use async_trait::async_trait;
use chrono::NaiveDate;
use shared::{
    domain::{AnimationClip, AnimationId, AvatarId, AvatarImage},
    protocol::{Ack, GenerateAnimationRequest, GeneratedAnimation},
};
use tracing::{debug, info, warn};

use crate::{
    config::PortalSettings,
    confirm::{Acknowledged, Confirmation, ConfirmationGate},
    context::PortalContext,
    error::{PortalError, PortalResult},
    events::PortalEvent,
    notifier::NoticeKind,
    transport::PortalApi,
    validation::{validate_image, UploadFile},
};

pub const AVATAR_PLACEHOLDER: &str = "--Select Avatar--";

/// One resource family served by the backend.
#[async_trait]
pub trait MediaResource: Send + Sync {
    type Item: Clone + fmt::Debug + Send + Sync;
    type Id: Copy + fmt::Debug + fmt::Display + PartialEq + Send + Sync;
    type Payload: Send;
    type Created: Send;

    const LABEL: &'static str;
    const UPLOAD_FALLBACK: &'static str;
    const DELETE_FALLBACK: &'static str;
    const REMOVE_PROMPTS: &'static [&'static str];

    fn item_id(item: &Self::Item) -> Option<Self::Id>;

    /// Local checks run before anything is sent.
    fn validate(&self, payload: &Self::Payload, settings: &PortalSettings) -> PortalResult<()>;

    async fn list(&self, api: &dyn PortalApi) -> PortalResult<Vec<Self::Item>>;
    async fn upload(&self, api: &dyn PortalApi, payload: Self::Payload)
        -> PortalResult<Self::Created>;
    async fn delete(&self, api: &dyn PortalApi, id: Self::Id) -> PortalResult<Ack>;

    fn created_message(created: &Self::Created) -> String;
    fn removed_message(ack: &Ack) -> String;
    fn replaced(items: Vec<Self::Item>) -> PortalEvent;
    fn entry(item: &Self::Item, settings: &PortalSettings) -> MediaEntry<Self::Id>;
}

/// Render-ready row of a media list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaEntry<I> {
    /// `None` means the row has no delete affordance.
    pub id: Option<I>,
    pub title: String,
    pub url: String,
    pub created: Option<NaiveDate>,
}

impl<I> MediaEntry<I> {
    pub fn deletable(&self) -> bool {
        self.id.is_some()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Avatars;

#[async_trait]
impl MediaResource for Avatars {
    type Item = AvatarImage;
    type Id = AvatarId;
    type Payload = UploadFile;
    type Created = Ack;

    const LABEL: &'static str = "avatar";
    const UPLOAD_FALLBACK: &'static str = "Failed to upload avatar";
    const DELETE_FALLBACK: &'static str = "Failed to delete avatar";
    const REMOVE_PROMPTS: &'static [&'static str] = &["Delete this avatar?"];

    fn item_id(item: &AvatarImage) -> Option<AvatarId> {
        Some(item.avatar_id)
    }

    fn validate(&self, file: &UploadFile, settings: &PortalSettings) -> PortalResult<()> {
        validate_image(file, settings.max_upload_bytes)
    }

    async fn list(&self, api: &dyn PortalApi) -> PortalResult<Vec<AvatarImage>> {
        api.list_avatars().await
    }

    async fn upload(&self, api: &dyn PortalApi, file: UploadFile) -> PortalResult<Ack> {
        api.upload_avatar(file).await
    }

    async fn delete(&self, api: &dyn PortalApi, id: AvatarId) -> PortalResult<Ack> {
        api.delete_avatar(id).await
    }

    fn created_message(ack: &Ack) -> String {
        ack.message_or("Avatar uploaded successfully!")
    }

    fn removed_message(ack: &Ack) -> String {
        ack.message_or("Avatar deleted")
    }

    fn replaced(items: Vec<AvatarImage>) -> PortalEvent {
        PortalEvent::AvatarsReplaced(items)
    }

    fn entry(item: &AvatarImage, settings: &PortalSettings) -> MediaEntry<AvatarId> {
        MediaEntry {
            id: Self::item_id(item),
            title: format!("Avatar {}", item.avatar_id),
            url: settings.media_url(&item.avatar_path),
            created: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AnimationClips;

#[async_trait]
impl MediaResource for AnimationClips {
    type Item = AnimationClip;
    type Id = AnimationId;
    type Payload = GenerateAnimationRequest;
    type Created = GeneratedAnimation;

    const LABEL: &'static str = "animation";
    const UPLOAD_FALLBACK: &'static str = "Failed to generate animation";
    const DELETE_FALLBACK: &'static str = "Failed to delete animation";
    const REMOVE_PROMPTS: &'static [&'static str] = &["Delete this animation?"];

    fn item_id(item: &AnimationClip) -> Option<AnimationId> {
        item.animation_id
    }

    fn validate(
        &self,
        request: &GenerateAnimationRequest,
        _settings: &PortalSettings,
    ) -> PortalResult<()> {
        if request.avatar_id.trim().is_empty() || request.expression_id.trim().is_empty() {
            return Err(PortalError::validation("Please select avatar and expression"));
        }
        Ok(())
    }

    async fn list(&self, api: &dyn PortalApi) -> PortalResult<Vec<AnimationClip>> {
        api.list_animations().await
    }

    async fn upload(
        &self,
        api: &dyn PortalApi,
        request: GenerateAnimationRequest,
    ) -> PortalResult<GeneratedAnimation> {
        api.generate_animation(&request).await
    }

    async fn delete(&self, api: &dyn PortalApi, id: AnimationId) -> PortalResult<Ack> {
        api.delete_animation(id).await
    }

    fn created_message(created: &GeneratedAnimation) -> String {
        created
            .message
            .clone()
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| "Animation generated successfully!".to_string())
    }

    fn removed_message(ack: &Ack) -> String {
        ack.message_or("Animation deleted")
    }

    fn replaced(items: Vec<AnimationClip>) -> PortalEvent {
        PortalEvent::AnimationsReplaced(items)
    }

    fn entry(item: &AnimationClip, settings: &PortalSettings) -> MediaEntry<AnimationId> {
        MediaEntry {
            id: Self::item_id(item),
            title: item.label().to_string(),
            url: settings.media_url(&item.animation_path),
            created: item.created_date(),
        }
    }
}

pub struct MediaResourceController<R: MediaResource> {
    ctx: PortalContext,
    resource: R,
    items: Vec<R::Item>,
    removal: ConfirmationGate<R::Id>,
}

pub type AvatarController = MediaResourceController<Avatars>;
pub type AnimationHistory = MediaResourceController<AnimationClips>;

impl<R: MediaResource + Default> MediaResourceController<R> {
    pub fn new(ctx: PortalContext) -> Self {
        Self {
            ctx,
            resource: R::default(),
            items: Vec::new(),
            removal: ConfirmationGate::default(),
        }
    }
}

impl<R: MediaResource> MediaResourceController<R> {
    pub fn items(&self) -> &[R::Item] {
        &self.items
    }

    pub fn entries(&self) -> Vec<MediaEntry<R::Id>> {
        self.items
            .iter()
            .map(|item| R::entry(item, self.ctx.settings()))
            .collect()
    }

    /// Replaces the cached list with the server's. Failures are logged only;
    /// the previous list stays on screen.
    pub async fn refresh(&mut self) -> PortalResult<()> {
        match self.resource.list(self.ctx.api()).await {
            Ok(items) => {
                debug!(resource = R::LABEL, count = items.len(), "list replaced");
                self.items = items;
                self.ctx.publish(R::replaced(self.items.clone()));
                Ok(())
            }
            Err(err) => {
                warn!(resource = R::LABEL, %err, "failed to load list");
                Err(err)
            }
        }
    }

    pub(crate) fn validate(&self, payload: &R::Payload) -> PortalResult<()> {
        self.resource.validate(payload, self.ctx.settings())
    }

    /// Validates and sends one payload without refreshing.
    pub(crate) async fn submit(&self, payload: R::Payload) -> PortalResult<R::Created> {
        let result = async {
            self.validate(&payload)?;
            self.resource.upload(self.ctx.api(), payload).await
        }
        .await;
        let created = self.ctx.surface(result, R::UPLOAD_FALLBACK)?;
        info!(resource = R::LABEL, "created");
        self.ctx
            .notify(NoticeKind::Success, R::created_message(&created));
        Ok(created)
    }

    pub async fn add(&mut self, payload: R::Payload) -> PortalResult<R::Created> {
        let created = self.submit(payload).await?;
        // The upload stands even if the follow-up fetch fails.
        let _ = self.refresh().await;
        Ok(created)
    }

    pub fn request_remove(&mut self, id: R::Id) -> &'static str {
        let prompt = self.removal.request(id, R::REMOVE_PROMPTS);
        self.ctx
            .publish(PortalEvent::ConfirmationRequested { prompt });
        prompt
    }

    pub fn pending_remove_prompt(&self) -> Option<&'static str> {
        self.removal.pending_prompt()
    }

    pub fn decline_remove(&mut self) -> bool {
        self.removal.decline().is_some()
    }

    pub async fn confirm_remove(&mut self) -> PortalResult<Confirmation<()>> {
        let id = match self.removal.acknowledge() {
            None => return Err(PortalError::NothingPending),
            Some(Acknowledged::NextPrompt(prompt)) => {
                self.ctx
                    .publish(PortalEvent::ConfirmationRequested { prompt });
                return Ok(Confirmation::Prompt(prompt));
            }
            Some(Acknowledged::Ready(id)) => id,
        };

        let result = self.resource.delete(self.ctx.api(), id).await;
        let ack = self.ctx.surface(result, R::DELETE_FALLBACK)?;
        info!(resource = R::LABEL, %id, "removed");
        self.ctx
            .notify(NoticeKind::Success, R::removed_message(&ack));
        let _ = self.refresh().await;
        Ok(Confirmation::Completed(()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl MediaResourceController<Avatars> {
    /// Options for the generation input selector, placeholder first.
    pub fn selection_options(&self) -> Vec<SelectOption> {
        let placeholder = SelectOption {
            value: String::new(),
            label: AVATAR_PLACEHOLDER.to_string(),
        };
        std::iter::once(placeholder)
            .chain(self.items.iter().map(|avatar| SelectOption {
                value: avatar.avatar_id.to_string(),
                label: format!("Avatar {}", avatar.avatar_id),
            }))
            .collect()
    }
}

#[cfg(test)]
#[path = "tests/media_tests.rs"]
mod tests;
