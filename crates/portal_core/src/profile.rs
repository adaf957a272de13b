use std::time::Duration;

use chrono::Utc;
use shared::{
    domain::{Account, Role, SubscriptionStatus, UserId},
    protocol::{ChangePasswordRequest, ProfileUpdateRequest},
};
use tracing::{debug, info, warn};

use crate::{
    config::cache_busted,
    confirm::{Acknowledged, Confirmation, ConfirmationGate},
    context::PortalContext,
    error::{PortalError, PortalResult},
    events::{Navigation, PortalEvent},
    notifier::{Notice, NoticeKind},
    validation::{validate_image, validate_password_change, UploadFile},
};

pub const LANDING_PATH: &str = "/";

pub const DELETE_ACCOUNT_PROMPTS: &[&str] = &[
    "Are you sure you want to delete your account? This action cannot be undone. All your data, animations, and avatars will be permanently deleted.",
    "This is your final warning. Are you absolutely sure you want to delete your account?",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfilePicture {
    Stored { url: String },
    Default { url: String },
}

impl ProfilePicture {
    pub fn url(&self) -> &str {
        match self {
            ProfilePicture::Stored { url } | ProfilePicture::Default { url } => url,
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, ProfilePicture::Default { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileView {
    pub user_id: UserId,
    pub fullname: String,
    pub email: String,
    pub role: Role,
    pub subscription_status: SubscriptionStatus,
    pub picture: ProfilePicture,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileDraft {
    pub fullname: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasswordFields {
    pub current: String,
    pub new: String,
    pub confirm: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasswordFormState {
    pub open: bool,
    pub fields: PasswordFields,
    /// Inline outcome shown inside the form.
    pub message: Option<Notice>,
    /// Set after a successful change; the view closes the form once it elapses.
    pub hide_after: Option<Duration>,
}

/// Identity fields, picture, password and self-service deletion of the
/// signed-in account. Every dashboard owns one.
pub struct ProfileController {
    ctx: PortalContext,
    view: Option<ProfileView>,
    draft: Option<ProfileDraft>,
    password_form: PasswordFormState,
    deletion: ConfirmationGate<()>,
}

impl ProfileController {
    pub fn new(ctx: PortalContext) -> Self {
        Self {
            ctx,
            view: None,
            draft: None,
            password_form: PasswordFormState::default(),
            deletion: ConfirmationGate::default(),
        }
    }

    pub fn view(&self) -> Option<&ProfileView> {
        self.view.as_ref()
    }

    pub fn draft(&self) -> Option<&ProfileDraft> {
        self.draft.as_ref()
    }

    pub fn is_editing(&self) -> bool {
        self.draft.is_some()
    }

    pub fn password_form(&self) -> &PasswordFormState {
        &self.password_form
    }

    pub async fn load_profile(&mut self) -> PortalResult<()> {
        let shown = self
            .view
            .as_ref()
            .map(|view| view.picture.clone())
            .filter(|picture| !picture.is_default());
        self.refresh(shown).await
    }

    async fn refresh(&mut self, shown: Option<ProfilePicture>) -> PortalResult<()> {
        let account = self.ctx.api().fetch_profile().await.map_err(|err| {
            warn!(%err, "failed to load profile");
            err
        })?;
        let view = self.build_view(account, shown);
        debug!(user_id = %view.user_id, picture = view.picture.url(), "profile loaded");
        self.ctx.publish(PortalEvent::ProfileLoaded(view.clone()));
        self.view = Some(view);
        Ok(())
    }

    fn build_view(&self, account: Account, shown: Option<ProfilePicture>) -> ProfileView {
        let picture = self.resolve_picture(account.profile_picture.as_deref(), shown);
        ProfileView {
            user_id: account.user_id,
            fullname: account.fullname,
            email: account.email,
            role: account.role,
            subscription_status: account.subscription_status,
            picture,
        }
    }

    /// A reply without a picture reference keeps whatever stored picture is
    /// already on screen; the default is only used when there is none.
    fn resolve_picture(
        &self,
        stored: Option<&str>,
        shown: Option<ProfilePicture>,
    ) -> ProfilePicture {
        match stored.map(str::trim).filter(|path| !path.is_empty()) {
            Some(path) => ProfilePicture::Stored {
                url: cache_busted(
                    &self.ctx.settings().media_url(path),
                    Utc::now().timestamp_millis(),
                ),
            },
            None => shown.unwrap_or_else(|| {
                debug!("no stored profile picture, using default");
                self.default_picture()
            }),
        }
    }

    fn default_picture(&self) -> ProfilePicture {
        ProfilePicture::Default {
            url: self.ctx.settings().default_profile_picture.clone(),
        }
    }

    /// The view reports that the picture could not be displayed. Degrades to
    /// the default image without telling the operator.
    pub fn picture_load_failed(&mut self) {
        let fallback = self.default_picture();
        let Some(view) = self.view.as_mut() else {
            return;
        };
        if view.picture.is_default() {
            return;
        }
        warn!(url = view.picture.url(), "profile picture failed to load");
        view.picture = fallback;
        self.ctx.publish(PortalEvent::ProfilePictureChanged {
            url: view.picture.url().to_string(),
        });
    }

    pub fn begin_edit(&mut self) -> &ProfileDraft {
        let draft = self
            .view
            .as_ref()
            .map(|view| ProfileDraft {
                fullname: view.fullname.clone(),
                email: view.email.clone(),
            })
            .unwrap_or_default();
        self.ctx
            .publish(PortalEvent::ProfileEditToggled { editing: true });
        self.draft.insert(draft)
    }

    pub fn cancel_edit(&mut self) {
        if self.draft.take().is_some() {
            self.ctx
                .publish(PortalEvent::ProfileEditToggled { editing: false });
        }
    }

    /// Sends both fields as given; the form stays open when the update fails.
    pub async fn save_profile(&mut self, fullname: &str, email: &str) -> PortalResult<()> {
        let request = ProfileUpdateRequest {
            fullname: fullname.to_string(),
            email: email.to_string(),
        };
        let result = self.ctx.api().update_profile(&request).await;
        let ack = self.ctx.surface(result, "Failed to update profile")?;

        if let Some(view) = self.view.as_mut() {
            view.fullname = request.fullname;
            view.email = request.email;
            self.ctx.publish(PortalEvent::ProfileLoaded(view.clone()));
        }
        self.cancel_edit();
        self.ctx
            .notify(NoticeKind::Success, ack.message_or("Profile updated"));
        Ok(())
    }

    pub async fn upload_profile_picture(&mut self, file: UploadFile) -> PortalResult<String> {
        let max_bytes = self.ctx.settings().max_upload_bytes;
        let result = async {
            validate_image(&file, max_bytes)?;
            self.ctx.api().upload_profile_picture(file).await
        }
        .await;
        let response = self
            .ctx
            .surface(result, "Failed to upload profile picture")?;

        // Same path, new content: bust caches so the view re-fetches it.
        let url = cache_busted(
            &self.ctx.settings().media_url(&response.profile_picture),
            Utc::now().timestamp_millis(),
        );
        if let Some(view) = self.view.as_mut() {
            view.picture = ProfilePicture::Stored { url: url.clone() };
        }
        self.ctx
            .publish(PortalEvent::ProfilePictureChanged { url: url.clone() });
        self.ctx.notify(
            NoticeKind::Success,
            response
                .message
                .unwrap_or_else(|| "Profile picture updated successfully!".to_string()),
        );

        if self.ctx.settings().reconcile_profile_after_upload {
            // Picture already shown; a failed reconcile only keeps the older fields.
            let uploaded = ProfilePicture::Stored { url: url.clone() };
            let _ = self.refresh(Some(uploaded)).await;
        }
        Ok(url)
    }

    pub fn toggle_password_form(&mut self) {
        let open = !self.password_form.open;
        self.password_form = PasswordFormState {
            open,
            ..PasswordFormState::default()
        };
        self.publish_password_form();
    }

    pub fn cancel_password_form(&mut self) {
        self.password_form = PasswordFormState::default();
        self.publish_password_form();
    }

    /// Closes the form once the post-success delay has elapsed.
    pub fn auto_hide_password_form(&mut self) {
        if self.password_form.hide_after.is_some() {
            self.cancel_password_form();
        }
    }

    /// Outcomes are reported inline in the form rather than through the notifier.
    pub async fn change_password(
        &mut self,
        current: &str,
        new: &str,
        confirm: &str,
    ) -> PortalResult<()> {
        self.password_form.open = true;
        self.password_form.hide_after = None;
        self.password_form.fields = PasswordFields {
            current: current.to_string(),
            new: new.to_string(),
            confirm: confirm.to_string(),
        };

        let result = async {
            validate_password_change(current, new, confirm)?;
            self.ctx
                .api()
                .change_password(&ChangePasswordRequest {
                    current_password: current.to_string(),
                    new_password: new.to_string(),
                    confirm_password: confirm.to_string(),
                })
                .await
        }
        .await;

        match result {
            Ok(ack) => {
                info!("password changed");
                self.password_form.fields = PasswordFields::default();
                self.password_form.message = Some(Notice::new(
                    NoticeKind::Success,
                    ack.message_or("Password changed successfully"),
                ));
                self.password_form.hide_after = Some(self.ctx.settings().password_form_hide_delay());
                self.publish_password_form();
                Ok(())
            }
            Err(err) => {
                let err = err.or_message("Failed to change password");
                if !err.is_local() {
                    warn!(%err, "password change failed");
                }
                self.password_form.message = Some(Notice::new(NoticeKind::Error, err.to_string()));
                self.publish_password_form();
                Err(err)
            }
        }
    }

    fn publish_password_form(&self) {
        self.ctx
            .publish(PortalEvent::PasswordFormChanged(self.password_form.clone()));
    }

    /// Starts the two-prompt deletion flow and returns the first prompt.
    pub fn request_account_deletion(&mut self) -> &'static str {
        let prompt = self.deletion.request((), DELETE_ACCOUNT_PROMPTS);
        self.ctx
            .publish(PortalEvent::ConfirmationRequested { prompt });
        prompt
    }

    pub fn pending_deletion_prompt(&self) -> Option<&'static str> {
        self.deletion.pending_prompt()
    }

    pub fn decline_account_deletion(&mut self) -> bool {
        self.deletion.decline().is_some()
    }

    /// Acknowledges the current prompt; the request goes out only after the
    /// final one.
    pub async fn confirm_account_deletion(&mut self) -> PortalResult<Confirmation<Navigation>> {
        match self.deletion.acknowledge() {
            None => Err(PortalError::NothingPending),
            Some(Acknowledged::NextPrompt(prompt)) => {
                self.ctx
                    .publish(PortalEvent::ConfirmationRequested { prompt });
                Ok(Confirmation::Prompt(prompt))
            }
            Some(Acknowledged::Ready(())) => {
                let result = self.ctx.api().delete_own_account().await;
                self.ctx.surface(result, "Failed to delete account")?;

                info!("account deleted");
                self.ctx.notify(
                    NoticeKind::Success,
                    "Account deleted successfully. Redirecting to home page...",
                );
                let navigation =
                    Navigation::delayed(LANDING_PATH, self.ctx.settings().redirect_delay());
                self.ctx
                    .publish(PortalEvent::NavigationRequested(navigation.clone()));
                Ok(Confirmation::Completed(navigation))
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/profile_tests.rs"]
mod tests;
