//! Request/response contract with the account/media backend.
//!
//! Every reply is a JSON object carrying `success` and, on failure, a
//! `message`. Uploads go out as multipart forms; everything else as JSON.

use async_trait::async_trait;
use reqwest::{multipart, Client, RequestBuilder};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Account, AnimationClip, AnimationId, AvatarId, AvatarImage, UserId},
    error::{ApiFailure, ApiStatus},
    protocol::{
        AccountListResponse, Ack, AdminAccountUpdate, AnimationListResponse, AvatarListResponse,
        ChangePasswordRequest, EmailRequest, GenerateAnimationRequest, GeneratedAnimation,
        LoginRequest, LoginResponse, ProfilePictureResponse, ProfileResponse,
        ProfileUpdateRequest, SignupRequest, SubscriptionUpdateRequest, VerifyEmailRequest,
    },
};
use tracing::debug;
use url::Url;

use crate::{
    error::{PortalError, PortalResult},
    validation::UploadFile,
};

#[async_trait]
pub trait PortalApi: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> PortalResult<LoginResponse>;
    async fn signup(&self, request: &SignupRequest) -> PortalResult<Ack>;
    async fn verify_email(&self, request: &VerifyEmailRequest) -> PortalResult<Ack>;
    async fn resend_otp(&self, request: &EmailRequest) -> PortalResult<Ack>;
    async fn forgot_password(&self, request: &EmailRequest) -> PortalResult<Ack>;
    async fn logout(&self) -> PortalResult<Ack>;

    async fn fetch_profile(&self) -> PortalResult<Account>;
    async fn update_profile(&self, request: &ProfileUpdateRequest) -> PortalResult<Ack>;
    async fn upload_profile_picture(&self, file: UploadFile)
        -> PortalResult<ProfilePictureResponse>;
    async fn change_password(&self, request: &ChangePasswordRequest) -> PortalResult<Ack>;
    async fn delete_own_account(&self) -> PortalResult<Ack>;
    async fn update_subscription(&self, request: &SubscriptionUpdateRequest)
        -> PortalResult<Ack>;

    async fn upload_avatar(&self, file: UploadFile) -> PortalResult<Ack>;
    async fn list_avatars(&self) -> PortalResult<Vec<AvatarImage>>;
    async fn delete_avatar(&self, avatar_id: AvatarId) -> PortalResult<Ack>;

    async fn generate_animation(
        &self,
        request: &GenerateAnimationRequest,
    ) -> PortalResult<GeneratedAnimation>;
    async fn list_animations(&self) -> PortalResult<Vec<AnimationClip>>;
    async fn delete_animation(&self, animation_id: AnimationId) -> PortalResult<Ack>;

    async fn list_accounts(&self) -> PortalResult<Vec<Account>>;
    async fn update_account(
        &self,
        user_id: UserId,
        update: &AdminAccountUpdate,
    ) -> PortalResult<Ack>;
    async fn delete_account(&self, user_id: UserId) -> PortalResult<Ack>;
}

pub(crate) fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// reqwest-backed implementation. The session is the backend's cookie, so the
/// client keeps a cookie store for its whole lifetime.
pub struct HttpPortalApi {
    http: Client,
    base_url: Url,
}

impl HttpPortalApi {
    /// Endpoints resolve below `base_url` even when it was given without a
    /// trailing slash.
    pub fn new(base_url: Url) -> PortalResult<Self> {
        let http = Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|err| PortalError::transport("Client setup", err))?;
        Ok(Self {
            http,
            base_url: with_trailing_slash(base_url),
        })
    }

    fn endpoint(&self, path: &str) -> PortalResult<Url> {
        self.base_url
            .join(path)
            .map_err(|err| PortalError::transport("Request", format!("bad endpoint '{path}': {err}")))
    }

    async fn exchange<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> PortalResult<T> {
        let response = request
            .send()
            .await
            .map_err(|err| PortalError::transport(operation, err))?;
        let status = response.status();
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|err| PortalError::decode(operation, format!("HTTP {status}: {err}")))?;
        debug!(operation, %status, "portal response");

        let api_status: ApiStatus = serde_json::from_value(body.clone())
            .map_err(|err| PortalError::decode(operation, format!("HTTP {status}: {err}")))?;
        if !api_status.success {
            return Err(ApiFailure::from(api_status).into());
        }

        serde_json::from_value(body).map_err(|err| PortalError::decode(operation, err))
    }

    async fn get<T: DeserializeOwned>(&self, operation: &'static str, path: &str) -> PortalResult<T> {
        let url = self.endpoint(path)?;
        self.exchange(operation, self.http.get(url)).await
    }

    async fn post_json<B, T>(&self, operation: &'static str, path: &str, body: &B) -> PortalResult<T>
    where
        B: serde::Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        self.exchange(operation, self.http.post(url).json(body)).await
    }

    async fn post_empty<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
    ) -> PortalResult<T> {
        let url = self.endpoint(path)?;
        self.exchange(operation, self.http.post(url)).await
    }

    async fn put_json<B, T>(&self, operation: &'static str, path: &str, body: &B) -> PortalResult<T>
    where
        B: serde::Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        self.exchange(operation, self.http.put(url).json(body)).await
    }

    async fn delete<T: DeserializeOwned>(&self, operation: &'static str, path: &str) -> PortalResult<T> {
        let url = self.endpoint(path)?;
        self.exchange(operation, self.http.delete(url)).await
    }

    async fn post_file<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        field: &'static str,
        file: UploadFile,
    ) -> PortalResult<T> {
        let url = self.endpoint(path)?;
        let part = multipart::Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(&file.mime_type)
            .map_err(|err| PortalError::transport(operation, err))?;
        let form = multipart::Form::new().part(field, part);
        self.exchange(operation, self.http.post(url).multipart(form))
            .await
    }
}

#[async_trait]
impl PortalApi for HttpPortalApi {
    async fn login(&self, request: &LoginRequest) -> PortalResult<LoginResponse> {
        self.post_json("Login", "api/login", request).await
    }

    async fn signup(&self, request: &SignupRequest) -> PortalResult<Ack> {
        self.post_json("Signup", "api/signup", request).await
    }

    async fn verify_email(&self, request: &VerifyEmailRequest) -> PortalResult<Ack> {
        self.post_json("Verification", "api/verify-email", request)
            .await
    }

    async fn resend_otp(&self, request: &EmailRequest) -> PortalResult<Ack> {
        self.post_json("Resend", "api/resend-otp", request).await
    }

    async fn forgot_password(&self, request: &EmailRequest) -> PortalResult<Ack> {
        self.post_json("Password reset", "api/forgot-password", request)
            .await
    }

    async fn logout(&self) -> PortalResult<Ack> {
        self.post_empty("Logout", "api/logout").await
    }

    async fn fetch_profile(&self) -> PortalResult<Account> {
        let response: ProfileResponse = self.get("Profile load", "api/profile").await?;
        Ok(response.user)
    }

    async fn update_profile(&self, request: &ProfileUpdateRequest) -> PortalResult<Ack> {
        self.put_json("Update", "api/profile", request).await
    }

    async fn upload_profile_picture(
        &self,
        file: UploadFile,
    ) -> PortalResult<ProfilePictureResponse> {
        self.post_file("Upload", "api/profile-picture", "profile_picture", file)
            .await
    }

    async fn change_password(&self, request: &ChangePasswordRequest) -> PortalResult<Ack> {
        self.post_json("Password change", "api/change-password", request)
            .await
    }

    async fn delete_own_account(&self) -> PortalResult<Ack> {
        self.post_empty("Delete", "api/account/delete").await
    }

    async fn update_subscription(
        &self,
        request: &SubscriptionUpdateRequest,
    ) -> PortalResult<Ack> {
        self.post_json("Update", "api/subscription/update", request)
            .await
    }

    async fn upload_avatar(&self, file: UploadFile) -> PortalResult<Ack> {
        self.post_file("Upload", "api/avatar/upload", "avatar", file)
            .await
    }

    async fn list_avatars(&self) -> PortalResult<Vec<AvatarImage>> {
        let response: AvatarListResponse = self.get("Avatar load", "api/avatars").await?;
        Ok(response.avatars)
    }

    async fn delete_avatar(&self, avatar_id: AvatarId) -> PortalResult<Ack> {
        self.delete("Delete", &format!("api/avatar/{avatar_id}"))
            .await
    }

    async fn generate_animation(
        &self,
        request: &GenerateAnimationRequest,
    ) -> PortalResult<GeneratedAnimation> {
        self.post_json("Generation", "api/animation/generate", request)
            .await
    }

    async fn list_animations(&self) -> PortalResult<Vec<AnimationClip>> {
        let response: AnimationListResponse =
            self.get("Animation load", "api/animations").await?;
        Ok(response.animations)
    }

    async fn delete_animation(&self, animation_id: AnimationId) -> PortalResult<Ack> {
        self.delete("Delete", &format!("api/animation/{animation_id}"))
            .await
    }

    async fn list_accounts(&self) -> PortalResult<Vec<Account>> {
        let response: AccountListResponse = self.get("User load", "api/admin/users").await?;
        Ok(response.users)
    }

    async fn update_account(
        &self,
        user_id: UserId,
        update: &AdminAccountUpdate,
    ) -> PortalResult<Ack> {
        self.put_json("Action", &format!("api/admin/user/{user_id}"), update)
            .await
    }

    async fn delete_account(&self, user_id: UserId) -> PortalResult<Ack> {
        self.delete("Delete", &format!("api/admin/user/{user_id}"))
            .await
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
