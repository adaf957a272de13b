//! In-memory backend double shared by the controller tests. It behaves like
//! an immediately consistent server, records every call it receives and can
//! be scripted to fail per endpoint.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use shared::{
    domain::{
        Account, AnimationClip, AnimationId, AvatarId, AvatarImage, Role, SubscriptionStatus,
        UserId,
    },
    protocol::{
        Ack, AdminAccountUpdate, ChangePasswordRequest, EmailRequest, GenerateAnimationRequest,
        GeneratedAnimation, LoginRequest, LoginResponse, ProfilePictureResponse,
        ProfileUpdateRequest, SignupRequest, SubscriptionUpdateRequest, VerifyEmailRequest,
    },
};

use crate::{
    config::PortalSettings,
    context::PortalContext,
    error::{PortalError, PortalResult},
    notifier::{Notice, NoticeKind, Notifier},
    transport::PortalApi,
    validation::UploadFile,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ApiCall {
    Login { email: String },
    Signup { email: String },
    VerifyEmail { email: String, otp: String },
    ResendOtp { email: String },
    ForgotPassword { email: String },
    Logout,
    FetchProfile,
    UpdateProfile(ProfileUpdateRequest),
    UploadProfilePicture { file_name: String },
    ChangePassword(ChangePasswordRequest),
    DeleteOwnAccount,
    UpdateSubscription { plan: String },
    UploadAvatar { file_name: String },
    ListAvatars,
    DeleteAvatar(AvatarId),
    GenerateAnimation(GenerateAnimationRequest),
    ListAnimations,
    DeleteAnimation(AnimationId),
    ListAccounts,
    UpdateAccount(UserId, AdminAccountUpdate),
    DeleteAccount(UserId),
}

impl ApiCall {
    pub(crate) fn endpoint(&self) -> &'static str {
        match self {
            ApiCall::Login { .. } => "login",
            ApiCall::Signup { .. } => "signup",
            ApiCall::VerifyEmail { .. } => "verify_email",
            ApiCall::ResendOtp { .. } => "resend_otp",
            ApiCall::ForgotPassword { .. } => "forgot_password",
            ApiCall::Logout => "logout",
            ApiCall::FetchProfile => "fetch_profile",
            ApiCall::UpdateProfile(_) => "update_profile",
            ApiCall::UploadProfilePicture { .. } => "upload_profile_picture",
            ApiCall::ChangePassword(_) => "change_password",
            ApiCall::DeleteOwnAccount => "delete_own_account",
            ApiCall::UpdateSubscription { .. } => "update_subscription",
            ApiCall::UploadAvatar { .. } => "upload_avatar",
            ApiCall::ListAvatars => "list_avatars",
            ApiCall::DeleteAvatar(_) => "delete_avatar",
            ApiCall::GenerateAnimation(_) => "generate_animation",
            ApiCall::ListAnimations => "list_animations",
            ApiCall::DeleteAnimation(_) => "delete_animation",
            ApiCall::ListAccounts => "list_accounts",
            ApiCall::UpdateAccount(..) => "update_account",
            ApiCall::DeleteAccount(_) => "delete_account",
        }
    }

    pub(crate) fn is_mutation(&self) -> bool {
        !matches!(
            self,
            ApiCall::FetchProfile
                | ApiCall::ListAvatars
                | ApiCall::ListAnimations
                | ApiCall::ListAccounts
        )
    }
}

struct FakeState {
    profile: Account,
    avatars: Vec<AvatarImage>,
    animations: Vec<AnimationClip>,
    accounts: Vec<Account>,
    login_redirect: String,
    login_role: Option<Role>,
    profile_without_picture: bool,
    next_id: i64,
    calls: Vec<ApiCall>,
    failures: HashMap<&'static str, PortalError>,
}

pub(crate) struct FakePortalApi {
    state: Mutex<FakeState>,
}

pub(crate) fn account(id: i64, fullname: &str, email: &str, role: Role) -> Account {
    Account {
        user_id: UserId(id),
        fullname: fullname.to_string(),
        email: email.to_string(),
        role,
        subscription_status: SubscriptionStatus::Active,
        profile_picture: None,
        created_at: Some("2024-03-01 10:00:00".to_string()),
    }
}

pub(crate) fn png(name: &str, size: usize) -> UploadFile {
    UploadFile::new(name, "image/png", vec![0u8; size])
}

impl FakePortalApi {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                profile: account(1, "Ana Lee", "ana@x.com", Role::User),
                avatars: Vec::new(),
                animations: Vec::new(),
                accounts: Vec::new(),
                login_redirect: "/user".to_string(),
                login_role: None,
                profile_without_picture: false,
                next_id: 100,
                calls: Vec::new(),
                failures: HashMap::new(),
            }),
        }
    }

    pub(crate) fn with_profile(self, profile: Account) -> Self {
        self.lock().profile = profile;
        self
    }

    pub(crate) fn with_accounts(self, accounts: Vec<Account>) -> Self {
        self.lock().accounts = accounts;
        self
    }

    pub(crate) fn with_avatars(self, paths: &[&str]) -> Self {
        {
            let mut state = self.lock();
            for path in paths {
                let avatar_id = AvatarId(state.next_id);
                state.next_id += 1;
                state.avatars.push(AvatarImage {
                    avatar_id,
                    user_id: Some(UserId(1)),
                    avatar_path: path.to_string(),
                });
            }
        }
        self
    }

    pub(crate) fn with_login(self, redirect: &str, role: Option<Role>) -> Self {
        {
            let mut state = self.lock();
            state.login_redirect = redirect.to_string();
            state.login_role = role;
        }
        self
    }

    /// Profile replies leave out the picture reference, as the Flask backend does.
    pub(crate) fn without_profile_picture_in_fetch(self) -> Self {
        self.lock().profile_without_picture = true;
        self
    }

    /// Every later call to `endpoint` fails with `err` until cleared.
    pub(crate) fn fail(&self, endpoint: &'static str, err: PortalError) {
        self.lock().failures.insert(endpoint, err);
    }

    pub(crate) fn calls(&self) -> Vec<ApiCall> {
        self.lock().calls.clone()
    }

    pub(crate) fn mutations(&self) -> Vec<ApiCall> {
        self.calls()
            .into_iter()
            .filter(ApiCall::is_mutation)
            .collect()
    }

    pub(crate) fn avatars(&self) -> Vec<AvatarImage> {
        self.lock().avatars.clone()
    }

    pub(crate) fn animations(&self) -> Vec<AnimationClip> {
        self.lock().animations.clone()
    }

    pub(crate) fn accounts(&self) -> Vec<Account> {
        self.lock().accounts.clone()
    }

    pub(crate) fn profile(&self) -> Account {
        self.lock().profile.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake backend lock")
    }

    fn check(&self, call: ApiCall) -> PortalResult<()> {
        self.enter(call).map(drop)
    }

    /// Records the call and returns the scripted failure, if any.
    fn enter(&self, call: ApiCall) -> PortalResult<std::sync::MutexGuard<'_, FakeState>> {
        let mut state = self.lock();
        let endpoint = call.endpoint();
        state.calls.push(call);
        if let Some(err) = state.failures.get(endpoint).cloned() {
            return Err(err);
        }
        Ok(state)
    }
}

fn ack(message: &str) -> Ack {
    Ack::with_message(message)
}

#[async_trait]
impl PortalApi for FakePortalApi {
    async fn login(&self, request: &LoginRequest) -> PortalResult<LoginResponse> {
        let state = self.enter(ApiCall::Login {
            email: request.email.clone(),
        })?;
        Ok(LoginResponse {
            redirect: state.login_redirect.clone(),
            role: state.login_role.clone(),
            message: Some("Login successful".to_string()),
        })
    }

    async fn signup(&self, request: &SignupRequest) -> PortalResult<Ack> {
        self.check(ApiCall::Signup {
            email: request.email.clone(),
        })?;
        Ok(ack("Signup successful. Please verify your email."))
    }

    async fn verify_email(&self, request: &VerifyEmailRequest) -> PortalResult<Ack> {
        self.check(ApiCall::VerifyEmail {
            email: request.email.clone(),
            otp: request.otp.clone(),
        })?;
        Ok(ack("Email verified successfully"))
    }

    async fn resend_otp(&self, request: &EmailRequest) -> PortalResult<Ack> {
        self.check(ApiCall::ResendOtp {
            email: request.email.clone(),
        })?;
        Ok(Ack::default())
    }

    async fn forgot_password(&self, request: &EmailRequest) -> PortalResult<Ack> {
        self.check(ApiCall::ForgotPassword {
            email: request.email.clone(),
        })?;
        Ok(Ack::default())
    }

    async fn logout(&self) -> PortalResult<Ack> {
        self.check(ApiCall::Logout)?;
        Ok(ack("Logged out"))
    }

    async fn fetch_profile(&self) -> PortalResult<Account> {
        let state = self.enter(ApiCall::FetchProfile)?;
        let mut profile = state.profile.clone();
        if state.profile_without_picture {
            profile.profile_picture = None;
        }
        Ok(profile)
    }

    async fn update_profile(&self, request: &ProfileUpdateRequest) -> PortalResult<Ack> {
        let mut state = self.enter(ApiCall::UpdateProfile(request.clone()))?;
        state.profile.fullname = request.fullname.clone();
        state.profile.email = request.email.clone();
        Ok(ack("Profile updated successfully"))
    }

    async fn upload_profile_picture(
        &self,
        file: UploadFile,
    ) -> PortalResult<ProfilePictureResponse> {
        let mut state = self.enter(ApiCall::UploadProfilePicture {
            file_name: file.file_name.clone(),
        })?;
        let path = format!("uploads/profile_{}.png", state.profile.user_id);
        state.profile.profile_picture = Some(path.clone());
        Ok(ProfilePictureResponse {
            profile_picture: path,
            message: None,
        })
    }

    async fn change_password(&self, request: &ChangePasswordRequest) -> PortalResult<Ack> {
        self.check(ApiCall::ChangePassword(request.clone()))?;
        Ok(Ack::default())
    }

    async fn delete_own_account(&self) -> PortalResult<Ack> {
        let mut state = self.enter(ApiCall::DeleteOwnAccount)?;
        state.avatars.clear();
        state.animations.clear();
        Ok(ack("Account deleted"))
    }

    async fn update_subscription(
        &self,
        request: &SubscriptionUpdateRequest,
    ) -> PortalResult<Ack> {
        self.check(ApiCall::UpdateSubscription {
            plan: request.plan.clone(),
        })?;
        Ok(Ack::default())
    }

    async fn upload_avatar(&self, file: UploadFile) -> PortalResult<Ack> {
        let mut state = self.enter(ApiCall::UploadAvatar {
            file_name: file.file_name.clone(),
        })?;
        let avatar_id = AvatarId(state.next_id);
        state.next_id += 1;
        let user_id = state.profile.user_id;
        state.avatars.push(AvatarImage {
            avatar_id,
            user_id: Some(user_id),
            avatar_path: format!("avatars/{}", file.file_name),
        });
        Ok(ack("Avatar uploaded successfully!"))
    }

    async fn list_avatars(&self) -> PortalResult<Vec<AvatarImage>> {
        let state = self.enter(ApiCall::ListAvatars)?;
        Ok(state.avatars.clone())
    }

    async fn delete_avatar(&self, avatar_id: AvatarId) -> PortalResult<Ack> {
        let mut state = self.enter(ApiCall::DeleteAvatar(avatar_id))?;
        let before = state.avatars.len();
        state.avatars.retain(|avatar| avatar.avatar_id != avatar_id);
        if state.avatars.len() == before {
            return Err(PortalError::rejected("Avatar not found"));
        }
        Ok(ack("Avatar deleted successfully"))
    }

    async fn generate_animation(
        &self,
        request: &GenerateAnimationRequest,
    ) -> PortalResult<GeneratedAnimation> {
        let mut state = self.enter(ApiCall::GenerateAnimation(request.clone()))?;
        let animation_id = AnimationId(state.next_id);
        state.next_id += 1;
        let animation_path = format!("animations/animation_{animation_id}.mp4");
        let user_id = state.profile.user_id;
        state.animations.push(AnimationClip {
            animation_id: Some(animation_id),
            user_id: Some(user_id),
            avatar_id: request.avatar_id.parse().ok().map(AvatarId),
            expression_id: Some(request.expression_id.clone()),
            expression_name: Some(request.expression_id.clone()),
            animation_path: animation_path.clone(),
            created_at: Some("2024-03-02 09:30:00".to_string()),
        });
        Ok(GeneratedAnimation {
            animation_path,
            message: None,
        })
    }

    async fn list_animations(&self) -> PortalResult<Vec<AnimationClip>> {
        let state = self.enter(ApiCall::ListAnimations)?;
        Ok(state.animations.clone())
    }

    async fn delete_animation(&self, animation_id: AnimationId) -> PortalResult<Ack> {
        let mut state = self.enter(ApiCall::DeleteAnimation(animation_id))?;
        state
            .animations
            .retain(|clip| clip.animation_id != Some(animation_id));
        Ok(Ack::default())
    }

    async fn list_accounts(&self) -> PortalResult<Vec<Account>> {
        let state = self.enter(ApiCall::ListAccounts)?;
        Ok(state.accounts.clone())
    }

    async fn update_account(
        &self,
        user_id: UserId,
        update: &AdminAccountUpdate,
    ) -> PortalResult<Ack> {
        let mut state = self.enter(ApiCall::UpdateAccount(user_id, update.clone()))?;
        let Some(target) = state
            .accounts
            .iter_mut()
            .find(|account| account.user_id == user_id)
        else {
            return Err(PortalError::rejected("User not found"));
        };
        match update {
            AdminAccountUpdate::Suspend => target.subscription_status = SubscriptionStatus::Suspended,
            AdminAccountUpdate::Activate => target.subscription_status = SubscriptionStatus::Active,
            AdminAccountUpdate::Edit { fullname, email } => {
                target.fullname = fullname.clone();
                target.email = email.clone();
            }
        }
        Ok(Ack::default())
    }

    async fn delete_account(&self, user_id: UserId) -> PortalResult<Ack> {
        let mut state = self.enter(ApiCall::DeleteAccount(user_id))?;
        state.accounts.retain(|account| account.user_id != user_id);
        Ok(Ack::default())
    }
}

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    shown: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub(crate) fn notices(&self) -> Vec<Notice> {
        self.shown.lock().expect("notifier lock").clone()
    }

    pub(crate) fn last(&self) -> Option<Notice> {
        self.notices().pop()
    }

    pub(crate) fn errors(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter(|notice| notice.kind == NoticeKind::Error)
            .map(|notice| notice.message)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn show(&self, notice: &Notice) {
        self.shown
            .lock()
            .expect("notifier lock")
            .push(notice.clone());
    }
}

pub(crate) struct Harness {
    pub(crate) api: Arc<FakePortalApi>,
    pub(crate) notifier: Arc<RecordingNotifier>,
    pub(crate) ctx: PortalContext,
}

pub(crate) fn harness(api: FakePortalApi) -> Harness {
    harness_with(api, PortalSettings::default())
}

pub(crate) fn harness_with(api: FakePortalApi, settings: PortalSettings) -> Harness {
    let api = Arc::new(api);
    let notifier = Arc::new(RecordingNotifier::default());
    let ctx = PortalContext::new(api.clone(), notifier.clone(), settings);
    Harness { api, notifier, ctx }
}
