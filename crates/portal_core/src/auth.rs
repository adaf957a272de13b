use shared::{
    domain::Role,
    protocol::{EmailRequest, LoginRequest, SignupRequest, VerifyEmailRequest},
};
use tracing::info;

use crate::{
    context::PortalContext,
    error::PortalResult,
    events::{Navigation, PortalEvent},
    notifier::NoticeKind,
    session::LOGIN_PATH,
    validation::{require_filled, validate_signup},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub navigation: Navigation,
    /// Dashboard role, taken from the reply or derived from the redirect route.
    pub role: Option<Role>,
}

/// Anonymous flows: sign-in, registration and email verification.
#[derive(Clone)]
pub struct AuthController {
    ctx: PortalContext,
}

impl AuthController {
    pub fn new(ctx: PortalContext) -> Self {
        Self { ctx }
    }

    pub async fn login(&self, email: &str, password: &str) -> PortalResult<LoginOutcome> {
        let result = async {
            require_filled(email, "Email and password required")?;
            require_filled(password, "Email and password required")?;
            self.ctx
                .api()
                .login(&LoginRequest {
                    email: email.trim().to_string(),
                    password: password.to_string(),
                })
                .await
        }
        .await;
        let response = self.ctx.surface(result, "Login failed")?;

        let role = response
            .role
            .clone()
            .filter(Role::is_known)
            .or_else(|| Role::from_dashboard_path(&response.redirect));
        info!(redirect = %response.redirect, role = ?role, "signed in");
        self.ctx.notify(
            NoticeKind::Success,
            response
                .message
                .clone()
                .unwrap_or_else(|| "Login successful".to_string()),
        );

        let navigation = Navigation::immediate(response.redirect);
        self.ctx
            .publish(PortalEvent::NavigationRequested(navigation.clone()));
        Ok(LoginOutcome { navigation, role })
    }

    pub async fn signup(
        &self,
        fullname: &str,
        email: &str,
        password: &str,
        confirm: &str,
    ) -> PortalResult<Navigation> {
        let result = async {
            validate_signup(fullname, email, password, confirm)?;
            self.ctx
                .api()
                .signup(&SignupRequest {
                    fullname: fullname.trim().to_string(),
                    email: email.trim().to_string(),
                    password: password.to_string(),
                })
                .await
        }
        .await;
        let ack = self.ctx.surface(result, "Signup failed")?;

        self.ctx
            .notify(NoticeKind::Success, ack.message_or("Signup successful"));
        let navigation = Navigation::delayed(LOGIN_PATH, self.ctx.settings().signup_redirect_delay());
        self.ctx
            .publish(PortalEvent::NavigationRequested(navigation.clone()));
        Ok(navigation)
    }

    pub async fn verify_email(&self, email: &str, otp: &str) -> PortalResult<()> {
        let result = async {
            require_filled(email, "Email and OTP are required")?;
            require_filled(otp, "Email and OTP are required")?;
            self.ctx
                .api()
                .verify_email(&VerifyEmailRequest {
                    email: email.trim().to_string(),
                    otp: otp.trim().to_string(),
                })
                .await
        }
        .await;
        let ack = self.ctx.surface(result, "Verification failed")?;
        self.ctx
            .notify(NoticeKind::Success, ack.message_or("Email verified"));
        Ok(())
    }

    pub async fn resend_otp(&self, email: &str) -> PortalResult<()> {
        let result = async {
            require_filled(email, "Email is required")?;
            self.ctx.api().resend_otp(&email_request(email)).await
        }
        .await;
        let ack = self.ctx.surface(result, "Failed to resend code")?;
        self.ctx
            .notify(NoticeKind::Success, ack.message_or("Verification code sent"));
        Ok(())
    }

    /// The backend answers identically whether or not the address exists.
    pub async fn forgot_password(&self, email: &str) -> PortalResult<()> {
        let result = async {
            require_filled(email, "Email is required")?;
            self.ctx.api().forgot_password(&email_request(email)).await
        }
        .await;
        let ack = self
            .ctx
            .surface(result, "An error occurred. Please try again.")?;
        self.ctx.notify(
            NoticeKind::Success,
            ack.message_or(
                "If an account with that email exists, password reset instructions have been sent.",
            ),
        );
        Ok(())
    }
}

fn email_request(email: &str) -> EmailRequest {
    EmailRequest {
        email: email.trim().to_string(),
    }
}

#[cfg(test)]
#[path = "tests/auth_tests.rs"]
mod tests;
