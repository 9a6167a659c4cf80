//! Password reset use cases
//!
//! Requesting a reset never reveals whether an account exists. Setting the
//! new password happens inside the session created by the emailed link.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::route_policy::location_with_query;
use crate::domain::entity::{session::Session, user::AuthUser};
use crate::domain::identity_error::IdentityErrorKind;
use crate::domain::repository::IdentityProvider;
use crate::domain::value_object::{email::Email, password::NewPassword};
use crate::error::{AuthError, AuthResult};

/// Where the reset link lands after the token is verified
pub const RESET_PASSWORD_PATH: &str = "/reset-password";

pub struct RequestPasswordResetUseCase<I>
where
    I: IdentityProvider + Clone + Send + Sync + 'static,
{
    identity: Arc<I>,
    config: Arc<AuthConfig>,
}

impl<I> RequestPasswordResetUseCase<I>
where
    I: IdentityProvider + Clone + Send + Sync + 'static,
{
    pub fn new(identity: Arc<I>, config: Arc<AuthConfig>) -> Self {
        Self { identity, config }
    }

    /// Errors are reported only for bad input, rate limiting and captcha
    /// failures; anything else looks like success to the caller.
    pub async fn execute(&self, email: &str, captcha_token: Option<&str>) -> AuthResult<()> {
        let email = Email::new(email)?;
        let redirect_to = location_with_query(
            &self.config.confirm_url(),
            &[("next", RESET_PASSWORD_PATH)],
        );

        let result = self
            .identity
            .send_password_reset(
                &email,
                &redirect_to,
                captcha_token.filter(|t| !t.is_empty()),
            )
            .await;

        match result {
            Ok(()) => Ok(()),
            Err(e)
                if matches!(
                    e.identity_kind(),
                    Some(IdentityErrorKind::RateLimited | IdentityErrorKind::CaptchaFailed)
                ) =>
            {
                Err(e)
            }
            Err(e) => {
                e.log();
                Ok(())
            }
        }
    }
}

pub struct UpdatePasswordInput {
    pub password: String,
    pub confirm_password: String,
}

pub struct UpdatePasswordUseCase<I>
where
    I: IdentityProvider + Clone + Send + Sync + 'static,
{
    identity: Arc<I>,
}

impl<I> UpdatePasswordUseCase<I>
where
    I: IdentityProvider + Clone + Send + Sync + 'static,
{
    pub fn new(identity: Arc<I>) -> Self {
        Self { identity }
    }

    pub async fn execute(
        &self,
        session: Option<&Session>,
        input: UpdatePasswordInput,
    ) -> AuthResult<AuthUser> {
        let session = session.ok_or(AuthError::Unauthenticated)?;
        let password = NewPassword::with_confirmation(input.password, &input.confirm_password)?;

        let user = self
            .identity
            .update_password(&session.access_token, &password)
            .await?;

        tracing::info!(user_id = %user.id, "Password updated");
        Ok(user)
    }
}
