//! Sign Up Use Case
//!
//! Validates the form and registers the account with the identity provider.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::entity::registration::{Registration, SignUpOutcome};
use crate::domain::repository::IdentityProvider;
use crate::domain::value_object::{email::Email, password::NewPassword};
use crate::error::AuthResult;

pub struct SignUpInput {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub full_name: Option<String>,
    pub captcha_token: Option<String>,
}

pub struct SignUpUseCase<I>
where
    I: IdentityProvider + Clone + Send + Sync + 'static,
{
    identity: Arc<I>,
    config: Arc<AuthConfig>,
}

impl<I> SignUpUseCase<I>
where
    I: IdentityProvider + Clone + Send + Sync + 'static,
{
    pub fn new(identity: Arc<I>, config: Arc<AuthConfig>) -> Self {
        Self { identity, config }
    }

    pub async fn execute(&self, input: SignUpInput) -> AuthResult<SignUpOutcome> {
        let email = Email::new(&input.email)?;
        let password = NewPassword::with_confirmation(input.password, &input.confirm_password)?;

        let registration = Registration {
            email,
            password,
            full_name: input
                .full_name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            captcha_token: input.captcha_token.filter(|t| !t.is_empty()),
            email_redirect_to: self.config.confirm_url(),
        };

        // Not retried: a timed-out sign-up may still have created the account
        let outcome = self.identity.sign_up(&registration).await?;

        match &outcome {
            SignUpOutcome::SessionCreated(session) => {
                tracing::info!(user_id = %session.user.id, "User signed up (auto-confirmed)");
            }
            SignUpOutcome::ConfirmationSent(user) => {
                tracing::info!(user_id = %user.id, "User signed up; confirmation email sent");
            }
        }

        Ok(outcome)
    }
}
