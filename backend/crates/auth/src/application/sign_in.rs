//! Sign In Use Case
//!
//! Password sign-in through the identity provider.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::entity::session::Session;
use crate::domain::repository::IdentityProvider;
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

pub struct SignInInput {
    pub email: String,
    pub password: String,
    pub captcha_token: Option<String>,
}

pub struct SignInUseCase<I>
where
    I: IdentityProvider + Clone + Send + Sync + 'static,
{
    identity: Arc<I>,
    config: Arc<AuthConfig>,
}

impl<I> SignInUseCase<I>
where
    I: IdentityProvider + Clone + Send + Sync + 'static,
{
    pub fn new(identity: Arc<I>, config: Arc<AuthConfig>) -> Self {
        Self { identity, config }
    }

    pub async fn execute(&self, input: SignInInput) -> AuthResult<Session> {
        let email = Email::new(&input.email)?;

        if input.password.is_empty() {
            return Err(AuthError::InvalidInput(
                "Please enter your password".to_string(),
            ));
        }

        let identity = &self.identity;
        let captcha = input.captcha_token.as_deref().filter(|t| !t.is_empty());
        let session = self
            .config
            .retry
            .run(
                || identity.sign_in_with_password(&email, &input.password, captcha),
                AuthError::is_transient,
            )
            .await?;

        tracing::info!(user_id = %session.user.id, "User signed in");

        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::identity_error::IdentityErrorKind;
    use crate::infra::memory::InMemoryIdentityProvider;
    use platform::retry::RetryPolicy;
    use std::time::Duration;

    fn use_case(provider: &InMemoryIdentityProvider) -> SignInUseCase<InMemoryIdentityProvider> {
        let config = AuthConfig::new("https://test.supabase.co", "http://localhost:3000")
            .with_retry(RetryPolicy::new(3, Duration::from_millis(10), Duration::from_millis(40)));
        SignInUseCase::new(Arc::new(provider.clone()), Arc::new(config))
    }

    fn input(email: &str, password: &str) -> SignInInput {
        SignInInput {
            email: email.to_string(),
            password: password.to_string(),
            captcha_token: None,
        }
    }

    #[tokio::test]
    async fn test_sign_in_success() {
        let provider = InMemoryIdentityProvider::new();
        provider.add_confirmed_user("user@example.com", "password1").await;

        let session = use_case(&provider)
            .execute(input("User@Example.com", "password1"))
            .await
            .unwrap();

        assert_eq!(session.user.email, "user@example.com");
    }

    #[tokio::test]
    async fn test_wrong_password_is_not_retried() {
        let provider = InMemoryIdentityProvider::new();
        provider.add_confirmed_user("user@example.com", "password1").await;

        let err = use_case(&provider)
            .execute(input("user@example.com", "wrong"))
            .await
            .unwrap_err();

        assert_eq!(err.identity_kind(), Some(IdentityErrorKind::InvalidCredentials));
        assert_eq!(provider.sign_in_calls().await, 1);
    }

    #[tokio::test]
    async fn test_unconfirmed_email() {
        let provider = InMemoryIdentityProvider::new();
        provider.add_unconfirmed_user("new@example.com", "password1").await;

        let err = use_case(&provider)
            .execute(input("new@example.com", "password1"))
            .await
            .unwrap_err();

        assert_eq!(err.identity_kind(), Some(IdentityErrorKind::EmailNotConfirmed));
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let provider = InMemoryIdentityProvider::new();
        provider.add_confirmed_user("user@example.com", "password1").await;
        provider.fail_next_sign_ins(1, 500).await;

        let session = use_case(&provider)
            .execute(input("user@example.com", "password1"))
            .await;

        assert!(session.is_ok());
        assert_eq!(provider.sign_in_calls().await, 2);
    }

    #[tokio::test]
    async fn test_invalid_email_never_reaches_provider() {
        let provider = InMemoryIdentityProvider::new();
        let err = use_case(&provider)
            .execute(input("not-an-email", "password1"))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::InvalidInput(_)));
        assert_eq!(provider.sign_in_calls().await, 0);
    }
}
