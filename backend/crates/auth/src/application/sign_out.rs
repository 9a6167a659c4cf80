//! Sign Out Use Case

use std::sync::Arc;

use crate::domain::repository::IdentityProvider;
use crate::error::AuthResult;

pub struct SignOutUseCase<I>
where
    I: IdentityProvider + Clone + Send + Sync + 'static,
{
    identity: Arc<I>,
}

impl<I> SignOutUseCase<I>
where
    I: IdentityProvider + Clone + Send + Sync + 'static,
{
    pub fn new(identity: Arc<I>) -> Self {
        Self { identity }
    }

    /// Revoke the session at the provider. Callers clear cookies regardless.
    pub async fn execute(&self, access_token: &str) -> AuthResult<()> {
        self.identity.sign_out(access_token).await?;
        tracing::info!("User signed out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory::InMemoryIdentityProvider;

    #[tokio::test]
    async fn test_sign_out_revokes() {
        let provider = InMemoryIdentityProvider::new();
        provider.add_confirmed_user("user@example.com", "password1").await;
        let session = provider
            .issue_session("user@example.com", i64::MAX / 2)
            .await
            .unwrap();

        SignOutUseCase::new(Arc::new(provider.clone()))
            .execute(&session.access_token)
            .await
            .unwrap();

        assert!(provider.get_user(&session.access_token).await.is_err());
    }
}
