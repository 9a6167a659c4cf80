//! Email link verification (sign-up confirmation, password recovery)

use std::sync::Arc;

use crate::domain::entity::{registration::OtpType, session::Session};
use crate::domain::repository::IdentityProvider;
use crate::error::{AuthError, AuthResult};

pub struct VerifyEmailUseCase<I>
where
    I: IdentityProvider + Clone + Send + Sync + 'static,
{
    identity: Arc<I>,
}

impl<I> VerifyEmailUseCase<I>
where
    I: IdentityProvider + Clone + Send + Sync + 'static,
{
    pub fn new(identity: Arc<I>) -> Self {
        Self { identity }
    }

    pub async fn execute(&self, token_hash: &str, otp_type: &str) -> AuthResult<Session> {
        let token_hash = token_hash.trim();
        if token_hash.is_empty() {
            return Err(AuthError::InvalidInput(
                "This link is invalid or has expired".to_string(),
            ));
        }
        let otp_type = OtpType::parse(otp_type).ok_or_else(|| {
            AuthError::InvalidInput("This link is invalid or has expired".to_string())
        })?;

        let session = self.identity.verify_otp(token_hash, otp_type).await?;
        tracing::info!(user_id = %session.user.id, otp_type = otp_type.as_str(), "Email link verified");
        Ok(session)
    }
}
