//! Ports
//!
//! Interfaces to the identity provider and the profile table.
//! Implementations live in the infrastructure layer.

use crate::domain::entity::{
    profile::UserProfile,
    registration::{OtpType, Registration, SignUpOutcome},
    session::Session,
    user::AuthUser,
};
use crate::domain::value_object::{email::Email, password::NewPassword, user_id::UserId};
use crate::error::AuthResult;

/// Identity provider (hosted auth service)
#[trait_variant::make(IdentityProvider: Send)]
pub trait LocalIdentityProvider {
    /// Create an account; may or may not return a session
    async fn sign_up(&self, registration: &Registration) -> AuthResult<SignUpOutcome>;

    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &str,
        captcha_token: Option<&str>,
    ) -> AuthResult<Session>;

    /// Exchange a refresh token for a new session
    async fn refresh_session(&self, refresh_token: &str) -> AuthResult<Session>;

    /// Validate an access token and return its user
    async fn get_user(&self, access_token: &str) -> AuthResult<AuthUser>;

    /// Send a password-reset email linking to `redirect_to`
    async fn send_password_reset(
        &self,
        email: &Email,
        redirect_to: &str,
        captcha_token: Option<&str>,
    ) -> AuthResult<()>;

    async fn update_password(
        &self,
        access_token: &str,
        password: &NewPassword,
    ) -> AuthResult<AuthUser>;

    /// Exchange an emailed token hash for a session
    async fn verify_otp(&self, token_hash: &str, otp_type: OtpType) -> AuthResult<Session>;

    /// Revoke the refresh tokens behind `access_token`
    async fn sign_out(&self, access_token: &str) -> AuthResult<()>;
}

/// Profile repository trait
#[trait_variant::make(ProfileRepository: Send)]
pub trait LocalProfileRepository {
    /// Insert or update by id; returns the stored row
    async fn upsert(&self, profile: &UserProfile) -> AuthResult<UserProfile>;

    async fn find_by_id(&self, id: &UserId) -> AuthResult<Option<UserProfile>>;
}
