//! In-memory identity provider and profile repository
//!
//! Behaves like the hosted provider closely enough to drive the use cases
//! and the HTTP layer in tests: tokens rotate on refresh, email links are
//! single use, and errors carry the provider's own wording.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entity::{
    profile::UserProfile,
    registration::{OtpType, Registration, SignUpOutcome},
    session::Session,
    user::AuthUser,
};
use crate::domain::repository::{IdentityProvider, ProfileRepository};
use crate::domain::value_object::{email::Email, password::NewPassword, user_id::UserId};
use crate::error::{AuthError, AuthResult};

/// Lifetime of sessions issued by sign-in, refresh and verification
const SESSION_TTL_SECS: i64 = 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Operation {
    SignIn,
    Refresh,
    GetUser,
    Reset,
}

#[derive(Debug, Clone)]
struct InjectedFailure {
    remaining: u32,
    status: u16,
    message: String,
}

#[derive(Debug, Clone)]
struct StoredUser {
    user: AuthUser,
    password: String,
}

#[derive(Debug, Default)]
struct IdentityState {
    /// Keyed by normalised email
    users: HashMap<String, StoredUser>,
    access_tokens: HashMap<String, UserId>,
    refresh_tokens: HashMap<String, UserId>,
    otps: HashMap<String, (String, OtpType)>,
    registrations: Vec<Registration>,
    reset_emails: Vec<(String, String)>,
    failures: HashMap<Operation, InjectedFailure>,
    calls: HashMap<Operation, u32>,
}

impl IdentityState {
    fn user_by_id(&self, id: &UserId) -> Option<&StoredUser> {
        self.users.values().find(|u| &u.user.id == id)
    }

    fn user_by_id_mut(&mut self, id: &UserId) -> Option<&mut StoredUser> {
        self.users.values_mut().find(|u| &u.user.id == id)
    }

    /// Count the call and return an injected failure if one is pending
    fn enter(&mut self, op: Operation) -> AuthResult<()> {
        *self.calls.entry(op).or_default() += 1;
        if let Some(failure) = self.failures.get_mut(&op) {
            if failure.remaining > 0 {
                failure.remaining -= 1;
                return Err(AuthError::provider(
                    failure.status,
                    None,
                    failure.message.clone(),
                ));
            }
        }
        Ok(())
    }

    fn issue(&mut self, user: AuthUser, now: i64) -> Session {
        let access_token = format!("at-{}", Uuid::new_v4());
        let refresh_token = format!("rt-{}", Uuid::new_v4());
        self.access_tokens.insert(access_token.clone(), user.id);
        self.refresh_tokens.insert(refresh_token.clone(), user.id);
        Session {
            access_token,
            refresh_token,
            expires_at: now + SESSION_TTL_SECS,
            token_type: "bearer".to_string(),
            user,
        }
    }
}

fn invalid_jwt() -> AuthError {
    AuthError::provider(
        403,
        Some("bad_jwt"),
        "invalid JWT: unable to parse or verify signature",
    )
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryIdentityProvider {
    state: Arc<RwLock<IdentityState>>,
    fixed_now: Option<i64>,
    auto_confirm: bool,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin the provider clock (unix seconds) used for issued sessions
    pub fn with_clock(mut self, now: i64) -> Self {
        self.fixed_now = Some(now);
        self
    }

    /// Return a session from sign-up instead of sending a confirmation
    pub fn with_auto_confirm(mut self, auto_confirm: bool) -> Self {
        self.auto_confirm = auto_confirm;
        self
    }

    fn now(&self) -> i64 {
        self.fixed_now.unwrap_or_else(|| Utc::now().timestamp())
    }

    async fn add_user(&self, email: &str, password: &str, confirmed: bool) -> AuthUser {
        let email = email.trim().to_lowercase();
        let user = AuthUser {
            id: UserId::new(),
            email: email.clone(),
            email_confirmed_at: confirmed.then(Utc::now),
            user_metadata: serde_json::json!({}),
        };
        self.state.write().await.users.insert(
            email,
            StoredUser {
                user: user.clone(),
                password: password.to_string(),
            },
        );
        user
    }

    pub async fn add_confirmed_user(&self, email: &str, password: &str) -> AuthUser {
        self.add_user(email, password, true).await
    }

    pub async fn add_unconfirmed_user(&self, email: &str, password: &str) -> AuthUser {
        self.add_user(email, password, false).await
    }

    /// Mint a session directly, bypassing sign-in
    pub async fn issue_session(&self, email: &str, expires_at: i64) -> Option<Session> {
        let mut state = self.state.write().await;
        let user = state.users.get(&email.trim().to_lowercase())?.user.clone();
        let mut session = state.issue(user, self.now());
        session.expires_at = expires_at;
        Some(session)
    }

    /// Mint an email-link token hash as the provider would mail it
    pub async fn issue_otp(&self, email: &str, otp_type: OtpType) -> String {
        let token_hash = format!("th-{}", Uuid::new_v4().simple());
        self.state
            .write()
            .await
            .otps
            .insert(token_hash.clone(), (email.trim().to_lowercase(), otp_type));
        token_hash
    }

    /// Invalidate every access and refresh token
    pub async fn revoke_all(&self) {
        let mut state = self.state.write().await;
        state.access_tokens.clear();
        state.refresh_tokens.clear();
    }

    async fn inject(&self, op: Operation, count: u32, status: u16, message: &str) {
        self.state.write().await.failures.insert(
            op,
            InjectedFailure {
                remaining: count,
                status,
                message: message.to_string(),
            },
        );
    }

    pub async fn fail_next_refreshes(&self, count: u32, status: u16) {
        self.inject(Operation::Refresh, count, status, "upstream unavailable")
            .await;
    }

    pub async fn fail_next_sign_ins(&self, count: u32, status: u16) {
        self.inject(Operation::SignIn, count, status, "upstream unavailable")
            .await;
    }

    pub async fn fail_next_get_users(&self, count: u32, status: u16) {
        self.inject(Operation::GetUser, count, status, "upstream unavailable")
            .await;
    }

    pub async fn fail_next_resets(&self, count: u32, status: u16, message: &str) {
        self.inject(Operation::Reset, count, status, message).await;
    }

    async fn calls(&self, op: Operation) -> u32 {
        self.state
            .read()
            .await
            .calls
            .get(&op)
            .copied()
            .unwrap_or(0)
    }

    pub async fn sign_in_calls(&self) -> u32 {
        self.calls(Operation::SignIn).await
    }

    pub async fn refresh_calls(&self) -> u32 {
        self.calls(Operation::Refresh).await
    }

    pub async fn get_user_calls(&self) -> u32 {
        self.calls(Operation::GetUser).await
    }

    pub async fn last_registration(&self) -> Option<Registration> {
        self.state.read().await.registrations.last().cloned()
    }

    /// `(email, redirect_to)` for every reset email sent
    pub async fn reset_emails(&self) -> Vec<(String, String)> {
        self.state.read().await.reset_emails.clone()
    }

    pub async fn password_matches(&self, email: &str, password: &str) -> bool {
        self.state
            .read()
            .await
            .users
            .get(&email.trim().to_lowercase())
            .is_some_and(|u| u.password == password)
    }
}

impl IdentityProvider for InMemoryIdentityProvider {
    async fn sign_up(&self, registration: &Registration) -> AuthResult<SignUpOutcome> {
        let now = self.now();
        let mut state = self.state.write().await;
        state.registrations.push(registration.clone());

        let email = registration.email.as_str().to_string();
        if state.users.contains_key(&email) {
            return Err(AuthError::provider(
                422,
                Some("user_already_exists"),
                "User already registered",
            ));
        }

        let user = AuthUser {
            id: UserId::new(),
            email: email.clone(),
            email_confirmed_at: self.auto_confirm.then(Utc::now),
            user_metadata: serde_json::json!({ "full_name": registration.full_name }),
        };
        state.users.insert(
            email,
            StoredUser {
                user: user.clone(),
                password: registration.password.expose().to_string(),
            },
        );

        if self.auto_confirm {
            Ok(SignUpOutcome::SessionCreated(state.issue(user, now)))
        } else {
            Ok(SignUpOutcome::ConfirmationSent(user))
        }
    }

    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &str,
        _captcha_token: Option<&str>,
    ) -> AuthResult<Session> {
        let now = self.now();
        let mut state = self.state.write().await;
        state.enter(Operation::SignIn)?;

        let stored = state
            .users
            .get(email.as_str())
            .filter(|u| u.password == password)
            .cloned()
            .ok_or_else(|| {
                AuthError::provider(400, Some("invalid_credentials"), "Invalid login credentials")
            })?;

        if !stored.user.is_confirmed() {
            return Err(AuthError::provider(
                400,
                Some("email_not_confirmed"),
                "Email not confirmed",
            ));
        }

        Ok(state.issue(stored.user, now))
    }

    async fn refresh_session(&self, refresh_token: &str) -> AuthResult<Session> {
        let now = self.now();
        let mut state = self.state.write().await;
        state.enter(Operation::Refresh)?;

        let user_id = state.refresh_tokens.remove(refresh_token).ok_or_else(|| {
            AuthError::provider(
                400,
                Some("refresh_token_not_found"),
                "Invalid Refresh Token: Refresh Token Not Found",
            )
        })?;
        let user = state
            .user_by_id(&user_id)
            .map(|u| u.user.clone())
            .ok_or_else(invalid_jwt)?;

        Ok(state.issue(user, now))
    }

    async fn get_user(&self, access_token: &str) -> AuthResult<AuthUser> {
        let mut state = self.state.write().await;
        state.enter(Operation::GetUser)?;

        let user_id = *state
            .access_tokens
            .get(access_token)
            .ok_or_else(invalid_jwt)?;
        state
            .user_by_id(&user_id)
            .map(|u| u.user.clone())
            .ok_or_else(invalid_jwt)
    }

    async fn send_password_reset(
        &self,
        email: &Email,
        redirect_to: &str,
        _captcha_token: Option<&str>,
    ) -> AuthResult<()> {
        let mut state = self.state.write().await;
        state.enter(Operation::Reset)?;
        state
            .reset_emails
            .push((email.as_str().to_string(), redirect_to.to_string()));
        Ok(())
    }

    async fn update_password(
        &self,
        access_token: &str,
        password: &NewPassword,
    ) -> AuthResult<AuthUser> {
        let mut state = self.state.write().await;
        let user_id = *state
            .access_tokens
            .get(access_token)
            .ok_or_else(invalid_jwt)?;
        let stored = state.user_by_id_mut(&user_id).ok_or_else(invalid_jwt)?;

        if stored.password == password.expose() {
            return Err(AuthError::provider(
                422,
                Some("same_password"),
                "New password should be different from the old password.",
            ));
        }
        stored.password = password.expose().to_string();
        Ok(stored.user.clone())
    }

    async fn verify_otp(&self, token_hash: &str, otp_type: OtpType) -> AuthResult<Session> {
        let now = self.now();
        let mut state = self.state.write().await;

        let expired = || {
            AuthError::provider(
                403,
                Some("otp_expired"),
                "Email link is invalid or has expired",
            )
        };

        let (email, issued_type) = state.otps.remove(token_hash).ok_or_else(expired)?;
        if issued_type != otp_type {
            return Err(expired());
        }

        let stored = state.users.get_mut(&email).ok_or_else(expired)?;
        if stored.user.email_confirmed_at.is_none() {
            stored.user.email_confirmed_at = Some(Utc::now());
        }
        let user = stored.user.clone();

        Ok(state.issue(user, now))
    }

    async fn sign_out(&self, access_token: &str) -> AuthResult<()> {
        let mut state = self.state.write().await;
        let user_id = state
            .access_tokens
            .remove(access_token)
            .ok_or_else(invalid_jwt)?;
        state.access_tokens.retain(|_, id| *id != user_id);
        state.refresh_tokens.retain(|_, id| *id != user_id);
        Ok(())
    }
}

/// Profile rows keyed by user id
#[derive(Debug, Clone, Default)]
pub struct InMemoryProfileRepository {
    rows: Arc<RwLock<HashMap<UserId, UserProfile>>>,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.rows.read().await.len()
    }
}

impl ProfileRepository for InMemoryProfileRepository {
    async fn upsert(&self, profile: &UserProfile) -> AuthResult<UserProfile> {
        let mut rows = self.rows.write().await;
        let now = Utc::now();
        let stored = rows
            .entry(profile.id)
            .and_modify(|row| {
                row.email = profile.email.clone();
                if profile.full_name.is_some() {
                    row.full_name = profile.full_name.clone();
                }
                row.updated_at = Some(now);
            })
            .or_insert_with(|| UserProfile {
                created_at: Some(now),
                updated_at: Some(now),
                ..profile.clone()
            });
        Ok(stored.clone())
    }

    async fn find_by_id(&self, id: &UserId) -> AuthResult<Option<UserProfile>> {
        Ok(self.rows.read().await.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_refresh_rotates_tokens() {
        let provider = InMemoryIdentityProvider::new();
        provider.add_confirmed_user("user@example.com", "password1").await;
        let session = provider
            .issue_session("user@example.com", 0)
            .await
            .unwrap();

        let fresh = provider.refresh_session(&session.refresh_token).await.unwrap();
        assert_ne!(fresh.refresh_token, session.refresh_token);
        assert!(provider.refresh_session(&session.refresh_token).await.is_err());
    }

    #[tokio::test]
    async fn test_profile_upsert_keeps_name_when_absent() {
        let repo = InMemoryProfileRepository::new();
        let id = UserId::new();

        repo.upsert(&UserProfile::new(id, "a@b.io", Some("Ada".to_string())))
            .await
            .unwrap();
        let stored = repo
            .upsert(&UserProfile::new(id, "a@b.io", None))
            .await
            .unwrap();

        assert_eq!(stored.full_name.as_deref(), Some("Ada"));
        assert!(stored.created_at.is_some());
        assert_eq!(repo.count().await, 1);
    }
}
