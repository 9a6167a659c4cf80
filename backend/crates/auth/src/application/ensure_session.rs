//! Ensure Session Use Case
//!
//! Turns whatever session the browser sent into a session the server can
//! trust for this request: refresh it when it is about to expire, then
//! confirm it with the identity provider.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::entity::session::Session;
use crate::domain::repository::IdentityProvider;
use crate::error::AuthError;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Anonymous {
        /// The cookies are unusable and should be deleted
        clear_cookies: bool,
    },
    Authenticated {
        session: Session,
        /// Tokens changed; the cookies must be rewritten
        refreshed: bool,
    },
}

impl SessionState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Authenticated { session, .. } => Some(session),
            SessionState::Anonymous { .. } => None,
        }
    }

    pub fn into_session(self) -> Option<Session> {
        match self {
            SessionState::Authenticated { session, .. } => Some(session),
            SessionState::Anonymous { .. } => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated { .. })
    }
}

pub struct EnsureSessionUseCase<I>
where
    I: IdentityProvider + Clone + Send + Sync + 'static,
{
    identity: Arc<I>,
    config: Arc<AuthConfig>,
}

impl<I> EnsureSessionUseCase<I>
where
    I: IdentityProvider + Clone + Send + Sync + 'static,
{
    pub fn new(identity: Arc<I>, config: Arc<AuthConfig>) -> Self {
        Self { identity, config }
    }

    /// `now` is unix seconds
    pub async fn execute(&self, session: Option<Session>, now: i64) -> SessionState {
        let Some(mut session) = session else {
            return SessionState::Anonymous {
                clear_cookies: false,
            };
        };

        let mut refreshed = false;

        if session.is_stale(now, self.config.refresh_skew) {
            if !self.config.auto_refresh {
                tracing::debug!(
                    expires_at = session.expires_at,
                    "Stale session and auto refresh disabled"
                );
                return SessionState::Anonymous {
                    clear_cookies: false,
                };
            }

            session = match self.refresh(&session.refresh_token).await {
                Ok(fresh) => fresh,
                Err(e) => return Self::anonymous_after(&e, "Session refresh failed"),
            };
            refreshed = true;

            if !self.config.propagation_delay.is_zero() {
                tokio::time::sleep(self.config.propagation_delay).await;
            }
        }

        match self.identity.get_user(&session.access_token).await {
            Ok(user) => {
                session.user = user;
                SessionState::Authenticated { session, refreshed }
            }
            // The old refresh token is spent; keep the new tokens until the
            // provider can confirm them
            Err(e) if refreshed && (e.is_transient() || e.is_rate_limited()) => {
                tracing::warn!(error = %e, "Refreshed session not validated; keeping it");
                SessionState::Authenticated { session, refreshed }
            }
            Err(e) => Self::anonymous_after(&e, "Session validation failed"),
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session, AuthError> {
        let identity = &self.identity;
        self.config
            .retry
            .run(
                || identity.refresh_session(refresh_token),
                |e: &AuthError| e.is_transient() || e.is_rate_limited(),
            )
            .await
    }

    /// Keep the cookies through provider outages; drop them once the
    /// provider has said the session is gone.
    fn anonymous_after(err: &AuthError, context: &'static str) -> SessionState {
        let clear_cookies = !err.is_transient() && !err.is_rate_limited();
        if clear_cookies {
            tracing::debug!(error = %err, "{context}; clearing session cookies");
        } else {
            tracing::warn!(error = %err, "{context}; identity provider unavailable");
        }
        SessionState::Anonymous { clear_cookies }
    }
}
