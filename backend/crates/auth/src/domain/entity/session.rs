//! Session Entity
//!
//! Token pair issued by the identity provider. Stored client-side in the
//! session cookie; the server keeps no session state of its own.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::entity::user::AuthUser;

fn default_token_type() -> String {
    "bearer".to_string()
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix seconds
    pub expires_at: i64,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub user: AuthUser,
}

impl Session {
    /// Seconds until expiry; negative once expired
    pub fn expires_in(&self, now: i64) -> i64 {
        self.expires_at - now
    }

    /// Stale once the expiry minus `skew` has been reached
    pub fn is_stale(&self, now: i64, skew: Duration) -> bool {
        let skew = i64::try_from(skew.as_secs()).unwrap_or(i64::MAX);
        self.expires_at.saturating_sub(skew) <= now
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user.id)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}
