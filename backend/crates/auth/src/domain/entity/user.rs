//! Identity-provider user

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_object::user_id::UserId;

/// User as reported by the identity provider's `/user` endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub email_confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
}

impl AuthUser {
    pub fn is_confirmed(&self) -> bool {
        self.email_confirmed_at.is_some()
    }

    /// `full_name` from sign-up metadata, if the user supplied one
    pub fn full_name(&self) -> Option<&str> {
        self.user_metadata
            .get("full_name")
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_provider_user() {
        let json = r#"{
            "id": "5f0c1b7e-8a57-4c52-9d5b-0e1f2a3b4c5d",
            "aud": "authenticated",
            "email": "user@example.com",
            "email_confirmed_at": "2025-01-02T03:04:05.123456Z",
            "user_metadata": {"full_name": "Ada Lovelace"},
            "app_metadata": {"provider": "email"}
        }"#;
        let user: AuthUser = serde_json::from_str(json).unwrap();
        assert_eq!(user.email, "user@example.com");
        assert!(user.is_confirmed());
        assert_eq!(user.full_name(), Some("Ada Lovelace"));
    }

    #[test]
    fn test_missing_optional_fields() {
        let json = r#"{"id": "5f0c1b7e-8a57-4c52-9d5b-0e1f2a3b4c5d"}"#;
        let user: AuthUser = serde_json::from_str(json).unwrap();
        assert!(!user.is_confirmed());
        assert_eq!(user.full_name(), None);
    }
}
