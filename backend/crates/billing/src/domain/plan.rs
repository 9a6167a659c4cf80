//! Plan tags and the per-email plan row

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Plan tag stored in `user_plan.plan`. Unknown tags are kept verbatim
/// (lowercased) so new plans can be introduced without a deploy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Plan {
    #[default]
    Free,
    Premium,
    Founding,
    Beta,
    Founder,
    Other(String),
}

impl Plan {
    /// Case-insensitive; blank input is `Free`
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "" | "free" => Plan::Free,
            "premium" => Plan::Premium,
            "founding" => Plan::Founding,
            "beta" => Plan::Beta,
            "founder" => Plan::Founder,
            other => Plan::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Plan::Free => "free",
            Plan::Premium => "premium",
            Plan::Founding => "founding",
            Plan::Beta => "beta",
            Plan::Founder => "founder",
            Plan::Other(tag) => tag,
        }
    }

    /// Only the early-access tiers count as paid
    pub fn is_paid(&self) -> bool {
        matches!(self, Plan::Founding | Plan::Beta | Plan::Founder)
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Plan {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Plan {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Plan::parse).unwrap_or_default())
    }
}

/// One row per email in the `user_plan` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPlan {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub plan: Plan,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stripe_customer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stripe_session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Key under which a plan row is stored and looked up
pub fn plan_key(email: &str) -> String {
    email.trim().to_lowercase()
}

impl UserPlan {
    pub fn new(email: impl Into<String>, plan: Plan) -> Self {
        Self {
            email: plan_key(&email.into()),
            user_id: None,
            plan,
            stripe_customer_id: None,
            stripe_session_id: None,
            updated_at: Some(Utc::now()),
        }
    }

    pub fn with_user_id(mut self, user_id: Option<UserId>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn is_paid(&self) -> bool {
        self.plan.is_paid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paid_plans_case_insensitive() {
        for raw in ["founding", "FOUNDING", " Beta ", "founder", "Founder"] {
            assert!(Plan::parse(raw).is_paid(), "{raw}");
        }
    }

    #[test]
    fn test_unpaid_plans() {
        for raw in ["free", "premium", "", "enterprise", "founders"] {
            assert!(!Plan::parse(raw).is_paid(), "{raw}");
        }
    }

    #[test]
    fn test_unknown_tag_kept_lowercased() {
        assert_eq!(Plan::parse(" Lifetime "), Plan::Other("lifetime".to_string()));
        assert_eq!(Plan::parse("Lifetime").as_str(), "lifetime");
    }

    #[test]
    fn test_plan_serde() {
        assert_eq!(serde_json::to_string(&Plan::Beta).unwrap(), "\"beta\"");
        let plan: Plan = serde_json::from_str("\"FOUNDER\"").unwrap();
        assert_eq!(plan, Plan::Founder);
        let plan: Plan = serde_json::from_str("null").unwrap();
        assert_eq!(plan, Plan::Free);
    }

    #[test]
    fn test_user_plan_row_shape() {
        let row = UserPlan::new(" Ada@Example.com ", Plan::Founding);
        assert_eq!(row.email, "ada@example.com");
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["plan"], "founding");
        assert!(json.get("user_id").is_none());
        assert!(json.get("stripe_customer_id").is_none());
    }
}
