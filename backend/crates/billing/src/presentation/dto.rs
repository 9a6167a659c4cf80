//! API DTOs (Data Transfer Objects)

use serde::{Deserialize, Serialize};

use crate::application::check_paid::PlanStatus;
use crate::domain::plan::Plan;
use crate::domain::repository::CheckoutSession;

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckPaidRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPlanRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub plan: String,
    pub user_id: Option<String>,
}

/// Body is optional; an empty POST buys the default plan
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutBody {
    pub plan: Option<String>,
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResponse {
    pub plan: String,
    pub is_paid: bool,
}

impl From<Plan> for PlanResponse {
    fn from(plan: Plan) -> Self {
        Self {
            is_paid: plan.is_paid(),
            plan: plan.as_str().to_string(),
        }
    }
}

impl From<PlanStatus> for PlanResponse {
    fn from(status: PlanStatus) -> Self {
        Self {
            plan: status.plan.as_str().to_string(),
            is_paid: status.is_paid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub session_id: String,
    pub url: String,
}

impl From<CheckoutSession> for CheckoutResponse {
    fn from(session: CheckoutSession) -> Self {
        Self {
            session_id: session.id,
            url: session.url,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// Webhook failures answer with a bare `{error}` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookErrorResponse {
    pub error: String,
}
