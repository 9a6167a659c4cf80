//! Check Paid Use Case
//!
//! Public, read-only lookup used by the browser extension to gate features.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::plan::{Plan, plan_key};
use crate::domain::repository::PlanRepository;
use crate::error::{BillingError, BillingResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanStatus {
    pub is_paid: bool,
    pub plan: Plan,
}

impl PlanStatus {
    pub fn from_plan(plan: Plan) -> Self {
        Self {
            is_paid: plan.is_paid(),
            plan,
        }
    }

    pub fn free() -> Self {
        Self::from_plan(Plan::Free)
    }
}

pub struct CheckPaidUseCase<R>
where
    R: PlanRepository + Clone + Send + Sync + 'static,
{
    plans: Arc<R>,
}

impl<R> CheckPaidUseCase<R>
where
    R: PlanRepository + Clone + Send + Sync + 'static,
{
    pub fn new(plans: Arc<R>) -> Self {
        Self { plans }
    }

    pub async fn execute(&self, email: &str) -> BillingResult<PlanStatus> {
        // Same key the webhook stores under, so any address Stripe reports
        // can be found again
        let key = plan_key(email);
        if key.is_empty() {
            return Err(BillingError::InvalidInput("Email is required".to_string()));
        }

        let status = match self.plans.find_by_email(&key).await? {
            Some(row) => PlanStatus::from_plan(row.plan),
            None => PlanStatus::free(),
        };

        tracing::debug!(plan = %status.plan, is_paid = status.is_paid, "Plan checked");

        Ok(status)
    }
}
