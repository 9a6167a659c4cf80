//! Plan lookup and manual assignment

use std::sync::Arc;

use auth::models::{AuthUser, Email};
use kernel::id::UserId;

use crate::domain::plan::{Plan, UserPlan, plan_key};
use crate::domain::repository::PlanRepository;
use crate::error::{BillingError, BillingResult};

/// Current plan of a signed-in user; `free` when no row exists
pub struct GetPlanUseCase<R>
where
    R: PlanRepository + Clone + Send + Sync + 'static,
{
    plans: Arc<R>,
}

impl<R> GetPlanUseCase<R>
where
    R: PlanRepository + Clone + Send + Sync + 'static,
{
    pub fn new(plans: Arc<R>) -> Self {
        Self { plans }
    }

    pub async fn execute(&self, user: &AuthUser) -> BillingResult<Plan> {
        let email = plan_key(&user.email);
        if email.is_empty() {
            return Ok(Plan::Free);
        }

        Ok(self
            .plans
            .find_by_email(&email)
            .await?
            .map(|row| row.plan)
            .unwrap_or_default())
    }
}

pub struct SetPlanInput {
    pub email: String,
    pub plan: String,
    pub user_id: Option<String>,
}

/// Assign a plan by hand (support, comps, migrations)
pub struct SetPlanUseCase<R>
where
    R: PlanRepository + Clone + Send + Sync + 'static,
{
    plans: Arc<R>,
}

impl<R> SetPlanUseCase<R>
where
    R: PlanRepository + Clone + Send + Sync + 'static,
{
    pub fn new(plans: Arc<R>) -> Self {
        Self { plans }
    }

    pub async fn execute(&self, input: SetPlanInput) -> BillingResult<UserPlan> {
        let email =
            Email::new(&input.email).map_err(|e| BillingError::InvalidInput(e.message().to_string()))?;

        if input.plan.trim().is_empty() {
            return Err(BillingError::InvalidInput("Plan is required".to_string()));
        }
        let plan = Plan::parse(&input.plan);

        let user_id = match input.user_id.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<UserId>()
                    .map_err(|_| BillingError::InvalidInput("Invalid user id".to_string()))?,
            ),
        };

        let row = UserPlan::new(email.as_str(), plan).with_user_id(user_id);
        let stored = self.plans.upsert(&row).await?;

        tracing::info!(email = %stored.email, plan = %stored.plan, "Plan assigned");

        Ok(stored)
    }
}
