//! Plan repository backed by the `user_plan` table over PostgREST

use platform::postgrest::{OnConflict, PostgrestClient};

use crate::domain::plan::UserPlan;
use crate::domain::repository::PlanRepository;
use crate::error::{BillingError, BillingResult};

const TABLE: &str = "user_plan";
const CONFLICT_KEY: &str = "email";

#[derive(Debug, Clone)]
pub struct SupabasePlanRepository {
    client: PostgrestClient,
}

impl SupabasePlanRepository {
    pub fn new(client: PostgrestClient) -> Self {
        Self { client }
    }
}

impl PlanRepository for SupabasePlanRepository {
    async fn find_by_email(&self, email: &str) -> BillingResult<Option<UserPlan>> {
        Ok(self.client.select_one(TABLE, &[("email", email)]).await?)
    }

    async fn upsert(&self, plan: &UserPlan) -> BillingResult<UserPlan> {
        self.client
            .upsert(TABLE, CONFLICT_KEY, OnConflict::Merge, plan)
            .await?
            .ok_or_else(|| BillingError::Internal("plan upsert returned no row".to_string()))
    }

    async fn create_if_missing(&self, plan: &UserPlan) -> BillingResult<UserPlan> {
        if let Some(created) = self
            .client
            .upsert(TABLE, CONFLICT_KEY, OnConflict::Ignore, plan)
            .await?
        {
            return Ok(created);
        }

        self.find_by_email(&plan.email)
            .await?
            .ok_or_else(|| BillingError::Internal("plan row vanished after insert".to_string()))
    }
}
