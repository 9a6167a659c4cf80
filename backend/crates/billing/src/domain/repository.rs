//! Ports
//!
//! Interfaces to the plan table and the payments provider.
//! Implementations live in the infrastructure layer.

use kernel::id::UserId;

use crate::domain::plan::{Plan, UserPlan};
use crate::error::BillingResult;

/// Plan repository trait
#[trait_variant::make(PlanRepository: Send)]
pub trait LocalPlanRepository {
    /// `email` is expected lowercased
    async fn find_by_email(&self, email: &str) -> BillingResult<Option<UserPlan>>;

    /// Insert or overwrite the row for `plan.email`
    async fn upsert(&self, plan: &UserPlan) -> BillingResult<UserPlan>;

    /// Insert only when no row exists; returns whatever row is stored afterwards
    async fn create_if_missing(&self, plan: &UserPlan) -> BillingResult<UserPlan>;
}

/// What the buyer is purchasing and where to send them afterwards
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRequest {
    pub email: String,
    pub user_id: UserId,
    pub plan: Plan,
    pub price_id: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// Hosted checkout page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    /// `cs_...`
    pub id: String,
    pub url: String,
}

/// Payments provider trait
#[trait_variant::make(PaymentGateway: Send)]
pub trait LocalPaymentGateway {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> BillingResult<CheckoutSession>;
}
