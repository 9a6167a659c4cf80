//! In-memory plan repository and payment gateway
//!
//! The repository keeps one row per email like the real table; the gateway
//! records every checkout request and hands back `cs_test_` sessions.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use platform::postgrest::PostgrestError;
use tokio::sync::RwLock;

use crate::domain::plan::UserPlan;
use crate::domain::repository::{CheckoutRequest, CheckoutSession, PaymentGateway, PlanRepository};
use crate::error::{BillingError, BillingResult};

#[derive(Debug, Default)]
struct PlanState {
    /// Keyed by lowercased email
    rows: HashMap<String, UserPlan>,
    fail_writes: bool,
    reads: u32,
    writes: u32,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryPlanRepository {
    state: Arc<RwLock<PlanState>>,
}

impl InMemoryPlanRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a row without counting it as a write
    pub async fn insert(&self, row: UserPlan) {
        self.state.write().await.rows.insert(row.email.clone(), row);
    }

    pub async fn get(&self, email: &str) -> Option<UserPlan> {
        self.state.read().await.rows.get(email).cloned()
    }

    pub async fn count(&self) -> usize {
        self.state.read().await.rows.len()
    }

    /// Make every subsequent write fail like an unreachable table
    pub async fn fail_writes(&self, fail: bool) {
        self.state.write().await.fail_writes = fail;
    }

    pub async fn read_calls(&self) -> u32 {
        self.state.read().await.reads
    }

    pub async fn write_calls(&self) -> u32 {
        self.state.read().await.writes
    }
}

impl PlanState {
    fn enter_write(&mut self) -> BillingResult<()> {
        self.writes += 1;
        if self.fail_writes {
            return Err(BillingError::Storage(PostgrestError::Status {
                status: 503,
                message: "storage unavailable".to_string(),
            }));
        }
        Ok(())
    }
}

impl PlanRepository for InMemoryPlanRepository {
    async fn find_by_email(&self, email: &str) -> BillingResult<Option<UserPlan>> {
        let mut state = self.state.write().await;
        state.reads += 1;
        Ok(state.rows.get(email).cloned())
    }

    async fn upsert(&self, plan: &UserPlan) -> BillingResult<UserPlan> {
        let mut state = self.state.write().await;
        state.enter_write()?;

        let now = Utc::now();
        let stored = state
            .rows
            .entry(plan.email.clone())
            .and_modify(|row| {
                row.plan = plan.plan.clone();
                if plan.user_id.is_some() {
                    row.user_id = plan.user_id;
                }
                if plan.stripe_customer_id.is_some() {
                    row.stripe_customer_id = plan.stripe_customer_id.clone();
                }
                if plan.stripe_session_id.is_some() {
                    row.stripe_session_id = plan.stripe_session_id.clone();
                }
                row.updated_at = Some(now);
            })
            .or_insert_with(|| UserPlan {
                updated_at: Some(now),
                ..plan.clone()
            });
        Ok(stored.clone())
    }

    async fn create_if_missing(&self, plan: &UserPlan) -> BillingResult<UserPlan> {
        let mut state = self.state.write().await;
        state.enter_write()?;

        let stored = state
            .rows
            .entry(plan.email.clone())
            .or_insert_with(|| plan.clone());
        Ok(stored.clone())
    }
}

#[derive(Debug, Default)]
struct GatewayState {
    requests: Vec<CheckoutRequest>,
    failure: Option<(u16, String)>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<RwLock<GatewayState>>,
}

impl InMemoryPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next checkout with a Stripe-style error
    pub async fn fail_next(&self, status: u16, message: &str) {
        self.state.write().await.failure = Some((status, message.to_string()));
    }

    pub async fn requests(&self) -> Vec<CheckoutRequest> {
        self.state.read().await.requests.clone()
    }

    pub async fn last_request(&self) -> Option<CheckoutRequest> {
        self.state.read().await.requests.last().cloned()
    }
}

impl PaymentGateway for InMemoryPaymentGateway {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> BillingResult<CheckoutSession> {
        let mut state = self.state.write().await;
        if let Some((status, message)) = state.failure.take() {
            return Err(BillingError::PaymentProvider { status, message });
        }

        state.requests.push(request.clone());
        let id = format!("cs_test_{}", state.requests.len());
        Ok(CheckoutSession {
            url: format!("https://checkout.stripe.com/c/pay/{}", id),
            id,
        })
    }
}
