//! Handle Webhook Use Case
//!
//! Verifies a Stripe delivery and applies it. A verified delivery is
//! acknowledged even when storing the plan fails; the failure is logged.

use std::sync::Arc;

use kernel::id::UserId;

use crate::application::config::BillingConfig;
use crate::domain::plan::{Plan, UserPlan};
use crate::domain::repository::PlanRepository;
use crate::domain::stripe_event::{
    CheckoutSessionObject, PaymentIntentObject, StripeEvent, StripeEventType,
};
use crate::domain::webhook_verifier::{WebhookError, WebhookVerifier};
use crate::error::{BillingError, BillingResult};

#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    /// `checkout.session.completed` stored a plan row
    PlanUpdated(UserPlan),
    /// Verified, but the plan row could not be written
    StoreFailed,
    /// Payment-intent events are only logged
    Logged(StripeEventType),
    Ignored,
}

pub struct HandleWebhookUseCase<R>
where
    R: PlanRepository + Clone + Send + Sync + 'static,
{
    plans: Arc<R>,
    verifier: WebhookVerifier,
    config: Arc<BillingConfig>,
}

impl<R> HandleWebhookUseCase<R>
where
    R: PlanRepository + Clone + Send + Sync + 'static,
{
    pub fn new(plans: Arc<R>, config: Arc<BillingConfig>) -> Self {
        Self {
            plans,
            verifier: WebhookVerifier::new(config.webhook_secret.clone()),
            config,
        }
    }

    pub async fn execute(&self, payload: &[u8], signature: Option<&str>) -> BillingResult<WebhookOutcome> {
        let event = self.verifier.verify(payload, signature)?;
        self.apply(event).await
    }

    pub async fn execute_at(
        &self,
        payload: &[u8],
        signature: Option<&str>,
        now: i64,
    ) -> BillingResult<WebhookOutcome> {
        let event = self.verifier.verify_at(payload, signature, now)?;
        self.apply(event).await
    }

    async fn apply(&self, event: StripeEvent) -> BillingResult<WebhookOutcome> {
        if event.livemode != self.config.mode.is_live() {
            tracing::warn!(
                event_id = %event.id,
                livemode = event.livemode,
                mode = self.config.mode.as_str(),
                "Webhook livemode does not match configured Stripe mode"
            );
        }

        match event.parsed_type() {
            StripeEventType::CheckoutSessionCompleted => self.checkout_completed(&event).await,
            kind @ StripeEventType::PaymentIntentSucceeded => {
                let intent = Self::object::<PaymentIntentObject>(&event)?;
                tracing::info!(
                    event_id = %event.id,
                    payment_intent = %intent.id,
                    amount = ?intent.amount,
                    currency = ?intent.currency,
                    "Payment succeeded"
                );
                Ok(WebhookOutcome::Logged(kind))
            }
            kind @ StripeEventType::PaymentIntentFailed => {
                let intent = Self::object::<PaymentIntentObject>(&event)?;
                tracing::warn!(
                    event_id = %event.id,
                    payment_intent = %intent.id,
                    reason = intent.failure_message().unwrap_or("unknown"),
                    "Payment failed"
                );
                Ok(WebhookOutcome::Logged(kind))
            }
            StripeEventType::Unknown => {
                tracing::debug!(event_id = %event.id, event_type = %event.event_type, "Ignoring webhook event");
                Ok(WebhookOutcome::Ignored)
            }
        }
    }

    fn object<T: serde::de::DeserializeOwned>(event: &StripeEvent) -> BillingResult<T> {
        event
            .deserialize_object()
            .map_err(|e| WebhookError::InvalidPayload(e.to_string()).into())
    }

    async fn checkout_completed(&self, event: &StripeEvent) -> BillingResult<WebhookOutcome> {
        let session = Self::object::<CheckoutSessionObject>(event)?;

        let email = session.customer_email().ok_or_else(|| {
            BillingError::InvalidInput("Checkout session has no customer email".to_string())
        })?;

        let plan = session
            .metadata_value("plan")
            .map(Plan::parse)
            .unwrap_or_else(|| self.config.default_paid_plan.clone());

        let user_id = session
            .metadata_value("user_id")
            .or(session.client_reference_id.as_deref())
            .and_then(|raw| raw.parse::<UserId>().ok());

        let mut row = UserPlan::new(email, plan).with_user_id(user_id);
        row.stripe_customer_id = session.customer.clone();
        row.stripe_session_id = Some(session.id.clone());

        match self.plans.upsert(&row).await {
            Ok(stored) => {
                tracing::info!(
                    event_id = %event.id,
                    email = %stored.email,
                    plan = %stored.plan,
                    "Plan updated from checkout"
                );
                Ok(WebhookOutcome::PlanUpdated(stored))
            }
            Err(e) => {
                e.log();
                tracing::error!(event_id = %event.id, email = %row.email, "Failed to store plan from checkout");
                Ok(WebhookOutcome::StoreFailed)
            }
        }
    }
}
