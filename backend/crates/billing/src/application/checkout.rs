//! Create Checkout Use Case
//!
//! Starts a hosted Stripe Checkout for a signed-in user. The plan upgrade
//! itself only happens when the completion webhook arrives.

use std::sync::Arc;

use auth::models::AuthUser;

use crate::application::config::BillingConfig;
use crate::domain::plan::{Plan, plan_key};
use crate::domain::repository::{CheckoutRequest, CheckoutSession, PaymentGateway};
use crate::error::{BillingError, BillingResult};

pub struct CreateCheckoutUseCase<G>
where
    G: PaymentGateway + Clone + Send + Sync + 'static,
{
    payments: Arc<G>,
    config: Arc<BillingConfig>,
}

impl<G> CreateCheckoutUseCase<G>
where
    G: PaymentGateway + Clone + Send + Sync + 'static,
{
    pub fn new(payments: Arc<G>, config: Arc<BillingConfig>) -> Self {
        Self { payments, config }
    }

    /// `plan` falls back to the configured paid plan
    pub async fn execute(&self, user: &AuthUser, plan: Option<&str>) -> BillingResult<CheckoutSession> {
        let plan = match plan.map(str::trim).filter(|p| !p.is_empty()) {
            Some(raw) => Plan::parse(raw),
            None => self.config.default_paid_plan.clone(),
        };
        if !plan.is_paid() {
            return Err(BillingError::NotPurchasable(plan.to_string()));
        }

        let email = plan_key(&user.email);
        if email.is_empty() {
            return Err(BillingError::InvalidInput(
                "Your account has no email address".to_string(),
            ));
        }

        let request = CheckoutRequest {
            email,
            user_id: user.id,
            plan,
            price_id: self.config.price_id.clone(),
            success_url: self.config.success_url(),
            cancel_url: self.config.cancel_url(),
        };

        let session = self.payments.create_checkout_session(&request).await?;

        tracing::info!(
            user_id = %user.id,
            plan = %request.plan,
            session_id = %session.id,
            mode = self.config.mode.as_str(),
            "Checkout session created"
        );

        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::config::StripeMode;
    use crate::infra::memory::InMemoryPaymentGateway;
    use kernel::id::UserId;
    use secrecy::SecretString;

    fn config() -> Arc<BillingConfig> {
        Arc::new(BillingConfig::new(
            StripeMode::Test,
            SecretString::new("sk_test_1".to_string()),
            SecretString::new("whsec_1".to_string()),
            "price_123",
            "https://app.example.com",
            SecretString::new("service".to_string()),
        ))
    }

    fn user() -> AuthUser {
        AuthUser {
            id: UserId::new(),
            email: "Buyer@Example.com".to_string(),
            email_confirmed_at: None,
            user_metadata: serde_json::Value::Null,
        }
    }

    #[tokio::test]
    async fn test_checkout_request_contents() {
        let gateway = InMemoryPaymentGateway::new();
        let use_case = CreateCheckoutUseCase::new(Arc::new(gateway.clone()), config());
        let buyer = user();

        let session = use_case.execute(&buyer, Some("Beta")).await.unwrap();
        assert!(session.id.starts_with("cs_test_"));

        let request = gateway.last_request().await.unwrap();
        assert_eq!(request.email, "buyer@example.com");
        assert_eq!(request.user_id, buyer.id);
        assert_eq!(request.plan, Plan::Beta);
        assert_eq!(request.price_id, "price_123");
        assert!(request.success_url.contains("checkout=success"));
        assert!(request.cancel_url.ends_with("/dashboard?checkout=cancelled"));
    }

    #[tokio::test]
    async fn test_default_plan() {
        let gateway = InMemoryPaymentGateway::new();
        let use_case = CreateCheckoutUseCase::new(Arc::new(gateway.clone()), config());

        use_case.execute(&user(), None).await.unwrap();
        assert_eq!(gateway.last_request().await.unwrap().plan, Plan::Founding);
    }

    #[tokio::test]
    async fn test_unpaid_plans_cannot_be_bought() {
        let gateway = InMemoryPaymentGateway::new();
        let use_case = CreateCheckoutUseCase::new(Arc::new(gateway.clone()), config());

        for plan in ["free", "premium", "enterprise"] {
            let err = use_case.execute(&user(), Some(plan)).await.unwrap_err();
            assert!(matches!(err, BillingError::NotPurchasable(_)));
        }
        assert!(gateway.last_request().await.is_none());
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let gateway = InMemoryPaymentGateway::new();
        gateway.fail_next(400, "No such price").await;
        let use_case = CreateCheckoutUseCase::new(Arc::new(gateway), config());

        let err = use_case.execute(&user(), None).await.unwrap_err();
        assert!(matches!(err, BillingError::PaymentProvider { status: 400, .. }));
    }
}
