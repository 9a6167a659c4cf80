//! Billing Configuration

use kernel::environment::Environment;
use secrecy::SecretString;

use crate::domain::plan::Plan;

pub const STRIPE_API_BASE_URL: &str = "https://api.stripe.com";

/// Which Stripe key pair is in use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripeMode {
    Test,
    Live,
}

impl StripeMode {
    /// `STRIPE_MODE` wins when it names a mode; otherwise live in production
    /// and test everywhere else
    pub fn resolve(raw: Option<&str>, environment: Environment) -> Self {
        match raw.map(|r| r.trim().to_ascii_lowercase()).as_deref() {
            Some("live") => StripeMode::Live,
            Some("test") => StripeMode::Test,
            Some("") | None => Self::default_for(environment),
            Some(other) => {
                tracing::warn!(value = other, "Unrecognised STRIPE_MODE, using environment default");
                Self::default_for(environment)
            }
        }
    }

    fn default_for(environment: Environment) -> Self {
        if environment.is_production() {
            StripeMode::Live
        } else {
            StripeMode::Test
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, StripeMode::Live)
    }

    /// Pick the value belonging to this mode
    pub fn select<T>(&self, test: T, live: T) -> T {
        match self {
            StripeMode::Test => test,
            StripeMode::Live => live,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StripeMode::Test => "test",
            StripeMode::Live => "live",
        }
    }
}

#[derive(Debug, Clone)]
pub struct BillingConfig {
    pub mode: StripeMode,
    /// `sk_test_...` / `sk_live_...` for the selected mode
    pub secret_key: SecretString,
    /// `whsec_...` for the selected mode
    pub webhook_secret: SecretString,
    /// Price charged at checkout
    pub price_id: String,
    /// Public origin of this app, used for checkout return URLs
    pub app_base_url: String,
    /// Plan granted when a completed checkout carries no plan metadata
    pub default_paid_plan: Plan,
    pub api_base_url: String,
    /// Identity service-role key; guards manual plan assignment
    pub service_key: SecretString,
}

impl BillingConfig {
    pub fn new(
        mode: StripeMode,
        secret_key: SecretString,
        webhook_secret: SecretString,
        price_id: impl Into<String>,
        app_base_url: impl Into<String>,
        service_key: SecretString,
    ) -> Self {
        Self {
            mode,
            secret_key,
            webhook_secret,
            price_id: price_id.into(),
            app_base_url: app_base_url.into().trim_end_matches('/').to_string(),
            default_paid_plan: Plan::Founding,
            api_base_url: STRIPE_API_BASE_URL.to_string(),
            service_key,
        }
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Stripe substitutes the session id into `{CHECKOUT_SESSION_ID}`
    pub fn success_url(&self) -> String {
        format!(
            "{}/dashboard?checkout=success&session_id={{CHECKOUT_SESSION_ID}}",
            self.app_base_url
        )
    }

    pub fn cancel_url(&self) -> String {
        format!("{}/dashboard?checkout=cancelled", self.app_base_url)
    }
}
