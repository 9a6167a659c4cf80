//! Stripe Checkout client
//!
//! Form-encoded `POST /v1/checkout/sessions` authenticated with the secret
//! key as the basic-auth user.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::application::config::BillingConfig;
use crate::domain::repository::{CheckoutRequest, CheckoutSession, PaymentGateway};
use crate::error::{BillingError, BillingResult};

#[derive(Debug, Deserialize)]
struct CheckoutSessionResponse {
    id: String,
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StripeErrorBody {
    error: Option<StripeErrorDetail>,
}

#[derive(Debug, Default, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

#[derive(Clone)]
pub struct StripeCheckoutClient {
    http: reqwest::Client,
    api_base_url: String,
    secret_key: SecretString,
}

impl StripeCheckoutClient {
    pub fn new(http: reqwest::Client, config: &BillingConfig) -> Self {
        Self {
            http,
            api_base_url: config.api_base_url.clone(),
            secret_key: config.secret_key.clone(),
        }
    }

    fn form_params(request: &CheckoutRequest) -> Vec<(&'static str, String)> {
        let user_id = request.user_id.to_string();
        vec![
            ("mode", "payment".to_string()),
            ("line_items[0][price]", request.price_id.clone()),
            ("line_items[0][quantity]", "1".to_string()),
            ("customer_email", request.email.clone()),
            ("client_reference_id", user_id.clone()),
            ("metadata[user_id]", user_id),
            ("metadata[plan]", request.plan.as_str().to_string()),
            ("success_url", request.success_url.clone()),
            ("cancel_url", request.cancel_url.clone()),
        ]
    }

    async fn error_from(response: reqwest::Response) -> BillingError {
        let status = response.status().as_u16();
        let body: StripeErrorBody = response.json().await.unwrap_or_default();
        let detail = body.error.unwrap_or_default();
        let message = match (detail.error_type, detail.message) {
            (Some(kind), Some(msg)) => format!("{kind}: {msg}"),
            (None, Some(msg)) => msg,
            (Some(kind), None) => kind,
            (None, None) => "unknown error".to_string(),
        };
        BillingError::PaymentProvider { status, message }
    }
}

impl PaymentGateway for StripeCheckoutClient {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> BillingResult<CheckoutSession> {
        let response = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.api_base_url))
            .basic_auth(self.secret_key.expose_secret(), Option::<&str>::None)
            .form(&Self::form_params(request))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let session: CheckoutSessionResponse = response.json().await?;
        let url = session.url.ok_or_else(|| BillingError::PaymentProvider {
            status: 200,
            message: format!("checkout session {} has no url", session.id),
        })?;

        Ok(CheckoutSession {
            id: session.id,
            url,
        })
    }
}

impl std::fmt::Debug for StripeCheckoutClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeCheckoutClient")
            .field("api_base_url", &self.api_base_url)
            .finish_non_exhaustive()
    }
}
