//! HTTP Handlers

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use auth::middleware::RequireUser;
use platform::crypto::constant_time_eq;
use secrecy::ExposeSecret;
use std::sync::Arc;

use crate::application::{
    BillingConfig, CheckPaidUseCase, CreateCheckoutUseCase, GetPlanUseCase, HandleWebhookUseCase,
    SetPlanInput, SetPlanUseCase,
};
use crate::domain::repository::{PaymentGateway, PlanRepository};
use crate::error::{BillingError, BillingResult};
use crate::presentation::dto::{
    CheckPaidRequest, CheckoutBody, CheckoutResponse, PlanResponse, SetPlanRequest, WebhookAck,
    WebhookErrorResponse,
};

pub const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

/// Shared state for billing handlers
#[derive(Clone)]
pub struct BillingAppState<R, G>
where
    R: PlanRepository + Clone + Send + Sync + 'static,
    G: PaymentGateway + Clone + Send + Sync + 'static,
{
    pub plans: Arc<R>,
    pub payments: Arc<G>,
    pub config: Arc<BillingConfig>,
}

impl<R, G> BillingAppState<R, G>
where
    R: PlanRepository + Clone + Send + Sync + 'static,
    G: PaymentGateway + Clone + Send + Sync + 'static,
{
    pub fn new(plans: Arc<R>, payments: Arc<G>, config: Arc<BillingConfig>) -> Self {
        Self {
            plans,
            payments,
            config,
        }
    }
}

/// `Authorization: Bearer <service key>`, compared in constant time
fn require_service_key(headers: &HeaderMap, config: &BillingConfig) -> BillingResult<()> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(BillingError::Unauthenticated)?;

    let expected = config.service_key.expose_secret();
    if expected.is_empty() || !constant_time_eq(token.as_bytes(), expected.as_bytes()) {
        return Err(BillingError::Forbidden);
    }
    Ok(())
}

// ============================================================================
// Plans
// ============================================================================

/// POST /api/check-paid
pub async fn check_paid<R, G>(
    State(state): State<BillingAppState<R, G>>,
    Json(req): Json<CheckPaidRequest>,
) -> BillingResult<Json<PlanResponse>>
where
    R: PlanRepository + Clone + Send + Sync + 'static,
    G: PaymentGateway + Clone + Send + Sync + 'static,
{
    let status = CheckPaidUseCase::new(state.plans.clone())
        .execute(&req.email)
        .await?;
    Ok(Json(status.into()))
}

/// GET /api/plan
pub async fn get_plan<R, G>(
    State(state): State<BillingAppState<R, G>>,
    RequireUser(session): RequireUser,
) -> BillingResult<Json<PlanResponse>>
where
    R: PlanRepository + Clone + Send + Sync + 'static,
    G: PaymentGateway + Clone + Send + Sync + 'static,
{
    let plan = GetPlanUseCase::new(state.plans.clone())
        .execute(&session.user)
        .await?;
    Ok(Json(plan.into()))
}

/// POST /api/plan (service key only)
pub async fn set_plan<R, G>(
    State(state): State<BillingAppState<R, G>>,
    headers: HeaderMap,
    Json(req): Json<SetPlanRequest>,
) -> BillingResult<Json<PlanResponse>>
where
    R: PlanRepository + Clone + Send + Sync + 'static,
    G: PaymentGateway + Clone + Send + Sync + 'static,
{
    require_service_key(&headers, &state.config)?;

    let stored = SetPlanUseCase::new(state.plans.clone())
        .execute(SetPlanInput {
            email: req.email,
            plan: req.plan,
            user_id: req.user_id,
        })
        .await?;
    Ok(Json(stored.plan.into()))
}

// ============================================================================
// Checkout
// ============================================================================

/// POST /api/checkout
pub async fn checkout<R, G>(
    State(state): State<BillingAppState<R, G>>,
    RequireUser(session): RequireUser,
    body: Bytes,
) -> BillingResult<Json<CheckoutResponse>>
where
    R: PlanRepository + Clone + Send + Sync + 'static,
    G: PaymentGateway + Clone + Send + Sync + 'static,
{
    let body: CheckoutBody = if body.iter().all(u8::is_ascii_whitespace) {
        CheckoutBody::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|_| BillingError::InvalidInput("Invalid request body".to_string()))?
    };

    let session = CreateCheckoutUseCase::new(state.payments.clone(), state.config.clone())
        .execute(&session.user, body.plan.as_deref())
        .await?;
    Ok(Json(session.into()))
}

// ============================================================================
// Webhooks
// ============================================================================

/// POST /api/webhooks/stripe
pub async fn stripe_webhook<R, G>(
    State(state): State<BillingAppState<R, G>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    R: PlanRepository + Clone + Send + Sync + 'static,
    G: PaymentGateway + Clone + Send + Sync + 'static,
{
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let use_case = HandleWebhookUseCase::new(state.plans.clone(), state.config.clone());
    match use_case.execute(&body, signature).await {
        Ok(_) => Json(WebhookAck { received: true }).into_response(),
        Err(e) => {
            e.log();
            let status = match e.status_code() {
                s if s.is_client_error() => s,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, Json(WebhookErrorResponse { error: e.to_string() })).into_response()
        }
    }
}
