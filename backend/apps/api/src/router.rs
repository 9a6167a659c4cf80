//! Router composition
//!
//! Pages at the root, auth forms under `/auth`, JSON under `/api`. The route
//! guard wraps everything so every handler sees the resolved session.

use auth::auth_router;
use auth::domain::{IdentityProvider, ProfileRepository};
use auth::middleware::route_guard;
use axum::http::{HeaderValue, Method, header};
use axum::routing::get;
use axum::{Router, middleware};
use billing::billing_router;
use billing::domain::{PaymentGateway, PlanRepository};
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::account::account_router;
use crate::diagnostics::diagnostics_router;
use crate::pages::{self, pages_router};
use crate::state::AppState;

/// GET /healthz
pub async fn healthz() -> &'static str {
    "ok"
}

pub fn build_router<I, P, R, G>(state: AppState<I, P, R, G>) -> Router
where
    I: IdentityProvider + Clone + Send + Sync + 'static,
    P: ProfileRepository + Clone + Send + Sync + 'static,
    R: PlanRepository + Clone + Send + Sync + 'static,
    G: PaymentGateway + Clone + Send + Sync + 'static,
{
    let api = billing_router(state.billing_state())
        .merge(account_router(state.account_state()))
        .merge(diagnostics_router(state.diagnostics_state()));

    let app = Router::new()
        .merge(pages_router(state.pages_state()))
        .nest("/auth", auth_router(state.auth_state()))
        .nest("/api", api)
        .route("/healthz", get(healthz))
        .fallback(pages::not_found)
        .layer(middleware::from_fn_with_state(
            state.auth_state(),
            route_guard::<I>,
        ))
        .layer(TraceLayer::new_for_http());

    match cors_layer(&state.config.frontend_origins) {
        Some(cors) => app.layer(cors),
        None => app,
    }
}

/// Cross-origin access for the extension; `None` when no origin is configured
fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    if allowed.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(allowed)
            .allow_methods(AllowMethods::list([
                Method::GET,
                Method::POST,
                Method::OPTIONS,
            ]))
            .allow_headers(AllowHeaders::list([
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                header::ACCEPT,
            ]))
            .allow_credentials(true),
    )
}
