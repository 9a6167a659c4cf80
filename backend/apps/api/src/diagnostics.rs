//! Diagnostics endpoints
//!
//! Report configuration presence and the resolved session. Values are never
//! echoed, only whether they are set. Both endpoints answer 404 in
//! production.

use std::collections::BTreeMap;
use std::sync::Arc;

use auth::AuthConfig;
use auth::middleware::CurrentSession;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use kernel::error::app_error::{AppError, AppResult};
use serde::Serialize;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct DiagnosticsState {
    pub config: Arc<AppConfig>,
    pub auth_config: Arc<AuthConfig>,
}

impl DiagnosticsState {
    fn ensure_enabled(&self) -> AppResult<()> {
        if self.config.environment.is_production() {
            return Err(AppError::not_found("Not found"));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvReport {
    pub environment: &'static str,
    pub stripe_mode: &'static str,
    pub variables: BTreeMap<&'static str, bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatusReport {
    pub authenticated: bool,
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub email_confirmed: Option<bool>,
    pub expires_at: Option<i64>,
    pub expires_in: Option<i64>,
    pub cookie_name: String,
    pub auto_refresh: bool,
}

/// GET /api/debug/env
pub async fn env_report(State(state): State<DiagnosticsState>) -> AppResult<Json<EnvReport>> {
    state.ensure_enabled()?;

    Ok(Json(EnvReport {
        environment: state.config.environment.as_str(),
        stripe_mode: state.config.stripe.mode.as_str(),
        variables: state.config.configured.iter().copied().collect(),
    }))
}

/// GET /api/debug/auth-status
pub async fn auth_status(
    State(state): State<DiagnosticsState>,
    current: CurrentSession,
) -> AppResult<Json<AuthStatusReport>> {
    state.ensure_enabled()?;

    let session = current.session();
    Ok(Json(AuthStatusReport {
        authenticated: session.is_some(),
        user_id: session.map(|s| s.user.id.to_string()),
        email: session.map(|s| s.user.email.clone()),
        email_confirmed: session.map(|s| s.user.is_confirmed()),
        expires_at: session.map(|s| s.expires_at),
        expires_in: session.map(|s| s.expires_in(Utc::now().timestamp())),
        cookie_name: state.auth_config.session_cookie_name.clone(),
        auto_refresh: state.auth_config.auto_refresh,
    }))
}

/// Routes mounted under `/api`
pub fn diagnostics_router(state: DiagnosticsState) -> Router {
    Router::new()
        .route("/debug/env", get(env_report))
        .route("/debug/auth-status", get(auth_status))
        .with_state(state)
}
