//! HTML pages
//!
//! Server-rendered forms and account pages. Access control happens in the
//! route guard; handlers here only read the session it resolved.

pub mod html;
pub mod views;

use std::sync::Arc;

use auth::domain::ProfileRepository;
use auth::middleware::CurrentSession;
use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use billing::application::GetPlanUseCase;
use billing::domain::PlanRepository;

use crate::account::ensure_provisioned;
use crate::config::AppConfig;
use views::{DashboardView, PageQuery};

#[derive(Clone)]
pub struct PagesState<P, R>
where
    P: ProfileRepository + Clone + Send + Sync + 'static,
    R: PlanRepository + Clone + Send + Sync + 'static,
{
    pub profiles: Arc<P>,
    pub plans: Arc<R>,
    pub config: Arc<AppConfig>,
}

impl<P, R> PagesState<P, R>
where
    P: ProfileRepository + Clone + Send + Sync + 'static,
    R: PlanRepository + Clone + Send + Sync + 'static,
{
    fn site_key(&self) -> Option<&str> {
        self.config.hcaptcha_site_key.as_deref()
    }
}

/// Protected pages reached without the guard in front fall back to login
fn login_redirect() -> Response {
    Redirect::temporary("/login").into_response()
}

pub async fn landing(current: CurrentSession) -> Html<String> {
    Html(views::landing(current.is_authenticated()))
}

pub async fn login<P, R>(
    State(state): State<PagesState<P, R>>,
    Query(query): Query<PageQuery>,
) -> Html<String>
where
    P: ProfileRepository + Clone + Send + Sync + 'static,
    R: PlanRepository + Clone + Send + Sync + 'static,
{
    Html(views::login(&query, state.site_key()))
}

pub async fn signup<P, R>(
    State(state): State<PagesState<P, R>>,
    Query(query): Query<PageQuery>,
) -> Html<String>
where
    P: ProfileRepository + Clone + Send + Sync + 'static,
    R: PlanRepository + Clone + Send + Sync + 'static,
{
    Html(views::signup(&query, state.site_key()))
}

pub async fn forgot_password<P, R>(
    State(state): State<PagesState<P, R>>,
    Query(query): Query<PageQuery>,
) -> Html<String>
where
    P: ProfileRepository + Clone + Send + Sync + 'static,
    R: PlanRepository + Clone + Send + Sync + 'static,
{
    Html(views::forgot_password(&query, state.site_key()))
}

pub async fn reset_password(current: CurrentSession, Query(query): Query<PageQuery>) -> Html<String> {
    Html(views::reset_password(&query, current.is_authenticated()))
}

pub async fn dashboard<P, R>(
    State(state): State<PagesState<P, R>>,
    current: CurrentSession,
    Query(query): Query<PageQuery>,
) -> Response
where
    P: ProfileRepository + Clone + Send + Sync + 'static,
    R: PlanRepository + Clone + Send + Sync + 'static,
{
    let Some(session) = current.0 else {
        return login_redirect();
    };

    if let Err(e) =
        ensure_provisioned(state.profiles.as_ref(), state.plans.as_ref(), &session.user).await
    {
        tracing::warn!(error = %e, "Account provisioning failed");
    }

    let plan = match GetPlanUseCase::new(state.plans.clone())
        .execute(&session.user)
        .await
    {
        Ok(plan) => Some(plan),
        Err(e) => {
            e.log();
            None
        }
    };

    Html(views::dashboard(&DashboardView {
        email: &session.user.email,
        plan: plan.as_ref(),
        query: &query,
    }))
    .into_response()
}

pub async fn profile<P, R>(State(state): State<PagesState<P, R>>, current: CurrentSession) -> Response
where
    P: ProfileRepository + Clone + Send + Sync + 'static,
    R: PlanRepository + Clone + Send + Sync + 'static,
{
    let Some(session) = current.0 else {
        return login_redirect();
    };
    let user = &session.user;

    let stored = match state.profiles.find_by_id(&user.id).await {
        Ok(stored) => stored,
        Err(e) => {
            e.log();
            None
        }
    };
    let full_name = stored
        .as_ref()
        .and_then(|p| p.full_name.as_deref())
        .or_else(|| user.full_name());
    let member_since = stored.as_ref().and_then(|p| p.created_at);

    Html(views::profile(&user.email, full_name, member_since)).into_response()
}

pub async fn settings(current: CurrentSession, Query(query): Query<PageQuery>) -> Response {
    match current.0 {
        Some(session) => Html(views::settings(&session.user.email, &query)).into_response(),
        None => login_redirect(),
    }
}

/// HTML 404 for every unmatched path
pub async fn not_found(current: CurrentSession) -> (StatusCode, Html<String>) {
    (
        StatusCode::NOT_FOUND,
        Html(views::not_found(current.is_authenticated())),
    )
}

pub fn pages_router<P, R>(state: PagesState<P, R>) -> Router
where
    P: ProfileRepository + Clone + Send + Sync + 'static,
    R: PlanRepository + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(landing))
        .route("/login", get(login::<P, R>))
        .route("/signup", get(signup::<P, R>))
        .route("/forgot-password", get(forgot_password::<P, R>))
        .route("/reset-password", get(reset_password))
        .route("/dashboard", get(dashboard::<P, R>))
        .route("/profile", get(profile::<P, R>))
        .route("/settings", get(settings))
        .with_state(state)
}
