//! HTTP Handlers
//!
//! Form posts answer with 303 redirects back to a page; failures travel in
//! the `error` query parameter as a user-facing message.

use axum::Json;
use axum::extract::{Form, Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Redirect, Response};
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::route_policy::{location_with_query, safe_redirect};
use crate::application::{
    RequestPasswordResetUseCase, SignInInput, SignInUseCase, SignOutUseCase, SignUpInput,
    SignUpUseCase, UpdatePasswordInput, UpdatePasswordUseCase, VerifyEmailUseCase,
};
use crate::domain::entity::registration::SignUpOutcome;
use crate::domain::repository::IdentityProvider;
use crate::error::AuthError;
use crate::presentation::dto::{
    ConfirmQuery, ForgotPasswordForm, LoginForm, ResetPasswordForm, SessionStatusResponse,
    SignUpForm,
};
use crate::presentation::middleware::{CurrentSession, with_cookies};
use crate::presentation::session_cookie::SessionCookieCodec;

pub const CONFIRM_EMAIL_MESSAGE: &str = "Check your email to confirm your account";
pub const RESET_SENT_MESSAGE: &str =
    "If an account exists for that email, you will receive a password reset link shortly";
pub const PASSWORD_UPDATED_MESSAGE: &str = "Your password has been updated";

/// Shared state for auth handlers and the route guard
#[derive(Clone)]
pub struct AuthAppState<I>
where
    I: IdentityProvider + Clone + Send + Sync + 'static,
{
    pub identity: Arc<I>,
    pub config: Arc<AuthConfig>,
}

impl<I> AuthAppState<I>
where
    I: IdentityProvider + Clone + Send + Sync + 'static,
{
    pub fn new(identity: Arc<I>, config: Arc<AuthConfig>) -> Self {
        Self { identity, config }
    }

    pub fn codec(&self) -> SessionCookieCodec {
        SessionCookieCodec::new(
            self.config.session_cookie_name.clone(),
            self.config.cookie.clone(),
        )
    }
}

fn form_error(path: &str, err: &AuthError, extra: &[(&str, &str)]) -> Response {
    err.log();
    let message = err.user_message();
    let mut params = vec![("error", message.as_str())];
    params.extend_from_slice(extra);
    Redirect::to(&location_with_query(path, &params)).into_response()
}

// ============================================================================
// Sign In
// ============================================================================

/// POST /auth/login
pub async fn login<I>(
    State(state): State<AuthAppState<I>>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Response
where
    I: IdentityProvider + Clone + Send + Sync + 'static,
{
    let redirect = form.redirect.as_deref().and_then(safe_redirect);

    let use_case = SignInUseCase::new(state.identity.clone(), state.config.clone());
    let input = SignInInput {
        email: form.email,
        password: form.password,
        captcha_token: form.captcha_token,
    };

    match use_case.execute(input).await {
        Ok(session) => {
            let target = state.config.route_policy.redirect_target(redirect.as_deref());
            let cookies = state.codec().write(&session, &headers);
            with_cookies(Redirect::to(&target).into_response(), cookies)
        }
        Err(e) => form_error(
            &state.config.route_policy.login_path,
            &e,
            &[("redirect", redirect.as_deref().unwrap_or(""))],
        ),
    }
}

// ============================================================================
// Sign Up
// ============================================================================

/// POST /auth/signup
pub async fn sign_up<I>(
    State(state): State<AuthAppState<I>>,
    headers: HeaderMap,
    Form(form): Form<SignUpForm>,
) -> Response
where
    I: IdentityProvider + Clone + Send + Sync + 'static,
{
    let use_case = SignUpUseCase::new(state.identity.clone(), state.config.clone());
    let input = SignUpInput {
        email: form.email,
        password: form.password,
        confirm_password: form.confirm_password,
        full_name: form.full_name,
        captcha_token: form.captcha_token,
    };

    match use_case.execute(input).await {
        Ok(SignUpOutcome::SessionCreated(session)) => {
            let cookies = state.codec().write(&session, &headers);
            with_cookies(
                Redirect::to(&state.config.route_policy.home_path).into_response(),
                cookies,
            )
        }
        Ok(SignUpOutcome::ConfirmationSent(_)) => Redirect::to(&location_with_query(
            &state.config.route_policy.login_path,
            &[("message", CONFIRM_EMAIL_MESSAGE)],
        ))
        .into_response(),
        Err(e) => form_error("/signup", &e, &[]),
    }
}

// ============================================================================
// Sign Out
// ============================================================================

/// POST /auth/logout
pub async fn logout<I>(
    State(state): State<AuthAppState<I>>,
    current: CurrentSession,
    headers: HeaderMap,
) -> Response
where
    I: IdentityProvider + Clone + Send + Sync + 'static,
{
    let codec = state.codec();
    let session = current.0.or_else(|| codec.read(&headers));

    if let Some(session) = session {
        // Ignore errors - the cookies go either way
        if let Err(e) = SignOutUseCase::new(state.identity.clone())
            .execute(&session.access_token)
            .await
        {
            tracing::warn!(error = %e, "Provider sign-out failed");
        }
    }

    with_cookies(Redirect::to("/").into_response(), codec.clear(&headers))
}

// ============================================================================
// Password Reset
// ============================================================================

/// POST /auth/forgot-password
pub async fn forgot_password<I>(
    State(state): State<AuthAppState<I>>,
    Form(form): Form<ForgotPasswordForm>,
) -> Response
where
    I: IdentityProvider + Clone + Send + Sync + 'static,
{
    let use_case = RequestPasswordResetUseCase::new(state.identity.clone(), state.config.clone());

    match use_case
        .execute(&form.email, form.captcha_token.as_deref())
        .await
    {
        Ok(()) => Redirect::to(&location_with_query(
            "/forgot-password",
            &[("message", RESET_SENT_MESSAGE)],
        ))
        .into_response(),
        Err(e) => form_error("/forgot-password", &e, &[]),
    }
}

/// POST /auth/reset-password
pub async fn reset_password<I>(
    State(state): State<AuthAppState<I>>,
    current: CurrentSession,
    Form(form): Form<ResetPasswordForm>,
) -> Response
where
    I: IdentityProvider + Clone + Send + Sync + 'static,
{
    let use_case = UpdatePasswordUseCase::new(state.identity.clone());
    let input = UpdatePasswordInput {
        password: form.password,
        confirm_password: form.confirm_password,
    };

    match use_case.execute(current.session(), input).await {
        Ok(_) => Redirect::to(&location_with_query(
            &state.config.route_policy.home_path,
            &[("message", PASSWORD_UPDATED_MESSAGE)],
        ))
        .into_response(),
        Err(e @ AuthError::Unauthenticated) => {
            form_error(&state.config.route_policy.login_path, &e, &[])
        }
        Err(e) if e.is_session_dead() => form_error(&state.config.route_policy.login_path, &e, &[]),
        Err(e) => form_error("/reset-password", &e, &[]),
    }
}

// ============================================================================
// Email Links
// ============================================================================

/// GET /auth/confirm
pub async fn confirm<I>(
    State(state): State<AuthAppState<I>>,
    headers: HeaderMap,
    Query(query): Query<ConfirmQuery>,
) -> Response
where
    I: IdentityProvider + Clone + Send + Sync + 'static,
{
    let use_case = VerifyEmailUseCase::new(state.identity.clone());

    match use_case.execute(&query.token_hash, &query.otp_type).await {
        Ok(session) => {
            let target = state
                .config
                .route_policy
                .redirect_target(query.next.as_deref());
            let cookies = state.codec().write(&session, &headers);
            with_cookies(Redirect::to(&target).into_response(), cookies)
        }
        Err(e) => form_error(&state.config.route_policy.login_path, &e, &[]),
    }
}

// ============================================================================
// Session Status
// ============================================================================

/// GET /auth/session
pub async fn session_status(current: CurrentSession) -> Json<SessionStatusResponse> {
    Json(match current.0 {
        Some(session) => SessionStatusResponse {
            authenticated: true,
            email: Some(session.user.email),
            expires_at: Some(session.expires_at),
        },
        None => SessionStatusResponse {
            authenticated: false,
            email: None,
            expires_at: None,
        },
    })
}
