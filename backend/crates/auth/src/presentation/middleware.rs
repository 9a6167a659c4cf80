//! Auth Middleware
//!
//! The route guard runs on every request: it resolves the session from
//! cookies, keeps the cookies in sync with any refresh, exposes the session
//! to handlers and applies the route policy.

use axum::body::Body;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, Request, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use chrono::Utc;
use platform::cookie::set_cookie_header;
use std::convert::Infallible;

use crate::application::{EnsureSessionUseCase, GuardDecision, SessionState};
use crate::domain::entity::session::Session;
use crate::domain::repository::IdentityProvider;
use crate::error::AuthError;
use crate::presentation::handlers::AuthAppState;

/// Session resolved by the route guard; `None` for anonymous requests
#[derive(Debug, Clone, Default)]
pub struct CurrentSession(pub Option<Session>);

impl CurrentSession {
    pub fn session(&self) -> Option<&Session> {
        self.0.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.0.is_some()
    }
}

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CurrentSession>()
            .cloned()
            .unwrap_or_default())
    }
}

/// Extractor for API routes that need a signed-in user; rejects with 401
#[derive(Debug, Clone)]
pub struct RequireUser(pub Session);

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentSession>()
            .and_then(|current| current.0.clone())
            .map(RequireUser)
            .ok_or(AuthError::Unauthenticated)
    }
}

/// Append Set-Cookie headers to a response
pub fn with_cookies(mut response: Response, cookies: Vec<String>) -> Response {
    for cookie in cookies {
        match set_cookie_header(&cookie) {
            Some(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            None => tracing::warn!("Dropping Set-Cookie with invalid header bytes"),
        }
    }
    response
}

/// Resolve the session for a request and the cookie changes that go with it
pub async fn resolve_session<I>(
    state: &AuthAppState<I>,
    headers: &HeaderMap,
) -> (Option<Session>, Vec<String>)
where
    I: IdentityProvider + Clone + Send + Sync + 'static,
{
    let codec = state.codec();
    let from_cookie = codec.read(headers);
    let undecodable = from_cookie.is_none() && codec.has_cookies(headers);

    let use_case = EnsureSessionUseCase::new(state.identity.clone(), state.config.clone());
    let outcome = use_case.execute(from_cookie, Utc::now().timestamp()).await;

    let cookies = match &outcome {
        SessionState::Authenticated {
            session,
            refreshed: true,
        } => codec.write(session, headers),
        SessionState::Anonymous {
            clear_cookies: true,
        } => codec.clear(headers),
        SessionState::Anonymous { .. } if undecodable => codec.clear(headers),
        _ => Vec::new(),
    };

    (outcome.into_session(), cookies)
}

/// Middleware applied to the whole app via `from_fn_with_state`
pub async fn route_guard<I>(
    State(state): State<AuthAppState<I>>,
    mut req: Request<Body>,
    next: Next,
) -> Response
where
    I: IdentityProvider + Clone + Send + Sync + 'static,
{
    let (session, cookies) = resolve_session(&state, req.headers()).await;

    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let decision = state
        .config
        .route_policy
        .decide(&path_and_query, session.is_some());

    let response = match decision {
        GuardDecision::Allow => {
            req.extensions_mut().insert(CurrentSession(session));
            next.run(req).await
        }
        GuardDecision::RedirectToLogin { location } => {
            tracing::debug!(path = %req.uri().path(), "Anonymous request for protected page");
            Redirect::temporary(&location).into_response()
        }
        GuardDecision::Redirect { location } => Redirect::temporary(&location).into_response(),
    };

    with_cookies(response, cookies)
}
