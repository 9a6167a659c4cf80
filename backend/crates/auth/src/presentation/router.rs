//! Auth Router

use axum::{
    Router,
    routing::{get, post},
};

use crate::domain::repository::IdentityProvider;
use crate::presentation::handlers::{self, AuthAppState};

/// Routes mounted under `/auth`. The route guard must wrap the app for
/// `CurrentSession` to be populated.
pub fn auth_router<I>(state: AuthAppState<I>) -> Router
where
    I: IdentityProvider + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/login", post(handlers::login::<I>))
        .route("/signup", post(handlers::sign_up::<I>))
        .route("/logout", post(handlers::logout::<I>))
        .route("/forgot-password", post(handlers::forgot_password::<I>))
        .route("/reset-password", post(handlers::reset_password::<I>))
        .route("/confirm", get(handlers::confirm::<I>))
        .route("/session", get(handlers::session_status))
        .with_state(state)
}
