//! Auth (Identity) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Session and user model, identity error classification, ports
//! - `application/` - Route policy, session persistence and account use cases
//! - `infra/` - Identity provider (GoTrue) and profile table clients, in-memory fakes
//! - `presentation/` - Session cookie codec, route guard, handlers, router
//!
//! ## Security Model
//! - Password hashing, token issuance and email delivery belong to the
//!   identity provider; this crate sequences calls and translates errors
//! - Sessions live in HttpOnly cookies in the provider's SSR format
//! - Every request re-validates the access token with the provider
//! - Redirect targets are restricted to same-origin paths

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use infra::supabase::SupabaseAuthClient;
pub use presentation::router::auth_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
