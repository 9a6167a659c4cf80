//! Application Layer
//!
//! Use cases and application services.

pub mod config;
pub mod confirm;
pub mod ensure_session;
pub mod password_reset;
pub mod route_policy;
pub mod sign_in;
pub mod sign_out;
pub mod sign_up;

// Re-exports
pub use config::AuthConfig;
pub use confirm::VerifyEmailUseCase;
pub use ensure_session::{EnsureSessionUseCase, SessionState};
pub use password_reset::{RequestPasswordResetUseCase, UpdatePasswordInput, UpdatePasswordUseCase};
pub use route_policy::{GuardDecision, RoutePolicy, safe_redirect};
pub use sign_in::{SignInInput, SignInUseCase};
pub use sign_out::SignOutUseCase;
pub use sign_up::{SignUpInput, SignUpUseCase};
