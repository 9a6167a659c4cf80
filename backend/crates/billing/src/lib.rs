//! Billing Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Plans, Stripe event model, webhook signature verification, ports
//! - `application/` - Plan lookup and assignment, checkout, webhook handling
//! - `infra/` - PostgREST plan table, Stripe Checkout client, in-memory fakes
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! ## Security Model
//! - Payment details never touch this service; Stripe Checkout collects them
//! - Plan upgrades only arrive through signature-verified webhooks
//! - Assigning a plan by hand requires the identity service key
//! - Checking a plan never writes anything

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::{BillingConfig, StripeMode};
pub use error::{BillingError, BillingResult};
pub use presentation::router::billing_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod models {
    pub use crate::domain::plan::*;
    pub use crate::domain::stripe_event::*;
    pub use crate::presentation::dto::*;
}
