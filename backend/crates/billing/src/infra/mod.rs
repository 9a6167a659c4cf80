//! Infrastructure Layer
//!
//! Plan table and Stripe Checkout clients, plus in-memory implementations
//! of both ports for tests and local runs.

pub mod memory;
pub mod plans;
pub mod stripe;

pub use memory::{InMemoryPaymentGateway, InMemoryPlanRepository};
pub use plans::SupabasePlanRepository;
pub use stripe::StripeCheckoutClient;
