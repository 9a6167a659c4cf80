//! Domain Layer
//!
//! Plans, the Stripe event model, webhook verification and ports.

pub mod plan;
pub mod repository;
pub mod stripe_event;
pub mod webhook_verifier;

// Re-exports
pub use plan::{Plan, UserPlan};
pub use repository::{CheckoutRequest, CheckoutSession, PaymentGateway, PlanRepository};
pub use stripe_event::{StripeEvent, StripeEventType};
pub use webhook_verifier::{WebhookError, WebhookVerifier};
