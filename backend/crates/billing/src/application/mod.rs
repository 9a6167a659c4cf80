//! Application Layer
//!
//! Use cases and application services.

pub mod check_paid;
pub mod checkout;
pub mod config;
pub mod plan;
pub mod webhook;

// Re-exports
pub use check_paid::{CheckPaidUseCase, PlanStatus};
pub use checkout::CreateCheckoutUseCase;
pub use config::{BillingConfig, StripeMode};
pub use plan::{GetPlanUseCase, SetPlanInput, SetPlanUseCase};
pub use webhook::{HandleWebhookUseCase, WebhookOutcome};
