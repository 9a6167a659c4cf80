//! Shared Kernel - Vocabulary shared by the identity and billing crates
//!
//! - Unified error type and HTTP-mapped error kinds
//! - Typed identifiers for provider-owned entities
//! - Deployment environment (development / test / production)
//!
//! Only things with the same meaning in every crate belong here.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod environment;
pub mod id;
