//! Domain Layer
//!
//! Contains entities, value objects, identity error classification and the
//! ports implemented by the infrastructure layer.

pub mod entity;
pub mod identity_error;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{profile::UserProfile, session::Session, user::AuthUser};
pub use identity_error::IdentityErrorKind;
pub use repository::{IdentityProvider, ProfileRepository};
