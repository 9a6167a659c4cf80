//! Entity Module

pub mod profile;
pub mod registration;
pub mod session;
pub mod user;

pub use profile::UserProfile;
pub use registration::{OtpType, Registration, SignUpOutcome};
pub use session::Session;
pub use user::AuthUser;
