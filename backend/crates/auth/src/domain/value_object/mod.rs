//! Value Object Module

pub mod email;
pub mod password;
pub mod user_id;

pub use email::Email;
pub use password::NewPassword;
pub use user_id::UserId;
