//! Sign-up and email verification types

use serde::{Deserialize, Serialize};

use crate::domain::entity::{session::Session, user::AuthUser};
use crate::domain::value_object::{email::Email, password::NewPassword};

/// Everything the identity provider needs to create an account
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: Email,
    pub password: NewPassword,
    pub full_name: Option<String>,
    pub captcha_token: Option<String>,
    /// Link target embedded in the confirmation email
    pub email_redirect_to: String,
}

/// Providers with auto-confirm enabled return a session immediately
#[derive(Debug, Clone)]
pub enum SignUpOutcome {
    SessionCreated(Session),
    ConfirmationSent(AuthUser),
}

/// Token types accepted by the provider's verify endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpType {
    Signup,
    Invite,
    Magiclink,
    Recovery,
    EmailChange,
    Email,
}

impl OtpType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "signup" => Some(OtpType::Signup),
            "invite" => Some(OtpType::Invite),
            "magiclink" => Some(OtpType::Magiclink),
            "recovery" => Some(OtpType::Recovery),
            "email_change" => Some(OtpType::EmailChange),
            "email" => Some(OtpType::Email),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OtpType::Signup => "signup",
            OtpType::Invite => "invite",
            OtpType::Magiclink => "magiclink",
            OtpType::Recovery => "recovery",
            OtpType::EmailChange => "email_change",
            OtpType::Email => "email",
        }
    }
}
