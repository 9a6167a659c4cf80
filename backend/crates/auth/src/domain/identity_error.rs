//! Identity provider error classification
//!
//! The provider reports failures as free text (plus an `error_code` on newer
//! versions). Forms need a short, stable message, so both are folded into a
//! small set of kinds.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityErrorKind {
    InvalidCredentials,
    EmailNotConfirmed,
    RateLimited,
    TokenExpired,
    UserExists,
    WeakPassword,
    CaptchaFailed,
    SamePassword,
    Unknown,
}

/// Checked in order; the first hit wins
const MESSAGE_PATTERNS: &[(&str, IdentityErrorKind)] = &[
    ("invalid login credentials", IdentityErrorKind::InvalidCredentials),
    ("email not confirmed", IdentityErrorKind::EmailNotConfirmed),
    ("rate limit", IdentityErrorKind::RateLimited),
    ("too many requests", IdentityErrorKind::RateLimited),
    ("for security purposes", IdentityErrorKind::RateLimited),
    ("should be different", IdentityErrorKind::SamePassword),
    ("already registered", IdentityErrorKind::UserExists),
    ("already exists", IdentityErrorKind::UserExists),
    ("password should be", IdentityErrorKind::WeakPassword),
    ("captcha", IdentityErrorKind::CaptchaFailed),
    ("invalid refresh token", IdentityErrorKind::TokenExpired),
    ("refresh token not found", IdentityErrorKind::TokenExpired),
    ("invalid jwt", IdentityErrorKind::TokenExpired),
    ("expired", IdentityErrorKind::TokenExpired),
];

impl IdentityErrorKind {
    /// Classify a provider message by case-insensitive substring
    pub fn classify(message: &str) -> Self {
        let message = message.to_lowercase();
        MESSAGE_PATTERNS
            .iter()
            .find(|(pattern, _)| message.contains(pattern))
            .map(|(_, kind)| *kind)
            .unwrap_or(IdentityErrorKind::Unknown)
    }

    /// Classify a machine-readable `error_code`
    pub fn from_code(code: &str) -> Option<Self> {
        let kind = match code {
            "invalid_credentials" => IdentityErrorKind::InvalidCredentials,
            "email_not_confirmed" => IdentityErrorKind::EmailNotConfirmed,
            "over_request_rate_limit" | "over_email_send_rate_limit" => {
                IdentityErrorKind::RateLimited
            }
            "bad_jwt" | "session_not_found" | "session_expired" | "refresh_token_not_found"
            | "refresh_token_already_used" | "otp_expired" => IdentityErrorKind::TokenExpired,
            "user_already_exists" | "email_exists" => IdentityErrorKind::UserExists,
            "weak_password" => IdentityErrorKind::WeakPassword,
            "captcha_failed" => IdentityErrorKind::CaptchaFailed,
            "same_password" => IdentityErrorKind::SamePassword,
            _ => return None,
        };
        Some(kind)
    }

    /// Prefer the error code; fall back to the message text
    pub fn from_response(code: Option<&str>, message: &str) -> Self {
        code.and_then(Self::from_code)
            .unwrap_or_else(|| Self::classify(message))
    }

    /// Text safe to show on a form
    pub fn user_message(&self) -> &'static str {
        match self {
            IdentityErrorKind::InvalidCredentials => "Invalid email or password",
            IdentityErrorKind::EmailNotConfirmed => {
                "Please confirm your email address before signing in"
            }
            IdentityErrorKind::RateLimited => {
                "Too many attempts. Please wait a moment and try again"
            }
            IdentityErrorKind::TokenExpired => "Your session has expired. Please sign in again",
            IdentityErrorKind::UserExists => "An account with this email already exists",
            IdentityErrorKind::WeakPassword => {
                "Password is too weak. Please choose a stronger password"
            }
            IdentityErrorKind::CaptchaFailed => "Captcha verification failed. Please try again",
            IdentityErrorKind::SamePassword => {
                "New password must be different from your current password"
            }
            IdentityErrorKind::Unknown => "Something went wrong. Please try again",
        }
    }
}

impl std::fmt::Display for IdentityErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.user_message())
    }
}
