//! API DTOs (Data Transfer Objects)
//!
//! Form bodies posted by the HTML pages, and the JSON session status.

use serde::{Deserialize, Serialize};

// ============================================================================
// Forms
// ============================================================================

/// The captcha widget posts its token as `h-captcha-response`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub redirect: Option<String>,
    #[serde(alias = "h-captcha-response")]
    pub captcha_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignUpForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    pub full_name: Option<String>,
    #[serde(alias = "h-captcha-response")]
    pub captcha_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForgotPasswordForm {
    #[serde(default)]
    pub email: String,
    #[serde(alias = "h-captcha-response")]
    pub captcha_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResetPasswordForm {
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

/// Query of the link mailed by the identity provider
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfirmQuery {
    #[serde(default)]
    pub token_hash: String,
    #[serde(default, rename = "type")]
    pub otp_type: String,
    pub next: Option<String>,
}

// ============================================================================
// Session Status
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusResponse {
    pub authenticated: bool,
    pub email: Option<String>,
    /// Unix seconds
    pub expires_at: Option<i64>,
}
