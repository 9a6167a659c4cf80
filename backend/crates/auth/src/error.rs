//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::postgrest::PostgrestError;
use thiserror::Error;

use crate::domain::identity_error::IdentityErrorKind;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

const GENERIC_MESSAGE: &str = "Something went wrong. Please try again";
const SIGN_IN_ACTION: &str = "Sign in and try again";

#[derive(Debug, Error)]
pub enum AuthError {
    /// Form or body failed local validation
    #[error("{0}")]
    InvalidInput(String),

    /// No usable session on a route that needs one
    #[error("Authentication required")]
    Unauthenticated,

    /// The identity provider answered with an error status
    #[error("identity provider returned {status}: {message}")]
    Provider {
        status: u16,
        kind: IdentityErrorKind,
        message: String,
    },

    /// The identity provider could not be reached or answered garbage
    #[error("identity provider unavailable: {0}")]
    Transport(#[from] reqwest::Error),

    /// Profile table access failed
    #[error("profile storage error: {0}")]
    Storage(#[from] PostgrestError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn provider(status: u16, code: Option<&str>, message: impl Into<String>) -> Self {
        let message = message.into();
        let kind = if status == 429 {
            IdentityErrorKind::RateLimited
        } else {
            IdentityErrorKind::from_response(code, &message)
        };
        AuthError::Provider {
            status,
            kind,
            message,
        }
    }

    /// Classification for provider errors; `None` for everything else
    pub fn identity_kind(&self) -> Option<IdentityErrorKind> {
        match self {
            AuthError::Provider { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Network failures and provider 5xx; worth another attempt
    pub fn is_transient(&self) -> bool {
        match self {
            AuthError::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            AuthError::Provider { status, .. } => *status >= 500,
            AuthError::Storage(e) => e.is_transient(),
            _ => false,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.identity_kind() == Some(IdentityErrorKind::RateLimited)
    }

    /// The session can never be used again (expired, revoked, malformed)
    pub fn is_session_dead(&self) -> bool {
        match self {
            AuthError::Provider { status, kind, .. } => {
                *kind == IdentityErrorKind::TokenExpired || matches!(status, 401 | 403)
            }
            _ => false,
        }
    }

    /// Message safe to show on a form
    pub fn user_message(&self) -> String {
        match self {
            AuthError::InvalidInput(msg) => msg.clone(),
            AuthError::Unauthenticated => IdentityErrorKind::TokenExpired.user_message().to_string(),
            AuthError::Provider { kind, .. } => kind.user_message().to_string(),
            _ => GENERIC_MESSAGE.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidInput(_) => ErrorKind::BadRequest,
            AuthError::Unauthenticated => ErrorKind::Unauthorized,
            AuthError::Provider { status, kind, .. } => match kind {
                IdentityErrorKind::InvalidCredentials | IdentityErrorKind::TokenExpired => {
                    ErrorKind::Unauthorized
                }
                IdentityErrorKind::EmailNotConfirmed => ErrorKind::Forbidden,
                IdentityErrorKind::RateLimited => ErrorKind::TooManyRequests,
                IdentityErrorKind::UserExists => ErrorKind::Conflict,
                IdentityErrorKind::WeakPassword | IdentityErrorKind::SamePassword => {
                    ErrorKind::UnprocessableEntity
                }
                IdentityErrorKind::CaptchaFailed => ErrorKind::BadRequest,
                IdentityErrorKind::Unknown if *status >= 500 => ErrorKind::BadGateway,
                IdentityErrorKind::Unknown => ErrorKind::BadRequest,
            },
            AuthError::Transport(e) if e.is_timeout() || e.is_connect() => {
                ErrorKind::ServiceUnavailable
            }
            AuthError::Transport(_) | AuthError::Storage(_) => ErrorKind::BadGateway,
            AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError; upstream detail stays in the logs
    pub fn to_app_error(&self) -> AppError {
        match self {
            AuthError::Unauthenticated => {
                AppError::unauthorized(self.user_message()).with_action(SIGN_IN_ACTION)
            }
            AuthError::InvalidInput(_) | AuthError::Provider { .. } => {
                AppError::new(self.kind(), self.user_message())
            }
            _ => AppError::new(self.kind(), GENERIC_MESSAGE),
        }
    }

    pub fn log(&self) {
        match self {
            AuthError::Transport(e) => {
                tracing::error!(error = %e, "Identity provider unreachable");
            }
            AuthError::Storage(e) => {
                tracing::error!(error = %e, "Profile storage error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::Provider {
                status, message, ..
            } if *status >= 500 => {
                tracing::error!(status, message = %message, "Identity provider failure");
            }
            AuthError::Provider { status, kind, .. } => {
                tracing::warn!(status, ?kind, "Identity provider rejected request");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

/// Value-object validation failures surface as form errors
impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        if err.kind().is_client_error() {
            AuthError::InvalidInput(err.message().to_string())
        } else {
            AuthError::Internal(err.to_string())
        }
    }
}
