//! Billing Error Types
//!
//! Billing-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::postgrest::PostgrestError;
use thiserror::Error;

use crate::domain::webhook_verifier::WebhookError;

/// Billing-specific result type alias
pub type BillingResult<T> = Result<T, BillingError>;

const GENERIC_MESSAGE: &str = "Something went wrong. Please try again";

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Authentication required")]
    Unauthenticated,

    /// Admin route called without the service key
    #[error("Forbidden")]
    Forbidden,

    #[error("Plan '{0}' cannot be purchased")]
    NotPurchasable(String),

    #[error("{0}")]
    Webhook(#[from] WebhookError),

    /// Stripe answered with an error status
    #[error("payments provider returned {status}: {message}")]
    PaymentProvider { status: u16, message: String },

    #[error("payments provider unavailable: {0}")]
    Transport(#[from] reqwest::Error),

    /// Plan table access failed
    #[error("plan storage error: {0}")]
    Storage(#[from] PostgrestError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BillingError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            BillingError::InvalidInput(_)
            | BillingError::NotPurchasable(_)
            | BillingError::Webhook(_) => ErrorKind::BadRequest,
            BillingError::Unauthenticated => ErrorKind::Unauthorized,
            BillingError::Forbidden => ErrorKind::Forbidden,
            BillingError::PaymentProvider { status, .. } if *status == 429 => {
                ErrorKind::TooManyRequests
            }
            BillingError::Transport(e) if e.is_timeout() || e.is_connect() => {
                ErrorKind::ServiceUnavailable
            }
            BillingError::PaymentProvider { .. }
            | BillingError::Transport(_)
            | BillingError::Storage(_) => ErrorKind::BadGateway,
            BillingError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError; provider and storage detail stays in the logs
    pub fn to_app_error(&self) -> AppError {
        match self.kind() {
            kind if kind.is_client_error() => AppError::new(kind, self.to_string()),
            kind => AppError::new(kind, GENERIC_MESSAGE),
        }
    }

    pub fn log(&self) {
        match self {
            BillingError::PaymentProvider { status, message } => {
                tracing::error!(status, message = %message, "Payments provider error");
            }
            BillingError::Transport(e) => {
                tracing::error!(error = %e, "Payments provider unreachable");
            }
            BillingError::Storage(e) => {
                tracing::error!(error = %e, "Plan storage error");
            }
            BillingError::Internal(msg) => {
                tracing::error!(message = %msg, "Billing internal error");
            }
            BillingError::Webhook(e) => {
                tracing::warn!(error = %e, "Rejected webhook");
            }
            BillingError::Forbidden => {
                tracing::warn!("Plan assignment without service key");
            }
            _ => {
                tracing::debug!(error = %self, "Billing error");
            }
        }
    }
}

impl IntoResponse for BillingError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            BillingError::InvalidInput("Email is required".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(BillingError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            BillingError::Webhook(WebhookError::SignatureMismatch).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            BillingError::PaymentProvider {
                status: 500,
                message: "boom".into()
            }
            .status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            BillingError::PaymentProvider {
                status: 429,
                message: "slow".into()
            }
            .status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn test_client_message_kept() {
        let err = BillingError::NotPurchasable("free".into());
        assert_eq!(err.to_app_error().message(), "Plan 'free' cannot be purchased");
    }

    #[test]
    fn test_provider_detail_not_exposed() {
        let err = BillingError::PaymentProvider {
            status: 400,
            message: "No such price: 'price_secret'".into(),
        };
        assert_eq!(err.to_app_error().message(), GENERIC_MESSAGE);
    }
}
