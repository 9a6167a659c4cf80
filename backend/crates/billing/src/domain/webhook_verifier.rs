//! Stripe webhook signature verification
//!
//! HMAC-SHA256 over `"{t}.{payload}"` with the endpoint secret, compared in
//! constant time against every `v1` entry of the `stripe-signature` header.
//! The timestamp bounds the replay window.

use platform::crypto::{constant_time_eq, from_hex, hmac_sha256};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::domain::stripe_event::StripeEvent;

/// Oldest acceptable event
pub const MAX_EVENT_AGE_SECS: i64 = 300;

/// Tolerated clock drift for events stamped in the future
pub const MAX_CLOCK_SKEW_SECS: i64 = 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WebhookError {
    #[error("missing stripe-signature header")]
    MissingSignature,

    #[error("malformed stripe-signature header: {0}")]
    MalformedHeader(&'static str),

    #[error("webhook timestamp outside tolerance")]
    TimestampOutOfRange,

    #[error("webhook signature mismatch")]
    SignatureMismatch,

    #[error("invalid webhook payload: {0}")]
    InvalidPayload(String),
}

/// Parsed `stripe-signature` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    /// Several during secret rotation
    pub v1_signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    /// `t=<unix>,v1=<hex>[,v1=<hex>...]`; unknown keys are ignored
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp = None;
        let mut v1_signatures = Vec::new();

        for part in header.split(',') {
            let (key, value) = part
                .trim()
                .split_once('=')
                .ok_or(WebhookError::MalformedHeader("expected key=value"))?;

            match key {
                "t" => {
                    timestamp = Some(
                        value
                            .parse::<i64>()
                            .map_err(|_| WebhookError::MalformedHeader("invalid timestamp"))?,
                    );
                }
                "v1" => {
                    // Undecodable entries can never match; skip rather than fail
                    if let Ok(sig) = from_hex(value) {
                        v1_signatures.push(sig);
                    }
                }
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or(WebhookError::MalformedHeader("missing timestamp"))?;
        if v1_signatures.is_empty() {
            return Err(WebhookError::MalformedHeader("missing v1 signature"));
        }

        Ok(Self {
            timestamp,
            v1_signatures,
        })
    }
}

#[derive(Clone)]
pub struct WebhookVerifier {
    secret: SecretString,
}

impl WebhookVerifier {
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    pub fn sign(&self, timestamp: i64, payload: &[u8]) -> [u8; 32] {
        let mut signed = format!("{}.", timestamp).into_bytes();
        signed.extend_from_slice(payload);
        hmac_sha256(self.secret.expose_secret().as_bytes(), &signed)
    }

    /// Verify against the current wall clock and parse the event
    pub fn verify(&self, payload: &[u8], header: Option<&str>) -> Result<StripeEvent, WebhookError> {
        self.verify_at(payload, header, chrono::Utc::now().timestamp())
    }

    pub fn verify_at(
        &self,
        payload: &[u8],
        header: Option<&str>,
        now: i64,
    ) -> Result<StripeEvent, WebhookError> {
        let header = header
            .filter(|h| !h.trim().is_empty())
            .ok_or(WebhookError::MissingSignature)?;
        let header = SignatureHeader::parse(header)?;

        let age = now - header.timestamp;
        if age > MAX_EVENT_AGE_SECS || age < -MAX_CLOCK_SKEW_SECS {
            return Err(WebhookError::TimestampOutOfRange);
        }

        let expected = self.sign(header.timestamp, payload);
        let matched = header
            .v1_signatures
            .iter()
            .fold(false, |acc, sig| constant_time_eq(&expected, sig) | acc);
        if !matched {
            return Err(WebhookError::SignatureMismatch);
        }

        serde_json::from_slice(payload).map_err(|e| WebhookError::InvalidPayload(e.to_string()))
    }
}
