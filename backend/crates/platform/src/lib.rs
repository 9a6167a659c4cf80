//! Platform Crate - Technical Infrastructure
//!
//! Shared technical foundations used by the identity and billing crates:
//! - Cookie building and parsing (including prefix scans for chunked cookies)
//! - HMAC-SHA256, constant-time comparison, hex/base64 helpers
//! - A single retry/backoff policy for provider calls
//! - Outbound HTTP client construction and a small PostgREST table client

pub mod cookie;
pub mod crypto;
pub mod http;
pub mod postgrest;
pub mod retry;
