//! Account site for the browser extension
//!
//! Composes the `auth` and `billing` crates into one axum application and
//! adds the pieces that belong to neither: configuration, HTML pages,
//! account provisioning and diagnostics.

pub mod account;
pub mod config;
pub mod diagnostics;
pub mod pages;
pub mod router;
pub mod state;

pub use config::{AppConfig, ConfigError};
pub use router::build_router;
pub use state::{AppState, LiveAppState};

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};
