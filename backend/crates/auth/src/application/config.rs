//! Application Configuration
//!
//! Configuration for the Auth application layer.

use std::time::Duration;

use platform::cookie::CookieConfig;
use platform::retry::RetryPolicy;

use crate::application::route_policy::RoutePolicy;

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

/// Session cookie lifetime used by the provider's SSR helpers (400 days)
pub const SESSION_COOKIE_MAX_AGE_SECS: i64 = 400 * 24 * 60 * 60;

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Identity provider base URL, e.g. `https://abc.supabase.co`
    pub identity_url: String,
    /// Public origin of this app, used for email links
    pub app_base_url: String,
    /// Base name of the session cookie (`sb-<project-ref>-auth-token`)
    pub session_cookie_name: String,
    /// Attributes shared by every session cookie chunk
    pub cookie: CookieConfig,
    /// Refresh this long before the access token expires
    pub refresh_skew: Duration,
    /// Wait after a refresh before re-validating
    pub propagation_delay: Duration,
    /// Refresh stale sessions in the route guard; otherwise treat them as anonymous
    pub auto_refresh: bool,
    /// Backoff for refresh and sign-in calls
    pub retry: RetryPolicy,
    pub route_policy: RoutePolicy,
}

impl AuthConfig {
    pub fn new(identity_url: impl Into<String>, app_base_url: impl Into<String>) -> Self {
        let identity_url = identity_url.into().trim_end_matches('/').to_string();
        let app_base_url = app_base_url.into().trim_end_matches('/').to_string();
        let session_cookie_name = format!("sb-{}-auth-token", project_ref(&identity_url));

        Self {
            identity_url,
            app_base_url,
            session_cookie_name,
            cookie: CookieConfig {
                secure: true,
                http_only: true,
                same_site: SameSite::Lax,
                path: "/".to_string(),
                max_age_secs: Some(SESSION_COOKIE_MAX_AGE_SECS),
            },
            refresh_skew: Duration::from_secs(60),
            propagation_delay: Duration::ZERO,
            auto_refresh: true,
            retry: RetryPolicy::default(),
            route_policy: RoutePolicy::default(),
        }
    }

    /// Config for local development (cookies without `Secure`)
    pub fn development(identity_url: impl Into<String>, app_base_url: impl Into<String>) -> Self {
        Self::new(identity_url, app_base_url).with_secure_cookies(false)
    }

    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.cookie.secure = secure;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Absolute URL on this app for `path`
    pub fn app_url(&self, path: &str) -> String {
        format!("{}{}", self.app_base_url, path)
    }

    /// Landing point for confirmation and reset links
    pub fn confirm_url(&self) -> String {
        self.app_url("/auth/confirm")
    }
}

/// First DNS label of the identity URL's host
pub fn project_ref(identity_url: &str) -> &str {
    let without_scheme = identity_url
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(identity_url);
    let host = without_scheme
        .split(['/', ':', '?', '#'])
        .next()
        .unwrap_or(without_scheme);
    host.split('.').next().unwrap_or(host)
}
