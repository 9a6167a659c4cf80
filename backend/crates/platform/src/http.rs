//! Outbound HTTP client construction

use std::time::Duration;

pub const USER_AGENT: &str = concat!("extension-site/", env!("CARGO_PKG_VERSION"));

/// Client shared by every provider adapter; cheap to clone.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(5))
        .build()
}

/// True for failures worth retrying: transport problems, 429 and 5xx.
pub fn is_transient_status(status: u16) -> bool {
    status == 429 || status >= 500
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_status() {
        assert!(is_transient_status(429));
        assert!(is_transient_status(503));
        assert!(!is_transient_status(400));
        assert!(!is_transient_status(401));
    }
}
