//! Route guard policy
//!
//! Which paths need a session, which are for guests only, and where to send
//! people who are on the wrong side of that line.

/// Outcome of applying the policy to one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    /// Anonymous request for a protected page
    RedirectToLogin { location: String },
    /// Authenticated request for a guest-only page
    Redirect { location: String },
}

#[derive(Debug, Clone)]
pub struct RoutePolicy {
    pub protected: Vec<String>,
    pub guest_only: Vec<String>,
    pub login_path: String,
    pub home_path: String,
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self {
            protected: vec![
                "/dashboard".to_string(),
                "/profile".to_string(),
                "/settings".to_string(),
            ],
            guest_only: vec!["/login".to_string(), "/signup".to_string()],
            login_path: "/login".to_string(),
            home_path: "/dashboard".to_string(),
        }
    }
}

/// `/dashboard` matches `/dashboard` and `/dashboard/x`, not `/dashboards`
fn matches_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || prefix.ends_with('/'),
        None => false,
    }
}

/// Accept `raw` as a post-login destination only if it stays on this origin
pub fn safe_redirect(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if !raw.starts_with('/') || raw.starts_with("//") || raw.starts_with("/\\") {
        return None;
    }
    if raw.contains('\\') || raw.chars().any(char::is_control) || raw.contains("://") {
        return None;
    }
    Some(raw.to_string())
}

/// Look up a single query parameter
pub fn query_param(query: &str, name: &str) -> Option<String> {
    serde_urlencoded::from_str::<Vec<(String, String)>>(query)
        .ok()?
        .into_iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value)
}

/// `path?k=v&...`, skipping empty values
pub fn location_with_query(path: &str, params: &[(&str, &str)]) -> String {
    let params: Vec<(&str, &str)> = params
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .copied()
        .collect();
    if params.is_empty() {
        return path.to_string();
    }
    match serde_urlencoded::to_string(&params) {
        Ok(query) => format!("{}?{}", path, query),
        Err(_) => path.to_string(),
    }
}

impl RoutePolicy {
    pub fn is_protected(&self, path: &str) -> bool {
        self.protected.iter().any(|p| matches_prefix(path, p))
    }

    pub fn is_guest_only(&self, path: &str) -> bool {
        self.guest_only.iter().any(|p| matches_prefix(path, p))
    }

    /// Validated `redirect` candidate, or the home path
    pub fn redirect_target(&self, candidate: Option<&str>) -> String {
        candidate
            .and_then(safe_redirect)
            .unwrap_or_else(|| self.home_path.clone())
    }

    /// Apply the policy to a request target (`path` plus optional `?query`).
    /// The `redirect` query parameter is honoured for guest-only pages.
    pub fn decide(&self, path_and_query: &str, authenticated: bool) -> GuardDecision {
        let (path, query) = match path_and_query.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (path_and_query, None),
        };

        if !authenticated && self.is_protected(path) {
            let location =
                location_with_query(&self.login_path, &[("redirect", path_and_query)]);
            return GuardDecision::RedirectToLogin { location };
        }

        if authenticated && self.is_guest_only(path) {
            let candidate = query.and_then(|q| query_param(q, "redirect"));
            return GuardDecision::Redirect {
                location: self.redirect_target(candidate.as_deref()),
            };
        }

        GuardDecision::Allow
    }
}
