//! Page renderers
//!
//! Pure functions from view data to HTML so they can be tested without a
//! router.

use billing::models::Plan;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::html::{captcha, escape, flash, hidden, input, layout};

/// Query parameters understood by every page
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub error: Option<String>,
    pub message: Option<String>,
    pub redirect: Option<String>,
    pub checkout: Option<String>,
}

impl PageQuery {
    fn flash(&self) -> String {
        flash(self.error.as_deref(), self.message.as_deref())
    }
}

pub fn landing(signed_in: bool) -> String {
    let cta = if signed_in {
        r#"<p><a href="/dashboard">Go to your dashboard</a></p>"#
    } else {
        r#"<p><a href="/signup">Create an account</a> or <a href="/login">log in</a>.</p>"#
    };
    let body = format!(
        "<h1>Your browser, upgraded</h1>\n\
         <p>Sign in to sync your extension and unlock early-access features.</p>\n{cta}"
    );
    layout("Welcome", signed_in, &body)
}

pub fn login(query: &PageQuery, site_key: Option<&str>) -> String {
    let redirect = query
        .redirect
        .as_deref()
        .and_then(auth::application::safe_redirect)
        .map(|r| hidden("redirect", &r))
        .unwrap_or_default();
    let body = format!(
        "<h1>Log in</h1>\n{flash}<form method=\"post\" action=\"/auth/login\">\n{email}{password}{redirect}{captcha}\
         <button type=\"submit\">Log in</button>\n</form>\n\
         <p><a href=\"/forgot-password\">Forgot your password?</a></p>\n\
         <p>No account yet? <a href=\"/signup\">Sign up</a></p>",
        flash = query.flash(),
        email = input("email", "email", "Email", "email", true),
        password = input("password", "password", "Password", "current-password", true),
        captcha = captcha(site_key),
    );
    layout("Log in", false, &body)
}

pub fn signup(query: &PageQuery, site_key: Option<&str>) -> String {
    let body = format!(
        "<h1>Create your account</h1>\n{flash}<form method=\"post\" action=\"/auth/signup\">\n\
         {name}{email}{password}{confirm}{captcha}\
         <button type=\"submit\">Sign up</button>\n</form>\n\
         <p>Already have an account? <a href=\"/login\">Log in</a></p>",
        flash = query.flash(),
        name = input("text", "full_name", "Full name (optional)", "name", false),
        email = input("email", "email", "Email", "email", true),
        password = input("password", "password", "Password", "new-password", true),
        confirm = input("password", "confirm_password", "Confirm password", "new-password", true),
        captcha = captcha(site_key),
    );
    layout("Sign up", false, &body)
}

pub fn forgot_password(query: &PageQuery, site_key: Option<&str>) -> String {
    let body = format!(
        "<h1>Reset your password</h1>\n{flash}<form method=\"post\" action=\"/auth/forgot-password\">\n\
         {email}{captcha}<button type=\"submit\">Send reset link</button>\n</form>\n\
         <p><a href=\"/login\">Back to log in</a></p>",
        flash = query.flash(),
        email = input("email", "email", "Email", "email", true),
        captcha = captcha(site_key),
    );
    layout("Forgot password", false, &body)
}

pub fn reset_password(query: &PageQuery, signed_in: bool) -> String {
    let body = if signed_in {
        format!(
            "<h1>Choose a new password</h1>\n{flash}<form method=\"post\" action=\"/auth/reset-password\">\n\
             {password}{confirm}<button type=\"submit\">Update password</button>\n</form>",
            flash = query.flash(),
            password = input("password", "password", "New password", "new-password", true),
            confirm = input("password", "confirm_password", "Confirm password", "new-password", true),
        )
    } else {
        format!(
            "<h1>Choose a new password</h1>\n{}\
             <p>Open the link from your reset email to choose a new password.</p>\n\
             <p><a href=\"/forgot-password\">Request a new link</a></p>",
            query.flash()
        )
    };
    layout("Reset password", signed_in, &body)
}

pub struct DashboardView<'a> {
    pub email: &'a str,
    /// `None` when the plan could not be loaded
    pub plan: Option<&'a Plan>,
    pub query: &'a PageQuery,
}

const CHECKOUT_SCRIPT: &str = r#"<script>
document.getElementById('checkout').addEventListener('click', async (event) => {
  event.target.disabled = true;
  const res = await fetch('/api/checkout', {
    method: 'POST',
    headers: { 'Content-Type': 'application/json' },
    body: '{}',
  });
  const data = await res.json().catch(() => ({}));
  if (res.ok && data.url) {
    window.location.href = data.url;
  } else {
    event.target.disabled = false;
    alert(data.detail || 'Checkout is unavailable right now.');
  }
});
</script>"#;

pub fn dashboard(view: &DashboardView<'_>) -> String {
    let checkout_notice = match view.query.checkout.as_deref() {
        Some("success") => flash(None, Some("Thanks for your purchase! Your plan will update in a moment.")),
        Some("cancelled") => flash(None, Some("Checkout was cancelled.")),
        _ => String::new(),
    };

    let plan_section = match view.plan {
        Some(plan) if plan.is_paid() => format!(
            "<p>Plan: <span class=\"badge paid\">{}</span> Paid</p>\n",
            escape(plan.as_str())
        ),
        Some(plan) => format!(
            "<p>Plan: <span class=\"badge\">{}</span></p>\n\
             <button id=\"checkout\" type=\"button\">Upgrade to early access</button>\n{CHECKOUT_SCRIPT}\n",
            escape(plan.as_str())
        ),
        None => "<p class=\"error\">Plan information is temporarily unavailable.</p>\n".to_string(),
    };

    let body = format!(
        "<h1>Dashboard</h1>\n{flash}{checkout_notice}<p>Signed in as <strong>{email}</strong></p>\n\
         {plan_section}<form method=\"post\" action=\"/auth/logout\"><button type=\"submit\">Log out</button></form>",
        flash = view.query.flash(),
        email = escape(view.email),
    );
    layout("Dashboard", true, &body)
}

pub fn profile(email: &str, full_name: Option<&str>, member_since: Option<DateTime<Utc>>) -> String {
    let since = member_since
        .map(|t| format!("<p>Member since {}</p>\n", t.format("%B %-d, %Y")))
        .unwrap_or_default();
    let body = format!(
        "<h1>Profile</h1>\n<p>Name: {name}</p>\n<p>Email: {email}</p>\n{since}",
        name = escape(full_name.unwrap_or("Not set")),
        email = escape(email),
    );
    layout("Profile", true, &body)
}

pub fn settings(email: &str, query: &PageQuery) -> String {
    let body = format!(
        "<h1>Settings</h1>\n{flash}<p>Signed in as {email}</p>\n\
         <h2>Change password</h2>\n<form method=\"post\" action=\"/auth/reset-password\">\n\
         {password}{confirm}<button type=\"submit\">Update password</button>\n</form>\n\
         <h2>Session</h2>\n<form method=\"post\" action=\"/auth/logout\"><button type=\"submit\">Log out everywhere</button></form>",
        flash = query.flash(),
        email = escape(email),
        password = input("password", "password", "New password", "new-password", true),
        confirm = input("password", "confirm_password", "Confirm password", "new-password", true),
    );
    layout("Settings", true, &body)
}

pub fn not_found(signed_in: bool) -> String {
    layout(
        "Page not found",
        signed_in,
        "<h1>Page not found</h1>\n<p>The page you are looking for does not exist. <a href=\"/\">Go home</a></p>",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_keeps_only_safe_redirect() {
        let query = PageQuery {
            redirect: Some("/settings".to_string()),
            ..Default::default()
        };
        assert!(login(&query, None).contains("name=\"redirect\" value=\"/settings\""));

        let query = PageQuery {
            redirect: Some("//evil.example".to_string()),
            ..Default::default()
        };
        assert!(!login(&query, None).contains("name=\"redirect\""));
    }

    #[test]
    fn test_error_message_escaped() {
        let query = PageQuery {
            error: Some("<img src=x onerror=alert(1)>".to_string()),
            ..Default::default()
        };
        let html = signup(&query, Some("key"));
        assert!(html.contains("&lt;img src=x onerror=alert(1)&gt;"));
        assert!(html.contains("h-captcha"));
    }

    #[test]
    fn test_dashboard_paid_has_no_checkout() {
        let query = PageQuery::default();
        let html = dashboard(&DashboardView {
            email: "a@example.com",
            plan: Some(&Plan::Founding),
            query: &query,
        });
        assert!(html.contains("badge paid"));
        assert!(!html.contains("id=\"checkout\""));
    }

    #[test]
    fn test_dashboard_free_offers_checkout() {
        let query = PageQuery {
            checkout: Some("cancelled".to_string()),
            ..Default::default()
        };
        let html = dashboard(&DashboardView {
            email: "<a@example.com>",
            plan: Some(&Plan::Free),
            query: &query,
        });
        assert!(html.contains("id=\"checkout\""));
        assert!(html.contains("Checkout was cancelled."));
        assert!(html.contains("&lt;a@example.com&gt;"));
    }

    #[test]
    fn test_reset_password_without_session() {
        let html = reset_password(&PageQuery::default(), false);
        assert!(!html.contains("action=\"/auth/reset-password\""));
        assert!(reset_password(&PageQuery::default(), true).contains("action=\"/auth/reset-password\""));
    }
}
