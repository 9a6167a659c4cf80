//! HTML building blocks
//!
//! Every dynamic value goes through `escape` before it reaches markup.

/// Escape text for element content and double-quoted attributes
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; max-width: 40rem; margin: 3rem auto; padding: 0 1rem; color: #1f2937; }
nav { display: flex; gap: 1rem; margin-bottom: 2rem; }
form { display: flex; flex-direction: column; gap: .75rem; }
input, button { font: inherit; padding: .5rem; }
.error { color: #b91c1c; }
.message { color: #166534; }
.badge { display: inline-block; padding: .125rem .5rem; border-radius: .25rem; background: #e5e7eb; }
.badge.paid { background: #fde68a; }
"#;

/// Full document around `body`; `title` is escaped here
pub fn layout(title: &str, signed_in: bool, body: &str) -> String {
    let nav = if signed_in {
        r#"<a href="/">Home</a><a href="/dashboard">Dashboard</a><a href="/profile">Profile</a><a href="/settings">Settings</a>"#
    } else {
        r#"<a href="/">Home</a><a href="/login">Log in</a><a href="/signup">Sign up</a>"#
    };
    format!(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<nav>{nav}</nav>\n\
         <main>\n{body}\n</main>\n</body>\n</html>\n",
        title = escape(title),
    )
}

/// `error` / `message` query parameters rendered as notices
pub fn flash(error: Option<&str>, message: Option<&str>) -> String {
    let mut out = String::new();
    if let Some(error) = error.filter(|e| !e.is_empty()) {
        out.push_str(&format!(
            "<p class=\"error\" role=\"alert\">{}</p>\n",
            escape(error)
        ));
    }
    if let Some(message) = message.filter(|m| !m.is_empty()) {
        out.push_str(&format!(
            "<p class=\"message\" role=\"status\">{}</p>\n",
            escape(message)
        ));
    }
    out
}

/// hCaptcha widget; empty when no site key is configured
pub fn captcha(site_key: Option<&str>) -> String {
    match site_key {
        Some(key) => format!(
            "<div class=\"h-captcha\" data-sitekey=\"{}\"></div>\n\
             <script src=\"https://js.hcaptcha.com/1/api.js\" async defer></script>\n",
            escape(key)
        ),
        None => String::new(),
    }
}

pub fn input(kind: &str, name: &str, label: &str, autocomplete: &str, required: bool) -> String {
    format!(
        "<label>{label}<br><input type=\"{kind}\" name=\"{name}\" autocomplete=\"{autocomplete}\"{required}></label>\n",
        label = escape(label),
        kind = escape(kind),
        name = escape(name),
        autocomplete = escape(autocomplete),
        required = if required { " required" } else { "" },
    )
}

pub fn hidden(name: &str, value: &str) -> String {
    format!(
        "<input type=\"hidden\" name=\"{}\" value=\"{}\">\n",
        escape(name),
        escape(value)
    )
}
