//! Application Configuration
//!
//! Everything is read from the process environment (after `.env` has been
//! loaded). Blank values count as unset.

use std::net::SocketAddr;
use std::time::Duration;

use auth::AuthConfig;
use billing::{BillingConfig, StripeMode};
use kernel::environment::Environment;
use secrecy::SecretString;
use thiserror::Error;

pub const DEFAULT_APP_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_LOG_FILTER: &str = "api=info,auth=info,billing=info,tower_http=info";

/// Variables reported (as set / unset) by the diagnostics endpoint
pub const KNOWN_VARS: &[&str] = &[
    "APP_ENV",
    "APP_BASE_URL",
    "BIND_ADDR",
    "SUPABASE_URL",
    "SUPABASE_ANON_KEY",
    "SUPABASE_SERVICE_ROLE_KEY",
    "STRIPE_MODE",
    "STRIPE_SECRET_KEY_TEST",
    "STRIPE_SECRET_KEY_LIVE",
    "STRIPE_WEBHOOK_SECRET_TEST",
    "STRIPE_WEBHOOK_SECRET_LIVE",
    "STRIPE_PRICE_ID",
    "HCAPTCHA_SITE_KEY",
    "SESSION_REFRESH_SKEW_SECS",
    "SESSION_PROPAGATION_DELAY_MS",
    "SESSION_AUTO_REFRESH",
    "FRONTEND_ORIGINS",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Required configuration missing: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {message}")]
    Invalid {
        name: &'static str,
        message: String,
    },
}

/// Session persistence tuning
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub refresh_skew: Duration,
    pub propagation_delay: Duration,
    pub auto_refresh: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            refresh_skew: Duration::from_secs(60),
            propagation_delay: Duration::ZERO,
            auto_refresh: true,
        }
    }
}

/// Stripe settings for the selected mode only
#[derive(Debug, Clone)]
pub struct StripeSettings {
    pub mode: StripeMode,
    pub secret_key: SecretString,
    pub webhook_secret: SecretString,
    pub price_id: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub bind_addr: SocketAddr,
    pub app_base_url: String,
    pub supabase_url: String,
    pub supabase_anon_key: SecretString,
    pub supabase_service_role_key: SecretString,
    pub stripe: StripeSettings,
    pub hcaptcha_site_key: Option<String>,
    pub session: SessionSettings,
    /// Origins allowed to call the JSON API cross-site (the extension)
    pub frontend_origins: Vec<String>,
    /// `(name, is_set)` for every entry of `KNOWN_VARS`
    pub configured: Vec<(&'static str, bool)>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let environment = get("APP_ENV")
            .map(|v| Environment::parse(&v))
            .unwrap_or_default();

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                name: "BIND_ADDR",
                message: e.to_string(),
            })?;

        let app_base_url = get("APP_BASE_URL")
            .unwrap_or_else(|| DEFAULT_APP_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let mode = StripeMode::resolve(get("STRIPE_MODE").as_deref(), environment);
        let stripe = StripeSettings {
            mode,
            secret_key: SecretString::new(require(
                mode.select("STRIPE_SECRET_KEY_TEST", "STRIPE_SECRET_KEY_LIVE"),
            )?),
            webhook_secret: SecretString::new(require(
                mode.select("STRIPE_WEBHOOK_SECRET_TEST", "STRIPE_WEBHOOK_SECRET_LIVE"),
            )?),
            price_id: require("STRIPE_PRICE_ID")?,
        };

        let defaults = SessionSettings::default();
        let session = SessionSettings {
            refresh_skew: match get("SESSION_REFRESH_SKEW_SECS") {
                Some(raw) => Duration::from_secs(parse_number("SESSION_REFRESH_SKEW_SECS", &raw)?),
                None => defaults.refresh_skew,
            },
            propagation_delay: match get("SESSION_PROPAGATION_DELAY_MS") {
                Some(raw) => {
                    Duration::from_millis(parse_number("SESSION_PROPAGATION_DELAY_MS", &raw)?)
                }
                None => defaults.propagation_delay,
            },
            auto_refresh: match get("SESSION_AUTO_REFRESH") {
                Some(raw) => parse_bool("SESSION_AUTO_REFRESH", &raw)?,
                None => defaults.auto_refresh,
            },
        };

        let frontend_origins = get("FRONTEND_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let configured = KNOWN_VARS
            .iter()
            .map(|name| (*name, get(name).is_some()))
            .collect();

        Ok(Self {
            environment,
            bind_addr,
            app_base_url,
            supabase_url: require("SUPABASE_URL")?,
            supabase_anon_key: SecretString::new(require("SUPABASE_ANON_KEY")?),
            supabase_service_role_key: SecretString::new(require("SUPABASE_SERVICE_ROLE_KEY")?),
            stripe,
            hcaptcha_site_key: get("HCAPTCHA_SITE_KEY"),
            session,
            frontend_origins,
            configured,
        })
    }

    /// `Secure` cookies everywhere except development
    pub fn auth_config(&self) -> AuthConfig {
        let mut config = AuthConfig::new(&self.supabase_url, &self.app_base_url)
            .with_secure_cookies(self.environment != Environment::Development);
        config.refresh_skew = self.session.refresh_skew;
        config.propagation_delay = self.session.propagation_delay;
        config.auto_refresh = self.session.auto_refresh;
        config
    }

    pub fn billing_config(&self) -> BillingConfig {
        BillingConfig::new(
            self.stripe.mode,
            self.stripe.secret_key.clone(),
            self.stripe.webhook_secret.clone(),
            &self.stripe.price_id,
            &self.app_base_url,
            self.supabase_service_role_key.clone(),
        )
    }

    pub fn is_configured(&self, name: &str) -> bool {
        self.configured
            .iter()
            .any(|(var, set)| *var == name && *set)
    }
}

fn parse_number(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.parse::<u64>().map_err(|e| ConfigError::Invalid {
        name,
        message: e.to_string(),
    })
}

fn parse_bool(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            message: format!("expected a boolean, got '{}'", raw),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn base() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("SUPABASE_URL", "https://proj.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
            ("SUPABASE_SERVICE_ROLE_KEY", "service"),
            ("STRIPE_SECRET_KEY_TEST", "sk_test_1"),
            ("STRIPE_WEBHOOK_SECRET_TEST", "whsec_test"),
            ("STRIPE_SECRET_KEY_LIVE", "sk_live_1"),
            ("STRIPE_WEBHOOK_SECRET_LIVE", "whsec_live"),
            ("STRIPE_PRICE_ID", "price_1"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> Result<AppConfig, ConfigError> {
        AppConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults() {
        let config = load(&base()).unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(config.app_base_url, DEFAULT_APP_BASE_URL);
        assert_eq!(config.stripe.mode, StripeMode::Test);
        assert_eq!(config.stripe.secret_key.expose_secret(), "sk_test_1");
        assert_eq!(config.session.propagation_delay, Duration::ZERO);
        assert!(config.session.auto_refresh);
        assert!(config.hcaptcha_site_key.is_none());
        assert!(!config.auth_config().cookie.secure);
    }

    #[test]
    fn test_production_uses_live_keys() {
        let mut vars = base();
        vars.insert("APP_ENV", "production");
        let config = load(&vars).unwrap();
        assert_eq!(config.stripe.mode, StripeMode::Live);
        assert_eq!(config.stripe.webhook_secret.expose_secret(), "whsec_live");
        assert!(config.auth_config().cookie.secure);
    }

    #[test]
    fn test_missing_required() {
        let mut vars = base();
        vars.remove("SUPABASE_ANON_KEY");
        assert!(matches!(load(&vars), Err(ConfigError::Missing("SUPABASE_ANON_KEY"))));

        let mut vars = base();
        vars.insert("STRIPE_MODE", "live");
        vars.remove("STRIPE_SECRET_KEY_LIVE");
        assert!(matches!(load(&vars), Err(ConfigError::Missing("STRIPE_SECRET_KEY_LIVE"))));
    }

    #[test]
    fn test_session_settings() {
        let mut vars = base();
        vars.insert("SESSION_REFRESH_SKEW_SECS", "120");
        vars.insert("SESSION_PROPAGATION_DELAY_MS", "500");
        vars.insert("SESSION_AUTO_REFRESH", "off");
        let config = load(&vars).unwrap();
        let auth = config.auth_config();
        assert_eq!(auth.refresh_skew, Duration::from_secs(120));
        assert_eq!(auth.propagation_delay, Duration::from_millis(500));
        assert!(!auth.auto_refresh);

        vars.insert("SESSION_AUTO_REFRESH", "maybe");
        assert!(matches!(load(&vars), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_configured_report() {
        let mut vars = base();
        vars.insert("HCAPTCHA_SITE_KEY", "  ");
        vars.insert("FRONTEND_ORIGINS", "chrome-extension://abc, https://x.example");
        let config = load(&vars).unwrap();
        assert!(config.is_configured("SUPABASE_URL"));
        assert!(!config.is_configured("HCAPTCHA_SITE_KEY"));
        assert_eq!(config.frontend_origins.len(), 2);
        assert_eq!(config.configured.len(), KNOWN_VARS.len());
    }

    #[test]
    fn test_bad_bind_addr() {
        let mut vars = base();
        vars.insert("BIND_ADDR", "not-an-addr");
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid { name: "BIND_ADDR", .. })
        ));
    }
}
