//! Shared harness: the full router over in-memory providers

#![allow(dead_code)]

use std::collections::HashMap;
use std::time::Duration;

use api::{AppConfig, AppState, build_router};
use auth::infra::{InMemoryIdentityProvider, InMemoryProfileRepository};
use auth::models::Session;
use auth::presentation::SessionCookieCodec;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, Response, header};
use billing::infra::{InMemoryPaymentGateway, InMemoryPlanRepository};
use platform::retry::RetryPolicy;

pub const WEBHOOK_SECRET: &str = "whsec_integration";
pub const SERVICE_KEY: &str = "service-role-integration";
pub const PASSWORD: &str = "password1";

pub struct TestApp {
    pub identity: InMemoryIdentityProvider,
    pub profiles: InMemoryProfileRepository,
    pub plans: InMemoryPlanRepository,
    pub payments: InMemoryPaymentGateway,
    pub codec: SessionCookieCodec,
    pub router: Router,
}

pub fn vars(environment: &str) -> HashMap<&'static str, String> {
    HashMap::from([
        ("APP_ENV", environment.to_string()),
        ("SUPABASE_URL", "https://proj.supabase.co".to_string()),
        ("SUPABASE_ANON_KEY", "anon-key".to_string()),
        ("SUPABASE_SERVICE_ROLE_KEY", SERVICE_KEY.to_string()),
        ("STRIPE_SECRET_KEY_TEST", "sk_test_1".to_string()),
        ("STRIPE_WEBHOOK_SECRET_TEST", WEBHOOK_SECRET.to_string()),
        ("STRIPE_SECRET_KEY_LIVE", "sk_live_1".to_string()),
        ("STRIPE_WEBHOOK_SECRET_LIVE", WEBHOOK_SECRET.to_string()),
        ("STRIPE_MODE", "test".to_string()),
        ("STRIPE_PRICE_ID", "price_1".to_string()),
    ])
}

pub fn spawn_app(environment: &str) -> TestApp {
    let vars = vars(environment);
    let config = AppConfig::from_lookup(|name| vars.get(name).cloned())
        .expect("test configuration is complete");

    let auth_config = config
        .auth_config()
        .with_retry(RetryPolicy::new(2, Duration::from_millis(1), Duration::from_millis(2)));
    let billing_config = config.billing_config();

    let identity = InMemoryIdentityProvider::new();
    let profiles = InMemoryProfileRepository::new();
    let plans = InMemoryPlanRepository::new();
    let payments = InMemoryPaymentGateway::new();

    let codec = SessionCookieCodec::new(
        auth_config.session_cookie_name.clone(),
        auth_config.cookie.clone(),
    );

    let state = AppState::with_configs(
        auth_config,
        billing_config,
        config,
        identity.clone(),
        profiles.clone(),
        plans.clone(),
        payments.clone(),
    );

    TestApp {
        identity,
        profiles,
        plans,
        payments,
        codec,
        router: build_router(state),
    }
}

impl TestApp {
    /// Register a confirmed user and return a session expiring in an hour
    pub async fn signed_in(&self, email: &str) -> Session {
        self.session_expiring(email, chrono::Utc::now().timestamp() + 3600)
            .await
    }

    pub async fn session_expiring(&self, email: &str, expires_at: i64) -> Session {
        if self.identity.issue_session(email, expires_at).await.is_none() {
            self.identity.add_confirmed_user(email, PASSWORD).await;
        }
        self.identity
            .issue_session(email, expires_at)
            .await
            .expect("user exists")
    }

    /// `Cookie` header value carrying `session`
    pub fn cookie_header(&self, session: &Session) -> String {
        self.codec
            .write(session, &HeaderMap::new())
            .iter()
            .filter_map(|set_cookie| set_cookie.split(';').next())
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn get(&self, uri: &str, session: Option<&Session>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(session) = session {
            builder = builder.header(header::COOKIE, self.cookie_header(session));
        }
        builder.body(Body::empty()).unwrap()
    }

    pub fn post_json(&self, uri: &str, body: &str, session: Option<&Session>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(session) = session {
            builder = builder.header(header::COOKIE, self.cookie_header(session));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }
}

pub fn location<B>(response: &Response<B>) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap().to_string())
}

pub fn set_cookies<B>(response: &Response<B>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}
