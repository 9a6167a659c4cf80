//! Billing Router

use axum::{
    Router,
    routing::{get, post},
};

use crate::domain::repository::{PaymentGateway, PlanRepository};
use crate::presentation::handlers::{self, BillingAppState};

/// Routes mounted under `/api`. Session-backed routes need the auth route
/// guard around the app.
pub fn billing_router<R, G>(state: BillingAppState<R, G>) -> Router
where
    R: PlanRepository + Clone + Send + Sync + 'static,
    G: PaymentGateway + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/check-paid", post(handlers::check_paid::<R, G>))
        .route(
            "/plan",
            get(handlers::get_plan::<R, G>).post(handlers::set_plan::<R, G>),
        )
        .route("/checkout", post(handlers::checkout::<R, G>))
        .route("/webhooks/stripe", post(handlers::stripe_webhook::<R, G>))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::config::{BillingConfig, StripeMode};
    use crate::domain::plan::{Plan, UserPlan};
    use crate::domain::webhook_verifier::WebhookVerifier;
    use crate::infra::memory::{InMemoryPaymentGateway, InMemoryPlanRepository};
    use crate::presentation::dto::{CheckoutResponse, PlanResponse};
    use auth::middleware::CurrentSession;
    use auth::models::{AuthUser, Session};
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use kernel::id::UserId;
    use secrecy::SecretString;
    use std::sync::Arc;
    use tower::ServiceExt;

    const WEBHOOK_SECRET: &str = "whsec_router_test";
    const SERVICE_KEY: &str = "service-role-key";

    struct Harness {
        plans: InMemoryPlanRepository,
        payments: InMemoryPaymentGateway,
        app: Router,
    }

    fn harness() -> Harness {
        let plans = InMemoryPlanRepository::new();
        let payments = InMemoryPaymentGateway::new();
        let config = BillingConfig::new(
            StripeMode::Test,
            SecretString::new("sk_test_1".to_string()),
            SecretString::new(WEBHOOK_SECRET.to_string()),
            "price_1",
            "http://localhost:3000",
            SecretString::new(SERVICE_KEY.to_string()),
        );
        let state = BillingAppState::new(
            Arc::new(plans.clone()),
            Arc::new(payments.clone()),
            Arc::new(config),
        );
        Harness {
            plans,
            payments,
            app: Router::new().nest("/api", billing_router(state)),
        }
    }

    fn session(email: &str) -> CurrentSession {
        CurrentSession(Some(Session {
            access_token: "at".to_string(),
            refresh_token: "rt".to_string(),
            expires_at: chrono::Utc::now().timestamp() + 3600,
            token_type: "bearer".to_string(),
            user: AuthUser {
                id: UserId::new(),
                email: email.to_string(),
                email_confirmed_at: None,
                user_metadata: serde_json::Value::Null,
            },
        }))
    }

    fn json(method: &str, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_check_paid_unknown_email_twice() {
        let h = harness();
        for _ in 0..2 {
            let response = h
                .app
                .clone()
                .oneshot(json("POST", "/api/check-paid", r#"{"email":"nobody@example.com"}"#))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let body: PlanResponse = body_json(response).await;
            assert_eq!(
                body,
                PlanResponse {
                    plan: "free".to_string(),
                    is_paid: false
                }
            );
        }
        assert_eq!(h.plans.count().await, 0);
        assert_eq!(h.plans.write_calls().await, 0);
    }

    #[tokio::test]
    async fn test_check_paid_empty_email() {
        let h = harness();
        let response = h
            .app
            .oneshot(json("POST", "/api/check-paid", r#"{"email":""}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_plan_requires_session() {
        let h = harness();
        let response = h
            .app
            .oneshot(Request::builder().uri("/api/plan").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_get_plan_for_session() {
        let h = harness();
        h.plans.insert(UserPlan::new("user@example.com", Plan::Founder)).await;

        let request = Request::builder()
            .uri("/api/plan")
            .extension(session("user@example.com"))
            .body(Body::empty())
            .unwrap();
        let body: PlanResponse = body_json(h.app.oneshot(request).await.unwrap()).await;
        assert_eq!(body.plan, "founder");
        assert!(body.is_paid);
    }

    #[tokio::test]
    async fn test_set_plan_requires_service_key() {
        let h = harness();
        let body = r#"{"email":"a@example.com","plan":"beta"}"#;

        let response = h.app.clone().oneshot(json("POST", "/api/plan", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let mut wrong = json("POST", "/api/plan", body);
        wrong
            .headers_mut()
            .insert(header::AUTHORIZATION, "Bearer anon-key".parse().unwrap());
        let response = h.app.clone().oneshot(wrong).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(h.plans.count().await, 0);

        let mut right = json("POST", "/api/plan", body);
        right.headers_mut().insert(
            header::AUTHORIZATION,
            format!("Bearer {SERVICE_KEY}").parse().unwrap(),
        );
        let response = h.app.oneshot(right).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: PlanResponse = body_json(response).await;
        assert!(body.is_paid);
        assert_eq!(h.plans.get("a@example.com").await.unwrap().plan, Plan::Beta);
    }

    #[tokio::test]
    async fn test_checkout_with_empty_body() {
        let h = harness();
        let request = Request::builder()
            .method("POST")
            .uri("/api/checkout")
            .extension(session("buyer@example.com"))
            .body(Body::empty())
            .unwrap();

        let response = h.app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: CheckoutResponse = body_json(response).await;
        assert!(body.session_id.starts_with("cs_test_"));
        assert_eq!(h.payments.last_request().await.unwrap().plan, Plan::Founding);
    }

    #[tokio::test]
    async fn test_checkout_free_plan_rejected() {
        let h = harness();
        let mut request = json("POST", "/api/checkout", r#"{"plan":"free"}"#);
        request.extensions_mut().insert(session("buyer@example.com"));

        let response = h.app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(h.payments.requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_webhook_bad_signature() {
        let h = harness();
        let request = Request::builder()
            .method("POST")
            .uri("/api/webhooks/stripe")
            .header("stripe-signature", "t=1,v1=deadbeef")
            .body(Body::from("{}"))
            .unwrap();

        let response = h.app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = body_json(response).await;
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_webhook_checkout_completed() {
        let h = harness();
        let now = chrono::Utc::now().timestamp();
        let payload = serde_json::json!({
            "id": "evt_1",
            "type": "checkout.session.completed",
            "created": now,
            "livemode": false,
            "data": {"object": {
                "id": "cs_test_1",
                "customer_details": {"email": "buyer@example.com"},
                "metadata": {"plan": "founding"}
            }}
        })
        .to_string();
        let verifier = WebhookVerifier::new(SecretString::new(WEBHOOK_SECRET.to_string()));
        let signature = format!("t={},v1={}", now, hex::encode(verifier.sign(now, payload.as_bytes())));

        let request = Request::builder()
            .method("POST")
            .uri("/api/webhooks/stripe")
            .header("stripe-signature", signature)
            .body(Body::from(payload))
            .unwrap();

        let response = h.app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = body_json(response).await;
        assert_eq!(body, serde_json::json!({"received": true}));
        assert_eq!(h.plans.count().await, 1);
        assert!(h.plans.get("buyer@example.com").await.unwrap().is_paid());
    }
}
