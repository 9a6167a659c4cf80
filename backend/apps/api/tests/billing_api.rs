mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use billing::domain::{UserPlan, WebhookVerifier};
use billing::models::Plan;
use common::{SERVICE_KEY, WEBHOOK_SECRET, body_json, spawn_app};
use secrecy::SecretString;
use serde_json::json;
use tower::ServiceExt;

fn webhook_request(payload: &str, signature: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/webhooks/stripe")
        .header("stripe-signature", signature)
        .body(Body::from(payload.to_string()))
        .unwrap()
}

fn sign(payload: &str, timestamp: i64) -> String {
    let verifier = WebhookVerifier::new(SecretString::new(WEBHOOK_SECRET.to_string()));
    format!(
        "t={},v1={}",
        timestamp,
        hex::encode(verifier.sign(timestamp, payload.as_bytes()))
    )
}

fn checkout_completed(email: &str) -> String {
    json!({
        "id": "evt_integration",
        "type": "checkout.session.completed",
        "created": chrono::Utc::now().timestamp(),
        "livemode": false,
        "data": {"object": {
            "id": "cs_test_integration",
            "customer": "cus_1",
            "customer_details": {"email": email},
            "metadata": {"plan": "founding"}
        }}
    })
    .to_string()
}

#[tokio::test]
async fn webhook_with_bad_signature_is_rejected() {
    let app = spawn_app("test");
    let payload = checkout_completed("buyer@example.com");
    let now = chrono::Utc::now().timestamp();

    for signature in [
        format!("t={now},v1={}", "00".repeat(32)),
        "garbage".to_string(),
        sign(&payload, now - 3600),
    ] {
        let response = app
            .router
            .clone()
            .oneshot(webhook_request(&payload, &signature))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].is_string());
    }
    assert_eq!(app.plans.count().await, 0);
}

#[tokio::test]
async fn completed_checkout_creates_exactly_one_row() {
    let app = spawn_app("test");
    let payload = checkout_completed("Buyer@Example.com");
    let signature = sign(&payload, chrono::Utc::now().timestamp());

    for _ in 0..2 {
        let response = app
            .router
            .clone()
            .oneshot(webhook_request(&payload, &signature))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"received": true}));
    }

    assert_eq!(app.plans.count().await, 1);
    let row = app.plans.get("buyer@example.com").await.unwrap();
    assert_eq!(row.plan, Plan::Founding);
    assert_eq!(row.stripe_session_id.as_deref(), Some("cs_test_integration"));
}

#[tokio::test]
async fn webhook_buyer_reported_paid_for_any_address() {
    let app = spawn_app("test");
    let payload = checkout_completed("Käufer@Bücher.Example");
    let signature = sign(&payload, chrono::Utc::now().timestamp());
    let response = app
        .router
        .clone()
        .oneshot(webhook_request(&payload, &signature))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .router
        .clone()
        .oneshot(app.post_json(
            "/api/check-paid",
            &json!({"email": " käufer@bücher.example "}).to_string(),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"isPaid": true, "plan": "founding"}));
}

#[tokio::test]
async fn check_paid_for_unknown_email_has_no_side_effects() {
    let app = spawn_app("test");

    for _ in 0..2 {
        let response = app
            .router
            .clone()
            .oneshot(app.post_json("/api/check-paid", r#"{"email":"nobody@example.com"}"#, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"isPaid": false, "plan": "free"}));
    }
    assert_eq!(app.plans.count().await, 0);
    assert_eq!(app.plans.write_calls().await, 0);
}

#[tokio::test]
async fn check_paid_plan_tags() {
    let app = spawn_app("test");
    let cases = [
        ("founding@example.com", "FOUNDING", true),
        ("beta@example.com", "Beta", true),
        ("founder@example.com", "founder", true),
        ("premium@example.com", "premium", false),
        ("free@example.com", "free", false),
        ("other@example.com", "lifetime", false),
    ];
    for (email, tag, _) in cases {
        app.plans.insert(UserPlan::new(email, Plan::parse(tag))).await;
    }

    for (email, _, paid) in cases {
        let response = app
            .router
            .clone()
            .oneshot(app.post_json("/api/check-paid", &json!({"email": email}).to_string(), None))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["isPaid"], json!(paid), "{email}");
    }
}

#[tokio::test]
async fn plan_routes() {
    let app = spawn_app("test");
    let session = app.signed_in("member@example.com").await;

    // Anonymous plan lookup is refused
    let response = app.router.clone().oneshot(app.get("/api/plan", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Assign with the service key
    let mut request = app.post_json(
        "/api/plan",
        r#"{"email":"member@example.com","plan":"beta"}"#,
        None,
    );
    request.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {SERVICE_KEY}").parse().unwrap(),
    );
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .router
        .clone()
        .oneshot(app.get("/api/plan", Some(&session)))
        .await
        .unwrap();
    assert_eq!(body_json(response).await, json!({"plan": "beta", "isPaid": true}));
}

#[tokio::test]
async fn checkout_requires_session() {
    let app = spawn_app("test");

    let response = app
        .router
        .clone()
        .oneshot(app.post_json("/api/checkout", "{}", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let session = app.signed_in("buyer@example.com").await;
    let response = app
        .router
        .clone()
        .oneshot(app.post_json("/api/checkout", r#"{"plan":"founder"}"#, Some(&session)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["sessionId"].as_str().unwrap().starts_with("cs_test_"));
    assert!(body["url"].as_str().unwrap().starts_with("https://"));

    let request = app.payments.last_request().await.unwrap();
    assert_eq!(request.email, "buyer@example.com");
    assert_eq!(request.plan, Plan::Founder);
    assert!(request.success_url.starts_with("http://localhost:3000/dashboard"));
}
