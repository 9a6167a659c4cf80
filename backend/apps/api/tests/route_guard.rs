mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use common::{location, set_cookies, spawn_app};
use tower::ServiceExt;

#[tokio::test]
async fn protected_pages_allow_valid_session() {
    let app = spawn_app("test");
    let session = app.signed_in("user@example.com").await;

    for path in ["/dashboard", "/profile", "/settings"] {
        let response = app
            .router
            .clone()
            .oneshot(app.get(path, Some(&session)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{path}");
    }
}

#[tokio::test]
async fn protected_pages_redirect_anonymous_to_login() {
    let app = spawn_app("test");

    let response = app
        .router
        .clone()
        .oneshot(app.get("/dashboard", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response).as_deref(), Some("/login?redirect=%2Fdashboard"));

    let response = app
        .router
        .clone()
        .oneshot(app.get("/settings/billing?tab=plan", None))
        .await
        .unwrap();
    assert_eq!(
        location(&response).as_deref(),
        Some("/login?redirect=%2Fsettings%2Fbilling%3Ftab%3Dplan")
    );
}

#[tokio::test]
async fn similar_prefixes_are_not_protected() {
    let app = spawn_app("test");
    let response = app
        .router
        .clone()
        .oneshot(app.get("/dashboards", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn guest_pages_send_signed_in_users_home() {
    let app = spawn_app("test");
    let session = app.signed_in("user@example.com").await;

    let cases = [
        ("/login", "/dashboard"),
        ("/signup", "/dashboard"),
        ("/login?redirect=%2Fsettings", "/settings"),
        ("/login?redirect=%2F%2Fevil.example", "/dashboard"),
        ("/login?redirect=https%3A%2F%2Fevil.example", "/dashboard"),
    ];
    for (path, expected) in cases {
        let response = app
            .router
            .clone()
            .oneshot(app.get(path, Some(&session)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT, "{path}");
        assert_eq!(location(&response).as_deref(), Some(expected), "{path}");
    }
}

#[tokio::test]
async fn guest_pages_render_for_anonymous() {
    let app = spawn_app("test");
    for path in ["/login", "/signup", "/forgot-password", "/reset-password", "/"] {
        let response = app.router.clone().oneshot(app.get(path, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{path}");
    }
}

#[tokio::test]
async fn stale_session_is_refreshed_and_cookie_rewritten() {
    let app = spawn_app("test");
    // Inside the 60 s skew window
    let expires_at = chrono::Utc::now().timestamp() + 30;
    let session = app.session_expiring("user@example.com", expires_at).await;

    let response = app
        .router
        .clone()
        .oneshot(app.get("/dashboard", Some(&session)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.identity.refresh_calls().await, 1);
    let cookies = set_cookies(&response);
    assert!(cookies.iter().any(|c| c.starts_with("sb-proj-auth-token=base64-")));
}

#[tokio::test]
async fn refreshed_session_kept_through_validation_outage() {
    let app = spawn_app("test");
    let expires_at = chrono::Utc::now().timestamp() + 30;
    let session = app.session_expiring("user@example.com", expires_at).await;
    app.identity.fail_next_get_users(1, 503).await;

    let response = app
        .router
        .clone()
        .oneshot(app.get("/dashboard", Some(&session)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = set_cookies(&response)
        .iter()
        .filter_map(|c| c.split(';').next().map(str::to_string))
        .filter(|pair| !pair.ends_with('='))
        .collect::<Vec<_>>()
        .join("; ");
    assert!(cookie.starts_with("sb-proj-auth-token=base64-"));

    // Replaying the rewritten cookie needs no second refresh
    let request = Request::builder()
        .uri("/dashboard")
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.identity.refresh_calls().await, 1);
}

#[tokio::test]
async fn revoked_session_clears_cookies() {
    let app = spawn_app("test");
    let session = app.signed_in("user@example.com").await;
    app.identity.revoke_all().await;

    let response = app
        .router
        .clone()
        .oneshot(app.get("/dashboard", Some(&session)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert!(
        set_cookies(&response)
            .iter()
            .any(|c| c.starts_with("sb-proj-auth-token=;") && c.contains("Max-Age=0"))
    );
}
