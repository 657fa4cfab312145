mod common;

use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use common::{TestApp, test_config};
use serde_json::json;
use tower::ServiceExt; // for .oneshot()

async fn limited_app() -> TestApp {
    let mut config = test_config();
    config.auth.login_max_attempts = 5;
    config.auth.login_window_secs = 60;
    TestApp::with_config(config).await
}

fn login_request(uri: &str, client_ip: &str) -> Request<Body> {
    let login_body = json!({"username": "admin", "password": "wrong"});
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-forwarded-for", client_ip)
        .body(Body::from(login_body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_login_rate_limit() {
    let app = limited_app().await;
    // 5 allowed attempts
    for _ in 0..5 {
        let response = app.router.clone().oneshot(login_request("/api/auth/login", "127.0.0.1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
    // 6th attempt should be rate limited
    let response = app.router.clone().oneshot(login_request("/api/auth/login", "127.0.0.1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "Too many login attempts");
    assert_eq!(json["success"], false);

    // Other clients keep their own budget.
    let response = app.router.clone().oneshot(login_request("/api/auth/login", "10.1.1.1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_staff_login_shares_the_budget() {
    let app = limited_app().await;
    for _ in 0..3 {
        let response = app.router.clone().oneshot(login_request("/api/auth/login", "127.0.0.3")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
    for _ in 0..2 {
        let response = app
            .router
            .clone()
            .oneshot(login_request("/api/auth/staff-login", "127.0.0.3"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
    let response = app
        .router
        .clone()
        .oneshot(login_request("/api/auth/staff-login", "127.0.0.3"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test(start_paused = true)]
async fn test_login_rate_limit_reset() {
    let app = limited_app().await;
    // 5 allowed attempts
    for _ in 0..5 {
        let response = app.router.clone().oneshot(login_request("/api/auth/login", "127.0.0.2")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
    // 6th attempt should be rate limited
    let response = app.router.clone().oneshot(login_request("/api/auth/login", "127.0.0.2")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    // Let the window expire
    tokio::time::advance(std::time::Duration::from_secs(61)).await;
    // Still unauthorized, but not rate limited
    let response = app.router.clone().oneshot(login_request("/api/auth/login", "127.0.0.2")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
