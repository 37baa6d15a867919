mod common;

use std::net::SocketAddr;

use axum::http::StatusCode;
use common::{TestApp, build_request, into_json, test_config};
use serde_json::json;

async fn rate_limited_app() -> TestApp {
    let (mut config, clock) = test_config().await;
    config.rate_limit = true;
    TestApp::from_config(config, clock)
}

fn bad_login() -> Option<serde_json::Value> {
    Some(json!({ "email": "nobody@x.com", "password": "pw" }))
}

#[tokio::test]
async fn test_login_is_rate_limited_per_ip() {
    let app = rate_limited_app().await;
    let attacker = SocketAddr::from(([10, 0, 0, 1], 40000));
    let bystander = SocketAddr::from(([10, 0, 0, 2], 40000));

    for _ in 0..5 {
        let response = app
            .send(build_request("POST", "/auth/login", None, bad_login(), Some(attacker)))
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let response = app
        .send(build_request("POST", "/auth/login", None, bad_login(), Some(attacker)))
        .await;
    let (status, body) = into_json(response).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(body["error"].as_str().unwrap().contains("Too many"));

    let response = app
        .send(build_request("POST", "/auth/login", None, bad_login(), Some(bystander)))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_signup_is_rate_limited() {
    let app = rate_limited_app().await;
    let peer = SocketAddr::from(([10, 0, 0, 3], 40000));

    for i in 0..3 {
        let body = Some(json!({ "email": format!("user{i}@x.com"), "password": "pw" }));
        let response = app
            .send(build_request("POST", "/auth/signup", None, body, Some(peer)))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let body = Some(json!({ "email": "user4@x.com", "password": "pw" }));
    let response = app
        .send(build_request("POST", "/auth/signup", None, body, Some(peer)))
        .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_requests_without_peer_address_are_not_limited() {
    let app = rate_limited_app().await;

    for _ in 0..10 {
        let (status, _) = app
            .request("POST", "/auth/login", None, bad_login())
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_protected_routes_are_not_limited() {
    let app = rate_limited_app().await;
    let peer = SocketAddr::from(([10, 0, 0, 4], 40000));

    for _ in 0..10 {
        let response = app
            .send(build_request("GET", "/auth/verify-token", None, None, Some(peer)))
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
