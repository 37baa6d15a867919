#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::ConnectInfo,
    http::{Request, StatusCode, header},
    response::Response,
};
use serde_json::Value;
use taskbook::{ServerConfig, clock::ManualClock, create_app, db::Database, wire::TokenPair};
use tower::ServiceExt;

pub const TEST_JWT_SECRET: &[u8] = b"test-jwt-secret-for-integration-tests";

/// Server configuration backed by an in-memory database and a manual clock.
pub async fn test_config() -> (ServerConfig, ManualClock) {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    let clock = ManualClock::starting_now();
    let config = ServerConfig {
        db,
        jwt_secret: TEST_JWT_SECRET.to_vec(),
        clock: Arc::new(clock.clone()),
        bcrypt_cost: 4 /* bcrypt minimum cost; bcrypt::MIN_COST is private */,
        cors_origins: Vec::new(),
        rate_limit: false,
    };
    (config, clock)
}

pub struct TestApp {
    pub router: Router,
    pub db: Database,
    pub clock: ManualClock,
}

impl TestApp {
    pub async fn new() -> Self {
        let (config, clock) = test_config().await;
        Self::from_config(config, clock)
    }

    pub fn from_config(config: ServerConfig, clock: ManualClock) -> Self {
        Self {
            router: create_app(&config),
            db: config.db,
            clock,
        }
    }

    /// Send a request and return the raw response.
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Send a JSON request, optionally authenticated, and decode the JSON response.
    /// Empty bodies decode to `Value::Null`.
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let response = self.send(build_request(method, uri, token, body, None)).await;
        into_json(response).await
    }

    pub async fn signup(&self, email: &str, password: &str) -> TokenPair {
        let (status, body) = self
            .request(
                "POST",
                "/auth/signup",
                None,
                Some(serde_json::json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "signup failed: {body}");
        serde_json::from_value(body).unwrap()
    }

    pub async fn create_todo(&self, token: &str, title: &str) -> Value {
        let (status, body) = self
            .request(
                "POST",
                "/todos",
                Some(token),
                Some(serde_json::json!({ "title": title })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
        body
    }
}

pub fn build_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
    peer: Option<SocketAddr>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    if let Some(peer) = peer {
        builder = builder.extension(ConnectInfo(peer));
    }

    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).unwrap()
}

pub async fn into_json(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}
