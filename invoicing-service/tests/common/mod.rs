//! Test helpers for invoicing-service integration tests.
//!
//! The router is built over in-memory repositories and driven in-process
//! with `oneshot`, so no network or database is needed.

#![allow(dead_code)]

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use invoicing_service::{build_router, config::InvoicingConfig, AppState, Repositories};
use serde_json::{json, Value};
use tower::util::ServiceExt;

pub const TEST_PASSWORD: &str = "secret123";

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("Response body is not JSON")
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub fn spawn() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: InvoicingConfig) -> Self {
        Self::with_repositories(config, Repositories::memory())
    }

    pub fn with_repositories(config: InvoicingConfig, repos: Repositories) -> Self {
        let state = AppState::new(config, repos);
        let router = build_router(state.clone());
        Self { router, state }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-forwarded-for", "10.0.0.1");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes();

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> TestResponse {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    pub async fn register(&self, name: &str, email: &str) -> TestResponse {
        self.post(
            "/api/register",
            None,
            json!({ "name": name, "email": email, "password": TEST_PASSWORD }),
        )
        .await
    }

    /// Register a fresh account and return its bearer token.
    pub async fn signed_in(&self, name: &str, email: &str) -> String {
        let registered = self.register(name, email).await;
        assert_eq!(registered.status, StatusCode::CREATED);

        let login = self
            .post(
                "/api/login",
                None,
                json!({ "email": email, "password": TEST_PASSWORD }),
            )
            .await;
        assert_eq!(login.status, StatusCode::OK);
        login.json()["token"].as_str().unwrap().to_string()
    }

    pub async fn add_item(&self, token: &str, name: &str, quantity: u32, rate: Value) -> Value {
        let response = self
            .post(
                "/api/items",
                Some(token),
                json!({ "name": name, "quantity": quantity, "rate": rate }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        response.json()
    }
}

/// Dev configuration with limits high enough not to interfere.
pub fn test_config() -> InvoicingConfig {
    let mut config = InvoicingConfig::default();
    config.service_name = "invoicing-service-test".to_string();
    config.log_level = "error".to_string();
    config.jwt.secret = "integration-test-secret".to_string();
    config.rate_limit.login_attempts = 1000;
    config.rate_limit.register_attempts = 1000;
    config
}

/// Decimal fields serialize as strings; compare them numerically.
pub fn amount(value: &Value) -> f64 {
    match value {
        Value::String(s) => s.parse().unwrap(),
        Value::Number(n) => n.as_f64().unwrap(),
        other => panic!("not an amount: {}", other),
    }
}
