mod common;

use axum::http::StatusCode;
use common::{TestApp, TEST_PASSWORD};
use serde_json::json;

#[tokio::test]
async fn register_then_login_returns_token_and_profile() {
    let app = TestApp::spawn();

    let registered = app.register("Asha Rao", "Asha@Example.com").await;
    assert_eq!(registered.status, StatusCode::CREATED);
    let body = registered.json();
    assert_eq!(body["message"], "User created successfully");
    assert_eq!(body["user"]["email"], "asha@example.com");
    assert!(body["user"].get("password_hash").is_none());

    let login = app
        .post(
            "/api/login",
            None,
            json!({ "email": "asha@example.com", "password": TEST_PASSWORD }),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    let body = login.json();
    assert!(body["token"].as_str().unwrap().len() > 20);
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["user"]["name"], "Asha Rao");
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let app = TestApp::spawn();
    assert_eq!(
        app.register("First", "dup@example.com").await.status,
        StatusCode::CREATED
    );

    let second = app.register("Second", "DUP@example.com").await;
    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_eq!(second.json()["error"], "User already exists");
}

#[tokio::test]
async fn invalid_registration_is_rejected_before_storage() {
    let app = TestApp::spawn();

    let response = app
        .post(
            "/api/register",
            None,
            json!({ "name": "Bad", "email": "not-an-email", "password": "secret123" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    let login = app
        .post(
            "/api/login",
            None,
            json!({ "email": "not-an-email", "password": "secret123" }),
        )
        .await;
    assert_eq!(login.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() {
    let app = TestApp::spawn();
    app.signed_in("Asha", "asha@example.com").await;

    let wrong_password = app
        .post(
            "/api/login",
            None,
            json!({ "email": "asha@example.com", "password": "nope-nope" }),
        )
        .await;
    let unknown = app
        .post(
            "/api/login",
            None,
            json!({ "email": "ghost@example.com", "password": "nope-nope" }),
        )
        .await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.json(), unknown.json());
    assert_eq!(unknown.json()["error"], "Invalid credentials");
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let app = TestApp::spawn();
    let response = app
        .request(
            axum::http::Method::POST,
            "/api/login",
            None,
            Some(json!("just a string")),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn current_user_requires_a_valid_token() {
    let app = TestApp::spawn();
    let token = app.signed_in("Asha", "asha@example.com").await;

    let me = app.get("/api/user", Some(&token)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.json()["email"], "asha@example.com");

    assert_eq!(
        app.get("/api/user", None).await.status,
        StatusCode::UNAUTHORIZED
    );
    let rejected = app.get("/api/user", Some("garbage")).await;
    assert_eq!(rejected.status, StatusCode::UNAUTHORIZED);
    assert_eq!(rejected.json()["error"], "Invalid token");
}

#[tokio::test]
async fn logout_is_acknowledged() {
    let app = TestApp::spawn();
    let token = app.signed_in("Asha", "asha@example.com").await;

    let response = app.post("/api/logout", Some(&token), json!({})).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["message"], "Logged out successfully");
}

#[tokio::test]
async fn login_is_rate_limited_per_ip() {
    let mut config = common::test_config();
    config.rate_limit.login_attempts = 2;
    let app = TestApp::with_config(config);

    let attempt = || {
        app.post(
            "/api/login",
            None,
            json!({ "email": "ghost@example.com", "password": "whatever" }),
        )
    };

    assert_eq!(attempt().await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(attempt().await.status, StatusCode::UNAUTHORIZED);

    let limited = attempt().await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert!(limited.headers.contains_key("retry-after"));
}
