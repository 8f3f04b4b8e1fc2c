mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn health_reports_service_name() {
    let app = TestApp::spawn();

    let response = app.get("/health", None).await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "invoicing-service-test");
}

#[tokio::test]
async fn ready_when_backends_answer() {
    let app = TestApp::spawn();

    let response = app.get("/ready", None).await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["checks"]["users"], "up");
    assert_eq!(body["checks"]["invoices"], "up");
    assert_eq!(body["checks"]["drafts"], "up");
}

#[tokio::test]
async fn metrics_expose_request_and_invoice_counters() {
    let app = TestApp::spawn();
    let token = app.signed_in("Asha", "asha@example.com").await;
    app.add_item(&token, "Pen", 1, json!(1)).await;
    app.post("/api/invoices", Some(&token), json!({})).await;

    let response = app.get("/metrics", None).await;
    assert_eq!(response.status, StatusCode::OK);
    let text = String::from_utf8(response.body.to_vec()).unwrap();
    assert!(text.contains("invoicing_http_requests_total"));
    assert!(text.contains("invoicing_invoices_created_total"));
    assert!(text.contains("invoicing_draft_mutations_total"));
}

#[tokio::test]
async fn responses_carry_request_id_and_security_headers() {
    let app = TestApp::spawn();

    let response = app.get("/health", None).await;
    assert!(response.headers.contains_key("x-request-id"));
    assert!(response.headers.contains_key("x-content-type-options"));
}
