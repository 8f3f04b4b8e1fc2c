mod common;

use axum::http::StatusCode;
use common::{amount, TestApp};
use serde_json::json;

#[tokio::test]
async fn draft_starts_empty() {
    let app = TestApp::spawn();
    let token = app.signed_in("Asha", "asha@example.com").await;

    let response = app.get("/api/items", Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["items"].as_array().unwrap().len(), 0);
    assert_eq!(amount(&body["totals"]["grand_total"]), 0.0);
}

#[tokio::test]
async fn adding_items_keeps_totals_in_step() {
    let app = TestApp::spawn();
    let token = app.signed_in("Asha", "asha@example.com").await;

    let after_pen = app.add_item(&token, "Pen", 3, json!(10)).await;
    let pen = &after_pen["items"][0];
    assert_eq!(pen["name"], "Pen");
    assert_eq!(amount(&pen["line_total"]), 30.0);
    assert_eq!(amount(&pen["line_tax"]), 5.4);

    let body = app.add_item(&token, "Notebook", 2, json!("50")).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
    assert_eq!(amount(&body["totals"]["subtotal"]), 130.0);
    assert_eq!(amount(&body["totals"]["total_tax"]), 23.4);
    assert_eq!(amount(&body["totals"]["grand_total"]), 153.4);

    let listed = app.get("/api/items", Some(&token)).await.json();
    assert_eq!(listed, body);
}

#[tokio::test]
async fn invalid_items_are_rejected_without_changes() {
    let app = TestApp::spawn();
    let token = app.signed_in("Asha", "asha@example.com").await;
    let before = app.add_item(&token, "Pen", 3, json!(10)).await;

    for bad in [
        json!({ "name": "   ", "quantity": 1, "rate": 5 }),
        json!({ "name": "Cup", "quantity": 0, "rate": 5 }),
        json!({ "name": "Cup", "quantity": 1, "rate": 0 }),
        json!({ "name": "Cup", "quantity": 1, "rate": -2 }),
    ] {
        let response = app.post("/api/items", Some(&token), bad).await;
        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    let after = app.get("/api/items", Some(&token)).await.json();
    assert_eq!(after, before);
}

#[tokio::test]
async fn amounts_beyond_decimal_range_are_rejected() {
    let app = TestApp::spawn();
    let token = app.signed_in("Asha", "asha@example.com").await;

    let response = app
        .post(
            "/api/items",
            Some(&token),
            json!({ "name": "Ore", "quantity": 4000000000u32, "rate": "100000000000000000000" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let huge = json!("50000000000000000000000000000");
    let before = app.add_item(&token, "Gold", 1, huge.clone()).await;
    let response = app
        .post(
            "/api/items",
            Some(&token),
            json!({ "name": "Gold", "quantity": 1, "rate": huge }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let after = app.get("/api/items", Some(&token)).await.json();
    assert_eq!(after, before);
    assert_eq!(after["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn update_and_remove_recompute_totals() {
    let app = TestApp::spawn();
    let token = app.signed_in("Asha", "asha@example.com").await;
    let body = app.add_item(&token, "Pen", 3, json!(10)).await;
    let id = body["items"][0]["id"].as_str().unwrap().to_string();

    let updated = app
        .put(
            &format!("/api/items/{}", id),
            &token,
            json!({ "quantity": 5, "rate": 20 }),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    let updated = updated.json();
    assert_eq!(updated["items"][0]["quantity"], 5);
    assert_eq!(amount(&updated["totals"]["subtotal"]), 100.0);
    assert_eq!(amount(&updated["totals"]["grand_total"]), 118.0);

    let removed = app.delete(&format!("/api/items/{}", id), &token).await;
    assert_eq!(removed.status, StatusCode::OK);
    let removed = removed.json();
    assert!(removed["items"].as_array().unwrap().is_empty());
    assert_eq!(amount(&removed["totals"]["total_tax"]), 0.0);
}

#[tokio::test]
async fn unknown_ids_are_no_ops() {
    let app = TestApp::spawn();
    let token = app.signed_in("Asha", "asha@example.com").await;
    let before = app.add_item(&token, "Pen", 3, json!(10)).await;

    let removed = app.delete("/api/items/does-not-exist", &token).await;
    assert_eq!(removed.status, StatusCode::OK);
    assert_eq!(removed.json(), before);

    let updated = app
        .put(
            "/api/items/does-not-exist",
            &token,
            json!({ "quantity": 9, "rate": 9 }),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.json(), before);
}

#[tokio::test]
async fn clear_empties_the_draft() {
    let app = TestApp::spawn();
    let token = app.signed_in("Asha", "asha@example.com").await;
    app.add_item(&token, "Pen", 3, json!(10)).await;
    app.add_item(&token, "Cup", 1, json!(99.5)).await;

    let cleared = app.delete("/api/items", &token).await;
    assert_eq!(cleared.status, StatusCode::OK);
    let body = cleared.json();
    assert!(body["items"].as_array().unwrap().is_empty());
    assert_eq!(amount(&body["totals"]["subtotal"]), 0.0);
    assert_eq!(amount(&body["totals"]["grand_total"]), 0.0);
}

#[tokio::test]
async fn drafts_are_private_to_each_user() {
    let app = TestApp::spawn();
    let asha = app.signed_in("Asha", "asha@example.com").await;
    let ravi = app.signed_in("Ravi", "ravi@example.com").await;

    app.add_item(&asha, "Pen", 3, json!(10)).await;

    let ravis = app.get("/api/items", Some(&ravi)).await.json();
    assert!(ravis["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn draft_preview_uses_caller_and_formatted_amounts() {
    let app = TestApp::spawn();
    let token = app.signed_in("Asha", "asha@example.com").await;
    app.add_item(&token, "Pen", 3, json!(10)).await;

    let response = app.get("/api/items/preview", Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
    let preview = response.json();
    assert_eq!(preview["invoice_number"], "DRAFT");
    assert_eq!(preview["issuer_name"], "Asha");
    assert_eq!(preview["issuer_email"], "asha@example.com");
    assert_eq!(preview["rows"][0]["amount"], "Rs. 30.00");
    assert_eq!(preview["tax_label"], "GST (18%)");
    assert_eq!(preview["tax"], "Rs. 5.40");
    assert_eq!(preview["grand_total"], "Rs. 35.40");
}

#[tokio::test]
async fn items_require_authentication() {
    let app = TestApp::spawn();
    let response = app.get("/api/items", None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}
