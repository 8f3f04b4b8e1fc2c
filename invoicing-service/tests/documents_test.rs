mod common;

use axum::http::{header, StatusCode};
use common::TestApp;
use serde_json::{json, Value};

async fn finalized_invoice(app: &TestApp, token: &str, items: &[(&str, u32, Value)]) -> Value {
    for (name, quantity, rate) in items {
        app.add_item(token, name, *quantity, rate.clone()).await;
    }
    let created = app.post("/api/invoices", Some(token), json!({})).await;
    assert_eq!(created.status, StatusCode::CREATED);
    created.json()["invoice"].clone()
}

#[tokio::test]
async fn pdf_download_is_an_attachment_named_after_the_invoice() {
    let app = TestApp::spawn();
    let token = app.signed_in("Asha", "asha@example.com").await;
    let invoice = finalized_invoice(&app, &token, &[("Pen", 3, json!(10))]).await;
    let id = invoice["id"].as_str().unwrap();
    let number = invoice["invoice_number"].as_str().unwrap();

    let response = app
        .get(&format!("/api/invoices/{}/pdf", id), Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.headers[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        response.headers[header::CONTENT_DISPOSITION],
        format!("attachment; filename=\"invoice-{}.pdf\"", number).as_str()
    );
    assert!(response.body.starts_with(b"%PDF"));
}

#[tokio::test]
async fn rendering_the_same_invoice_twice_is_identical() {
    let app = TestApp::spawn();
    let token = app.signed_in("Asha", "asha@example.com").await;
    let invoice = finalized_invoice(
        &app,
        &token,
        &[("Pen", 3, json!(10)), ("Notebook", 2, json!(50))],
    )
    .await;
    let uri = format!("/api/invoices/{}/pdf", invoice["id"].as_str().unwrap());

    let first = app.get(&uri, Some(&token)).await;
    let second = app.get(&uri, Some(&token)).await;
    assert_eq!(
        first.headers["x-content-hash"],
        second.headers["x-content-hash"]
    );
}

#[tokio::test]
async fn preview_matches_stored_totals() {
    let app = TestApp::spawn();
    let token = app.signed_in("Asha", "asha@example.com").await;
    let invoice = finalized_invoice(
        &app,
        &token,
        &[("Pen", 3, json!(10)), ("Notebook", 2, json!(50))],
    )
    .await;

    let response = app
        .get(
            &format!("/api/invoices/{}/preview", invoice["id"].as_str().unwrap()),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let preview = response.json();
    assert_eq!(preview["invoice_number"], invoice["invoice_number"]);
    assert_eq!(preview["rows"].as_array().unwrap().len(), 2);
    assert_eq!(preview["rows"][1]["name"], "Notebook");
    assert_eq!(preview["rows"][1]["rate"], "Rs. 50.00");
    assert_eq!(preview["subtotal"], "Rs. 130.00");
    assert_eq!(preview["tax"], "Rs. 23.40");
    assert_eq!(preview["grand_total"], "Rs. 153.40");
    assert_eq!(preview["issuer_name"], "Asha");
}

#[tokio::test]
async fn whole_number_precision_is_configurable() {
    let mut config = common::test_config();
    config.document.amount_precision = 0;
    let app = TestApp::with_config(config);
    let token = app.signed_in("Asha", "asha@example.com").await;
    let invoice = finalized_invoice(&app, &token, &[("Pen", 3, json!(10))]).await;

    let preview = app
        .get(
            &format!("/api/invoices/{}/preview", invoice["id"].as_str().unwrap()),
            Some(&token),
        )
        .await
        .json();
    assert_eq!(preview["subtotal"], "Rs. 30");
    assert_eq!(preview["tax"], "Rs. 5");
    assert_eq!(preview["grand_total"], "Rs. 35");
}

#[tokio::test]
async fn long_invoices_still_render() {
    let app = TestApp::spawn();
    let token = app.signed_in("Asha", "asha@example.com").await;
    let items: Vec<(&str, u32, Value)> = (0..60).map(|_| ("Widget", 1, json!(2.5))).collect();
    let invoice = finalized_invoice(&app, &token, &items).await;

    let response = app
        .get(
            &format!("/api/invoices/{}/pdf", invoice["id"].as_str().unwrap()),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.starts_with(b"%PDF"));
}

#[tokio::test]
async fn unknown_invoice_is_not_found() {
    let app = TestApp::spawn();
    let token = app.signed_in("Asha", "asha@example.com").await;

    let response = app.get("/api/invoices/missing/pdf", Some(&token)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json()["error"], "Invoice not found");
}
