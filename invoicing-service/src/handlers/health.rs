use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::AppState;

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": state.config.service_name,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Ready once every storage backend answers.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let checks = [
        ("users", state.auth.health_check().await),
        ("invoices", state.invoices.health_check().await),
        ("drafts", state.drafts.health_check().await),
    ];

    let mut ready = true;
    let mut report = serde_json::Map::new();
    for (name, result) in checks {
        let status = match result {
            Ok(()) => "up",
            Err(e) => {
                tracing::warn!(check = name, error = %e, "Readiness check failed");
                ready = false;
                "down"
            }
        };
        report.insert(name.to_string(), json!(status));
    }

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(json!({
            "status": if ready { "ready" } else { "unavailable" },
            "checks": report,
        })),
    )
}
