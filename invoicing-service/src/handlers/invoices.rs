use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::invoices::{CreateInvoiceResponse, InvoiceResponse},
    middleware::AuthUser,
    render::RenderRequest,
    AppState,
};

/// Finalize the caller's draft into a stored invoice.
pub async fn create_invoice(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let record = state
        .invoices
        .finalize(&state.drafts, user.user_id())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateInvoiceResponse {
            message: "Invoice generated successfully".to_string(),
            invoice: InvoiceResponse::from(record),
        }),
    ))
}

pub async fn list_invoices(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let records = state.invoices.list_for_user(user.user_id()).await?;
    let invoices: Vec<InvoiceResponse> = records.into_iter().map(InvoiceResponse::from).collect();
    Ok(Json(invoices))
}

pub async fn download_invoice_pdf(
    State(state): State<AppState>,
    user: AuthUser,
    Path(invoice_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let request = render_request(&state, &user, &invoice_id).await?;

    let renderer = state.renderer.clone();
    let rendered = tokio::task::spawn_blocking(move || renderer.render_pdf(&request))
        .await
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Render task failed: {}", e)))??;

    let disposition = format!("attachment; filename=\"{}\"", rendered.file_name);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
            (
                header::HeaderName::from_static("x-content-hash"),
                rendered.content_hash,
            ),
        ],
        rendered.bytes,
    ))
}

pub async fn preview_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    Path(invoice_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let request = render_request(&state, &user, &invoice_id).await?;
    Ok(Json(state.renderer.preview(&request)))
}

async fn render_request(
    state: &AppState,
    user: &AuthUser,
    invoice_id: &str,
) -> Result<RenderRequest, AppError> {
    let record = state.invoices.get(user.user_id(), invoice_id).await?;
    let issuer = state.auth.current_user(user.user_id()).await?.issuer();
    Ok(RenderRequest::for_record(&record, issuer))
}
