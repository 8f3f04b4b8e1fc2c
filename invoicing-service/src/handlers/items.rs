use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use service_core::error::AppError;

use crate::{
    dtos::items::{AddItemRequest, UpdateItemRequest},
    middleware::AuthUser,
    models::{NewLineItem, Pricing},
    render::RenderRequest,
    utils::ValidatedJson,
    AppState,
};

pub async fn list_items(State(state): State<AppState>, user: AuthUser) -> impl IntoResponse {
    Json(state.drafts.view(user.user_id()).await)
}

pub async fn add_item(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<AddItemRequest>,
) -> Result<impl IntoResponse, AppError> {
    let input = NewLineItem::parse(&req.name, req.quantity, req.rate)?;
    Ok(Json(state.drafts.add(user.user_id(), input).await?))
}

/// Unknown ids leave the draft untouched and still answer with its state.
pub async fn update_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(item_id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateItemRequest>,
) -> Result<impl IntoResponse, AppError> {
    let pricing = Pricing::parse(req.quantity, req.rate)?;
    Ok(Json(
        state.drafts.update(user.user_id(), &item_id, pricing).await?,
    ))
}

pub async fn remove_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(item_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.drafts.remove(user.user_id(), &item_id).await?))
}

pub async fn clear_items(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.drafts.clear(user.user_id()).await?))
}

/// On-screen preview of the draft, issued by the caller and dated today.
pub async fn preview_items(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let issuer = state.auth.current_user(user.user_id()).await?.issuer();
    let draft = state.drafts.view(user.user_id()).await;
    let request = RenderRequest::for_draft(draft, issuer, Utc::now().date_naive());
    Ok(Json(state.renderer.preview(&request)))
}
