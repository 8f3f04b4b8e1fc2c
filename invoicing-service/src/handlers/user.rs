use axum::{extract::State, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::{dtos::auth::UserResponse, middleware::AuthUser, AppState};

pub async fn get_user(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let user = state.auth.current_user(user.user_id()).await?;
    Ok(Json(UserResponse::from(&user)))
}
