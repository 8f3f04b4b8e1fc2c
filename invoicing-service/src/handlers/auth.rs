use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::{
    dtos::{
        auth::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, UserResponse},
        MessageResponse,
    },
    middleware::AuthUser,
    utils::{password::Password, ValidatedJson},
    AppState,
};

pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .auth
        .register(&req.name, &req.email, &Password::new(req.password))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User created successfully".to_string(),
            user: UserResponse::from(&user),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = state
        .auth
        .login(&req.email, &Password::new(req.password))
        .await?;

    Ok(Json(LoginResponse {
        token: session.token,
        token_type: "Bearer",
        expires_in: state.jwt.expiry_seconds(),
        user: UserResponse::from(&session.user),
    }))
}

/// Tokens are stateless; the client discards its copy.
pub async fn logout(user: AuthUser) -> impl IntoResponse {
    tracing::info!(user_id = %user.user_id(), "User logged out");
    Json(MessageResponse::new("Logged out successfully"))
}
