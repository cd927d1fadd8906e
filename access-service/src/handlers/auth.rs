use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::{
    dtos::{
        auth::{LoginRequest, RegisterRequest, RegisterResponse, TokenResponse},
        ErrorResponse,
    },
    utils::{Secret, ValidatedJson},
    AppState,
};

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = RegisterResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .auth_service
        .register(req.email, Secret::new(req.password))
        .await?;

    Ok((StatusCode::CREATED, Json(RegisterResponse::from(user))))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let issued = state
        .auth_service
        .login(&req.email, Secret::new(req.password))
        .await?;

    Ok(Json(TokenResponse {
        token: issued.token,
        token_type: "Bearer".to_string(),
        expires_in: issued.expires_in,
    }))
}
