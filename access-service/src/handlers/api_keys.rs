use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use super::parse_id;
use crate::{
    dtos::{
        api_key::{ApiKeyResponse, CreateApiKeyRequest, CreateApiKeyResponse},
        ErrorResponse,
    },
    middleware::Principal,
    utils::ValidatedJson,
    AppState,
};

/// List the caller's API keys
#[utoipa::path(
    get,
    path = "/api/v1/api-keys",
    responses(
        (status = 200, description = "Keys owned by the caller", body = [ApiKeyResponse]),
        (status = 401, description = "Unauthenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = []), ("api_key" = [])),
    tag = "API Keys"
)]
pub async fn list_api_keys(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<Vec<ApiKeyResponse>>, AppError> {
    let keys = state.api_keys.list(principal.user_id).await?;
    Ok(Json(keys.into_iter().map(ApiKeyResponse::from).collect()))
}

/// Generate an API key. The raw key is only ever returned here.
#[utoipa::path(
    post,
    path = "/api/v1/api-keys",
    request_body = CreateApiKeyRequest,
    responses(
        (status = 201, description = "Key created", body = CreateApiKeyResponse),
        (status = 401, description = "Unauthenticated", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []), ("api_key" = [])),
    tag = "API Keys"
)]
pub async fn create_api_key(
    State(state): State<AppState>,
    principal: Principal,
    ValidatedJson(req): ValidatedJson<CreateApiKeyRequest>,
) -> Result<impl IntoResponse, AppError> {
    let generated = state.api_keys.generate(principal.user_id, req.name).await?;

    let response = CreateApiKeyResponse {
        id: generated.record.id,
        name: generated.record.name,
        key: generated.raw_key.into_inner(),
        created_at: generated.record.created_at,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Revoke one of the caller's API keys
#[utoipa::path(
    delete,
    path = "/api/v1/api-keys/{api_key_id}",
    params(("api_key_id" = uuid::Uuid, Path, description = "API key ID")),
    responses(
        (status = 204, description = "Key revoked"),
        (status = 401, description = "Unauthenticated", body = ErrorResponse),
        (status = 404, description = "No active key with this ID for the caller", body = ErrorResponse)
    ),
    security(("bearer_auth" = []), ("api_key" = [])),
    tag = "API Keys"
)]
pub async fn revoke_api_key(
    State(state): State<AppState>,
    principal: Principal,
    Path(api_key_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let api_key_id = parse_id(&api_key_id, "API key")?;

    state.api_keys.revoke(api_key_id, principal.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
