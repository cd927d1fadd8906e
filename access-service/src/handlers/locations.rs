use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use service_core::error::AppError;

use super::parse_id;
use crate::{
    dtos::{location::CreateLocationRequest, ErrorResponse},
    middleware::HomeAccess,
    models::Location,
    utils::ValidatedJson,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct LocationPath {
    location_id: String,
}

#[utoipa::path(
    get,
    path = "/api/v1/homes/{home_id}/locations",
    params(("home_id" = uuid::Uuid, Path, description = "Home ID")),
    responses(
        (status = 200, description = "Locations in the home", body = [Location]),
        (status = 403, description = "Not a member", body = ErrorResponse)
    ),
    security(("bearer_auth" = []), ("api_key" = [])),
    tag = "Locations"
)]
pub async fn list_locations(
    State(state): State<AppState>,
    access: HomeAccess,
) -> Result<Json<Vec<Location>>, AppError> {
    Ok(Json(state.locations.list_locations(access.home_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/homes/{home_id}/locations",
    params(("home_id" = uuid::Uuid, Path, description = "Home ID")),
    request_body = CreateLocationRequest,
    responses(
        (status = 201, description = "Location created", body = Location),
        (status = 403, description = "Not a member", body = ErrorResponse),
        (status = 404, description = "Parent location not in this home", body = ErrorResponse)
    ),
    security(("bearer_auth" = []), ("api_key" = [])),
    tag = "Locations"
)]
pub async fn create_location(
    State(state): State<AppState>,
    access: HomeAccess,
    ValidatedJson(req): ValidatedJson<CreateLocationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let location = state
        .locations
        .create_location(
            access.home_id,
            req.name,
            req.location_type,
            req.parent_location_id,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(location)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/homes/{home_id}/locations/{location_id}",
    params(
        ("home_id" = uuid::Uuid, Path, description = "Home ID"),
        ("location_id" = uuid::Uuid, Path, description = "Location ID")
    ),
    responses(
        (status = 204, description = "Location deleted"),
        (status = 403, description = "Not a member", body = ErrorResponse),
        (status = 404, description = "Location not in this home", body = ErrorResponse),
        (status = 409, description = "Location has children or items", body = ErrorResponse)
    ),
    security(("bearer_auth" = []), ("api_key" = [])),
    tag = "Locations"
)]
pub async fn delete_location(
    State(state): State<AppState>,
    access: HomeAccess,
    Path(path): Path<LocationPath>,
) -> Result<StatusCode, AppError> {
    let location_id = parse_id(&path.location_id, "location")?;
    state
        .locations
        .delete_location(access.home_id, location_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
