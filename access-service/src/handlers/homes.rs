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
    dtos::{
        home::{
            AccessResponse, CreateHomeResponse, HomeRequest, InviteMemberRequest,
            UpdateMemberRoleRequest,
        },
        ErrorResponse,
    },
    middleware::{HomeAccess, Principal},
    models::{Home, HomeMember},
    utils::ValidatedJson,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct MemberPath {
    user_id: String,
}

/// Create a home owned by the caller
#[utoipa::path(
    post,
    path = "/api/v1/homes",
    request_body = HomeRequest,
    responses(
        (status = 201, description = "Home created with the caller as owner", body = CreateHomeResponse),
        (status = 401, description = "Unauthenticated", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []), ("api_key" = [])),
    tag = "Homes"
)]
pub async fn create_home(
    State(state): State<AppState>,
    principal: Principal,
    ValidatedJson(req): ValidatedJson<HomeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let created = state.homes.create_home(req.name, principal.user_id).await?;
    Ok((StatusCode::CREATED, Json(CreateHomeResponse::from(created))))
}

/// Homes the caller belongs to
#[utoipa::path(
    get,
    path = "/api/v1/homes",
    responses(
        (status = 200, description = "Homes with a membership for the caller", body = [Home]),
        (status = 401, description = "Unauthenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = []), ("api_key" = [])),
    tag = "Homes"
)]
pub async fn list_homes(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<Vec<Home>>, AppError> {
    Ok(Json(state.homes.list_homes(principal.user_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/homes/{home_id}",
    params(("home_id" = uuid::Uuid, Path, description = "Home ID")),
    responses(
        (status = 200, description = "Home", body = Home),
        (status = 403, description = "Not a member", body = ErrorResponse)
    ),
    security(("bearer_auth" = []), ("api_key" = [])),
    tag = "Homes"
)]
pub async fn get_home(
    State(state): State<AppState>,
    access: HomeAccess,
) -> Result<Json<Home>, AppError> {
    Ok(Json(state.homes.get_home(access.home_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/homes/{home_id}",
    params(("home_id" = uuid::Uuid, Path, description = "Home ID")),
    request_body = HomeRequest,
    responses(
        (status = 200, description = "Home renamed", body = Home),
        (status = 403, description = "Not a member", body = ErrorResponse)
    ),
    security(("bearer_auth" = []), ("api_key" = [])),
    tag = "Homes"
)]
pub async fn update_home(
    State(state): State<AppState>,
    access: HomeAccess,
    ValidatedJson(req): ValidatedJson<HomeRequest>,
) -> Result<Json<Home>, AppError> {
    Ok(Json(state.homes.update_home(access.home_id, req.name).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/homes/{home_id}",
    params(("home_id" = uuid::Uuid, Path, description = "Home ID")),
    responses(
        (status = 204, description = "Home deleted"),
        (status = 403, description = "Not a member", body = ErrorResponse)
    ),
    security(("bearer_auth" = []), ("api_key" = [])),
    tag = "Homes"
)]
pub async fn delete_home(
    State(state): State<AppState>,
    access: HomeAccess,
) -> Result<StatusCode, AppError> {
    state.homes.delete_home(access.home_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The caller's principal and role in this home
#[utoipa::path(
    get,
    path = "/api/v1/homes/{home_id}/access",
    params(("home_id" = uuid::Uuid, Path, description = "Home ID")),
    responses(
        (status = 200, description = "Caller's access", body = AccessResponse),
        (status = 401, description = "Unauthenticated", body = ErrorResponse),
        (status = 403, description = "Not a member", body = ErrorResponse)
    ),
    security(("bearer_auth" = []), ("api_key" = [])),
    tag = "Homes"
)]
pub async fn get_access(access: HomeAccess) -> Json<AccessResponse> {
    Json(AccessResponse::from(access))
}

#[utoipa::path(
    get,
    path = "/api/v1/homes/{home_id}/users",
    params(("home_id" = uuid::Uuid, Path, description = "Home ID")),
    responses(
        (status = 200, description = "Membership edges", body = [HomeMember]),
        (status = 403, description = "Not a member", body = ErrorResponse)
    ),
    security(("bearer_auth" = []), ("api_key" = [])),
    tag = "Members"
)]
pub async fn list_members(
    State(state): State<AppState>,
    access: HomeAccess,
) -> Result<Json<Vec<HomeMember>>, AppError> {
    Ok(Json(state.homes.list_members(access.home_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/homes/{home_id}/users/invite",
    params(("home_id" = uuid::Uuid, Path, description = "Home ID")),
    request_body = InviteMemberRequest,
    responses(
        (status = 201, description = "Member added", body = HomeMember),
        (status = 403, description = "Not a member", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Already a member", body = ErrorResponse)
    ),
    security(("bearer_auth" = []), ("api_key" = [])),
    tag = "Members"
)]
pub async fn invite_member(
    State(state): State<AppState>,
    access: HomeAccess,
    ValidatedJson(req): ValidatedJson<InviteMemberRequest>,
) -> Result<impl IntoResponse, AppError> {
    let member = state
        .homes
        .invite_member(access.home_id, req.user_id, req.role)
        .await?;
    Ok((StatusCode::CREATED, Json(member)))
}

#[utoipa::path(
    put,
    path = "/api/v1/homes/{home_id}/users/{user_id}",
    params(
        ("home_id" = uuid::Uuid, Path, description = "Home ID"),
        ("user_id" = uuid::Uuid, Path, description = "Member user ID")
    ),
    request_body = UpdateMemberRoleRequest,
    responses(
        (status = 204, description = "Role updated"),
        (status = 403, description = "Not a member", body = ErrorResponse),
        (status = 404, description = "Membership not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []), ("api_key" = [])),
    tag = "Members"
)]
pub async fn update_member_role(
    State(state): State<AppState>,
    access: HomeAccess,
    Path(path): Path<MemberPath>,
    ValidatedJson(req): ValidatedJson<UpdateMemberRoleRequest>,
) -> Result<StatusCode, AppError> {
    let user_id = parse_id(&path.user_id, "user")?;
    state
        .homes
        .update_member_role(access.home_id, user_id, req.role)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/api/v1/homes/{home_id}/users/{user_id}",
    params(
        ("home_id" = uuid::Uuid, Path, description = "Home ID"),
        ("user_id" = uuid::Uuid, Path, description = "Member user ID")
    ),
    responses(
        (status = 204, description = "Member removed"),
        (status = 403, description = "Not a member", body = ErrorResponse),
        (status = 404, description = "Membership not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []), ("api_key" = [])),
    tag = "Members"
)]
pub async fn remove_member(
    State(state): State<AppState>,
    access: HomeAccess,
    Path(path): Path<MemberPath>,
) -> Result<StatusCode, AppError> {
    let user_id = parse_id(&path.user_id, "user")?;
    state.homes.remove_member(access.home_id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
