//! Home-scoped authorization.
//!
//! Runs after [`auth_middleware`](super::auth_middleware) on every route that
//! carries a `:home_id` path segment. The membership edge is looked up on
//! every request; a missing edge is 403, a store failure 500.

use axum::{
    async_trait,
    extract::{FromRequestParts, Path, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use service_core::error::AppError;
use std::collections::HashMap;
use uuid::Uuid;

use super::Principal;
use crate::{
    models::HomeRole,
    services::{metrics, ServiceError},
    AppState,
};

/// A principal bound to the home addressed by the request, with its role.
#[derive(Debug, Clone, Serialize)]
pub struct HomeAccess {
    pub principal: Principal,
    pub home_id: Uuid,
    pub role: HomeRole,
}

pub async fn membership_middleware(
    State(state): State<AppState>,
    principal: Principal,
    Path(params): Path<HashMap<String, String>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let home_id = params
        .get("home_id")
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Invalid home ID")))?;

    let role = state
        .store
        .find_membership(home_id, principal.user_id)
        .await
        .map_err(|e| {
            metrics::record_membership_check("error");
            tracing::error!(error = %e, home_id = %home_id, "Membership lookup failed");
            AppError::from(ServiceError::from(e))
        })?;

    let Some(role) = role else {
        metrics::record_membership_check("denied");
        tracing::debug!(home_id = %home_id, user_id = %principal.user_id, "Not a member of home");
        return Err(ServiceError::Forbidden.into());
    };

    metrics::record_membership_check("granted");
    req.extensions_mut().insert(HomeAccess {
        principal,
        home_id,
        role,
    });

    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for HomeAccess
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<HomeAccess>().cloned().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "Home access missing from request extensions"
            ))
        })
    }
}
