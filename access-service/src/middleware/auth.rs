//! Identity resolution for protected routes.
//!
//! A bearer token is tried first. If it is missing or fails verification the
//! `X-API-Key` header is tried next, so an invalid token does not stop a
//! valid key from authenticating the request. Only when neither succeeds is
//! the request rejected with 401.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    services::metrics,
    utils::Secret,
    AppState,
};

pub const API_KEY_HEADER: &str = "x-api-key";

/// Which credential authenticated the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialScheme {
    BearerToken,
    ApiKey { key_id: Uuid },
}

/// The authenticated caller, valid for one request only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub user_id: Uuid,
    pub scheme: CredentialScheme,
}

/// Middleware to require an authenticated identity.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let principal = resolve_principal(&state, req.headers())
        .await?
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Unauthorized")))?;

    tracing::debug!(user_id = %principal.user_id, scheme = ?principal.scheme, "Request authenticated");

    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

/// Run both credential paths in order. `Ok(None)` means unauthenticated; an
/// error means the store could not answer.
pub async fn resolve_principal(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Option<Principal>, AppError> {
    if let Some(token) = bearer_token(headers) {
        match state.tokens.verify(token) {
            Ok(user_id) => {
                metrics::record_auth_attempt("bearer", "success");
                return Ok(Some(Principal {
                    user_id,
                    scheme: CredentialScheme::BearerToken,
                }));
            }
            Err(_) => metrics::record_auth_attempt("bearer", "rejected"),
        }
    }

    if let Some(raw_key) = api_key(headers) {
        match state.api_keys.validate(&raw_key).await {
            Ok(Some(identity)) => {
                metrics::record_auth_attempt("api_key", "success");
                return Ok(Some(Principal {
                    user_id: identity.owner.id,
                    scheme: CredentialScheme::ApiKey {
                        key_id: identity.key_id,
                    },
                }));
            }
            Ok(None) => metrics::record_auth_attempt("api_key", "rejected"),
            Err(e) => {
                metrics::record_auth_attempt("api_key", "error");
                tracing::error!(error = %e, "API key validation failed");
                return Err(e.into());
            }
        }
    }

    Ok(None)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn api_key(headers: &HeaderMap) -> Option<Secret> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(Secret::new)
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Principal>().cloned().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "Principal missing from request extensions"
            ))
        })
    }
}
