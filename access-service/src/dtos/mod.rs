pub mod api_key;
pub mod auth;
pub mod home;
pub mod location;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Shape of every error body (see `service_core::error::AppError`).
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "Unauthorized")]
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
