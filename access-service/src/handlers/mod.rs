pub mod api_keys;
pub mod auth;
pub mod homes;
pub mod locations;
pub mod metrics;

use service_core::error::AppError;
use uuid::Uuid;

/// Parse a path identifier, answering 400 with a JSON body when malformed.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest(anyhow::anyhow!("Invalid {} ID", what)))
}
