use service_core::error::AppError;
use thiserror::Error;

use super::store::StoreError;

#[derive(Error, Debug)]
pub enum ServiceError {
    /// Bad password, bad or expired token, or a key that matched nothing.
    /// Always surfaced with the same message.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Forbidden")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Store(anyhow::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(what) => ServiceError::Conflict(format!("{} already exists", what)),
            StoreError::Backend(e) => ServiceError::Store(e),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidCredentials => {
                AppError::Unauthorized(anyhow::anyhow!("Invalid credentials"))
            }
            ServiceError::Forbidden => AppError::Forbidden(anyhow::anyhow!("Forbidden")),
            ServiceError::NotFound(what) => AppError::NotFound(anyhow::anyhow!("{} not found", what)),
            ServiceError::Conflict(msg) => AppError::Conflict(anyhow::anyhow!(msg)),
            ServiceError::Validation(msg) => AppError::BadRequest(anyhow::anyhow!(msg)),
            ServiceError::Store(e) => AppError::DatabaseError(e),
            ServiceError::Internal(e) => AppError::InternalError(e),
        }
    }
}
