//! Business logic for the access layer: credential hashing and issuance,
//! API keys, homes and locations, and the storage collaborator they share.

mod api_keys;
mod auth;
mod database;
pub mod error;
mod homes;
mod jwt;
mod locations;
mod memory;
pub mod metrics;
pub mod store;

pub use api_keys::{ApiKeyIdentity, ApiKeyService, GeneratedApiKey, API_KEY_BYTES};
pub use auth::{AuthService, IssuedToken};
pub use database::Database;
pub use error::ServiceError;
pub use homes::HomeService;
pub use jwt::{TokenClaims, TokenService};
pub use locations::LocationService;
pub use memory::MemoryStore;
pub use store::{Store, StoreError};
