pub mod auth;
pub mod membership;

pub use auth::{auth_middleware, resolve_principal, CredentialScheme, Principal, API_KEY_HEADER};
pub use membership::{membership_middleware, HomeAccess};
