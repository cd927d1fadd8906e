pub mod secret;
pub mod validation;

pub use secret::{hash_secret, verify_secret, Secret, SecretHash};
pub use validation::ValidatedJson;
