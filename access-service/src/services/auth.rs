use std::sync::Arc;

use super::{store::Store, ServiceError, TokenService};
use crate::models::User;
use crate::utils::{hash_secret, verify_secret, Secret, SecretHash};

/// Bearer token handed out at login.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: i64,
}

/// Registration and password login.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, tokens: TokenService) -> Self {
        Self { store, tokens }
    }

    pub async fn register(&self, email: String, password: Secret) -> Result<User, ServiceError> {
        let email = normalize_email(&email);

        let hash = tokio::task::spawn_blocking(move || hash_secret(&password))
            .await
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Hashing task failed: {}", e)))??;

        let user = User::new(email, hash.into_string());
        self.store.insert_user(&user).await.map_err(|e| match ServiceError::from(e) {
            ServiceError::Conflict(_) => ServiceError::Conflict("Email already registered".to_string()),
            other => other,
        })?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: Secret) -> Result<IssuedToken, ServiceError> {
        let user = self
            .store
            .find_user_by_email(&normalize_email(email))
            .await?
            .ok_or_else(|| {
                tracing::debug!("Login for unknown email");
                ServiceError::InvalidCredentials
            })?;

        let stored = SecretHash::new(user.password_hash.as_str());
        let matched = tokio::task::spawn_blocking(move || verify_secret(&password, &stored))
            .await
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Verification task failed: {}", e)))?;

        if !matched {
            tracing::debug!(user_id = %user.id, "Login with wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        let token = self.tokens.issue(user.id)?;
        tracing::info!(user_id = %user.id, "User logged in");

        Ok(IssuedToken {
            token,
            expires_in: self.tokens.expires_in_seconds(),
        })
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
