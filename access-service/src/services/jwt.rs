use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ServiceError;
use crate::config::JwtConfig;

/// Issues and verifies HS256 bearer tokens.
///
/// The signing key comes from [`JwtConfig`] at construction and is fixed for
/// the life of the value, so tests can run side by side with distinct keys.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry: Duration,
}

/// Claims carried by a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl TokenService {
    pub fn new(config: &JwtConfig) -> Result<Self, ServiceError> {
        let expiry = Duration::try_hours(config.token_expiry_hours).ok_or_else(|| {
            ServiceError::Internal(anyhow::anyhow!(
                "Token lifetime of {} hours is out of range",
                config.token_expiry_hours
            ))
        })?;
        let secret = config.secret.expose_secret().as_bytes();

        // Expiry is checked by hand against an explicit clock in `verify_at`;
        // the library only enforces the algorithm, the signature and that
        // `exp` and `sub` are present.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            expiry,
        })
    }

    /// Issue a token for `subject` expiring after the configured lifetime.
    pub fn issue(&self, subject: Uuid) -> Result<String, ServiceError> {
        self.issue_at(subject, Utc::now())
    }

    pub fn issue_at(&self, subject: Uuid, now: DateTime<Utc>) -> Result<String, ServiceError> {
        let expires_at = now.checked_add_signed(self.expiry).ok_or_else(|| {
            ServiceError::Internal(anyhow::anyhow!("Token expiry overflows the clock"))
        })?;
        let claims = TokenClaims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Failed to encode token: {}", e)))
    }

    /// Verify a token and return its subject.
    pub fn verify(&self, token: &str) -> Result<Uuid, ServiceError> {
        self.verify_at(token, Utc::now())
    }

    /// Every failure collapses into [`ServiceError::InvalidCredentials`]; the
    /// reason is only visible at debug level.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Uuid, ServiceError> {
        let data = decode::<TokenClaims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::debug!(reason = %e, "Bearer token rejected");
            ServiceError::InvalidCredentials
        })?;

        if now.timestamp() >= data.claims.exp {
            tracing::debug!(exp = data.claims.exp, "Bearer token expired");
            return Err(ServiceError::InvalidCredentials);
        }

        Uuid::parse_str(&data.claims.sub).map_err(|_| {
            tracing::debug!("Bearer token subject is not a user id");
            ServiceError::InvalidCredentials
        })
    }

    /// Token lifetime in seconds (for client info).
    pub fn expires_in_seconds(&self) -> i64 {
        self.expiry.num_seconds()
    }
}
