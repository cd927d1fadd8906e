use secrecy::{ExposeSecret, SecretString};
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;

/// Minimum HS256 signing secret length, in bytes.
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Longest accepted bearer token lifetime (one year).
pub const MAX_TOKEN_EXPIRY_HOURS: i64 = 24 * 365;

#[derive(Debug, Clone)]
pub struct AccessConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: SecretString,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HS256 signing secret, fixed for the lifetime of the process.
    pub secret: SecretString,
    pub token_expiry_hours: i64,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

impl AccessConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        Self::from_lookup(common, |key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment: Environment = lookup("ENVIRONMENT")
            .unwrap_or_else(|| "dev".to_string())
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;
        let get = |key: &str, default: Option<&str>| get_var(&lookup, key, default, is_prod);

        let config = AccessConfig {
            common,
            environment: environment.clone(),
            service_name: get("SERVICE_NAME", Some("access-service"))?,
            service_version: get("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")))?,
            log_level: get("LOG_LEVEL", Some("info"))?,
            otlp_endpoint: lookup("OTLP_ENDPOINT").filter(|v| !v.trim().is_empty()),
            database: DatabaseConfig {
                url: SecretString::new(get("DATABASE_URL", None)?),
                max_connections: parse(
                    "DATABASE_MAX_CONNECTIONS",
                    get("DATABASE_MAX_CONNECTIONS", Some("10"))?,
                )?,
                min_connections: parse(
                    "DATABASE_MIN_CONNECTIONS",
                    get("DATABASE_MIN_CONNECTIONS", Some("1"))?,
                )?,
            },
            jwt: JwtConfig {
                secret: SecretString::new(get("JWT_SECRET", None)?),
                token_expiry_hours: parse(
                    "JWT_TOKEN_EXPIRY_HOURS",
                    get("JWT_TOKEN_EXPIRY_HOURS", Some("24"))?,
                )?,
            },
            security: SecurityConfig {
                allowed_origins: get("ALLOWED_ORIGINS", Some("http://localhost:5173"))?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if !(1..=MAX_TOKEN_EXPIRY_HOURS).contains(&self.jwt.token_expiry_hours) {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_TOKEN_EXPIRY_HOURS must be between 1 and {}",
                MAX_TOKEN_EXPIRY_HOURS
            )));
        }

        if self.jwt.secret.expose_secret().len() < MIN_JWT_SECRET_LEN {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_SECRET must be at least {} bytes",
                MIN_JWT_SECRET_LEN
            )));
        }

        if self.database.max_connections == 0
            || self.database.min_connections > self.database.max_connections
        {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "DATABASE_MIN_CONNECTIONS must not exceed a non-zero DATABASE_MAX_CONNECTIONS"
            )));
        }

        if self.environment == Environment::Prod
            && self.security.allowed_origins.iter().any(|o| o == "*")
        {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "Wildcard CORS origin not allowed in production"
            )));
        }

        Ok(())
    }
}

fn get_var<F>(lookup: &F, key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(val) => Ok(val),
        None => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn parse<T>(key: &str, raw: String) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| {
        AppError::ConfigError(anyhow::anyhow!("{} is invalid: {}", key, e))
    })
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}
