use crate::error::AppError;
use config::{Config as Cfg, ConfigBuilder, File, builder::DefaultState};
use serde::Deserialize;

/// Settings shared by every service binary.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Seconds in-flight requests get to finish after a shutdown signal.
    #[serde(default = "default_shutdown_grace_seconds")]
    pub shutdown_grace_seconds: u64,
}

fn default_port() -> u16 {
    8080
}

fn default_shutdown_grace_seconds() -> u64 {
    30
}

impl Config {
    /// Layered load: `.env`, optional `configuration.*` file, then `APP__*` variables.
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let builder = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        Self::from_builder(builder)
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, AppError> {
        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }
}
