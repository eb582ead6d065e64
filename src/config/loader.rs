use crate::config::{AccountConfig, CatalogSeed};
use crate::error::{Error, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub account: AccountConfig,
    #[serde(default)]
    pub catalog: Vec<CatalogSeed>,
}

impl AppConfig {
    pub fn load(env: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name("config/default"))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("CRYPTOLEDGER"))
            .build()
            .map_err(|e| Error::ConfigError(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| Error::ConfigError(e.to_string()))
    }
}
