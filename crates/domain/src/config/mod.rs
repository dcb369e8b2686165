pub mod blocking;
pub mod database;

pub use blocking::BlockingConfig;
pub use database::DatabaseConfig;

use crate::DomainError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UmbraConfig {
    #[serde(default)]
    pub blocking: BlockingConfig,

    #[serde(default)]
    pub database: DatabaseConfig,
}

impl UmbraConfig {
    pub fn from_toml(content: &str) -> Result<Self, DomainError> {
        toml::from_str(content).map_err(|e| DomainError::ConfigError(e.to_string()))
    }
}
