mod types;

pub use types::*;

use crate::Result;
use std::env;
use tracing::debug;

/// Read the worker config from `CONFIG_PATH`, or `config.yaml` when unset.
///
/// Every section is optional; see `config.example.yaml` for the full layout.
pub async fn load() -> Result<Config> {
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());

    debug!("Loading worker configuration from: {}", config_path);

    let config_str = tokio::fs::read_to_string(&config_path).await?;
    let config: Config = serde_yaml::from_str(&config_str)?;

    Ok(config)
}
