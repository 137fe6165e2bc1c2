//! Application configuration: database connection, dashboard options and the
//! session identity source.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Database configuration and connection management
pub mod database;

/// Dashboard options from config.toml
pub mod dashboard;

/// Session identity from environment variables
pub mod session;

pub use dashboard::DashboardConfig;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_VAR: &str = "DASHBOARD_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Aggregation options
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A field has an unexpected value
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {path_ref:?}: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse TOML from config file {path_ref:?}: {e}"),
    })
}

/// Loads the application configuration from `DASHBOARD_CONFIG` (default
/// `./config.toml`). A missing file is not an error: defaults are used.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    if !Path::new(&path).exists() {
        info!("No configuration file at {path}, using defaults.");
        return Ok(AppConfig::default());
    }
    let config = load_config(&path)?;
    info!("Loaded configuration from {path}.");
    Ok(config)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::config::dashboard::TransactionOrder;

    #[test]
    fn test_parse_app_config() {
        let toml_str = r#"
            [dashboard]
            reminder_limit = 3
            transaction_order = "created_at"
            resolve_categories = false
        "#;

        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.dashboard.reminder_limit, 3);
        assert_eq!(config.dashboard.transaction_order, TransactionOrder::CreatedAt);
        assert!(!config.dashboard.resolve_categories);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.dashboard, DashboardConfig::default());
    }

    #[test]
    fn test_load_config_missing_file_is_config_error() {
        let result = load_config("definitely/not/here.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
