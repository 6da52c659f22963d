//! # Configuration
//!
//! Layered configuration built with the `config` crate, lowest precedence
//! first:
//!
//! 1. Built-in defaults (`WorkflowConfig::default()`)
//! 2. Optional TOML file (`config/statportal.toml` or an explicit path)
//! 3. Environment variables `STATPORTAL__<SECTION>__<KEY>`
//! 4. `DATABASE_URL`, if set

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::{
    DEFAULT_CONFIG_FILE, DEFAULT_DATABASE_URL, DEFAULT_SCHEMA, DEFAULT_STATUS_COLUMN, ENV_PREFIX,
};
use crate::error::{WorkflowError, WorkflowResult};
use crate::locator::is_valid_identifier;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    pub database: DatabaseConfig,
    pub locator: LocatorConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Also bounds how long a transition waits for a connection
    pub acquire_timeout_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocatorConfig {
    /// Schema holding the business tables
    pub schema: String,
    /// Numeric status column on business tables
    pub status_column: String,
    /// Resolve unregistered tables through `information_schema`
    pub catalog_fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Users holding the administrator capability
    pub administrator_ids: Vec<i64>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            locator: LocatorConfig::default(),
            logging: LoggingConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_seconds: 30,
        }
    }
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            schema: DEFAULT_SCHEMA.to_string(),
            status_column: DEFAULT_STATUS_COLUMN.to_string(),
            catalog_fallback: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl WorkflowConfig {
    /// Load from the default file location (if present) and the environment
    pub fn load() -> WorkflowResult<Self> {
        Self::load_from(None)
    }

    /// Load with an explicit configuration file; a missing explicit file is an error
    pub fn load_from(path: Option<&Path>) -> WorkflowResult<Self> {
        let defaults = Config::try_from(&Self::default()).map_err(config_error)?;

        let file_source = match path {
            Some(path) => File::from(path).format(FileFormat::Toml).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE)
                .format(FileFormat::Toml)
                .required(false),
        };

        let mut config: WorkflowConfig = Config::builder()
            .add_source(defaults)
            .add_source(file_source)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("security.administrator_ids")
                    .try_parsing(true),
            )
            .build()
            .map_err(config_error)?
            .try_deserialize()
            .map_err(config_error)?;

        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database.url = url;
        }

        config.validate()?;

        tracing::debug!(
            schema = %config.locator.schema,
            status_column = %config.locator.status_column,
            max_connections = config.database.max_connections,
            "Configuration loaded"
        );

        Ok(config)
    }

    pub fn validate(&self) -> WorkflowResult<()> {
        if self.database.url.trim().is_empty() {
            return Err(WorkflowError::Configuration(
                "database.url must not be empty".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(WorkflowError::Configuration(
                "database.max_connections must be greater than zero".to_string(),
            ));
        }
        if self.database.min_connections > self.database.max_connections {
            return Err(WorkflowError::Configuration(format!(
                "database.min_connections ({}) exceeds max_connections ({})",
                self.database.min_connections, self.database.max_connections
            )));
        }
        if !is_valid_identifier(&self.locator.schema) {
            return Err(WorkflowError::Configuration(format!(
                "locator.schema is not a valid identifier: {:?}",
                self.locator.schema
            )));
        }
        if !is_valid_identifier(&self.locator.status_column) {
            return Err(WorkflowError::Configuration(format!(
                "locator.status_column is not a valid identifier: {:?}",
                self.locator.status_column
            )));
        }
        Ok(())
    }
}

fn config_error(err: config::ConfigError) -> WorkflowError {
    WorkflowError::Configuration(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = WorkflowConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.locator.status_column, "workflow_status_id");
        assert!(config.locator.catalog_fallback);
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[locator]
schema = "stats"
status_column = "StatusId"
catalog_fallback = false

[security]
administrator_ids = [1, 42]
"#
        )
        .unwrap();

        let config = WorkflowConfig::load_from(Some(file.path())).unwrap();
        assert_eq!(config.locator.schema, "stats");
        assert_eq!(config.locator.status_column, "StatusId");
        assert!(!config.locator.catalog_fallback);
        assert_eq!(config.security.administrator_ids, vec![1, 42]);
        // untouched sections keep their defaults
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = WorkflowConfig::load_from(Some(Path::new("/nonexistent/statportal.toml")))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Configuration(_)));
    }

    #[test]
    fn test_validate_rejects_unsafe_status_column() {
        let mut config = WorkflowConfig::default();
        config.locator.status_column = "status; DROP TABLE x".to_string();
        assert!(matches!(
            config.validate(),
            Err(WorkflowError::Configuration(_))
        ));

        let mut config = WorkflowConfig::default();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());
    }
}
