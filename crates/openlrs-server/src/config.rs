//! Configuration loading and typed config structures for the LRS server.
//!
//! The canonical configuration lives in `openlrs.yaml` in the server's
//! working directory. This module defines strongly-typed structs that
//! mirror the YAML structure, with the `server` and `tasks` sections
//! owned by the crates they configure.

use std::path::Path;

use serde::Deserialize;

use openlrs_api::ServerConfig;
use openlrs_tasks::TasksConfig;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level LRS configuration.
///
/// Mirrors the structure of `openlrs.yaml`. Every field has a default,
/// so an absent file or an empty document yields a working server.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LrsConfig {
    /// HTTP server settings (bind address and port).
    #[serde(default)]
    pub server: ServerConfig,

    /// Background job settings (queue, webhook dispatch, metadata
    /// resolution).
    #[serde(default)]
    pub tasks: TasksConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl LrsConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values for the bind address:
    /// - `OPENLRS_HOST` overrides `server.host`
    /// - `OPENLRS_PORT` overrides `server.port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Override the bind address with environment variables when set.
    ///
    /// This allows Docker Compose (or any deployment) to set the listen
    /// address via env vars without modifying the YAML config file.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("OPENLRS_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("OPENLRS_PORT")
            && let Ok(port) = val.parse()
        {
            self.server.port = port;
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes
    /// precedence when set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_owned()
}
