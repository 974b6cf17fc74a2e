//! Configuration module for Bookshelf.

use serde::Deserialize;
use std::path::Path;

use crate::catalog::FileStore;
use crate::{BookshelfError, Result};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
        }
    }
}

/// Upload directory configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FilesConfig {
    /// Directory holding uploaded files and the metadata file.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    /// Name of the metadata JSON file inside the upload directory.
    #[serde(default = "default_metadata_name")]
    pub metadata_name: String,
    /// Maximum upload size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
}

fn default_upload_dir() -> String {
    "uploads".to_string()
}

fn default_metadata_name() -> String {
    "metadata.json".to_string()
}

fn default_max_upload_size() -> u64 {
    100
}

impl FilesConfig {
    /// Maximum upload size in bytes.
    pub fn max_upload_size_bytes(&self) -> u64 {
        self.max_upload_size_mb * 1024 * 1024
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            metadata_name: default_metadata_name(),
            max_upload_size_mb: default_max_upload_size(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/bookshelf.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Upload directory configuration.
    #[serde(default)]
    pub files: FilesConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(BookshelfError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| BookshelfError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `BOOKSHELF_UPLOAD_DIR`: upload directory
    /// - `BOOKSHELF_METADATA_NAME`: metadata file name
    /// - `BOOKSHELF_PORT`: listening port
    ///
    /// Empty values are ignored, as is an unparsable port.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("BOOKSHELF_UPLOAD_DIR") {
            if !dir.is_empty() {
                self.files.upload_dir = dir;
            }
        }

        if let Ok(name) = std::env::var("BOOKSHELF_METADATA_NAME") {
            if !name.is_empty() {
                self.files.metadata_name = name;
            }
        }

        if let Ok(port) = std::env::var("BOOKSHELF_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - The upload directory is empty
    /// - The metadata file name is not a plain file name
    /// - The upload limit is zero
    pub fn validate(&self) -> Result<()> {
        if self.files.upload_dir.trim().is_empty() {
            return Err(BookshelfError::Config(
                "files.upload_dir must not be empty".to_string(),
            ));
        }

        FileStore::validate_name(&self.files.metadata_name).map_err(|e| {
            BookshelfError::Config(format!("files.metadata_name is not usable: {e}"))
        })?;

        if self.files.max_upload_size_mb == 0 {
            return Err(BookshelfError::Config(
                "files.max_upload_size_mb must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
