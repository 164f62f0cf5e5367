//! Configuration management
//!
//! This module handles loading, validation, and management of the docsum configuration.
//! Configuration is stored in TOML format at ~/.docsum/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level, download directory for exported artifacts
//! - **api**: Base URL of the document server API
//! - **upload**: Advisory file acceptance rules
//!
//! # Path Expansion
//!
//! The download directory supports ~ expansion and is created if it doesn't exist.
//!
//! # Examples
//!
//! ```no_run
//! use docsum_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//!
//! println!("API: {}", config.api.base_url);
//! println!("Downloads: {:?}", config.core.download_dir);
//! # Ok(())
//! # }
//! ```

use docsum_sdk::errors::ClientError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Core client settings
    #[serde(default)]
    pub core: CoreConfig,

    /// Document server API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Advisory upload rules
    #[serde(default)]
    pub upload: UploadConfig,
}

/// Core client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory exported artifacts are saved into (supports ~ expansion)
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
}

/// Document server API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

/// Upload acceptance configuration
///
/// Both rules are advisory: the server decides what it accepts, the client
/// only warns before sending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// File extensions the server is known to accept, with leading dot
    #[serde(default = "default_accepted_extensions")]
    pub accepted_extensions: Vec<String>,

    /// Size above which the server is known to reject uploads, in MB
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,
}

impl UploadConfig {
    /// Maximum upload size in bytes
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }
}

/// Log levels accepted in config and on the command line
pub const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Check that `level` is one of [`LOG_LEVELS`]
pub fn validate_log_level(level: &str) -> Result<(), ClientError> {
    if LOG_LEVELS.contains(&level) {
        Ok(())
    } else {
        Err(ClientError::Config(format!(
            "Invalid log level '{}'. Must be one of: {}",
            level,
            LOG_LEVELS.join(", ")
        )))
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("~/Downloads")
}

fn default_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_accepted_extensions() -> Vec<String> {
    [".pdf", ".docx", ".doc", ".txt"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_max_file_size_mb() -> u64 {
    10
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            download_dir: default_download_dir(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            accepted_extensions: default_accepted_extensions(),
            max_file_size_mb: default_max_file_size_mb(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.docsum/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_or_create() -> Result<Self, ClientError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_from_path(path: &Path) -> Result<Self, ClientError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ClientError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&contents)
    }

    /// Log level to run with: `flag` when given, else the configured one
    ///
    /// # Errors
    ///
    /// Returns an error if `flag` is not a known level.
    pub fn log_level<'a>(&'a self, flag: Option<&'a str>) -> Result<&'a str, ClientError> {
        match flag {
            Some(level) => {
                validate_log_level(level)?;
                Ok(level)
            }
            None => Ok(&self.core.log_level),
        }
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, ClientError> {
        let mut config: Config = toml::from_str(contents)
            .map_err(|e| ClientError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Create default configuration and save to path
    fn create_default(path: &Path) -> Result<Self, ClientError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ClientError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        // Persist the unexpanded form so the file stays portable
        let default_config = Self::default();
        let toml_string = toml::to_string_pretty(&default_config)
            .map_err(|e| ClientError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| ClientError::Config(format!("Failed to write config file: {}", e)))?;

        let mut config = default_config;
        config.validate_and_process()?;

        Ok(config)
    }

    /// Get the default configuration file path (~/.docsum/config.toml)
    fn default_config_path() -> Result<PathBuf, ClientError> {
        let home = dirs::home_dir()
            .ok_or_else(|| ClientError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".docsum").join("config.toml"))
    }

    /// Validate and process configuration
    ///
    /// Checks the log level and base URL, normalizes the base URL, expands
    /// the download directory and creates it if needed.
    fn validate_and_process(&mut self) -> Result<(), ClientError> {
        validate_log_level(&self.core.log_level)?;

        let base_url = self.api.base_url.trim().trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::Config(format!(
                "Invalid base_url '{}'. Must start with http:// or https://",
                self.api.base_url
            )));
        }
        self.api.base_url = base_url.to_string();

        if let Some(ext) = self
            .upload
            .accepted_extensions
            .iter()
            .find(|ext| !ext.starts_with('.'))
        {
            return Err(ClientError::Config(format!(
                "Invalid accepted extension '{}'. Extensions must start with '.'",
                ext
            )));
        }

        self.core.download_dir = expand_path(&self.core.download_dir)?;

        if !self.core.download_dir.exists() {
            fs::create_dir_all(&self.core.download_dir).map_err(|e| {
                ClientError::Config(format!("Failed to create download directory: {}", e))
            })?;
        }

        if !self.core.download_dir.is_dir() {
            return Err(ClientError::Config(format!(
                "Download path is not a directory: {:?}",
                self.core.download_dir
            )));
        }

        Ok(())
    }
}

/// Expand ~ in path to user's home directory
fn expand_path(path: &Path) -> Result<PathBuf, ClientError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| ClientError::Config("Invalid UTF-8 in path".to_string()))?;

    if let Some(rest) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| ClientError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(rest))
    } else if path_str == "~" {
        dirs::home_dir()
            .ok_or_else(|| ClientError::Config("Could not determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_file_size_saturates() {
        let rules = UploadConfig {
            accepted_extensions: Vec::new(),
            max_file_size_mb: u64::MAX,
        };
        assert_eq!(rules.max_file_size_bytes(), u64::MAX);
        assert_eq!(UploadConfig::default().max_file_size_bytes(), 10 * 1024 * 1024);
    }

    #[test]
    fn test_validate_log_level() {
        for level in LOG_LEVELS {
            assert!(validate_log_level(level).is_ok());
        }
        let err = validate_log_level("debgu").unwrap_err();
        assert!(err.to_string().contains("Invalid log level 'debgu'"));
    }

    #[test]
    fn test_log_level_flag_overrides_config() {
        let config = Config::default();
        assert_eq!(config.log_level(None).unwrap(), "info");
        assert_eq!(config.log_level(Some("trace")).unwrap(), "trace");
        assert!(matches!(
            config.log_level(Some("verbose")),
            Err(ClientError::Config(_))
        ));
    }

    #[test]
    fn test_default_config_creation() {
        let config = Config::default();

        assert_eq!(config.core.log_level, "info");
        assert_eq!(config.api.base_url, "http://localhost:8000/api");
        assert_eq!(
            config.upload.accepted_extensions,
            vec![".pdf", ".docx", ".doc", ".txt"]
        );
        assert_eq!(config.upload.max_file_size_bytes(), 10 * 1024 * 1024);
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test");
        let expanded = expand_path(&path).unwrap();

        let home = dirs::home_dir().unwrap();
        assert_eq!(expanded, home.join("test"));
    }

    #[test]
    fn test_expand_path_without_tilde() {
        let path = PathBuf::from("/absolute/path");
        let expanded = expand_path(&path).unwrap();

        assert_eq!(expanded, path);
    }

    #[test]
    fn test_base_url_trailing_slash_is_stripped() {
        let dir = tempfile::tempdir().unwrap();
        let toml = format!(
            "[core]\ndownload_dir = {:?}\n\n[api]\nbase_url = \"http://example.test/api/\"\n",
            dir.path()
        );

        let config = Config::from_toml_str(&toml).unwrap();
        assert_eq!(config.api.base_url, "http://example.test/api");
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let err = Config::from_toml_str("[api]\nbase_url = \"ftp://example.test\"\n").unwrap_err();
        assert!(matches!(err, ClientError::Config(msg) if msg.contains("base_url")));
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_string = toml::to_string(&config).unwrap();

        let deserialized: Config = toml::from_str(&toml_string).unwrap();
        assert_eq!(config.core.log_level, deserialized.core.log_level);
        assert_eq!(config.api.base_url, deserialized.api.base_url);
    }
}
