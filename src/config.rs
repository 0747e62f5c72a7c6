//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::stores::{ServerAddress, DEFAULT_HOST, DEFAULT_PORT};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub router: RouterConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Durable storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_path")]
    pub path: String,
}

fn default_storage_path() -> String {
    dirs::data_local_dir()
        .map(|p| {
            p.join("admin-console")
                .join("storage.json")
                .to_string_lossy()
                .to_string()
        })
        .unwrap_or_else(|| "./admin_console_storage.json".to_string())
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

/// Server address used until one is set and persisted
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> ServerAddress {
        ServerAddress::new(self.host.clone(), self.port)
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpConfig {
    /// Request timeout; unset means calls may stay pending indefinitely
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl HttpConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Router configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RouterConfig {
    #[serde(default = "default_base_path")]
    pub base_path: String,
}

fn default_base_path() -> String {
    "/".to_string()
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// First config file found in the default locations
    pub fn default_path() -> Option<PathBuf> {
        let candidates = [
            dirs::config_dir().map(|p| p.join("admin-console").join("config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];
        first_existing(candidates.into_iter().flatten())
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        if let Some(path) = Self::default_path() {
            match Self::load_with_env(&path) {
                Ok(config) => {
                    tracing::info!("Loaded config from {:?}", path);
                    return config;
                }
                Err(e) => {
                    tracing::warn!("Failed to load config from {:?}: {}", path, e);
                }
            }
        }

        tracing::debug!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("ADMIN_CONSOLE_STORAGE_PATH") {
            self.storage.path = path;
        }

        if let Some(host) = lookup("ADMIN_CONSOLE_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("ADMIN_CONSOLE_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }

        if let Some(timeout) = lookup("ADMIN_CONSOLE_HTTP_TIMEOUT_SECS") {
            if let Ok(t) = timeout.parse() {
                self.http.timeout_secs = Some(t);
            }
        }

        if let Some(level) = lookup("ADMIN_CONSOLE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("ADMIN_CONSOLE_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

fn first_existing(candidates: impl IntoIterator<Item = PathBuf>) -> Option<PathBuf> {
    candidates.into_iter().find(|path| path.exists())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Admin Console Configuration
#
# Environment variables override these settings:
# - ADMIN_CONSOLE_STORAGE_PATH
# - ADMIN_CONSOLE_HOST
# - ADMIN_CONSOLE_PORT
# - ADMIN_CONSOLE_HTTP_TIMEOUT_SECS
# - ADMIN_CONSOLE_LOG_LEVEL
# - ADMIN_CONSOLE_LOG_FORMAT

[storage]
# File holding the persisted token, host and port
# (unset: storage.json in the platform data directory)
# path = "/var/lib/admin-console/storage.json"

[server]
# Backend address used until `server <host> <port>` stores one
host = "127.0.0.1"
port = 5000

[http]
# Request timeout in seconds (unset: wait indefinitely)
# timeout_secs = 30

[router]
# Path the console is served under
base_path = "/"

[logging]
# Log level: trace, debug, info, warn, error
level = "warn"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
