//! TOML configuration for the query server and CLI.
//!
//! Example configuration:
//! ```toml
//! [server]
//! bind = "0.0.0.0:5050"
//!
//! [storage]
//! root = "${DATA_ROOT}/data-sets"
//!
//! [query]
//! default_page_size = 1000
//! max_page_size = 10000
//! timeout_seconds = 30
//! csv_batch_size = 5000
//! catalog_cache_size = 64
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "DATAQUERY_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "dataquery.toml";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub query: QuerySettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Socket address the HTTP server listens on.
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5050".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory holding one sub-directory per data set (supports `${VAR}`).
    pub root: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            root: "./data".to_string(),
        }
    }
}

impl StorageSettings {
    /// The root with environment variables expanded.
    pub fn resolved_root(&self) -> Result<PathBuf, SettingsError> {
        expand_env_vars(&self.root).map(PathBuf::from)
    }
}

/// Limits applied to every query.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QuerySettings {
    /// Page size when the request gives none.
    pub default_page_size: u32,

    /// Largest page size a request may ask for.
    pub max_page_size: u32,

    /// Upper bound on the executor calls of one request.
    pub timeout_seconds: u64,

    /// Rows fetched per batch while exporting CSV.
    pub csv_batch_size: u32,

    /// Version catalogs kept in memory; the least recently used is dropped
    /// beyond this.
    pub catalog_cache_size: usize,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            default_page_size: 1000,
            max_page_size: 10000,
            timeout_seconds: 30,
            csv_batch_size: 5000,
            catalog_cache_size: 64,
        }
    }
}

impl QuerySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.max_page_size == 0 {
            return Err(SettingsError::InvalidConfig(
                "query.max_page_size must be at least 1".to_string(),
            ));
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            return Err(SettingsError::InvalidConfig(format!(
                "query.default_page_size must be between 1 and {}",
                self.max_page_size
            )));
        }
        if self.timeout_seconds == 0 {
            return Err(SettingsError::InvalidConfig(
                "query.timeout_seconds must be at least 1".to_string(),
            ));
        }
        if self.csv_batch_size == 0 {
            return Err(SettingsError::InvalidConfig(
                "query.csv_batch_size must be at least 1".to_string(),
            ));
        }
        if self.catalog_cache_size == 0 {
            return Err(SettingsError::InvalidConfig(
                "query.catalog_cache_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Settings {
    /// Parse and validate settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.query.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `DATAQUERY_CONFIG`
    /// 2. `./dataquery.toml`
    /// 3. `~/.config/dataquery/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var(CONFIG_ENV) {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("dataquery").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }
}

static ENV_VAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)")
        .expect("valid env var regex")
});

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax. A `$` not followed by a name is kept.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut missing = None;
    let expanded = ENV_VAR.replace_all(s, |caps: &Captures<'_>| {
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map_or("", |m| m.as_str());
        match env::var(name) {
            Ok(value) => value,
            Err(_) => {
                missing.get_or_insert_with(|| name.to_string());
                String::new()
            }
        }
    });
    match missing {
        Some(name) => Err(SettingsError::MissingEnvVar(name)),
        None => Ok(expanded.into_owned()),
    }
}
