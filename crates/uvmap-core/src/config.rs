use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Environment variable consulted when no provider token is configured.
pub const ACCESS_TOKEN_ENV: &str = "UVMAP_ACCESS_TOKEN";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    pub config_dir: PathBuf,

    /// UV index provider settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Reading store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Map defaults
    #[serde(default)]
    pub map: MapConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API root of the UV index provider (the client appends `/v1/uv`)
    #[serde(default = "default_provider_url")]
    pub base_url: String,

    /// Value sent in the `x-access-token` header
    #[serde(default)]
    pub access_token: Option<String>,
}

fn default_provider_url() -> String {
    "https://api.openuv.io/api".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_provider_url(),
            access_token: None,
        }
    }
}

impl ProviderConfig {
    /// Configured token, falling back to `UVMAP_ACCESS_TOKEN`.
    pub fn resolved_token(&self) -> Option<String> {
        self.access_token
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| std::env::var(ACCESS_TOKEN_ENV).ok().filter(|t| !t.is_empty()))
    }
}

/// Which document store backs the reading cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Sqlite,
    Firestore,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Collection holding reading documents
    #[serde(default = "default_collection")]
    pub collection: String,

    /// SQLite file; defaults to `uv_data.db` inside the config directory
    #[serde(default)]
    pub sqlite_path: Option<PathBuf>,

    #[serde(default)]
    pub firestore_project_id: Option<String>,

    #[serde(default)]
    pub firestore_api_key: Option<String>,

    /// Override for the Firestore REST root (emulators, tests)
    #[serde(default)]
    pub firestore_base_url: Option<String>,
}

fn default_collection() -> String {
    "uvData".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            collection: default_collection(),
            sqlite_path: None,
            firestore_project_id: None,
            firestore_api_key: None,
            firestore_base_url: None,
        }
    }
}

impl StoreConfig {
    /// Effective SQLite path for the given config directory.
    pub fn effective_sqlite_path(&self, config_dir: &Path) -> PathBuf {
        self.sqlite_path
            .clone()
            .unwrap_or_else(|| config_dir.join("uv_data.db"))
    }

    /// Documents root URL for the Firestore REST API.
    pub fn firestore_documents_url(&self) -> Option<String> {
        if let Some(base) = &self.firestore_base_url {
            return Some(base.trim_end_matches('/').to_string());
        }
        self.firestore_project_id.as_ref().map(|project| {
            format!(
                "https://firestore.googleapis.com/v1/projects/{}/databases/(default)/documents",
                project
            )
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    /// Latitude resolved on start-up
    pub default_lat: f64,
    /// Longitude resolved on start-up
    pub default_lng: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            default_lat: -27.376139,
            default_lng: -70.323444,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("uvmap");

        Self {
            config_dir,
            provider: ProviderConfig::default(),
            store: StoreConfig::default(),
            map: MapConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path, creating a default file there if missing
    ///
    /// A file that is not valid TOML fails with [`ConfigError::ParseError`].
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let contents =
            std::fs::read_to_string(config_path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents).map_err(|e| {
            ConfigError::ParseError(format!("{}: {}", config_path.display(), e))
        })?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns [`ConfigError::Invalid`] if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        Self::load_validated_from(&Self::config_path()?)
    }

    /// Same as [`Config::load_validated`] for an explicit path
    pub fn load_validated_from(config_path: &Path) -> Result<(Self, ValidationResult)> {
        let config = Self::load_from(config_path)?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.provider.base_url, "provider.base_url", &mut result);

        if self.provider.resolved_token().is_none() {
            result.add_warning(
                "provider.access_token",
                format!(
                    "No access token configured (set it here or via {})",
                    ACCESS_TOKEN_ENV
                ),
            );
        }

        if self.store.collection.trim().is_empty() {
            result.add_error("store.collection", "Collection name cannot be empty");
        }

        if self.store.backend == StoreBackend::Firestore {
            match self.store.firestore_documents_url() {
                Some(url) => self.validate_url(&url, "store.firestore_base_url", &mut result),
                None => result.add_error(
                    "store.firestore_project_id",
                    "Firestore backend requires a project id or base url",
                ),
            }
        }

        if self.store.backend == StoreBackend::Memory {
            result.add_warning("store.backend", "Memory store does not persist readings");
        }

        if !(-90.0..=90.0).contains(&self.map.default_lat) {
            result.add_error("map.default_lat", "Latitude must be within [-90, 90]");
        }
        if !(-180.0..=180.0).contains(&self.map.default_lng) {
            result.add_error("map.default_lng", "Longitude must be within [-180, 180]");
        }

        result
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::NotFound("platform config directory".to_string()))?
            .join("uvmap");

        Ok(config_dir.join("config.toml"))
    }
}
