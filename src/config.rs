//! Configuration module for Academia.

use serde::Deserialize;
use std::path::Path;

use crate::{AcademiaError, Result};

/// Web API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// Host address to bind.
    #[serde(default = "default_web_host")]
    pub host: String,
    /// Port number for the Web API.
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// JWT secret key (must be set).
    #[serde(default)]
    pub jwt_secret: String,
    /// Access token expiry in seconds.
    #[serde(default = "default_jwt_expiry")]
    pub jwt_expiry_secs: u64,
    /// Rate limit for login endpoint (requests per minute).
    #[serde(default = "default_login_rate_limit")]
    pub login_rate_limit: u32,
    /// Rate limit for general API endpoints (requests per minute).
    #[serde(default = "default_api_rate_limit")]
    pub api_rate_limit: u32,
    /// Externally visible base URL used to build retrieval URLs for locally stored files.
    #[serde(default)]
    pub public_base_url: Option<String>,
}

fn default_web_host() -> String {
    "0.0.0.0".to_string()
}

fn default_web_port() -> u16 {
    5000
}

fn default_jwt_expiry() -> u64 {
    3600 // 1 hour
}

fn default_login_rate_limit() -> u32 {
    5 // 5 requests per minute
}

fn default_api_rate_limit() -> u32 {
    100 // 100 requests per minute
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
            cors_origins: vec![],
            jwt_secret: String::new(),
            jwt_expiry_secs: default_jwt_expiry(),
            login_rate_limit: default_login_rate_limit(),
            api_rate_limit: default_api_rate_limit(),
            public_base_url: None,
        }
    }
}

impl WebConfig {
    /// Base URL clients use to reach this server.
    ///
    /// Falls back to `http://{host}:{port}`, rendering the wildcard
    /// address as `localhost`. Trailing slashes are removed.
    pub fn public_base_url(&self) -> String {
        match &self.public_base_url {
            Some(url) if !url.trim().is_empty() => url.trim().trim_end_matches('/').to_string(),
            _ => {
                let host = if self.host == "0.0.0.0" {
                    "localhost"
                } else {
                    self.host.as_str()
                };
                format!("http://{}:{}", host, self.port)
            }
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file (`:memory:` for an in-memory database).
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/academia.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Object storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Files on the local filesystem, served by this process.
    #[default]
    Local,
    /// Cloudinary raw uploads.
    Cloudinary,
}

/// Cloudinary credentials and endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct CloudinaryConfig {
    /// Cloud name.
    #[serde(default)]
    pub cloud_name: String,
    /// API key.
    #[serde(default)]
    pub api_key: String,
    /// API secret.
    #[serde(default)]
    pub api_secret: String,
    /// Folder uploaded documents are placed in.
    #[serde(default = "default_cloudinary_folder")]
    pub folder: String,
    /// Upload API base URL.
    #[serde(default = "default_cloudinary_api_base")]
    pub api_base: String,
    /// Delivery base URL.
    #[serde(default = "default_cloudinary_delivery_base")]
    pub delivery_base: String,
}

fn default_cloudinary_folder() -> String {
    "academia-resources".to_string()
}

fn default_cloudinary_api_base() -> String {
    "https://api.cloudinary.com/v1_1".to_string()
}

fn default_cloudinary_delivery_base() -> String {
    "https://res.cloudinary.com".to_string()
}

impl Default for CloudinaryConfig {
    fn default() -> Self {
        Self {
            cloud_name: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            folder: default_cloudinary_folder(),
            api_base: default_cloudinary_api_base(),
            delivery_base: default_cloudinary_delivery_base(),
        }
    }
}

impl CloudinaryConfig {
    /// Check whether all credentials are present.
    pub fn is_complete(&self) -> bool {
        !self.cloud_name.is_empty() && !self.api_key.is_empty() && !self.api_secret.is_empty()
    }
}

/// Object storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Storage backend.
    #[serde(default)]
    pub backend: StorageBackend,
    /// Path to the local file storage directory.
    #[serde(default = "default_local_path")]
    pub local_path: String,
    /// Maximum upload size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
    /// Cloudinary settings (used when backend = "cloudinary").
    #[serde(default)]
    pub cloudinary: CloudinaryConfig,
}

fn default_local_path() -> String {
    "data/files".to_string()
}

fn default_max_upload_size() -> u64 {
    20
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            local_path: default_local_path(),
            max_upload_size_mb: default_max_upload_size(),
            cloudinary: CloudinaryConfig::default(),
        }
    }
}

impl StorageConfig {
    /// Maximum upload size in bytes.
    pub fn max_upload_size_bytes(&self) -> u64 {
        self.max_upload_size_mb * 1024 * 1024
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
    "logs/academia.log".to_string()
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
    /// Web API configuration.
    #[serde(default)]
    pub web: WebConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Object storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(AcademiaError::Io)?;
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
        toml::from_str(s).map_err(|e| AcademiaError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `ACADEMIA_JWT_SECRET`: JWT secret key
    /// - `CLOUDINARY_CLOUD_NAME`, `CLOUDINARY_API_KEY`, `CLOUDINARY_API_SECRET`
    pub fn apply_env_overrides(&mut self) {
        fn non_empty_var(name: &str) -> Option<String> {
            std::env::var(name).ok().filter(|v| !v.is_empty())
        }

        if let Some(secret) = non_empty_var("ACADEMIA_JWT_SECRET") {
            self.web.jwt_secret = secret;
        }
        if let Some(cloud_name) = non_empty_var("CLOUDINARY_CLOUD_NAME") {
            self.storage.cloudinary.cloud_name = cloud_name;
        }
        if let Some(api_key) = non_empty_var("CLOUDINARY_API_KEY") {
            self.storage.cloudinary.api_key = api_key;
        }
        if let Some(api_secret) = non_empty_var("CLOUDINARY_API_SECRET") {
            self.storage.cloudinary.api_secret = api_secret;
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - the JWT secret is not set
    /// - the Cloudinary backend is selected without complete credentials
    /// - the upload limit is zero
    pub fn validate(&self) -> Result<()> {
        if self.web.jwt_secret.is_empty() {
            return Err(AcademiaError::Config(
                "jwt_secret is not set. \
                 Set it in config.toml or via ACADEMIA_JWT_SECRET environment variable."
                    .to_string(),
            ));
        }
        if self.storage.backend == StorageBackend::Cloudinary
            && !self.storage.cloudinary.is_complete()
        {
            return Err(AcademiaError::Config(
                "cloudinary backend requires cloud_name, api_key and api_secret".to_string(),
            ));
        }
        if self.storage.max_upload_size_mb == 0 {
            return Err(AcademiaError::Config(
                "max_upload_size_mb must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
