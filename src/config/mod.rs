//! Configuration management
//!
//! Configuration for the newsdesk admin backend is loaded from:
//! - config.yml file
//! - Environment variables prefixed with `NEWSDESK_` (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Post storage backend
    #[serde(default)]
    pub storage: StorageConfig,
    /// SQLite connection settings (used when `storage.driver` is `sqlite`)
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Upload configuration
    #[serde(default)]
    pub upload: UploadConfig,
    /// Admin authentication
    #[serde(default)]
    pub auth: AuthConfig,
    /// Settings for the HTTP client of the admin API
    #[serde(default)]
    pub client: ClientConfig,
    /// Retry policy for wizard submissions
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin of the admin panel
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "http://localhost:5173".to_string()
}

/// Storage backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageDriver {
    /// Seeded in-memory collection with simulated latency (default)
    #[default]
    Memory,
    /// SQLite database
    Sqlite,
}

/// Storage configuration
///
/// The delay values only apply to the in-memory driver, which mimics
/// the response times of a remote backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub driver: StorageDriver,
    /// Number of fabricated posts seeded at startup
    #[serde(default = "default_seed_count")]
    pub seed_count: u32,
    #[serde(default = "default_read_delay_ms")]
    pub read_delay_ms: u64,
    #[serde(default = "default_write_delay_ms")]
    pub write_delay_ms: u64,
    #[serde(default = "default_delete_delay_ms")]
    pub delete_delay_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            driver: StorageDriver::default(),
            seed_count: default_seed_count(),
            read_delay_ms: default_read_delay_ms(),
            write_delay_ms: default_write_delay_ms(),
            delete_delay_ms: default_delete_delay_ms(),
        }
    }
}

fn default_seed_count() -> u32 {
    100
}

fn default_read_delay_ms() -> u64 {
    1000
}

fn default_write_delay_ms() -> u64 {
    2000
}

fn default_delete_delay_ms() -> u64 {
    1000
}

impl StorageConfig {
    pub fn read_delay(&self) -> Duration {
        Duration::from_millis(self.read_delay_ms)
    }

    pub fn write_delay(&self) -> Duration {
        Duration::from_millis(self.write_delay_ms)
    }

    pub fn delete_delay(&self) -> Duration {
        Duration::from_millis(self.delete_delay_ms)
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite path or URL (`:memory:` for a throwaway database)
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/newsdesk.db".to_string()
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub driver: CacheDriver,
    /// Cache TTL in seconds
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            driver: CacheDriver::default(),
            ttl_seconds: default_ttl(),
        }
    }
}

fn default_ttl() -> u64 {
    300
}

/// Cache driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheDriver {
    /// In-memory cache (default)
    #[default]
    Memory,
    /// Every lookup misses
    Disabled,
}

/// Upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Upload directory path
    #[serde(default = "default_upload_path")]
    pub path: PathBuf,
    /// Maximum file size in bytes (default: 10MB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// MIME types accepted for a cover image
    #[serde(default = "default_cover_types")]
    pub cover_types: Vec<String>,
    /// MIME types accepted for gallery images
    #[serde(default = "default_gallery_types")]
    pub gallery_types: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            path: default_upload_path(),
            max_file_size: default_max_file_size(),
            cover_types: default_cover_types(),
            gallery_types: default_gallery_types(),
        }
    }
}

fn default_upload_path() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024 // 10MB
}

fn default_cover_types() -> Vec<String> {
    vec![
        "image/jpeg".to_string(),
        "image/png".to_string(),
        "image/gif".to_string(),
        "image/webp".to_string(),
    ]
}

fn default_gallery_types() -> Vec<String> {
    vec!["image/jpeg".to_string(), "image/png".to_string()]
}

impl UploadConfig {
    pub fn is_cover_type_allowed(&self, mime_type: &str) -> bool {
        self.cover_types.iter().any(|t| t == mime_type)
    }

    pub fn is_gallery_type_allowed(&self, mime_type: &str) -> bool {
        self.gallery_types.iter().any(|t| t == mime_type)
    }

    /// Get file extension for a MIME type
    pub fn get_extension(&self, mime_type: &str) -> &'static str {
        match mime_type {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            _ => "bin",
        }
    }
}

/// Admin authentication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Expected bearer token. When unset any non-empty token is accepted.
    #[serde(default)]
    pub admin_token: Option<String>,
    /// Author recorded on posts created through the API
    #[serde(default = "default_author")]
    pub author: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_token: None,
            author: default_author(),
        }
    }
}

fn default_author() -> String {
    "admin".to_string()
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub token: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            token: None,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080/api/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

/// Retry policy for transient submission failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            multiplier: default_multiplier(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    8000
}

fn default_multiplier() -> f64 {
    2.0
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist or is empty, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - NEWSDESK_SERVER_HOST / NEWSDESK_SERVER_PORT / NEWSDESK_SERVER_CORS_ORIGIN
    /// - NEWSDESK_STORAGE_DRIVER / NEWSDESK_STORAGE_SEED_COUNT
    /// - NEWSDESK_DATABASE_URL
    /// - NEWSDESK_CACHE_DRIVER / NEWSDESK_CACHE_TTL_SECONDS
    /// - NEWSDESK_UPLOAD_PATH
    /// - NEWSDESK_AUTH_ADMIN_TOKEN / NEWSDESK_AUTH_AUTHOR
    /// - NEWSDESK_CLIENT_BASE_URL / NEWSDESK_CLIENT_TOKEN
    /// - NEWSDESK_RETRY_MAX_RETRIES
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject values that parse but cannot work at runtime
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry.multiplier < 1.0 {
            return Err(ConfigError::ValidationError(format!(
                "retry.multiplier must be at least 1.0, got {}",
                self.retry.multiplier
            )));
        }
        if self.retry.initial_delay_ms > self.retry.max_delay_ms {
            return Err(ConfigError::ValidationError(
                "retry.initial_delay_ms must not exceed retry.max_delay_ms".to_string(),
            ));
        }
        if self.client.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "client.timeout_secs must be positive".to_string(),
            ));
        }
        if self.upload.max_file_size == 0 {
            return Err(ConfigError::ValidationError(
                "upload.max_file_size must be positive".to_string(),
            ));
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("NEWSDESK_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("NEWSDESK_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("NEWSDESK_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }

        if let Ok(driver) = std::env::var("NEWSDESK_STORAGE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "memory" => self.storage.driver = StorageDriver::Memory,
                "sqlite" => self.storage.driver = StorageDriver::Sqlite,
                _ => {} // Ignore invalid values
            }
        }
        if let Ok(count) = std::env::var("NEWSDESK_STORAGE_SEED_COUNT") {
            if let Ok(count) = count.parse::<u32>() {
                self.storage.seed_count = count;
            }
        }

        if let Ok(url) = std::env::var("NEWSDESK_DATABASE_URL") {
            self.database.url = url;
        }

        if let Ok(driver) = std::env::var("NEWSDESK_CACHE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "memory" => self.cache.driver = CacheDriver::Memory,
                "disabled" => self.cache.driver = CacheDriver::Disabled,
                _ => {}
            }
        }
        if let Ok(ttl) = std::env::var("NEWSDESK_CACHE_TTL_SECONDS") {
            if let Ok(ttl) = ttl.parse::<u64>() {
                self.cache.ttl_seconds = ttl;
            }
        }

        if let Ok(path) = std::env::var("NEWSDESK_UPLOAD_PATH") {
            self.upload.path = PathBuf::from(path);
        }

        if let Ok(token) = std::env::var("NEWSDESK_AUTH_ADMIN_TOKEN") {
            self.auth.admin_token = Some(token).filter(|t| !t.is_empty());
        }
        if let Ok(author) = std::env::var("NEWSDESK_AUTH_AUTHOR") {
            self.auth.author = author;
        }

        if let Ok(base_url) = std::env::var("NEWSDESK_CLIENT_BASE_URL") {
            self.client.base_url = base_url;
        }
        if let Ok(token) = std::env::var("NEWSDESK_CLIENT_TOKEN") {
            self.client.token = Some(token).filter(|t| !t.is_empty());
        }

        if let Ok(retries) = std::env::var("NEWSDESK_RETRY_MAX_RETRIES") {
            if let Ok(retries) = retries.parse::<u32>() {
                self.retry.max_retries = retries;
            }
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

#[cfg(test)]
const ENV_KEYS: &[&str] = &[
    "NEWSDESK_SERVER_HOST",
    "NEWSDESK_SERVER_PORT",
    "NEWSDESK_SERVER_CORS_ORIGIN",
    "NEWSDESK_STORAGE_DRIVER",
    "NEWSDESK_STORAGE_SEED_COUNT",
    "NEWSDESK_DATABASE_URL",
    "NEWSDESK_CACHE_DRIVER",
    "NEWSDESK_CACHE_TTL_SECONDS",
    "NEWSDESK_UPLOAD_PATH",
    "NEWSDESK_AUTH_ADMIN_TOKEN",
    "NEWSDESK_AUTH_AUTHOR",
    "NEWSDESK_CLIENT_BASE_URL",
    "NEWSDESK_CLIENT_TOKEN",
    "NEWSDESK_RETRY_MAX_RETRIES",
];

// Shared by every test module that touches the process environment.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
fn lock_env() -> std::sync::MutexGuard<'static, ()> {
    let guard = CONFIG_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
    guard
}
