//! Configuration management
//!
//! Configuration is read from `config.yml` and may be overridden with
//! `LAXMI_*` environment variables. Missing values fall back to defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::Locale;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub smtp: SmtpConfig,
    #[serde(default)]
    pub admin: AdminSeedConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin for the admin client
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
    "http://localhost:3000".to_string()
}

/// Public site settings used for canonical links, sitemap and emails
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Base URL without a trailing slash
    #[serde(default = "default_site_url")]
    pub url: String,
    #[serde(default = "default_site_name")]
    pub name: String,
    #[serde(default)]
    pub default_locale: Locale,
    /// Public contact address shown on the contact page and in emails
    #[serde(default = "default_contact_email")]
    pub contact_email: String,
    #[serde(default = "default_contact_phone")]
    pub contact_phone: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            url: default_site_url(),
            name: default_site_name(),
            default_locale: Locale::default(),
            contact_email: default_contact_email(),
            contact_phone: default_contact_phone(),
        }
    }
}

impl SiteConfig {
    /// Absolute URL for a site-relative path
    pub fn absolute_url(&self, path: &str) -> String {
        let base = self.url.trim_end_matches('/');
        if path.is_empty() {
            base.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }
}

fn default_site_url() -> String {
    "https://laxmi.it".to_string()
}

fn default_site_name() -> String {
    "LAXMI".to_string()
}

fn default_contact_email() -> String {
    "concierge@laxmi.it".to_string()
}

fn default_contact_phone() -> String {
    "+39 02 0000 0000".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database path or `:memory:`
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
    "data/laxmi.db".to_string()
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Upper bound for entry lifetime in seconds
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl(),
            max_entries: default_max_entries(),
        }
    }
}

fn default_ttl() -> u64 {
    3600
}

fn default_max_entries() -> u64 {
    10_000
}

/// Upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Object store root directory
    #[serde(default = "default_upload_path")]
    pub path: PathBuf,
    /// Maximum file size in bytes (default: 5MB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            path: default_upload_path(),
            max_file_size: default_max_file_size(),
            allowed_types: default_allowed_types(),
        }
    }
}

fn default_upload_path() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_max_file_size() -> u64 {
    5 * 1024 * 1024
}

fn default_allowed_types() -> Vec<String> {
    vec![
        "image/jpeg".to_string(),
        "image/png".to_string(),
        "image/gif".to_string(),
        "image/webp".to_string(),
        "image/avif".to_string(),
    ]
}

impl UploadConfig {
    /// Check if a MIME type is allowed
    pub fn is_type_allowed(&self, mime_type: &str) -> bool {
        self.allowed_types.iter().any(|t| t == mime_type)
    }

    /// Get file extension for a MIME type
    pub fn get_extension(&self, mime_type: &str) -> &'static str {
        match mime_type {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            "image/avif" => "avif",
            _ => "bin",
        }
    }
}

/// Outgoing mail settings for booking notifications.
///
/// Mail is disabled while `host` is empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_from_address")]
    pub from_address: String,
    /// Recipient of new consultation requests
    #[serde(default = "default_contact_email")]
    pub concierge_email: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_smtp_port(),
            username: String::new(),
            password: String::new(),
            from_address: default_from_address(),
            concierge_email: default_contact_email(),
        }
    }
}

impl SmtpConfig {
    pub fn is_enabled(&self) -> bool {
        !self.host.trim().is_empty()
    }
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from_address() -> String {
    "LAXMI <noreply@laxmi.it>".to_string()
}

/// Credentials for the first admin account created by the seeder
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminSeedConfig {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
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
    /// Load configuration from file.
    ///
    /// A missing or empty file yields the defaults. Invalid YAML is an
    /// error carrying the line and column.
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

    /// Load configuration from file, then apply `LAXMI_*` overrides
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.upload.max_file_size == 0 {
            return Err(ConfigError::ValidationError(
                "upload.max_file_size must be greater than zero".to_string(),
            ));
        }
        if !self.site.url.starts_with("http://") && !self.site.url.starts_with("https://") {
            return Err(ConfigError::ValidationError(format!(
                "site.url must be an absolute http(s) URL, got '{}'",
                self.site.url
            )));
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("LAXMI_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("LAXMI_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(origin) = std::env::var("LAXMI_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = origin;
        }

        if let Ok(url) = std::env::var("LAXMI_SITE_URL") {
            self.site.url = url;
        }
        if let Ok(locale) = std::env::var("LAXMI_SITE_DEFAULT_LOCALE") {
            if let Some(locale) = Locale::parse(&locale) {
                self.site.default_locale = locale;
            }
        }

        if let Ok(url) = std::env::var("LAXMI_DATABASE_URL") {
            self.database.url = url;
        }

        if let Ok(ttl) = std::env::var("LAXMI_CACHE_TTL_SECONDS") {
            if let Ok(ttl) = ttl.parse::<u64>() {
                self.cache.ttl_seconds = ttl;
            }
        }

        if let Ok(path) = std::env::var("LAXMI_UPLOAD_PATH") {
            self.upload.path = PathBuf::from(path);
        }
        if let Ok(size) = std::env::var("LAXMI_UPLOAD_MAX_FILE_SIZE") {
            if let Ok(size) = size.parse::<u64>() {
                self.upload.max_file_size = size;
            }
        }

        if let Ok(host) = std::env::var("LAXMI_SMTP_HOST") {
            self.smtp.host = host;
        }
        if let Ok(port) = std::env::var("LAXMI_SMTP_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.smtp.port = port;
            }
        }
        if let Ok(username) = std::env::var("LAXMI_SMTP_USERNAME") {
            self.smtp.username = username;
        }
        if let Ok(password) = std::env::var("LAXMI_SMTP_PASSWORD") {
            self.smtp.password = password;
        }
        if let Ok(email) = std::env::var("LAXMI_CONCIERGE_EMAIL") {
            self.smtp.concierge_email = email;
        }

        if let Ok(email) = std::env::var("LAXMI_ADMIN_EMAIL") {
            self.admin.email = Some(email);
        }
        if let Ok(password) = std::env::var("LAXMI_ADMIN_PASSWORD") {
            self.admin.password = Some(password);
        }
    }
}

/// Format YAML parsing error with location
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

// Shared by every test that touches LAXMI_* variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const ENV_VARS: &[&str] = &[
        "LAXMI_SERVER_HOST",
        "LAXMI_SERVER_PORT",
        "LAXMI_SERVER_CORS_ORIGIN",
        "LAXMI_SITE_URL",
        "LAXMI_SITE_DEFAULT_LOCALE",
        "LAXMI_DATABASE_URL",
        "LAXMI_CACHE_TTL_SECONDS",
        "LAXMI_UPLOAD_PATH",
        "LAXMI_UPLOAD_MAX_FILE_SIZE",
        "LAXMI_SMTP_HOST",
        "LAXMI_SMTP_PORT",
        "LAXMI_SMTP_USERNAME",
        "LAXMI_SMTP_PASSWORD",
        "LAXMI_CONCIERGE_EMAIL",
        "LAXMI_ADMIN_EMAIL",
        "LAXMI_ADMIN_PASSWORD",
    ];

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        let guard = super::CONFIG_ENV_MUTEX
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
        guard
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let config = Config::load(std::path::Path::new("nonexistent_config.yml")).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.site.url, "https://laxmi.it");
        assert_eq!(config.site.default_locale, Locale::It);
        assert_eq!(config.database.url, "data/laxmi.db");
        assert_eq!(config.cache.ttl_seconds, 3600);
        assert_eq!(config.upload.max_file_size, 5 * 1024 * 1024);
        assert!(!config.smtp.is_enabled());
        assert!(config.admin.email.is_none());
    }

    #[test]
    fn test_load_empty_file_returns_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "   \n").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_load_partial_config_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: 3000\nsmtp:\n  host: smtp.example.com\n").unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(config.smtp.is_enabled());
        assert_eq!(config.smtp.port, 587);
        assert_eq!(config.smtp.concierge_email, "concierge@laxmi.it");
    }

    #[test]
    fn test_load_full_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
server:
  host: "127.0.0.1"
  port: 9000
site:
  url: "https://staging.laxmi.it"
  default_locale: en
database:
  url: "/var/lib/laxmi/site.db"
cache:
  ttl_seconds: 120
upload:
  path: "/srv/uploads"
  max_file_size: 1048576
admin:
  email: "owner@laxmi.it"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.site.url, "https://staging.laxmi.it");
        assert_eq!(config.site.default_locale, Locale::En);
        assert_eq!(config.database.url, "/var/lib/laxmi/site.db");
        assert_eq!(config.cache.ttl_seconds, 120);
        assert_eq!(config.upload.path, PathBuf::from("/srv/uploads"));
        assert_eq!(config.upload.max_file_size, 1_048_576);
        assert_eq!(config.admin.email.as_deref(), Some("owner@laxmi.it"));
    }

    #[test]
    fn test_load_invalid_yaml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: not_a_number\n").unwrap();

        let err = Config::load(file.path()).unwrap_err().to_string();
        assert!(err.contains("parse"));
    }

    #[test]
    fn test_load_rejects_relative_site_url() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "site:\n  url: laxmi.it\n").unwrap();

        let err = Config::load(file.path()).unwrap_err().to_string();
        assert!(err.contains("site.url"));
    }

    #[test]
    fn test_env_overrides() {
        let _guard = lock_env();

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: 8080\n").unwrap();

        std::env::set_var("LAXMI_SERVER_PORT", "4000");
        std::env::set_var("LAXMI_SITE_URL", "https://example.org");
        std::env::set_var("LAXMI_SMTP_HOST", "mail.example.org");
        std::env::set_var("LAXMI_ADMIN_EMAIL", "admin@example.org");

        let config = Config::load_with_env(file.path()).unwrap();

        assert_eq!(config.server.port, 4000);
        assert_eq!(config.site.url, "https://example.org");
        assert!(config.smtp.is_enabled());
        assert_eq!(config.admin.email.as_deref(), Some("admin@example.org"));

        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_env_override_ignores_invalid_numbers() {
        let _guard = lock_env();

        std::env::set_var("LAXMI_SERVER_PORT", "not-a-port");
        std::env::set_var("LAXMI_SITE_DEFAULT_LOCALE", "fr");

        let config = Config::load_with_env(std::path::Path::new("nonexistent.yml")).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.site.default_locale, Locale::It);

        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_absolute_url() {
        let site = SiteConfig {
            url: "https://laxmi.it/".to_string(),
            ..SiteConfig::default()
        };
        assert_eq!(site.absolute_url(""), "https://laxmi.it");
        assert_eq!(site.absolute_url("/en/book"), "https://laxmi.it/en/book");
        assert_eq!(site.absolute_url("it"), "https://laxmi.it/it");
    }

    #[test]
    fn test_upload_type_checks() {
        let upload = UploadConfig::default();
        assert!(upload.is_type_allowed("image/webp"));
        assert!(!upload.is_type_allowed("application/pdf"));
        assert_eq!(upload.get_extension("image/jpeg"), "jpg");
        assert_eq!(upload.get_extension("text/plain"), "bin");
    }
}
