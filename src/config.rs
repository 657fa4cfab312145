//! # Service Configuration
//!
//! Configuration is read from a TOML file, then selected values can be
//! overridden from `EBOOK_*` environment variables, then the result is
//! validated.
//!
//! ## Example: TOML Configuration
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8081
//! cors_allowed_origins = ["https://shop.example.com"]
//!
//! [auth]
//! jwt_secret = "change-me"
//! jwt_expiration_secs = 86400
//! blacklist_sweep_interval_secs = 600
//!
//! [orders]
//! pending_timeout_secs = 86400
//!
//! [admin]
//! username = "admin"
//! email = "admin@example.com"
//! password = "Admin@123"
//! ```
//!
//! Every section and field is optional; missing values fall back to the
//! defaults below.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration for the ebook store service.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub orders: OrderConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Account created at startup when no user with this username exists.
    #[serde(default)]
    pub admin: Option<BootstrapAdmin>,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// `["*"]` allows any origin.
    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_allowed_origins: default_cors_origins(),
        }
    }
}

/// Token, password and login throttling settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "default_jwt_expiration_secs")]
    pub jwt_expiration_secs: u64,
    #[serde(default = "default_blacklist_sweep_interval_secs")]
    pub blacklist_sweep_interval_secs: u64,
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
    #[serde(default = "default_login_max_attempts")]
    pub login_max_attempts: u32,
    #[serde(default = "default_login_window_secs")]
    pub login_window_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            jwt_expiration_secs: default_jwt_expiration_secs(),
            blacklist_sweep_interval_secs: default_blacklist_sweep_interval_secs(),
            bcrypt_cost: default_bcrypt_cost(),
            login_max_attempts: default_login_max_attempts(),
            login_window_secs: default_login_window_secs(),
        }
    }
}

impl AuthConfig {
    pub fn jwt_expiration(&self) -> Duration {
        Duration::from_secs(self.jwt_expiration_secs)
    }

    pub fn blacklist_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.blacklist_sweep_interval_secs)
    }

    pub fn login_window(&self) -> Duration {
        Duration::from_secs(self.login_window_secs)
    }
}

/// Background order maintenance settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrderConfig {
    #[serde(default = "default_order_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Pending orders older than this are canceled.
    #[serde(default = "default_pending_timeout_secs")]
    pub pending_timeout_secs: u64,
    /// Canceled orders untouched for this long are deleted.
    #[serde(default = "default_canceled_retention_secs")]
    pub canceled_retention_secs: u64,
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_order_sweep_interval_secs(),
            pending_timeout_secs: default_pending_timeout_secs(),
            canceled_retention_secs: default_canceled_retention_secs(),
        }
    }
}

impl OrderConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn expiry_policy(&self) -> crate::models::ExpiryPolicy {
        let secs = |s: u64| {
            i64::try_from(s)
                .ok()
                .and_then(chrono::Duration::try_seconds)
                .unwrap_or(chrono::Duration::MAX)
        };
        crate::models::ExpiryPolicy {
            pending_timeout: secs(self.pending_timeout_secs),
            canceled_retention: secs(self.canceled_retention_secs),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BootstrapAdmin {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Config {
    /// Apply `EBOOK_*` environment overrides on top of file values.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secret) = lookup("EBOOK_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(value) = lookup("EBOOK_JWT_EXPIRATION_SECS") {
            self.auth.jwt_expiration_secs = parse_env("EBOOK_JWT_EXPIRATION_SECS", &value)?;
        }
        if let Some(host) = lookup("EBOOK_HOST") {
            self.server.host = host;
        }
        if let Some(value) = lookup("EBOOK_PORT") {
            self.server.port = parse_env("EBOOK_PORT", &value)?;
        }
        if let Some(level) = lookup("EBOOK_LOG_LEVEL") {
            self.logging.level = level;
        }
        Ok(())
    }

    /// Reject values the service cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Invalid("auth.jwt_secret must not be empty".to_string()));
        }
        if self.auth.jwt_expiration_secs == 0 {
            return Err(ConfigError::Invalid("auth.jwt_expiration_secs must be > 0".to_string()));
        }
        if self.auth.blacklist_sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "auth.blacklist_sweep_interval_secs must be > 0".to_string(),
            ));
        }
        if !(4..=31).contains(&self.auth.bcrypt_cost) {
            return Err(ConfigError::Invalid(format!(
                "auth.bcrypt_cost must be between 4 and 31, got {}",
                self.auth.bcrypt_cost
            )));
        }
        if self.auth.login_max_attempts == 0 || self.auth.login_window_secs == 0 {
            return Err(ConfigError::Invalid(
                "auth.login_max_attempts and auth.login_window_secs must be > 0".to_string(),
            ));
        }
        if self.orders.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid("orders.sweep_interval_secs must be > 0".to_string()));
        }
        if let Some(admin) = &self.admin {
            if admin.username.trim().is_empty() || admin.password.len() < 6 {
                return Err(ConfigError::Invalid(
                    "admin.username must be set and admin.password must be at least 6 characters"
                        .to_string(),
                ));
            }
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{key} has invalid value '{value}'")))
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8081 }
fn default_cors_origins() -> Vec<String> { vec!["*".to_string()] }
fn default_jwt_secret() -> String { "default_secret_should_be_changed".to_string() }
fn default_jwt_expiration_secs() -> u64 { 24 * 60 * 60 }
fn default_blacklist_sweep_interval_secs() -> u64 { 10 * 60 }
fn default_bcrypt_cost() -> u32 { bcrypt::DEFAULT_COST }
fn default_login_max_attempts() -> u32 { 5 }
fn default_login_window_secs() -> u64 { 60 }
fn default_order_sweep_interval_secs() -> u64 { 60 * 60 }
fn default_pending_timeout_secs() -> u64 { 24 * 60 * 60 }
fn default_canceled_retention_secs() -> u64 { 48 * 60 * 60 }
fn default_log_level() -> String { "info".to_string() }

/// Load configuration from a TOML file at the given path.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::error!("Failed to parse config TOML: {}", e);
                Err(ConfigError::Toml(e))
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file '{}': {}", path.display(), e);
            Err(ConfigError::Io(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.auth.jwt_expiration(), Duration::from_secs(86400));
        assert_eq!(config.auth.blacklist_sweep_interval(), Duration::from_secs(600));
        assert_eq!(config.auth.login_max_attempts, 5);
        assert_eq!(config.orders.pending_timeout_secs, 86400);
        assert_eq!(config.orders.canceled_retention_secs, 172800);
        assert!(config.admin.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_config_success() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("store.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(
            file,
            "[server]\nport = 9000\n[auth]\njwt_secret = 'abc'\n[admin]\nusername = 'root'\nemail = 'root@example.com'\npassword = 'secret1'"
        )
        .unwrap();
        file.flush().unwrap();
        let config = load_config(&file_path).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.auth.jwt_secret, "abc");
        assert_eq!(config.admin.as_ref().unwrap().username, "root");
        // Defaults for missing fields
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.auth.jwt_expiration_secs, 86400);
    }

    #[test]
    fn test_expiry_policy_saturates() {
        let mut config = Config::default();
        assert_eq!(config.orders.expiry_policy().pending_timeout, chrono::Duration::hours(24));
        config.orders.pending_timeout_secs = u64::MAX;
        config.orders.canceled_retention_secs = 9_300_000_000_000_000;
        let policy = config.orders.expiry_policy();
        assert_eq!(policy.pending_timeout, chrono::Duration::MAX);
        assert_eq!(policy.canceled_retention, chrono::Duration::MAX);
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent_file.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("bad.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "not a valid toml").unwrap();
        file.flush().unwrap();
        let result = load_config(&file_path);
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_env_overrides() {
        let vars = HashMap::from([
            ("EBOOK_JWT_SECRET", "from-env"),
            ("EBOOK_JWT_EXPIRATION_SECS", "120"),
            ("EBOOK_PORT", "7070"),
        ]);
        let mut config = Config::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.auth.jwt_secret, "from-env");
        assert_eq!(config.auth.jwt_expiration_secs, 120);
        assert_eq!(config.server.port, 7070);
    }

    #[test]
    fn test_env_override_rejects_garbage() {
        let mut config = Config::default();
        let result = config.apply_overrides(|key| (key == "EBOOK_PORT").then(|| "eighty".to_string()));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.auth.jwt_secret = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.auth.blacklist_sweep_interval_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.auth.bcrypt_cost = 2;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.admin = Some(BootstrapAdmin {
            username: "admin".to_string(),
            email: "admin@example.com".to_string(),
            password: "123".to_string(),
        });
        assert!(config.validate().is_err());
    }
}
