//! Application configuration
//!
//! Loaded from a TOML file (default `~/.config/nts-server/config.toml`),
//! then patched from environment variables. Every section has defaults so
//! an empty file is a valid configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the bootstrap account created when none exists.
pub const DEFAULT_ADMIN_USERNAME: &str = "Admin";
const DEFAULT_ADMIN_PASSWORD: &str = "Admin";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Default config file location: `<config_dir>/nts-server/config.toml`
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("nts-server")
        .join("config.toml")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSection,
    pub security: SecurityConfig,
    pub session: SessionConfig,
    pub geo: GeoConfig,
    pub admin: AdminConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Seconds to wait for in-flight requests on shutdown
    pub shutdown_timeout: u64,
    /// Take the client IP from the first `X-Forwarded-For` hop.
    /// Only enable behind a trusted reverse proxy.
    pub trust_proxy_headers: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            shutdown_timeout: 30,
            trust_proxy_headers: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: "sqlite://./database.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub environment: Environment,
    /// HMAC signing secret for access tokens. Required in production.
    pub jwt_secret: Option<String>,
    pub jwt_issuer: String,
    pub token_ttl_hours: i64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            jwt_secret: None,
            jwt_issuer: "nts-server".to_string(),
            token_ttl_hours: 24,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Sessions idle for longer than this are swept
    pub stale_after_hours: i64,
    pub sweep_on_startup: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            stale_after_hours: 24,
            sweep_on_startup: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoConfig {
    pub enabled: bool,
    pub base_url: String,
    pub timeout_ms: u64,
    pub cache_ttl_secs: u64,
    /// Upper bound on cached lookups
    pub cache_capacity: usize,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://ipapi.co".to_string(),
            timeout_ms: 1500,
            cache_ttl_secs: 3600,
            cache_capacity: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub username: String,
    pub password: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: DEFAULT_ADMIN_USERNAME.to_string(),
            password: DEFAULT_ADMIN_PASSWORD.to_string(),
        }
    }
}

impl AdminConfig {
    pub fn uses_default_password(&self) -> bool {
        self.password == DEFAULT_ADMIN_PASSWORD
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file and apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut cfg = Self::from_toml_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        cfg.apply_env();
        Ok(cfg)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Defaults patched from the environment; used when no file exists.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.apply_env();
        cfg
    }

    fn apply_env(&mut self) {
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            if !secret.is_empty() {
                self.security.jwt_secret = Some(secret);
            }
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Ok(env) = std::env::var("NTS_ENV") {
            match env.to_lowercase().as_str() {
                "production" | "prod" => self.security.environment = Environment::Production,
                "development" | "dev" => self.security.environment = Environment::Development,
                _ => {}
            }
        }
    }

    /// Resolve the token signing secret.
    ///
    /// Production requires an explicit secret. Development without one gets
    /// a random per-process secret, so tokens do not survive a restart.
    pub fn resolve_jwt_secret(&self) -> Result<String, ConfigError> {
        match &self.security.jwt_secret {
            Some(secret) if secret.len() >= 16 => Ok(secret.clone()),
            Some(_) if self.security.environment.is_production() => Err(ConfigError::Invalid(
                "security.jwt_secret must be at least 16 characters in production".into(),
            )),
            Some(secret) => Ok(secret.clone()),
            None if self.security.environment.is_production() => Err(ConfigError::Invalid(
                "security.jwt_secret (or JWT_SECRET) must be set in production".into(),
            )),
            None => {
                use rand::RngCore;
                let mut bytes = [0u8; 32];
                rand::thread_rng().fill_bytes(&mut bytes);
                Ok(hex::encode(bytes))
            }
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = AppConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.server.port, 8000);
        assert_eq!(cfg.security.token_ttl_hours, 24);
        assert_eq!(cfg.session.stale_after_hours, 24);
        assert_eq!(cfg.admin.username, "Admin");
        assert!(cfg.geo.enabled);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = AppConfig::from_toml_str(
            r#"
            [server]
            port = 9100
            trust_proxy_headers = true

            [security]
            environment = "production"
            jwt_secret = "0123456789abcdef0123"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.port, 9100);
        assert!(cfg.server.trust_proxy_headers);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert!(cfg.security.environment.is_production());
        assert_eq!(cfg.resolve_jwt_secret().unwrap(), "0123456789abcdef0123");
    }

    #[test]
    fn production_without_secret_is_rejected() {
        let mut cfg = AppConfig::default();
        cfg.security.environment = Environment::Production;
        assert!(cfg.resolve_jwt_secret().is_err());
    }

    #[test]
    fn development_without_secret_gets_random_secret() {
        let cfg = AppConfig::default();
        let a = cfg.resolve_jwt_secret().unwrap();
        let b = cfg.resolve_jwt_secret().unwrap();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
    }
}
