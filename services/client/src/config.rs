//! services/client/src/config.rs
//!
//! Defines the client's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// How the token is presented in the `Authorization` header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthScheme {
    /// `Authorization: Token <t>` (Django REST framework token auth).
    Token,
    /// `Authorization: Bearer <t>`.
    Bearer,
}

impl AuthScheme {
    pub fn header_value(&self, token: &str) -> String {
        match self {
            AuthScheme::Token => format!("Token {}", token),
            AuthScheme::Bearer => format!("Bearer {}", token),
        }
    }
}

impl std::str::FromStr for AuthScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "token" => Ok(AuthScheme::Token),
            "bearer" => Ok(AuthScheme::Bearer),
            other => Err(format!("'{}' is not one of token, bearer", other)),
        }
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_base_url: String,
    pub auth_scheme: AuthScheme,
    pub request_timeout: Duration,
    pub autosave_delay: Duration,
    /// `None` means the platform data directory.
    pub store_path: Option<PathBuf>,
    pub log_level: Level,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            auth_scheme: AuthScheme::Token,
            request_timeout: Duration::from_secs(10),
            autosave_delay: Duration::from_millis(1000),
            store_path: None,
            log_level: Level::INFO,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        // --- Backend ---
        let api_base_url = lookup("API_BASE_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base_url);
        if !(api_base_url.starts_with("http://") || api_base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue(
                "API_BASE_URL".to_string(),
                format!("'{}' must start with http:// or https://", api_base_url),
            ));
        }

        let auth_scheme = match lookup("AUTH_SCHEME") {
            Some(raw) => raw
                .parse::<AuthScheme>()
                .map_err(|e| ConfigError::InvalidValue("AUTH_SCHEME".to_string(), e))?,
            None => defaults.auth_scheme,
        };

        // --- Timings ---
        let request_timeout = match lookup("REQUEST_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_number("REQUEST_TIMEOUT_SECS", &raw)?),
            None => defaults.request_timeout,
        };
        let autosave_delay = match lookup("AUTOSAVE_DELAY_MS") {
            Some(raw) => Duration::from_millis(parse_number("AUTOSAVE_DELAY_MS", &raw)?),
            None => defaults.autosave_delay,
        };

        // --- Local State & Logging ---
        let store_path = lookup("ATTICUS_STORE").map(PathBuf::from);

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            api_base_url,
            auth_scheme,
            request_timeout,
            autosave_delay,
            store_path,
            log_level,
        })
    }

    /// The WebSocket origin matching the HTTP base URL.
    pub fn ws_base_url(&self) -> String {
        if let Some(rest) = self.api_base_url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.api_base_url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            self.api_base_url.clone()
        }
    }
}

fn parse_number(var: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse::<u64>().map_err(|_| {
        ConfigError::InvalidValue(var.to_string(), format!("'{}' is not a whole number", raw))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.api_base_url, "http://localhost:8000");
        assert_eq!(config.auth_scheme, AuthScheme::Token);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.autosave_delay, Duration::from_millis(1000));
        assert!(config.store_path.is_none());
    }

    #[test]
    fn values_are_read_from_the_environment() {
        let config = Config::from_lookup(lookup(&[
            ("API_BASE_URL", "https://writer.example.com/"),
            ("AUTH_SCHEME", "Bearer"),
            ("AUTOSAVE_DELAY_MS", "2000"),
            ("ATTICUS_STORE", "/tmp/store.json"),
            ("RUST_LOG", "debug"),
        ]))
        .unwrap();
        assert_eq!(config.api_base_url, "https://writer.example.com");
        assert_eq!(config.auth_scheme, AuthScheme::Bearer);
        assert_eq!(config.autosave_delay, Duration::from_millis(2000));
        assert_eq!(config.store_path, Some(PathBuf::from("/tmp/store.json")));
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.ws_base_url(), "wss://writer.example.com");
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            Config::from_lookup(lookup(&[("AUTH_SCHEME", "basic")])),
            Err(ConfigError::InvalidValue(var, _)) if var == "AUTH_SCHEME"
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("AUTOSAVE_DELAY_MS", "soon")])),
            Err(ConfigError::InvalidValue(var, _)) if var == "AUTOSAVE_DELAY_MS"
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("API_BASE_URL", "localhost:8000")])),
            Err(ConfigError::InvalidValue(var, _)) if var == "API_BASE_URL"
        ));
    }

    #[test]
    fn header_value_follows_scheme() {
        assert_eq!(AuthScheme::Token.header_value("abc"), "Token abc");
        assert_eq!(AuthScheme::Bearer.header_value("abc"), "Bearer abc");
        let config = Config::default();
        assert_eq!(config.ws_base_url(), "ws://localhost:8000");
    }
}
