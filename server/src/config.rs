//! Server configuration module.
//!
//! Parses configuration from environment variables for the todos server.
//!
//! # Environment Variables
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `PORT` | No | 4567 | HTTP server port |
//! | `TODOS_SESSION_STORE` | No | `memory` | Session backend: `memory` or `cookie` |
//! | `TODOS_SESSION_SECRET` | Yes* | - | Base64-encoded 32-byte key for signing session cookies |
//! | `TODOS_SESSION_TTL_SECS` | No | 86400 | Idle lifetime of in-memory sessions |
//! | `TODOS_MAX_SESSIONS` | No | 10000 | Maximum number of in-memory sessions |
//!
//! *Only required when `TODOS_SESSION_STORE=cookie`

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use base64::prelude::*;
use thiserror::Error;
use zeroize::Zeroize;

use crate::session::{DEFAULT_IDLE_TTL_SECS, DEFAULT_MAX_CAPACITY};

/// Default HTTP server port.
const DEFAULT_PORT: u16 = 4567;

/// Length of the decoded session secret in bytes.
const SECRET_LENGTH: usize = 32;

/// Errors that can occur when parsing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Environment variable has invalid format.
    #[error("invalid format for {var}: {message}")]
    InvalidFormat { var: String, message: String },

    /// Port number is invalid.
    #[error("invalid port number: {0}")]
    InvalidPort(#[from] std::num::ParseIntError),
}

/// Which [`SessionStore`](crate::session::SessionStore) backs the sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionBackend {
    /// Sessions live in process memory; the cookie carries a token.
    #[default]
    Memory,

    /// Sessions live in a signed cookie.
    Cookie,
}

impl FromStr for SessionBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "cookie" => Ok(Self::Cookie),
            other => Err(ConfigError::InvalidFormat {
                var: "TODOS_SESSION_STORE".to_string(),
                message: format!("expected 'memory' or 'cookie', got '{other}'"),
            }),
        }
    }
}

/// Key material for signing session cookies.
///
/// Never printed by `Debug` and wiped from memory on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionSecret([u8; SECRET_LENGTH]);

impl SessionSecret {
    /// Wraps raw key bytes.
    pub fn new(bytes: [u8; SECRET_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Returns the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; SECRET_LENGTH] {
        &self.0
    }
}

impl Drop for SessionSecret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for SessionSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionSecret(<redacted>)")
    }
}

/// Server configuration parsed from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port.
    pub port: u16,

    /// Session backend.
    pub session_backend: SessionBackend,

    /// Signing key for the cookie backend.
    pub session_secret: Option<SessionSecret>,

    /// Idle lifetime of in-memory sessions.
    pub session_ttl: Duration,

    /// Maximum number of in-memory sessions.
    pub max_sessions: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            session_backend: SessionBackend::Memory,
            session_secret: None,
            session_ttl: Duration::from_secs(DEFAULT_IDLE_TTL_SECS),
            max_sessions: DEFAULT_MAX_CAPACITY,
        }
    }
}

impl Config {
    /// Parse configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - A variable has an invalid format
    /// - The port number is not a valid u16
    /// - `TODOS_SESSION_STORE=cookie` but `TODOS_SESSION_SECRET` is missing
    ///
    /// # Example
    ///
    /// ```no_run
    /// use todos_server::config::Config;
    ///
    /// let config = Config::from_env().expect("Failed to load config");
    /// println!("Server will listen on port {}", config.port);
    /// ```
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = parse_port()?;
        let session_backend = match non_empty_env("TODOS_SESSION_STORE") {
            Some(value) => value.parse()?,
            None => SessionBackend::default(),
        };
        let session_secret = parse_session_secret()?;
        let session_ttl = Duration::from_secs(parse_number_env(
            "TODOS_SESSION_TTL_SECS",
            DEFAULT_IDLE_TTL_SECS,
        )?);
        let max_sessions = parse_number_env("TODOS_MAX_SESSIONS", DEFAULT_MAX_CAPACITY)?;

        let config = Self {
            port,
            session_backend,
            session_secret,
            session_ttl,
            max_sessions,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// The cookie backend needs a signing secret; in-memory sessions need a
    /// non-zero lifetime and capacity.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.session_backend == SessionBackend::Cookie && self.session_secret.is_none() {
            return Err(ConfigError::MissingEnvVar(
                "TODOS_SESSION_SECRET".to_string(),
            ));
        }

        if self.session_ttl.is_zero() {
            return Err(ConfigError::InvalidFormat {
                var: "TODOS_SESSION_TTL_SECS".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        if self.max_sessions == 0 {
            return Err(ConfigError::InvalidFormat {
                var: "TODOS_MAX_SESSIONS".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}

/// Reads a variable, treating an empty value as unset.
fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Parse the PORT environment variable.
///
/// Returns the default port if not set.
fn parse_port() -> Result<u16, ConfigError> {
    match env::var("PORT") {
        Ok(port_str) => Ok(port_str.trim().parse()?),
        Err(env::VarError::NotPresent) => Ok(DEFAULT_PORT),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::InvalidFormat {
            var: "PORT".to_string(),
            message: "contains invalid unicode".to_string(),
        }),
    }
}

/// Parse an unsigned numeric variable, falling back to `default` when unset.
fn parse_number_env<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match non_empty_env(name) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidFormat {
            var: name.to_string(),
            message: format!("expected a non-negative integer, got '{value}'"),
        }),
        None => Ok(default),
    }
}

/// Parse the TODOS_SESSION_SECRET environment variable.
///
/// Expected format: standard base64 encoding of exactly 32 bytes.
fn parse_session_secret() -> Result<Option<SessionSecret>, ConfigError> {
    let Some(encoded) = non_empty_env("TODOS_SESSION_SECRET") else {
        return Ok(None);
    };

    let mut decoded = BASE64_STANDARD
        .decode(encoded.trim())
        .map_err(|_| ConfigError::InvalidFormat {
            var: "TODOS_SESSION_SECRET".to_string(),
            message: "not valid base64".to_string(),
        })?;

    if decoded.len() != SECRET_LENGTH {
        let len = decoded.len();
        decoded.zeroize();
        return Err(ConfigError::InvalidFormat {
            var: "TODOS_SESSION_SECRET".to_string(),
            message: format!("expected {SECRET_LENGTH} bytes, got {len}"),
        });
    }

    let mut key = [0u8; SECRET_LENGTH];
    key.copy_from_slice(&decoded);
    decoded.zeroize();

    let secret = SessionSecret::new(key);
    key.zeroize();
    Ok(Some(secret))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    /// Helper to temporarily set environment variables for testing.
    struct EnvGuard {
        vars: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn new() -> Self {
            Self { vars: Vec::new() }
        }

        fn set(&mut self, key: &str, value: &str) {
            let old_value = env::var(key).ok();
            self.vars.push((key.to_string(), old_value));
            env::set_var(key, value);
        }

        fn remove(&mut self, key: &str) {
            let old_value = env::var(key).ok();
            self.vars.push((key.to_string(), old_value));
            env::remove_var(key);
        }

        fn clear_all(&mut self) {
            for key in [
                "PORT",
                "TODOS_SESSION_STORE",
                "TODOS_SESSION_SECRET",
                "TODOS_SESSION_TTL_SECS",
                "TODOS_MAX_SESSIONS",
            ] {
                self.remove(key);
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in self.vars.iter().rev() {
                match value {
                    Some(v) => env::set_var(key, v),
                    None => env::remove_var(key),
                }
            }
        }
    }

    fn encoded_secret() -> String {
        BASE64_STANDARD.encode([3u8; SECRET_LENGTH])
    }

    #[test]
    #[serial]
    fn test_config_defaults() {
        let mut guard = EnvGuard::new();
        guard.clear_all();

        let config = Config::from_env().expect("should parse config");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.session_backend, SessionBackend::Memory);
        assert!(config.session_secret.is_none());
        assert_eq!(config.session_ttl, Duration::from_secs(DEFAULT_IDLE_TTL_SECS));
        assert_eq!(config.max_sessions, DEFAULT_MAX_CAPACITY);
    }

    #[test]
    #[serial]
    fn test_config_cookie_backend_with_secret() {
        let mut guard = EnvGuard::new();
        guard.clear_all();
        guard.set("TODOS_SESSION_STORE", "Cookie");
        guard.set("TODOS_SESSION_SECRET", &encoded_secret());
        guard.set("PORT", "9090");

        let config = Config::from_env().expect("should parse config");
        assert_eq!(config.session_backend, SessionBackend::Cookie);
        assert_eq!(
            config.session_secret,
            Some(SessionSecret::new([3u8; SECRET_LENGTH]))
        );
        assert_eq!(config.port, 9090);
    }

    #[test]
    #[serial]
    fn test_config_cookie_backend_requires_secret() {
        let mut guard = EnvGuard::new();
        guard.clear_all();
        guard.set("TODOS_SESSION_STORE", "cookie");

        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref v) if v == "TODOS_SESSION_SECRET"));
    }

    #[test]
    #[serial]
    fn test_config_unknown_backend() {
        let mut guard = EnvGuard::new();
        guard.clear_all();
        guard.set("TODOS_SESSION_STORE", "redis");

        let err = Config::from_env().unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidFormat { ref var, .. } if var == "TODOS_SESSION_STORE")
        );
    }

    #[test]
    #[serial]
    fn test_config_custom_ttl_and_capacity() {
        let mut guard = EnvGuard::new();
        guard.clear_all();
        guard.set("TODOS_SESSION_TTL_SECS", "600");
        guard.set("TODOS_MAX_SESSIONS", "50");

        let config = Config::from_env().expect("should parse config");
        assert_eq!(config.session_ttl, Duration::from_secs(600));
        assert_eq!(config.max_sessions, 50);
    }

    #[test]
    #[serial]
    fn test_config_rejects_zero_ttl_and_capacity() {
        let mut guard = EnvGuard::new();
        guard.clear_all();
        guard.set("TODOS_SESSION_TTL_SECS", "0");
        assert!(Config::from_env().is_err());

        guard.set("TODOS_SESSION_TTL_SECS", "60");
        guard.set("TODOS_MAX_SESSIONS", "0");
        assert!(Config::from_env().is_err());
    }

    #[test]
    #[serial]
    fn test_parse_number_env_invalid() {
        let mut guard = EnvGuard::new();
        guard.set("TODOS_MAX_SESSIONS", "lots");

        let err = parse_number_env("TODOS_MAX_SESSIONS", 1usize).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidFormat { ref var, .. } if var == "TODOS_MAX_SESSIONS"));
    }

    #[test]
    #[serial]
    fn test_parse_session_secret_wrong_length() {
        let mut guard = EnvGuard::new();
        guard.set("TODOS_SESSION_SECRET", &BASE64_STANDARD.encode([1u8; 16]));

        let err = parse_session_secret().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid format for TODOS_SESSION_SECRET: expected 32 bytes, got 16"
        );
    }

    #[test]
    #[serial]
    fn test_parse_session_secret_invalid_base64() {
        let mut guard = EnvGuard::new();
        guard.set("TODOS_SESSION_SECRET", "not base64!");

        assert!(parse_session_secret().is_err());
    }

    #[test]
    #[serial]
    fn test_parse_port_default() {
        let mut guard = EnvGuard::new();
        guard.remove("PORT");

        let port = parse_port().expect("should parse port");
        assert_eq!(port, DEFAULT_PORT);
    }

    #[test]
    #[serial]
    fn test_parse_port_invalid() {
        let mut guard = EnvGuard::new();
        guard.set("PORT", "not-a-number");

        let result = parse_port();
        assert!(matches!(result.unwrap_err(), ConfigError::InvalidPort(_)));
    }

    #[test]
    #[serial]
    fn test_parse_port_out_of_range() {
        let mut guard = EnvGuard::new();
        guard.set("PORT", "99999");

        assert!(parse_port().is_err());
    }

    #[test]
    fn test_session_secret_debug_is_redacted() {
        let secret = SessionSecret::new([42u8; SECRET_LENGTH]);
        let debug_str = format!("{secret:?}");
        assert_eq!(debug_str, "SessionSecret(<redacted>)");
        assert!(!format!("{:?}", Config {
            session_secret: Some(secret),
            ..Config::default()
        })
        .contains("42"));
    }
}
