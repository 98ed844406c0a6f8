//! Per-request session context and the pluggable stores behind it.
//!
//! Each request loads a [`Session`] from its cookie, the mutation handlers
//! work on the session's [`SessionData`], and the response saves it back.
//! Two [`SessionStore`] implementations exist:
//!
//! - [`MemoryStore`] keeps session data in process memory, keyed by an opaque
//!   random token carried in the cookie.
//! - [`CookieStore`] carries the whole session in the cookie, signed with
//!   Ed25519 so it cannot be altered client-side.
//!
//! A cookie that cannot be resolved (unknown token, expired session, bad
//! signature) never fails the request; it yields a fresh, empty session.
//!
//! # Example
//!
//! ```rust
//! use todos_server::session::{MemoryStore, MemoryStoreConfig, SessionStore};
//!
//! let store = MemoryStore::new(MemoryStoreConfig::default());
//!
//! let mut session = store.load(None);
//! session.data.add_list("Groceries");
//! let cookie = store.save(session).expect("store has capacity");
//!
//! let session = store.load(Some(&cookie));
//! assert_eq!(session.data.lists.len(), 1);
//! ```

mod cookie;
mod memory;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use thiserror::Error;

use crate::config::{Config, ConfigError, SessionBackend};
use crate::types::SessionData;

pub use cookie::{CookieStore, MAX_COOKIE_SIZE};
pub use memory::{MemoryStore, MemoryStoreConfig, DEFAULT_IDLE_TTL_SECS, DEFAULT_MAX_CAPACITY};

/// Name of the cookie carrying the session.
pub const SESSION_COOKIE: &str = "todos.session";

/// Errors that can occur while saving a session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The memory store has reached maximum capacity.
    #[error("session store at maximum capacity ({max_capacity} sessions)")]
    AtCapacity {
        /// The maximum number of sessions allowed.
        max_capacity: usize,
    },

    /// The encoded session does not fit in a cookie.
    #[error("session cookie too large ({size} bytes, limit {limit})")]
    CookieTooLarge {
        /// Encoded size in bytes.
        size: usize,
        /// Maximum allowed size in bytes.
        limit: usize,
    },

    /// The session data could not be serialized.
    #[error("failed to encode session: {0}")]
    Encode(String),
}

/// The session attached to a single request.
///
/// Handlers mutate [`Session::data`]; the store decides how the result is
/// persisted when the session is saved.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Store-specific handle: the memory store's token or the verified
    /// cookie value. `None` means no existing session was resolved.
    key: Option<String>,

    /// Lists and pending flash messages.
    pub data: SessionData,
}

impl Session {
    /// Creates a fresh session with no data and no store handle.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_key(key: String, data: SessionData) -> Self {
        Self {
            key: Some(key),
            data,
        }
    }

    /// Returns the store handle, if this session was loaded from a store.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }
}

/// Backing storage for sessions.
///
/// Implementations must be safe to share across request handlers.
pub trait SessionStore: Send + Sync + fmt::Debug {
    /// Short backend name used in logs and the health endpoint.
    fn name(&self) -> &'static str;

    /// Resolves the session for a cookie value.
    ///
    /// Returns a fresh session when the cookie is absent or cannot be
    /// resolved.
    fn load(&self, cookie: Option<&str>) -> Session;

    /// Persists the session and returns the cookie value to send back.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] if the session cannot be stored.
    fn save(&self, session: Session) -> Result<String, SessionError>;

    /// Number of sessions held server-side, if the store keeps any.
    fn session_count(&self) -> Option<usize> {
        None
    }

    /// Drops expired sessions, returning how many were removed.
    fn cleanup_expired(&self) -> usize {
        0
    }
}

/// Builds the session store selected by the configuration.
///
/// # Errors
///
/// Returns [`ConfigError::MissingEnvVar`] if the cookie backend is selected
/// without a signing secret.
pub fn store_from_config(config: &Config) -> Result<Arc<dyn SessionStore>, ConfigError> {
    match config.session_backend {
        SessionBackend::Memory => Ok(Arc::new(MemoryStore::new(MemoryStoreConfig::new(
            config.max_sessions,
            config.session_ttl,
        )))),
        SessionBackend::Cookie => {
            let secret = config
                .session_secret
                .as_ref()
                .ok_or_else(|| ConfigError::MissingEnvVar("TODOS_SESSION_SECRET".to_string()))?;
            Ok(Arc::new(CookieStore::new(secret.as_bytes())))
        }
    }
}

/// Spawns a background task that periodically purges expired sessions.
///
/// Must be called from within a tokio runtime.
pub fn spawn_cleanup_task(
    store: Arc<dyn SessionStore>,
    cleanup_interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cleanup_interval);
        loop {
            interval.tick().await;
            store.cleanup_expired();
        }
    })
}

/// Extracts the value of the named cookie from the request headers.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// Builds the `Set-Cookie` header value for the session cookie.
pub fn session_cookie_header(value: &str) -> String {
    format!("{SESSION_COOKIE}={value}; Path=/; HttpOnly; SameSite=Lax")
}
