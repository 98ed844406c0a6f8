//! In-memory session store with idle TTL and capacity management.
//!
//! Session tokens are 32 bytes of cryptographically secure random data,
//! base64-url encoded without padding (43 characters). Every save pushes the
//! session's expiry forward by the idle TTL; expired sessions are removed
//! lazily on access and periodically by
//! [`spawn_cleanup_task`](super::spawn_cleanup_task).

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;
use tracing::{debug, trace, warn};

use super::{Session, SessionError, SessionStore};
use crate::types::SessionData;

/// Default idle TTL (24 hours).
pub const DEFAULT_IDLE_TTL_SECS: u64 = 86_400;

/// Default maximum number of sessions.
pub const DEFAULT_MAX_CAPACITY: usize = 10_000;

/// Size of the random token in bytes.
const TOKEN_BYTES: usize = 32;

/// Expected length of a base64-url encoded token.
const TOKEN_LENGTH: usize = 43;

/// Configuration for the memory store.
#[derive(Debug, Clone, Copy)]
pub struct MemoryStoreConfig {
    /// Maximum number of concurrent sessions.
    pub max_capacity: usize,

    /// How long a session survives without being saved.
    pub idle_ttl: Duration,
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        Self {
            max_capacity: DEFAULT_MAX_CAPACITY,
            idle_ttl: Duration::from_secs(DEFAULT_IDLE_TTL_SECS),
        }
    }
}

impl MemoryStoreConfig {
    /// Creates a configuration with custom values.
    pub fn new(max_capacity: usize, idle_ttl: Duration) -> Self {
        Self {
            max_capacity,
            idle_ttl,
        }
    }
}

#[derive(Debug)]
struct Entry {
    data: SessionData,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Thread-safe in-memory session store.
///
/// Clones share the same sessions.
#[derive(Clone)]
pub struct MemoryStore {
    sessions: Arc<RwLock<HashMap<String, Entry>>>,
    config: MemoryStoreConfig,
}

impl MemoryStore {
    /// Creates a new, empty store.
    pub fn new(config: MemoryStoreConfig) -> Self {
        debug!(
            max_capacity = config.max_capacity,
            idle_ttl_secs = config.idle_ttl.as_secs(),
            "Creating in-memory session store"
        );
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    /// Current number of sessions, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if the store holds no sessions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of sessions the store accepts.
    pub fn max_capacity(&self) -> usize {
        self.config.max_capacity
    }

    /// Removes all expired sessions, returning how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let initial_len = sessions.len();

        sessions.retain(|_, entry| !entry.is_expired());

        let removed = initial_len - sessions.len();
        if removed > 0 {
            debug!(
                removed_count = removed,
                remaining_count = sessions.len(),
                "Cleaned up expired sessions"
            );
        }
        removed
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(MemoryStoreConfig::default())
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("session_count", &self.len())
            .field("config", &self.config)
            .finish()
    }
}

impl SessionStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn load(&self, cookie: Option<&str>) -> Session {
        let Some(token) = cookie else {
            return Session::new();
        };

        if token.len() != TOKEN_LENGTH {
            trace!(token_len = token.len(), "Invalid session token length");
            return Session::new();
        }

        {
            let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
            match sessions.get(token) {
                Some(entry) if !entry.is_expired() => {
                    trace!(list_count = entry.data.lists.len(), "Session loaded");
                    return Session::with_key(token.to_string(), entry.data.clone());
                }
                Some(_) => {}
                None => {
                    trace!("Session token not found");
                    return Session::new();
                }
            }
        }

        // Present but expired. A concurrent save may have refreshed it since
        // the read lock was released.
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        match sessions.get(token) {
            Some(entry) if !entry.is_expired() => {
                Session::with_key(token.to_string(), entry.data.clone())
            }
            Some(_) => {
                sessions.remove(token);
                trace!("Removed expired session during load");
                Session::new()
            }
            None => Session::new(),
        }
    }

    fn session_count(&self) -> Option<usize> {
        Some(self.len())
    }

    fn cleanup_expired(&self) -> usize {
        MemoryStore::cleanup_expired(self)
    }

    fn save(&self, session: Session) -> Result<String, SessionError> {
        let Session { key, data } = session;
        let expires_at = Instant::now() + self.config.idle_ttl;

        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(token) = key {
            if let Some(entry) = sessions.get_mut(&token) {
                entry.data = data;
                entry.expires_at = expires_at;
                trace!("Session updated");
                return Ok(token);
            }
        }

        if sessions.len() >= self.config.max_capacity {
            warn!(
                capacity = sessions.len(),
                max_capacity = self.config.max_capacity,
                "Session store at capacity, rejecting new session"
            );
            return Err(SessionError::AtCapacity {
                max_capacity: self.config.max_capacity,
            });
        }

        let token = generate_session_token();
        sessions.insert(token.clone(), Entry { data, expires_at });
        trace!(session_count = sessions.len(), "Session created");

        Ok(token)
    }
}

/// Generates a cryptographically secure session token.
fn generate_session_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
