//! Signed-cookie session store.
//!
//! The whole [`SessionData`] travels in the cookie as
//! `base64url(json) "." base64url(signature)`, where the signature is an
//! Ed25519 signature over the encoded payload text. Nothing is kept
//! server-side, so the store itself is stateless.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey, SIGNATURE_LENGTH};
use thiserror::Error;
use tracing::{trace, warn};

use super::{Session, SessionError, SessionStore};
use crate::types::SessionData;

/// Largest cookie value the store will emit, in bytes.
pub const MAX_COOKIE_SIZE: usize = 4096;

/// Reasons a cookie value could not be decoded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub(crate) enum DecodeError {
    #[error("missing signature separator")]
    Malformed,

    #[error("invalid base64 encoding for {0}")]
    InvalidBase64(&'static str),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid session payload: {0}")]
    InvalidPayload(String),
}

/// Session store that keeps all state in a signed cookie.
pub struct CookieStore {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl CookieStore {
    /// Creates a store signing with the Ed25519 key derived from `secret`.
    pub fn new(secret: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(secret);
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Encodes and signs session data into a cookie value.
    pub(crate) fn encode(&self, data: &SessionData) -> Result<String, SessionError> {
        let json = serde_json::to_vec(data).map_err(|err| SessionError::Encode(err.to_string()))?;
        let payload = URL_SAFE_NO_PAD.encode(json);
        let signature = self.signing_key.sign(payload.as_bytes());
        let value = format!("{payload}.{}", URL_SAFE_NO_PAD.encode(signature.to_bytes()));

        if value.len() > MAX_COOKIE_SIZE {
            return Err(SessionError::CookieTooLarge {
                size: value.len(),
                limit: MAX_COOKIE_SIZE,
            });
        }
        Ok(value)
    }

    /// Verifies and decodes a cookie value.
    pub(crate) fn decode(&self, value: &str) -> Result<SessionData, DecodeError> {
        let (payload, signature) = value.rsplit_once('.').ok_or(DecodeError::Malformed)?;

        let signature_bytes = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| DecodeError::InvalidBase64("signature"))?;
        let signature_array: [u8; SIGNATURE_LENGTH] = signature_bytes
            .try_into()
            .map_err(|_| DecodeError::InvalidSignature)?;
        let signature = Signature::from_bytes(&signature_array);

        self.verifying_key
            .verify_strict(payload.as_bytes(), &signature)
            .map_err(|_| DecodeError::InvalidSignature)?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| DecodeError::InvalidBase64("payload"))?;
        serde_json::from_slice(&json).map_err(|err| DecodeError::InvalidPayload(err.to_string()))
    }
}

impl std::fmt::Debug for CookieStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieStore")
            .field("signing_key", &"<redacted>")
            .finish()
    }
}

impl SessionStore for CookieStore {
    fn name(&self) -> &'static str {
        "cookie"
    }

    fn load(&self, cookie: Option<&str>) -> Session {
        let Some(value) = cookie else {
            return Session::new();
        };

        match self.decode(value) {
            Ok(data) => {
                trace!(list_count = data.lists.len(), "Session cookie verified");
                Session::with_key(value.to_string(), data)
            }
            Err(err) => {
                warn!(error = %err, "Rejected session cookie, starting a fresh session");
                Session::new()
            }
        }
    }

    fn save(&self, session: Session) -> Result<String, SessionError> {
        let value = self.encode(&session.data)?;
        trace!(cookie_len = value.len(), "Session cookie encoded");
        Ok(value)
    }
}
