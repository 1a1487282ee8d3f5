//! Cache key builders for every entry the identity plane writes.
//!
//! The layout is shared with other services reading the same store, so
//! these strings are part of the external interface.

use uuid::Uuid;

// ── Session keys ───────────────────────────────────────────

/// Cache key for a session record.
pub fn session(session_id: Uuid) -> String {
    format!("session:{session_id}")
}

/// Pattern matching every session record.
pub const SESSION_PATTERN: &str = "session:*";

/// Parse the session id out of a session key.
pub fn session_id_from_key(key: &str) -> Option<Uuid> {
    key.strip_prefix("session:")
        .and_then(|raw| Uuid::parse_str(raw).ok())
}

/// Cache key marking a session as ended by logout or revocation.
pub fn ended_session(session_id: Uuid) -> String {
    format!("session_ended:{session_id}")
}

/// Cache key for the set of session ids owned by an identity.
pub fn user_sessions(user_id: Uuid) -> String {
    format!("user_sessions:{user_id}")
}

/// Pattern matching every per-identity session index.
pub const USER_SESSIONS_PATTERN: &str = "user_sessions:*";

// ── Token keys ─────────────────────────────────────────────

/// Cache key marking a token id as revoked.
pub fn revoked_token(jti: &str) -> String {
    format!("jwt:blacklist:{jti}")
}
