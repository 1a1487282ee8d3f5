//! Session records in the shared cache.
//!
//! Each session lives at `session:{id}` with a TTL equal to its remaining
//! lifetime. A per-identity set at `user_sessions:{user_id}` indexes the
//! ids so listing and bulk revocation avoid a keyspace scan. The index may
//! hold ids whose record already expired; readers prune them.
//!
//! A session that lapses from inactivity can be resumed under the same id
//! by a still-valid refresh token. Logout and bulk revocation instead leave
//! a `session_ended:{id}` marker that blocks resumption.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use remit_cache::keys;
use remit_cache::provider::CacheManager;
use remit_core::config::session::SessionConfig;
use remit_core::error::AppError;
use remit_core::result::AppResult;
use remit_core::traits::CacheProvider;
use remit_entity::session::Session;

/// Data for a new session.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: Uuid,
    pub email: String,
    pub role: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Manages session records.
#[derive(Debug, Clone)]
pub struct SessionManager {
    cache: Arc<CacheManager>,
    default_ttl: Duration,
    ended_ttl: Duration,
}

impl SessionManager {
    pub fn new(cache: Arc<CacheManager>, config: &SessionConfig) -> Self {
        Self {
            cache,
            default_ttl: Duration::from_secs(config.ttl_minutes * 60),
            ended_ttl: Duration::from_secs(config.ended_ttl_hours * 3600),
        }
    }

    /// Lifetime given to sessions created or refreshed without an explicit TTL.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Stores a new session and indexes it under its identity.
    pub async fn create(&self, new: NewSession, ttl: Duration) -> AppResult<Session> {
        let session = self.open(Uuid::new_v4(), new, ttl).await?;
        info!(
            session_id = %session.id,
            user_id = %session.user_id,
            "Session created"
        );
        Ok(session)
    }

    /// Re-opens a session that lapsed from inactivity, keeping its id so
    /// tokens bound to it stay valid. Fails with `NotFound` when the session
    /// was ended by logout or revocation.
    pub async fn resume(&self, id: Uuid, new: NewSession, ttl: Duration) -> AppResult<Session> {
        if self.is_ended(id).await? {
            return Err(AppError::not_found("Session has ended"));
        }
        let session = self.open(id, new, ttl).await?;
        info!(
            session_id = %session.id,
            user_id = %session.user_id,
            "Idle session resumed"
        );
        Ok(session)
    }

    /// Whether the session was ended by logout or revocation.
    pub async fn is_ended(&self, id: Uuid) -> AppResult<bool> {
        self.cache.exists(&keys::ended_session(id)).await
    }

    async fn open(&self, id: Uuid, new: NewSession, ttl: Duration) -> AppResult<Session> {
        let now = Utc::now();
        let session = Session {
            id,
            user_id: new.user_id,
            email: new.email,
            role: new.role,
            ip_address: new.ip_address,
            user_agent: new.user_agent,
            created_at: now,
            last_activity: now,
            expires_at: now + chrono_ttl(ttl)?,
            metadata: new.metadata,
        };

        self.store(&session, ttl).await?;
        let index = keys::user_sessions(session.user_id);
        self.cache.set_add(&index, &session.id.to_string()).await?;
        self.cache.expire(&index, ttl).await?;
        Ok(session)
    }

    /// Fetches a live session.
    pub async fn get(&self, id: Uuid) -> AppResult<Session> {
        let now = Utc::now();
        match self.load(id).await? {
            None => Err(AppError::not_found("Session not found")),
            Some(session) if session.is_expired_at(now) => {
                self.remove(&session).await?;
                Err(AppError::expired("Session has expired"))
            }
            Some(session) => Ok(session),
        }
    }

    /// Extends a live session to `now + ttl` and stamps its activity.
    pub async fn refresh(&self, id: Uuid, ttl: Duration) -> AppResult<Session> {
        let mut session = self.get(id).await?;
        let now = Utc::now();
        session.last_activity = now;
        session.expires_at = now + chrono_ttl(ttl)?;

        self.store(&session, ttl).await?;
        self.cache
            .expire(&keys::user_sessions(session.user_id), ttl)
            .await?;

        debug!(session_id = %id, expires_at = %session.expires_at, "Session refreshed");
        Ok(session)
    }

    /// Ends a session. Ending an unknown session only marks it ended.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.mark_ended(id).await?;
        match self.load(id).await {
            Ok(Some(session)) => self.remove(&session).await?,
            Ok(None) => {}
            Err(e) => {
                warn!(session_id = %id, error = %e, "Deleting unreadable session record");
                self.cache.delete(&keys::session(id)).await?;
            }
        }
        info!(session_id = %id, "Session deleted");
        Ok(())
    }

    /// Live sessions of an identity, oldest first.
    pub async fn list_by_identity(&self, user_id: Uuid) -> AppResult<Vec<Session>> {
        let index = keys::user_sessions(user_id);
        let now = Utc::now();
        let mut sessions = Vec::new();

        for member in self.cache.set_members(&index).await? {
            let live = match Uuid::parse_str(&member) {
                Ok(id) => self.load(id).await.ok().flatten(),
                Err(_) => None,
            };
            match live {
                Some(session) if !session.is_expired_at(now) => sessions.push(session),
                _ => self.cache.set_remove(&index, &member).await?,
            }
        }

        sessions.sort_by_key(|s| s.created_at);
        Ok(sessions)
    }

    /// Removes every session of an identity. Returns how many were live.
    pub async fn revoke_all(&self, user_id: Uuid) -> AppResult<usize> {
        let index = keys::user_sessions(user_id);
        let mut revoked = 0;

        for member in self.cache.set_members(&index).await? {
            if let Ok(id) = Uuid::parse_str(&member) {
                self.mark_ended(id).await?;
                let key = keys::session(id);
                if self.cache.exists(&key).await? {
                    revoked += 1;
                }
                self.cache.delete(&key).await?;
            }
        }
        self.cache.delete(&index).await?;

        info!(user_id = %user_id, revoked, "All sessions revoked");
        Ok(revoked)
    }

    /// Number of session records currently stored.
    pub async fn count(&self) -> AppResult<usize> {
        Ok(self.cache.scan_keys(keys::SESSION_PATTERN).await?.len())
    }

    /// Number of distinct identities holding a live session.
    pub async fn active_identity_count(&self) -> AppResult<usize> {
        let now = Utc::now();
        let mut identities = HashSet::new();
        for key in self.cache.scan_keys(keys::SESSION_PATTERN).await? {
            let Some(id) = keys::session_id_from_key(&key) else {
                continue;
            };
            if let Ok(Some(session)) = self.load(id).await {
                if !session.is_expired_at(now) {
                    identities.insert(session.user_id);
                }
            }
        }
        Ok(identities.len())
    }

    /// Removes expired or unreadable session records and prunes dangling
    /// index members. Returns the number of session records removed.
    pub async fn cleanup_expired(&self) -> AppResult<usize> {
        let now = Utc::now();
        let mut removed = 0;

        for key in self.cache.scan_keys(keys::SESSION_PATTERN).await? {
            let Some(id) = keys::session_id_from_key(&key) else {
                continue;
            };
            match self.load(id).await {
                Ok(Some(session)) if session.is_expired_at(now) => {
                    self.remove(&session).await?;
                    removed += 1;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(session_id = %id, error = %e, "Removing unreadable session record");
                    self.cache.delete(&key).await?;
                    removed += 1;
                }
            }
        }

        for index in self.cache.scan_keys(keys::USER_SESSIONS_PATTERN).await? {
            for member in self.cache.set_members(&index).await? {
                let dangling = match Uuid::parse_str(&member) {
                    Ok(id) => !self.cache.exists(&keys::session(id)).await?,
                    Err(_) => true,
                };
                if dangling {
                    self.cache.set_remove(&index, &member).await?;
                }
            }
        }

        if removed > 0 {
            info!(removed, "Expired sessions cleaned up");
        }
        Ok(removed)
    }

    async fn mark_ended(&self, id: Uuid) -> AppResult<()> {
        self.cache
            .set(&keys::ended_session(id), "1", self.ended_ttl)
            .await
    }

    async fn load(&self, id: Uuid) -> AppResult<Option<Session>> {
        self.cache.get_json::<Session>(&keys::session(id)).await
    }

    async fn store(&self, session: &Session, ttl: Duration) -> AppResult<()> {
        self.cache
            .set_json(&keys::session(session.id), session, ttl)
            .await
    }

    async fn remove(&self, session: &Session) -> AppResult<()> {
        self.cache.delete(&keys::session(session.id)).await?;
        self.cache
            .set_remove(&keys::user_sessions(session.user_id), &session.id.to_string())
            .await
    }
}

fn chrono_ttl(ttl: Duration) -> AppResult<chrono::Duration> {
    chrono::Duration::from_std(ttl)
        .map_err(|_| AppError::validation(format!("Session TTL out of range: {ttl:?}")))
}
