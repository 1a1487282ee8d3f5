//! Verifies email/password pairs and maintains the failed-attempt counter.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{info, warn};

use remit_core::config::auth::AuthConfig;
use remit_database::UserStore;
use remit_entity::user::{User, UserStatus};

use crate::error::CredentialError;
use crate::password::PasswordHasher;

/// Authenticates identities by email and password.
///
/// Every mismatch increments the identity's failed-attempt counter in one
/// atomic store write; reaching `max_failed_attempts` locks the account for
/// `lockout_duration_minutes`. A lock whose window has elapsed is cleared
/// on the next attempt before the password is checked.
#[derive(Debug, Clone)]
pub struct CredentialAuthenticator {
    users: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    max_failed_attempts: i32,
    lockout: Duration,
}

impl CredentialAuthenticator {
    pub fn new(users: Arc<dyn UserStore>, hasher: PasswordHasher, config: &AuthConfig) -> Self {
        Self {
            users,
            hasher,
            max_failed_attempts: config.max_failed_attempts,
            lockout: Duration::minutes(config.lockout_duration_minutes as i64),
        }
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, CredentialError> {
        let mut user = self
            .users
            .find_by_email(email.trim())
            .await?
            .ok_or(CredentialError::NotFound)?;

        let now = Utc::now();

        if user.is_lock_active(now) {
            return Err(CredentialError::Locked {
                until: user.locked_until,
            });
        }

        if user.is_lock_elapsed(now) {
            self.users.clear_lockout(user.id).await?;
            info!(user_id = %user.id, "Elapsed lockout cleared");
            user.failed_login_attempts = 0;
            user.locked_until = None;
        }

        match user.status {
            UserStatus::Active => {}
            UserStatus::Locked => return Err(CredentialError::Locked { until: None }),
            status => return Err(CredentialError::Inactive(status)),
        }

        if !self.hasher.verify_password(password, &user.password_hash)? {
            let attempt = self
                .users
                .record_failed_attempt(user.id, self.max_failed_attempts, now + self.lockout)
                .await?;

            let locked_until = attempt.locked_until.filter(|_| attempt.is_locked(now));
            if let Some(until) = locked_until {
                warn!(
                    user_id = %user.id,
                    attempts = attempt.attempts,
                    locked_until = %until,
                    "Account locked after repeated failed logins"
                );
            } else {
                warn!(user_id = %user.id, attempts = attempt.attempts, "Failed login attempt");
            }

            return Err(CredentialError::PasswordMismatch {
                user_id: user.id,
                attempts: attempt.attempts,
                locked_until,
            });
        }

        self.users.record_successful_login(user.id, now).await?;
        user.failed_login_attempts = 0;
        user.locked_until = None;
        user.last_login_at = Some(now);

        if self.hasher.needs_rehash(&user.password_hash) {
            self.upgrade_hash(&mut user, password).await;
        }

        Ok(user)
    }

    /// Replaces a legacy hash with Argon2id. Failures leave the old hash in
    /// place; it still verifies.
    async fn upgrade_hash(&self, user: &mut User, password: &str) {
        let upgraded = match self.hasher.hash_password(password) {
            Ok(hash) => hash,
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Password rehash failed");
                return;
            }
        };
        match self.users.update_password(user.id, &upgraded).await {
            Ok(()) => {
                info!(user_id = %user.id, "Legacy password hash upgraded");
                user.password_hash = upgraded;
            }
            Err(e) => warn!(user_id = %user.id, error = %e, "Storing upgraded hash failed"),
        }
    }
}
