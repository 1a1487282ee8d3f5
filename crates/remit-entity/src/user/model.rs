//! Identity entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::UserStatus;

/// An authenticatable account.
///
/// `role` is the name of the primary role, joined from `roles` on read.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique identity identifier.
    pub id: Uuid,
    /// Login name, derived from the email local part when not chosen.
    pub username: String,
    /// Email address, unique case-insensitively.
    pub email: String,
    /// Adaptive password hash (argon2id, or legacy bcrypt).
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    /// Primary role reference.
    pub role_id: i32,
    /// Primary role name.
    pub role: String,
    /// Account status.
    pub status: UserStatus,
    /// Consecutive failed login attempts since the last reset.
    pub failed_login_attempts: i32,
    /// Authentication is blocked until this instant.
    pub locked_until: Option<DateTime<Utc>>,
    /// Last successful login time.
    pub last_login_at: Option<DateTime<Utc>>,
    /// The identity that invited this one, if any.
    pub invited_by: Option<Uuid>,
    /// Optimistic concurrency counter, bumped on every write.
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether a lock window is still running at `now`.
    pub fn is_lock_active(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }

    /// Whether a lock window was set but has already elapsed at `now`.
    pub fn is_lock_elapsed(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| until <= now)
    }

    /// Display name assembled from the profile.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Data required to create a new identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    /// Pre-hashed password.
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub role_id: i32,
    pub status: UserStatus,
    pub invited_by: Option<Uuid>,
}

/// Profile fields applied when a placeholder identity is promoted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
}

/// Derive a username from the local part of an email address.
pub fn username_from_email(email: &str) -> String {
    email
        .split_once('@')
        .map(|(local, _)| local)
        .unwrap_or(email)
        .to_string()
}
