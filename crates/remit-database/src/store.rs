//! Store traits consumed by the authentication core.
//!
//! Each trait has a PostgreSQL implementation in [`crate::repositories`]
//! and an in-process implementation in `crate::memory`.

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use remit_core::result::AppResult;
use remit_entity::activity::{NewActivity, UserActivity};
use remit_entity::invitation::{CreateInvitation, Invitation, InvitationFilter};
use remit_entity::role::Role;
use remit_entity::user::{CreateUser, ProfileUpdate, User, UserStatus};

/// Outcome of an atomic failed-attempt increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailedAttempt {
    /// Counter value after the increment.
    pub attempts: i32,
    /// Lock window, set when the counter reached the threshold.
    pub locked_until: Option<DateTime<Utc>>,
}

impl FailedAttempt {
    /// Whether this attempt started or is inside a lock window.
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }
}

/// Identity persistence.
#[async_trait]
pub trait UserStore: Send + Sync + Debug + 'static {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Case-insensitive lookup.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Insert a new identity. Fails with `Conflict` on a duplicate email and
    /// `NotFound` on an unknown role.
    async fn create(&self, data: &CreateUser) -> AppResult<User>;

    /// Increment the failed-attempt counter in a single atomic write and set
    /// `locked_until = lock_until` when the new count reaches `max_attempts`.
    async fn record_failed_attempt(
        &self,
        id: Uuid,
        max_attempts: i32,
        lock_until: DateTime<Utc>,
    ) -> AppResult<FailedAttempt>;

    /// Reset the counter and clear `locked_until`.
    async fn clear_lockout(&self, id: Uuid) -> AppResult<()>;

    /// Reset the counter, clear `locked_until`, and stamp `last_login_at`.
    async fn record_successful_login(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()>;

    async fn update_password(&self, id: Uuid, password_hash: &str) -> AppResult<()>;

    /// Administrative status change. Also resets the failed-attempt counter
    /// and clears `locked_until`. Fails with `NotFound` on an unknown id.
    async fn update_status(&self, id: Uuid, status: UserStatus) -> AppResult<User>;

    /// Promote a `PendingVerification` identity to `Active` with the given
    /// profile and password. Fails with `Conflict` if the identity is no
    /// longer pending.
    async fn activate_placeholder(
        &self,
        id: Uuid,
        profile: &ProfileUpdate,
        password_hash: &str,
    ) -> AppResult<User>;
}

/// Role and permission lookups.
#[async_trait]
pub trait RoleStore: Send + Sync + Debug + 'static {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Role>>;

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Role>>;

    /// Every role, ordered by name.
    async fn list_roles(&self) -> AppResult<Vec<Role>>;

    /// Permission codes granted through the identity's primary role and any
    /// additional role grants. May contain duplicates.
    async fn permission_codes_for_user(&self, user_id: Uuid) -> AppResult<Vec<String>>;
}

/// Invitation persistence.
#[async_trait]
pub trait InvitationStore: Send + Sync + Debug + 'static {
    async fn create(&self, data: &CreateInvitation) -> AppResult<Invitation>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Invitation>>;

    async fn find_by_token_hash(&self, token_hash: &str) -> AppResult<Option<Invitation>>;

    /// A pending, unexpired invitation for this email (case-insensitive).
    async fn find_active_by_email(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Invitation>>;

    /// Atomically move a pending, unexpired invitation to `Accepted`.
    /// Returns `false` if another caller won, or it is no longer claimable.
    async fn claim(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<bool>;

    /// Undo a claim whose follow-up provisioning failed.
    async fn release_claim(&self, id: Uuid) -> AppResult<()>;

    async fn set_accepted_by(&self, id: Uuid, user_id: Uuid) -> AppResult<()>;

    /// Pending → Cancelled. Returns `false` if the invitation was not pending.
    async fn cancel(&self, id: Uuid) -> AppResult<bool>;

    /// Replace the token and expiry and return the invitation to `Pending`.
    /// Accepted invitations are left untouched and yield `None`.
    async fn reissue(
        &self,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<Option<Invitation>>;

    /// Newest first.
    async fn list(&self, filter: &InvitationFilter) -> AppResult<Vec<Invitation>>;
}

/// Append-only security activity log.
#[async_trait]
pub trait ActivityStore: Send + Sync + Debug + 'static {
    async fn record(&self, entry: &NewActivity) -> AppResult<()>;

    /// Most recent entries for an identity, newest first.
    async fn recent_for_user(&self, user_id: Uuid, limit: i64) -> AppResult<Vec<UserActivity>>;
}
