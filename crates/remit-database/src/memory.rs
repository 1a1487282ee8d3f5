//! In-process implementation of every store trait.
//!
//! Single-node only. Mirrors the PostgreSQL semantics closely enough for
//! the authentication core to be exercised without a database: case-insensitive
//! email uniqueness, atomic failed-attempt increments, and atomic invitation
//! claims all happen under one lock.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use remit_core::error::AppError;
use remit_core::result::AppResult;
use remit_entity::activity::{NewActivity, UserActivity};
use remit_entity::invitation::{CreateInvitation, Invitation, InvitationFilter, InvitationStatus};
use remit_entity::role::{Role, DEFAULT_ROLE, ORG_ADMIN};
use remit_entity::user::{CreateUser, ProfileUpdate, User, UserStatus};

use crate::store::{ActivityStore, FailedAttempt, InvitationStore, RoleStore, UserStore};

/// Permission codes seeded for `ORG_USER`, matching the migration.
const ORG_USER_PERMISSIONS: &[&str] = &[
    "clients:create",
    "clients:read",
    "clients:update",
    "transactions:create",
    "transactions:read",
    "reports:read",
    "profile:update",
];

/// Every seeded permission code, granted to `ORG_ADMIN`.
const ALL_PERMISSIONS: &[&str] = &[
    "users:create",
    "users:read",
    "users:update",
    "users:delete",
    "roles:read",
    "roles:update",
    "clients:create",
    "clients:read",
    "clients:update",
    "transactions:create",
    "transactions:read",
    "transactions:approve",
    "reports:read",
    "audit:read",
    "profile:update",
];

#[derive(Debug, Default)]
struct InnerState {
    users: HashMap<Uuid, User>,
    roles: HashMap<i32, Role>,
    role_permissions: HashMap<i32, BTreeSet<String>>,
    user_roles: HashMap<Uuid, BTreeSet<i32>>,
    invitations: HashMap<Uuid, Invitation>,
    activity: Vec<UserActivity>,
    /// Pending injected failures of `set_accepted_by`.
    acceptor_write_failures: u32,
}

impl InnerState {
    fn role_name(&self, role_id: i32) -> Option<String> {
        self.roles.get(&role_id).map(|r| r.name.clone())
    }

    fn email_taken(&self, email: &str) -> bool {
        let needle = email.to_lowercase();
        self.users.values().any(|u| u.email.to_lowercase() == needle)
    }
}

/// In-memory user, role, invitation, and activity store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<InnerState>>,
}

impl MemoryStore {
    /// Create an empty store with no roles.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with `ORG_ADMIN` (id 1) and `ORG_USER` (id 2)
    /// and their default permission sets.
    pub async fn with_default_roles() -> Self {
        let store = Self::new();
        store
            .insert_role(1, ORG_ADMIN, ALL_PERMISSIONS.iter().copied())
            .await;
        store
            .insert_role(2, DEFAULT_ROLE, ORG_USER_PERMISSIONS.iter().copied())
            .await;
        store
    }

    /// Insert or replace a role and its permission codes.
    pub async fn insert_role<'a>(
        &self,
        id: i32,
        name: &str,
        permissions: impl IntoIterator<Item = &'a str>,
    ) {
        let mut state = self.state.lock().await;
        state.roles.insert(
            id,
            Role {
                id,
                name: name.to_string(),
                description: None,
                is_system: true,
            },
        );
        state.role_permissions.insert(
            id,
            permissions.into_iter().map(str::to_string).collect(),
        );
    }

    /// Replace the permission set of an existing role.
    pub async fn set_role_permissions<'a>(
        &self,
        role_id: i32,
        permissions: impl IntoIterator<Item = &'a str>,
    ) {
        let mut state = self.state.lock().await;
        state.role_permissions.insert(
            role_id,
            permissions.into_iter().map(str::to_string).collect(),
        );
    }

    /// Grant an additional role to an identity.
    pub async fn grant_role(&self, user_id: Uuid, role_id: i32) {
        let mut state = self.state.lock().await;
        state.user_roles.entry(user_id).or_default().insert(role_id);
    }

    /// Overwrite an identity's status.
    pub async fn set_status(&self, user_id: Uuid, status: UserStatus) {
        let mut state = self.state.lock().await;
        if let Some(user) = state.users.get_mut(&user_id) {
            user.status = status;
        }
    }

    /// Overwrite an identity's lock window.
    pub async fn set_locked_until(&self, user_id: Uuid, until: Option<DateTime<Utc>>) {
        let mut state = self.state.lock().await;
        if let Some(user) = state.users.get_mut(&user_id) {
            user.locked_until = until;
        }
    }

    /// Make the next `times` calls of `set_accepted_by` fail.
    pub async fn fail_acceptor_writes(&self, times: u32) {
        self.state.lock().await.acceptor_write_failures = times;
    }

    /// Overwrite an invitation's expiry.
    pub async fn set_invitation_expiry(&self, id: Uuid, expires_at: DateTime<Utc>) {
        let mut state = self.state.lock().await;
        if let Some(inv) = state.invitations.get_mut(&id) {
            inv.expires_at = expires_at;
        }
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let needle = email.to_lowercase();
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .find(|u| u.email.to_lowercase() == needle)
            .cloned())
    }

    async fn create(&self, data: &CreateUser) -> AppResult<User> {
        let mut state = self.state.lock().await;
        if state.email_taken(&data.email) {
            return Err(AppError::conflict("Email already in use"));
        }
        let role = state
            .role_name(data.role_id)
            .ok_or_else(|| AppError::not_found(format!("Role {} not found", data.role_id)))?;

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: data.username.clone(),
            email: data.email.clone(),
            password_hash: data.password_hash.clone(),
            first_name: data.first_name.clone(),
            last_name: data.last_name.clone(),
            phone: data.phone.clone(),
            department: data.department.clone(),
            position: data.position.clone(),
            role_id: data.role_id,
            role,
            status: data.status,
            failed_login_attempts: 0,
            locked_until: None,
            last_login_at: None,
            invited_by: data.invited_by,
            version: 1,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn record_failed_attempt(
        &self,
        id: Uuid,
        max_attempts: i32,
        lock_until: DateTime<Utc>,
    ) -> AppResult<FailedAttempt> {
        let mut state = self.state.lock().await;
        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))?;

        user.failed_login_attempts += 1;
        if user.failed_login_attempts >= max_attempts {
            user.locked_until = Some(lock_until);
        }
        user.version += 1;
        user.updated_at = Utc::now();

        Ok(FailedAttempt {
            attempts: user.failed_login_attempts,
            locked_until: user.locked_until,
        })
    }

    async fn clear_lockout(&self, id: Uuid) -> AppResult<()> {
        let now = Utc::now();
        let mut state = self.state.lock().await;
        if let Some(user) = state.users.get_mut(&id) {
            if !user.is_lock_active(now) {
                user.failed_login_attempts = 0;
                user.locked_until = None;
                user.version += 1;
                user.updated_at = now;
            }
        }
        Ok(())
    }

    async fn record_successful_login(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if let Some(user) = state.users.get_mut(&id) {
            user.failed_login_attempts = 0;
            user.locked_until = None;
            user.last_login_at = Some(at);
            user.version += 1;
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))?;
        user.password_hash = password_hash.to_string();
        user.version += 1;
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn update_status(&self, id: Uuid, status: UserStatus) -> AppResult<User> {
        let mut state = self.state.lock().await;
        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))?;
        user.status = status;
        user.failed_login_attempts = 0;
        user.locked_until = None;
        user.version += 1;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn activate_placeholder(
        &self,
        id: Uuid,
        profile: &ProfileUpdate,
        password_hash: &str,
    ) -> AppResult<User> {
        let mut state = self.state.lock().await;
        let user = state
            .users
            .get_mut(&id)
            .filter(|u| u.status == UserStatus::PendingVerification)
            .ok_or_else(|| AppError::conflict("User is no longer pending verification"))?;

        user.first_name = profile.first_name.clone();
        user.last_name = profile.last_name.clone();
        user.phone = profile.phone.clone();
        user.department = profile.department.clone();
        user.position = profile.position.clone();
        user.password_hash = password_hash.to_string();
        user.status = UserStatus::Active;
        user.failed_login_attempts = 0;
        user.locked_until = None;
        user.version += 1;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[async_trait]
impl RoleStore for MemoryStore {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Role>> {
        Ok(self.state.lock().await.roles.get(&id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        let state = self.state.lock().await;
        Ok(state.roles.values().find(|r| r.name == name).cloned())
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let state = self.state.lock().await;
        let mut roles: Vec<Role> = state.roles.values().cloned().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn permission_codes_for_user(&self, user_id: Uuid) -> AppResult<Vec<String>> {
        let state = self.state.lock().await;
        let mut role_ids: BTreeSet<i32> = state
            .user_roles
            .get(&user_id)
            .cloned()
            .unwrap_or_default();
        if let Some(user) = state.users.get(&user_id) {
            role_ids.insert(user.role_id);
        }

        Ok(role_ids
            .iter()
            .filter_map(|id| state.role_permissions.get(id))
            .flat_map(|codes| codes.iter().cloned())
            .collect())
    }
}

#[async_trait]
impl InvitationStore for MemoryStore {
    async fn create(&self, data: &CreateInvitation) -> AppResult<Invitation> {
        let mut state = self.state.lock().await;
        if state
            .invitations
            .values()
            .any(|i| i.token_hash == data.token_hash)
        {
            return Err(AppError::conflict("Invitation token collision"));
        }
        if !state.roles.contains_key(&data.role_id) {
            return Err(AppError::not_found(format!("Role {} not found", data.role_id)));
        }

        let now = Utc::now();
        let invitation = Invitation {
            id: Uuid::new_v4(),
            email: data.email.clone(),
            token_hash: data.token_hash.clone(),
            role_id: data.role_id,
            invited_by: data.invited_by,
            expires_at: data.expires_at,
            status: InvitationStatus::Pending,
            accepted_at: None,
            accepted_by: None,
            message: data.message.clone(),
            department: data.department.clone(),
            position: data.position.clone(),
            created_at: now,
            updated_at: now,
        };
        state.invitations.insert(invitation.id, invitation.clone());
        Ok(invitation)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Invitation>> {
        Ok(self.state.lock().await.invitations.get(&id).cloned())
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> AppResult<Option<Invitation>> {
        let state = self.state.lock().await;
        Ok(state
            .invitations
            .values()
            .find(|i| i.token_hash == token_hash)
            .cloned())
    }

    async fn find_active_by_email(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Invitation>> {
        let needle = email.to_lowercase();
        let state = self.state.lock().await;
        Ok(state
            .invitations
            .values()
            .filter(|i| i.email.to_lowercase() == needle && i.is_active(now))
            .max_by_key(|i| i.created_at)
            .cloned())
    }

    async fn claim(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        match state.invitations.get_mut(&id) {
            Some(inv) if inv.is_active(now) => {
                inv.status = InvitationStatus::Accepted;
                inv.accepted_at = Some(now);
                inv.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release_claim(&self, id: Uuid) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if let Some(inv) = state.invitations.get_mut(&id) {
            if inv.status == InvitationStatus::Accepted {
                inv.status = InvitationStatus::Pending;
                inv.accepted_at = None;
                inv.accepted_by = None;
                inv.updated_at = Utc::now();
            }
        }
        Ok(())
    }

    async fn set_accepted_by(&self, id: Uuid, user_id: Uuid) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if state.acceptor_write_failures > 0 {
            state.acceptor_write_failures -= 1;
            return Err(AppError::database("Injected invitation write failure"));
        }
        if let Some(inv) = state.invitations.get_mut(&id) {
            inv.accepted_by = Some(user_id);
            inv.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn cancel(&self, id: Uuid) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        match state.invitations.get_mut(&id) {
            Some(inv) if inv.status == InvitationStatus::Pending => {
                inv.status = InvitationStatus::Cancelled;
                inv.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn reissue(
        &self,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<Option<Invitation>> {
        let mut state = self.state.lock().await;
        match state.invitations.get_mut(&id) {
            Some(inv) if inv.status != InvitationStatus::Accepted => {
                inv.token_hash = token_hash.to_string();
                inv.expires_at = expires_at;
                inv.status = InvitationStatus::Pending;
                inv.updated_at = Utc::now();
                Ok(Some(inv.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn list(&self, filter: &InvitationFilter) -> AppResult<Vec<Invitation>> {
        let needle = filter.email.as_ref().map(|e| e.to_lowercase());
        let state = self.state.lock().await;
        let mut rows: Vec<Invitation> = state
            .invitations
            .values()
            .filter(|i| filter.status.is_none_or(|s| i.status == s))
            .filter(|i| {
                needle
                    .as_ref()
                    .is_none_or(|n| i.email.to_lowercase().contains(n.as_str()))
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }
}

#[async_trait]
impl ActivityStore for MemoryStore {
    async fn record(&self, entry: &NewActivity) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.activity.push(UserActivity {
            id: Uuid::new_v4(),
            user_id: entry.user_id,
            activity_type: entry.activity_type,
            ip_address: entry.ip_address.clone(),
            user_agent: entry.user_agent.clone(),
            details: entry.details.clone(),
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn recent_for_user(&self, user_id: Uuid, limit: i64) -> AppResult<Vec<UserActivity>> {
        let state = self.state.lock().await;
        Ok(state
            .activity
            .iter()
            .rev()
            .filter(|a| a.user_id == user_id)
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }
}
