//! Administrator use cases: account status, role catalogue, and effective
//! permissions of an identity.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use remit_auth::{PermissionResolver, SessionManager};
use remit_core::error::AppError;
use remit_core::result::AppResult;
use remit_database::{RoleStore, UserStore};
use remit_entity::role::Role;
use remit_entity::user::{User, UserStatus};

use crate::context::RequestContext;

/// Statuses an administrator may set directly. The rest are reached only
/// through registration, invitation, or deletion flows.
const SETTABLE_STATUSES: &[UserStatus] = &[
    UserStatus::Active,
    UserStatus::Suspended,
    UserStatus::Locked,
    UserStatus::Disabled,
];

#[derive(Debug, Clone)]
pub struct AdminService {
    users: Arc<dyn UserStore>,
    roles: Arc<dyn RoleStore>,
    permissions: PermissionResolver,
    sessions: Arc<SessionManager>,
}

impl AdminService {
    pub fn new(
        users: Arc<dyn UserStore>,
        roles: Arc<dyn RoleStore>,
        permissions: PermissionResolver,
        sessions: Arc<SessionManager>,
    ) -> Self {
        Self {
            users,
            roles,
            permissions,
            sessions,
        }
    }

    /// Unlocks, suspends, locks, or disables an identity. The lockout
    /// counter and window are reset either way. Moving to a status that
    /// cannot log in ends every session of the identity.
    pub async fn update_status(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
        status: UserStatus,
        reason: Option<&str>,
    ) -> AppResult<User> {
        if !SETTABLE_STATUSES.contains(&status) {
            return Err(AppError::validation(format!(
                "Status {status} cannot be set by an administrator"
            )));
        }
        if user_id == ctx.user_id() {
            return Err(AppError::validation("Cannot change your own status"));
        }

        let user = self.users.update_status(user_id, status).await?;

        if !status.can_login() {
            let ended = self.sessions.revoke_all(user_id).await?;
            warn!(user_id = %user_id, ended, "Sessions ended by status change");
        }

        info!(
            user_id = %user_id,
            status = %status,
            changed_by = %ctx.user_id(),
            reason = reason.unwrap_or_default(),
            "Account status changed"
        );
        Ok(user)
    }

    pub async fn list_roles(&self) -> AppResult<Vec<Role>> {
        self.roles.list_roles().await
    }

    /// Effective permission codes of an identity, sorted.
    pub async fn user_permissions(&self, user_id: Uuid) -> AppResult<BTreeSet<String>> {
        if self.users.find_by_id(user_id).await?.is_none() {
            return Err(AppError::not_found("User not found"));
        }
        self.permissions.resolve(user_id).await
    }
}
