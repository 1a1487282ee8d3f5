//! Resolves the effective permission set for an identity.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use remit_core::result::AppResult;
use remit_database::RoleStore;

/// Unions the permissions of an identity's primary role and any additional
/// role grants.
#[derive(Debug, Clone)]
pub struct PermissionResolver {
    roles: Arc<dyn RoleStore>,
}

impl PermissionResolver {
    pub fn new(roles: Arc<dyn RoleStore>) -> Self {
        Self { roles }
    }

    /// Sorted, de-duplicated permission codes. An identity with no grants
    /// resolves to the empty set.
    pub async fn resolve(&self, user_id: Uuid) -> AppResult<BTreeSet<String>> {
        let codes: BTreeSet<String> = self
            .roles
            .permission_codes_for_user(user_id)
            .await?
            .into_iter()
            .collect();
        debug!(user_id = %user_id, count = codes.len(), "Resolved permissions");
        Ok(codes)
    }
}
