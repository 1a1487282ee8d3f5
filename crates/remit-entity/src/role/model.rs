//! Role and permission entity models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Role assigned to self-registered identities.
pub const DEFAULT_ROLE: &str = "ORG_USER";

/// Seeded administrator role.
pub const ORG_ADMIN: &str = "ORG_ADMIN";

/// A named bundle of permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: i32,
    /// Unique role name, e.g. `ORG_ADMIN`.
    pub name: String,
    pub description: Option<String>,
    /// Seeded roles cannot be deleted.
    pub is_system: bool,
}

/// A single grantable capability, identified by its code (`users:create`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Permission {
    pub id: i32,
    pub code: String,
    pub name: String,
    pub category: String,
}
