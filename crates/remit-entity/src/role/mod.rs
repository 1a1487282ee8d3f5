//! Roles and permissions.

pub mod model;

pub use model::{Permission, Role, DEFAULT_ROLE, ORG_ADMIN};
