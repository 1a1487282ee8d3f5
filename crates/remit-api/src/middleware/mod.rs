//! Axum middleware stack.

pub mod cors;
pub mod logging;
pub mod permission;

pub use permission::require_permission;
