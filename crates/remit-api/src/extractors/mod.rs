//! Custom Axum extractors.

pub mod auth;
pub mod json;

pub use auth::{AuthUser, Client};
pub use json::ValidatedJson;
