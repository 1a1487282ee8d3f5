//! # remit-api
//!
//! HTTP API layer for the Global Remit identity plane built on Axum.
//!
//! Provides the auth and invitation endpoints, the `AuthUser` extractor
//! (cookie first, then bearer header), the permission gate, request
//! logging, CORS, cookie handling, and error mapping.

pub mod app;
pub mod cookies;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{Stores, build_app, build_state};
pub use error::{ApiError, ApiResult};
pub use state::AppState;
