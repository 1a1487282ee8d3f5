//! # remit-core
//!
//! Core crate for the Global Remit identity plane. Contains configuration
//! schemas, the unified error system, and the cache provider trait that
//! the session and revocation stores are built on.
//!
//! This crate has **no** internal dependencies on other remit crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
