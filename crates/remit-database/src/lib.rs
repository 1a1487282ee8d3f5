//! # remit-database
//!
//! PostgreSQL connection management, the store traits the authentication
//! core depends on, and their concrete implementations: sqlx repositories
//! for production and, behind the `memory` feature, an in-process store
//! for tests and local development.

pub mod connection;
#[cfg(any(test, feature = "memory"))]
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
#[cfg(any(test, feature = "memory"))]
pub use memory::MemoryStore;
pub use store::{ActivityStore, FailedAttempt, InvitationStore, RoleStore, UserStore};
