//! # remit-entity
//!
//! Domain entity models for the Global Remit identity plane. Every struct in
//! this crate represents a database table row, a cache record, or a domain
//! value object. Database entities derive `sqlx::FromRow`; enums mapped to
//! PostgreSQL enum types derive `sqlx::Type`.

pub mod activity;
pub mod invitation;
pub mod role;
pub mod session;
pub mod user;
