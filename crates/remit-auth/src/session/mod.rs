//! Session lifecycle: creation, sliding refresh, termination, and sweeping.

pub mod cleanup;
pub mod manager;

pub use cleanup::SessionCleanup;
pub use manager::{NewSession, SessionManager};
