//! # remit-service
//!
//! Use-case layer for the identity plane. Each service orchestrates the
//! auth core, the stores, and the activity log to implement one
//! application-level flow.
//!
//! Services follow constructor injection — all dependencies are provided
//! at construction time via `Arc` references.

pub mod activity;
pub mod admin;
pub mod auth;
pub mod context;
pub mod invitation;

pub use activity::ActivityRecorder;
pub use admin::AdminService;
pub use auth::{AuthService, LoginResult, RegisterRequest};
pub use context::{ClientInfo, RequestContext};
pub use invitation::{InvitationRequest, InvitationService};

#[cfg(test)]
pub(crate) mod testing;
