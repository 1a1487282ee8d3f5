//! Invitation onboarding flows.

pub mod service;

pub use service::{InvitationRequest, InvitationService};
