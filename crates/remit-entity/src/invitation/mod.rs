//! Invitation onboarding entities.

pub mod model;
pub mod status;

pub use model::{CreateInvitation, Invitation, InvitationFilter};
pub use status::InvitationStatus;
