//! Single-use onboarding invitations.

pub mod engine;
pub mod token;

pub use engine::{
    AcceptInvitation, AcceptedInvitation, InvitationEngine, InvitationSummary, IssuedInvitation,
    NewInvitation,
};
