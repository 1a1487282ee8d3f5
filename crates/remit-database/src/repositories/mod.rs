//! PostgreSQL implementations of the store traits.

pub mod activity;
pub mod invitation;
pub mod role;
pub mod user;

pub use activity::ActivityRepository;
pub use invitation::InvitationRepository;
pub use role::RoleRepository;
pub use user::UserRepository;
