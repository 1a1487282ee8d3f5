//! Identity domain entities.

pub mod model;
pub mod status;

pub use model::{CreateUser, ProfileUpdate, User, username_from_email};
pub use status::UserStatus;
