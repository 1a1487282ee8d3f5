//! Security activity log entities.

pub mod model;

pub use model::{ActivityType, NewActivity, UserActivity};
