//! Administrative identity management.

pub mod service;

pub use service::AdminService;
