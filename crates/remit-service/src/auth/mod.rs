//! Login, refresh, logout, registration, and self-service account flows.

pub mod service;

pub use service::{AuthService, LoginResult, RegisterRequest};
