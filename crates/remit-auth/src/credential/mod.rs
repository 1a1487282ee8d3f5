//! Email/password authentication with brute-force lockout.

pub mod engine;

pub use engine::CredentialAuthenticator;
