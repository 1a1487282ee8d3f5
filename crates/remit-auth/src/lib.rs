//! # remit-auth
//!
//! The authentication and authorization core of the Global Remit identity
//! plane.
//!
//! ## Modules
//!
//! - `password` — Argon2id hashing, legacy bcrypt verification, and policy enforcement
//! - `credential` — email/password authentication with brute-force lockout
//! - `permission` — identity → role → permission resolution
//! - `jwt` — RS256 token issuance, validation, revocation, and rotation
//! - `session` — TTL-bound session records in the shared cache
//! - `invitation` — single-use onboarding invitations

pub mod credential;
pub mod error;
pub mod invitation;
pub mod jwt;
pub mod password;
pub mod permission;
pub mod session;

pub use credential::CredentialAuthenticator;
pub use error::{CredentialError, InvitationError, TokenError};
pub use invitation::InvitationEngine;
pub use jwt::{Claims, JwtDecoder, JwtEncoder, RevocationList, SigningKeys, TokenService, TokenType};
pub use password::{PasswordHasher, PasswordValidator};
pub use permission::PermissionResolver;
pub use session::{SessionCleanup, SessionManager};
