//! RS256 token issuance, validation, revocation, and rotation.

pub mod claims;
pub mod decoder;
pub mod encoder;
pub mod keys;
pub mod revocation;
pub mod service;

pub use claims::{Claims, TokenType};
pub use decoder::JwtDecoder;
pub use encoder::{JwtEncoder, TokenPair, TokenSubject};
pub use keys::SigningKeys;
pub use revocation::RevocationList;
pub use service::TokenService;
