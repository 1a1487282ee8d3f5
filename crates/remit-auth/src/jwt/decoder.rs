//! JWT token validation and revocation checking.

use std::sync::Arc;

use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, Validation, decode};
use tracing::debug;

use remit_core::config::auth::AuthConfig;

use crate::error::TokenError;

use super::claims::{Claims, TokenType};
use super::keys::SigningKeys;
use super::revocation::RevocationList;

/// Validates JWT tokens and checks revocation status.
#[derive(Clone)]
pub struct JwtDecoder {
    keys: Arc<SigningKeys>,
    /// Validation configuration.
    validation: Validation,
    revocations: RevocationList,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig, keys: Arc<SigningKeys>, revocations: RevocationList) -> Self {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;
        validation.leeway = config.jwt_leeway_seconds;
        validation.set_issuer(&[config.jwt_issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iat", "iss", "sub"]);

        Self {
            keys,
            validation,
            revocations,
        }
    }

    /// Decodes and validates an access token string.
    ///
    /// Checks:
    /// 1. Signature validity and issuer
    /// 2. Expiration
    /// 3. Token type is Access
    /// 4. JTI not revoked
    pub async fn decode_access_token(&self, token: &str) -> Result<Claims, TokenError> {
        self.decode_typed(token, TokenType::Access).await
    }

    /// Decodes and validates a refresh token string.
    pub async fn decode_refresh_token(&self, token: &str) -> Result<Claims, TokenError> {
        self.decode_typed(token, TokenType::Refresh).await
    }

    async fn decode_typed(&self, token: &str, expected: TokenType) -> Result<Claims, TokenError> {
        let claims = self.decode_token(token)?;

        if claims.token_type != expected {
            return Err(TokenError::WrongType);
        }

        if self.revocations.is_revoked(claims.jti).await? {
            debug!(jti = %claims.jti, "Rejected revoked token");
            return Err(TokenError::Revoked);
        }

        Ok(claims)
    }

    /// Signature and claim checks, without the revocation lookup.
    fn decode_token(&self, token: &str) -> Result<Claims, TokenError> {
        let token_data = decode::<Claims>(token, self.keys.decoding(), &self.validation)
            .map_err(|e| match e.kind() {
                JwtErrorKind::ExpiredSignature => TokenError::Expired,
                JwtErrorKind::InvalidSignature
                | JwtErrorKind::InvalidAlgorithm => TokenError::SignatureInvalid,
                _ => {
                    debug!(error = %e, "Token rejected");
                    TokenError::Malformed
                }
            })?;

        Ok(token_data.claims)
    }
}
