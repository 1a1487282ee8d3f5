//! Token issuance, validation, revocation, and refresh rotation.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use remit_cache::provider::CacheManager;
use remit_core::config::auth::AuthConfig;
use remit_core::error::AppError;
use remit_database::UserStore;
use remit_entity::user::User;

use crate::error::TokenError;
use crate::permission::PermissionResolver;

use super::claims::Claims;
use super::decoder::JwtDecoder;
use super::encoder::{JwtEncoder, TokenPair, TokenSubject};
use super::keys::SigningKeys;
use super::revocation::RevocationList;

/// Facade over the encoder, decoder, and revocation list.
#[derive(Debug, Clone)]
pub struct TokenService {
    encoder: JwtEncoder,
    decoder: JwtDecoder,
    revocations: RevocationList,
    users: Arc<dyn UserStore>,
    permissions: PermissionResolver,
    rotate_refresh_tokens: bool,
}

impl TokenService {
    pub fn new(
        config: &AuthConfig,
        keys: SigningKeys,
        cache: Arc<CacheManager>,
        users: Arc<dyn UserStore>,
        permissions: PermissionResolver,
    ) -> Self {
        let keys = Arc::new(keys);
        let revocations = RevocationList::new(cache, config.jwt_leeway_seconds);
        Self {
            encoder: JwtEncoder::new(config, keys.clone()),
            decoder: JwtDecoder::new(config, keys, revocations.clone()),
            revocations,
            users,
            permissions,
            rotate_refresh_tokens: config.rotate_refresh_tokens,
        }
    }

    /// Resolves the identity's permissions and issues a pair bound to
    /// `session_id`.
    pub async fn issue_pair(&self, user: &User, session_id: Uuid) -> Result<TokenPair, AppError> {
        let permissions = self.permissions.resolve(user.id).await?;
        let subject = TokenSubject::new(user, permissions);
        self.encoder.generate_token_pair(&subject, session_id)
    }

    pub async fn validate_access(&self, token: &str) -> Result<Claims, TokenError> {
        self.decoder.decode_access_token(token).await
    }

    pub async fn validate_refresh(&self, token: &str) -> Result<Claims, TokenError> {
        self.decoder.decode_refresh_token(token).await
    }

    /// Marks a token id revoked for the rest of its lifetime.
    pub async fn revoke(&self, claims: &Claims) -> Result<(), AppError> {
        self.revocations.revoke(claims).await
    }

    /// Issues a new pair from already-validated refresh claims.
    ///
    /// Role and permissions are re-resolved, so grants changed since the
    /// last issuance take effect here. The identity must still be able to
    /// log in.
    pub async fn rotate(&self, refresh: &Claims) -> Result<TokenPair, AppError> {
        let user = self
            .users
            .find_by_id(refresh.sub)
            .await?
            .ok_or(TokenError::Malformed)?;

        if !user.status.can_login() {
            warn!(user_id = %user.id, status = %user.status, "Refresh refused for inactive identity");
            return Err(AppError::token_invalid("Invalid or expired token"));
        }

        let pair = self.issue_pair(&user, refresh.sid).await?;

        if self.rotate_refresh_tokens {
            self.revoke(refresh).await?;
        }

        info!(user_id = %user.id, session_id = %refresh.sid, "Token pair refreshed");
        Ok(pair)
    }
}
