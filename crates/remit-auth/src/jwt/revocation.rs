//! Revoked token ids, kept in the shared cache until the token would have
//! expired anyway.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error};
use uuid::Uuid;

use remit_cache::keys;
use remit_cache::provider::CacheManager;
use remit_core::error::AppError;
use remit_core::traits::CacheProvider;

use crate::error::TokenError;

use super::claims::Claims;

/// Cache-backed revocation list keyed by token id.
#[derive(Debug, Clone)]
pub struct RevocationList {
    cache: Arc<CacheManager>,
    /// Added to each entry's lifetime so a token accepted within the
    /// validation leeway is still reported as revoked.
    leeway: u64,
}

impl RevocationList {
    pub fn new(cache: Arc<CacheManager>, leeway_seconds: u64) -> Self {
        Self {
            cache,
            leeway: leeway_seconds,
        }
    }

    /// Revokes a token for the rest of its lifetime.
    ///
    /// Tokens already past expiry plus leeway are skipped; validation
    /// rejects them regardless.
    pub async fn revoke(&self, claims: &Claims) -> Result<(), AppError> {
        let horizon = Utc::now() - chrono::Duration::seconds(self.leeway as i64);
        let remaining = claims.remaining_ttl_seconds(horizon);
        if remaining == 0 {
            debug!(jti = %claims.jti, "Skipping revocation of expired token");
            return Ok(());
        }
        self.cache
            .set(
                &keys::revoked_token(&claims.jti.to_string()),
                "revoked",
                Duration::from_secs(remaining),
            )
            .await?;
        debug!(jti = %claims.jti, ttl_secs = remaining, "Token revoked");
        Ok(())
    }

    /// Whether a token id is revoked. Store failures are reported as
    /// [`TokenError::RevocationUnavailable`] so callers fail closed.
    pub async fn is_revoked(&self, jti: Uuid) -> Result<bool, TokenError> {
        self.cache
            .exists(&keys::revoked_token(&jti.to_string()))
            .await
            .map_err(|e| {
                error!(jti = %jti, error = %e, "Revocation lookup failed");
                TokenError::RevocationUnavailable
            })
    }
}
