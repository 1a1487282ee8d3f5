//! JWT token creation with RS256 signing and configurable TTLs.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, Header, encode};
use uuid::Uuid;

use remit_core::config::auth::AuthConfig;
use remit_core::error::{AppError, ErrorKind};
use remit_entity::user::User;

use super::claims::{Claims, TokenType};
use super::keys::SigningKeys;

/// The identity facts embedded in a token.
#[derive(Debug, Clone)]
pub struct TokenSubject {
    pub user_id: Uuid,
    pub email: String,
    pub role: String,
    pub permissions: BTreeSet<String>,
}

impl TokenSubject {
    pub fn new(user: &User, permissions: BTreeSet<String>) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            role: user.role.clone(),
            permissions,
        }
    }
}

/// Result of a successful token pair generation.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TokenPair {
    /// Short-lived access token.
    pub access_token: String,
    /// Long-lived refresh token.
    pub refresh_token: String,
    /// Access token expiration timestamp.
    pub access_expires_at: DateTime<Utc>,
    /// Refresh token expiration timestamp.
    pub refresh_expires_at: DateTime<Utc>,
    /// Claims of the access token, for callers that need the jti or sid.
    #[serde(skip)]
    pub access_claims: Option<Claims>,
}

/// Creates signed JWT access and refresh tokens.
#[derive(Debug, Clone)]
pub struct JwtEncoder {
    keys: Arc<SigningKeys>,
    issuer: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(config: &AuthConfig, keys: Arc<SigningKeys>) -> Self {
        Self {
            keys,
            issuer: config.jwt_issuer.clone(),
            access_ttl: Duration::minutes(config.jwt_access_ttl_minutes as i64),
            refresh_ttl: Duration::hours(config.jwt_refresh_ttl_hours as i64),
        }
    }

    /// Generates a new access + refresh token pair bound to a session.
    pub fn generate_token_pair(
        &self,
        subject: &TokenSubject,
        session_id: Uuid,
    ) -> Result<TokenPair, AppError> {
        let now = Utc::now();
        let access = self.claims(subject, session_id, TokenType::Access, now);
        let refresh = self.claims(subject, session_id, TokenType::Refresh, now);

        let access_token = self.sign(&access)?;
        let refresh_token = self.sign(&refresh)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_expires_at: access.expires_at(),
            refresh_expires_at: refresh.expires_at(),
            access_claims: Some(access),
        })
    }

    /// Signs arbitrary claims.
    pub fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::RS256), claims, self.keys.encoding()).map_err(|e| {
            AppError::with_source(
                ErrorKind::Internal,
                format!("Failed to encode {:?} token", claims.token_type),
                e,
            )
        })
    }

    fn claims(
        &self,
        subject: &TokenSubject,
        session_id: Uuid,
        token_type: TokenType,
        now: DateTime<Utc>,
    ) -> Claims {
        let ttl = match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };
        Claims {
            sub: subject.user_id,
            email: subject.email.clone(),
            role: subject.role.clone(),
            permissions: subject.permissions.iter().cloned().collect(),
            sid: session_id,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            iss: self.issuer.clone(),
            token_type,
        }
    }
}
