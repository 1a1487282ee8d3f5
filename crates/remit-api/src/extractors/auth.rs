//! `AuthUser` extractor: pulls the access token from the `accessToken` cookie
//! or the Authorization header, validates it, and injects the request context.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::{Authorization, HeaderMapExt};

use remit_auth::TokenError;
use remit_core::error::AppError;
use remit_service::{ClientInfo, RequestContext};

use crate::cookies::ACCESS_COOKIE;
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated caller available in handlers.
#[derive(Debug, Clone)]
pub struct AuthUser(pub RequestContext);

impl AuthUser {
    /// Returns the inner `RequestContext`.
    pub fn context(&self) -> &RequestContext {
        &self.0
    }

    /// Fail with `Forbidden` unless the token carries `code`.
    pub fn require(&self, code: &str) -> Result<(), AppError> {
        if self.0.has_permission(code) {
            return Ok(());
        }
        tracing::warn!(
            user_id = %self.0.user_id(),
            permission = code,
            "Permission denied"
        );
        Err(AppError::forbidden("Insufficient permissions"))
    }
}

impl std::ops::Deref for AuthUser {
    type Target = RequestContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Already authenticated by the permission gate.
        if let Some(ctx) = parts.extensions.get::<RequestContext>() {
            return Ok(AuthUser(ctx.clone()));
        }

        let token = access_token(parts)
            .ok_or_else(|| AppError::token_invalid("Authentication required"))?;

        let claims = state
            .tokens
            .validate_access(&token)
            .await
            .inspect_err(|e| match e {
                TokenError::Revoked => tracing::warn!("Revoked access token presented"),
                other => tracing::debug!(reason = %other, "Access token rejected"),
            })?;

        let ctx = RequestContext::new(claims, client_info(parts));
        parts.extensions.insert(ctx.clone());
        Ok(AuthUser(ctx))
    }
}

impl OptionalFromRequestParts<AppState> for AuthUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(
            <AuthUser as FromRequestParts<AppState>>::from_request_parts(parts, state)
                .await
                .ok(),
        )
    }
}

/// The cookie wins over the header when both are present.
pub fn access_token(parts: &Parts) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(ACCESS_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    parts
        .headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_string())
}

/// Caller address and agent for session records and the activity log.
pub fn client_info(parts: &Parts) -> ClientInfo {
    let forwarded = parts
        .headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let ip_address = forwarded.or_else(|| {
        parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
    });

    let user_agent = parts
        .headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    ClientInfo {
        ip_address,
        user_agent,
    }
}

/// Extracts [`ClientInfo`] for unauthenticated endpoints.
#[derive(Debug, Clone)]
pub struct Client(pub ClientInfo);

impl<S: Send + Sync> FromRequestParts<S> for Client {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Client(client_info(parts)))
    }
}
