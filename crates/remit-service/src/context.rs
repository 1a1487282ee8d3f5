//! Request context carrying the authenticated identity, its session, and
//! the permission snapshot from the access token.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use remit_auth::Claims;

/// Where a request came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Context for the current authenticated request.
///
/// Built by the HTTP layer from validated access-token claims and passed
/// into service methods so that every operation knows *who* is acting and
/// from *which* session.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Validated access-token claims.
    pub claims: Claims,
    pub client: ClientInfo,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(claims: Claims, client: ClientInfo) -> Self {
        Self {
            claims,
            client,
            request_time: Utc::now(),
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.claims.sub
    }

    pub fn session_id(&self) -> Uuid {
        self.claims.sid
    }

    pub fn role(&self) -> &str {
        &self.claims.role
    }

    pub fn permissions(&self) -> &[String] {
        &self.claims.permissions
    }

    /// Exact-match membership; no hierarchy or wildcards.
    pub fn has_permission(&self, code: &str) -> bool {
        self.claims.has_permission(code)
    }
}
