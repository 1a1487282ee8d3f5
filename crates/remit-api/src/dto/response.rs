//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use remit_auth::invitation::{AcceptedInvitation, InvitationSummary, IssuedInvitation};
use remit_auth::jwt::TokenPair;
use remit_entity::activity::{ActivityType, UserActivity};
use remit_entity::invitation::{Invitation, InvitationStatus};
use remit_entity::role::Role;
use remit_entity::session::Session;
use remit_entity::user::User;

/// Identity summary for responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub role: String,
    pub status: String,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone: user.phone.clone(),
            department: user.department.clone(),
            position: user.position.clone(),
            role: user.role.clone(),
            status: user.status.to_string(),
            last_login_at: user.last_login_at,
            created_at: user.created_at,
        }
    }
}

/// Token pair as returned by login and refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

impl From<&TokenPair> for TokenResponse {
    fn from(pair: &TokenPair) -> Self {
        Self {
            access_token: pair.access_token.clone(),
            refresh_token: pair.refresh_token.clone(),
            access_expires_at: pair.access_expires_at,
            refresh_expires_at: pair.refresh_expires_at,
        }
    }
}

/// Login response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(flatten)]
    pub tokens: TokenResponse,
    pub session_id: Uuid,
    pub user: UserResponse,
}

/// Generic message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: Uuid,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// The session the request was made with.
    pub current: bool,
}

impl SessionResponse {
    pub fn new(session: &Session, current_id: Uuid) -> Self {
        Self {
            id: session.id,
            ip_address: session.ip_address.clone(),
            user_agent: session.user_agent.clone(),
            created_at: session.created_at,
            last_activity: session.last_activity,
            expires_at: session.expires_at,
            current: session.id == current_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevokedSessionsResponse {
    pub revoked: usize,
}

/// One entry of the caller's activity log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityResponse {
    pub id: Uuid,
    pub activity_type: ActivityType,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl From<UserActivity> for ActivityResponse {
    fn from(entry: UserActivity) -> Self {
        Self {
            id: entry.id,
            activity_type: entry.activity_type,
            ip_address: entry.ip_address,
            user_agent: entry.user_agent,
            details: entry.details,
            created_at: entry.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub is_system: bool,
}

impl From<Role> for RoleResponse {
    fn from(role: Role) -> Self {
        Self {
            id: role.id,
            name: role.name,
            description: role.description,
            is_system: role.is_system,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleListResponse {
    pub roles: Vec<RoleResponse>,
}

/// Effective permissions of an identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPermissionsResponse {
    pub user_id: Uuid,
    pub permissions: Vec<String>,
}

/// A freshly created or re-issued invitation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationCreatedResponse {
    pub id: Uuid,
    pub email: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub invite_url: String,
}

impl From<IssuedInvitation> for InvitationCreatedResponse {
    fn from(issued: IssuedInvitation) -> Self {
        Self {
            id: issued.invitation.id,
            email: issued.invitation.email,
            token: issued.token,
            expires_at: issued.invitation.expires_at,
            invite_url: issued.invite_url,
        }
    }
}

/// What the registration page shows before the invitee accepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationValidationResponse {
    pub valid: bool,
    pub email: String,
    pub role_id: i32,
    pub role: String,
    pub expires_at: DateTime<Utc>,
    pub invited_by: Option<String>,
    pub message: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
}

impl From<InvitationSummary> for InvitationValidationResponse {
    fn from(summary: InvitationSummary) -> Self {
        let inv = summary.invitation;
        Self {
            valid: true,
            email: inv.email,
            role_id: inv.role_id,
            role: summary.role,
            expires_at: inv.expires_at,
            invited_by: summary.inviter_name,
            message: inv.message,
            department: inv.department,
            position: inv.position,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationAcceptedResponse {
    pub user_id: Uuid,
    pub email: String,
    pub role: String,
}

impl From<AcceptedInvitation> for InvitationAcceptedResponse {
    fn from(accepted: AcceptedInvitation) -> Self {
        Self {
            user_id: accepted.user_id,
            email: accepted.email,
            role: accepted.role,
        }
    }
}

/// Administrator view of an invitation. The token is never included.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationResponse {
    pub id: Uuid,
    pub email: String,
    pub role_id: i32,
    pub status: InvitationStatus,
    pub expires_at: DateTime<Utc>,
    pub invited_by: Uuid,
    pub accepted_at: Option<DateTime<Utc>>,
    pub accepted_by: Option<Uuid>,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl InvitationResponse {
    /// Reports `Expired` for pending invitations past their expiry.
    pub fn new(inv: &Invitation, now: DateTime<Utc>) -> Self {
        Self {
            id: inv.id,
            email: inv.email.clone(),
            role_id: inv.role_id,
            status: inv.effective_status(now),
            expires_at: inv.expires_at,
            invited_by: inv.invited_by,
            accepted_at: inv.accepted_at,
            accepted_by: inv.accepted_by,
            message: inv.message.clone(),
            created_at: inv.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationListResponse {
    pub invitations: Vec<InvitationResponse>,
    pub total: usize,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
    pub cache: String,
    /// Omitted when the cache cannot be read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sessions: Option<SessionStats>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    /// Session records currently stored.
    pub stored: usize,
    /// Distinct identities holding a live session.
    pub active_users: usize,
}
