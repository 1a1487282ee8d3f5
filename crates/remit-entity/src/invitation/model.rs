//! Invitation entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::InvitationStatus;

/// A single-use onboarding credential.
///
/// Only the SHA-256 digest of the token is stored; the plaintext is returned
/// once on create/resend.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invitation {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub token_hash: String,
    /// Role the accepted identity is bound to.
    pub role_id: i32,
    pub invited_by: Uuid,
    pub expires_at: DateTime<Utc>,
    pub status: InvitationStatus,
    pub accepted_at: Option<DateTime<Utc>>,
    pub accepted_by: Option<Uuid>,
    pub message: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invitation {
    /// Status as observed at `now`: a pending invitation past its expiry
    /// reads as `Expired`.
    pub fn effective_status(&self, now: DateTime<Utc>) -> InvitationStatus {
        match self.status {
            InvitationStatus::Pending if self.expires_at <= now => InvitationStatus::Expired,
            other => other,
        }
    }

    /// Pending and unexpired at `now`.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.effective_status(now) == InvitationStatus::Pending
    }
}

/// Data required to create an invitation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInvitation {
    pub email: String,
    pub token_hash: String,
    pub role_id: i32,
    pub invited_by: Uuid,
    pub expires_at: DateTime<Utc>,
    pub message: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
}

/// Listing filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvitationFilter {
    pub status: Option<InvitationStatus>,
    /// Case-insensitive substring match.
    pub email: Option<String>,
}
