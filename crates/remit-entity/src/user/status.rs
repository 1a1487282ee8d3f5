//! Account status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    /// Self-registered, awaiting verification or an invitation.
    PendingVerification,
    /// Can authenticate.
    Active,
    /// Suspended by an administrator.
    Suspended,
    /// Explicitly locked; independent of `locked_until`.
    Locked,
    /// Disabled by an administrator.
    Disabled,
    /// Soft-deleted.
    Deleted,
    /// Invited but not yet onboarded.
    Invited,
    /// Password must be reset before login.
    PasswordExpired,
}

impl UserStatus {
    /// Check if the identity can authenticate with this status.
    pub fn can_login(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Statuses that may be targeted by a new invitation.
    pub fn is_invitable(&self) -> bool {
        matches!(self, Self::PendingVerification | Self::Invited)
    }

    /// Return the status as its wire/database string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingVerification => "PENDING_VERIFICATION",
            Self::Active => "ACTIVE",
            Self::Suspended => "SUSPENDED",
            Self::Locked => "LOCKED",
            Self::Disabled => "DISABLED",
            Self::Deleted => "DELETED",
            Self::Invited => "INVITED",
            Self::PasswordExpired => "PASSWORD_EXPIRED",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = remit_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDING_VERIFICATION" => Ok(Self::PendingVerification),
            "ACTIVE" => Ok(Self::Active),
            "SUSPENDED" => Ok(Self::Suspended),
            "LOCKED" => Ok(Self::Locked),
            "DISABLED" => Ok(Self::Disabled),
            "DELETED" => Ok(Self::Deleted),
            "INVITED" => Ok(Self::Invited),
            "PASSWORD_EXPIRED" => Ok(Self::PasswordExpired),
            _ => Err(remit_core::AppError::validation(format!(
                "Invalid user status: '{s}'"
            ))),
        }
    }
}
