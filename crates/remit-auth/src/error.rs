//! Typed failures for the authentication components.
//!
//! Each enum carries enough detail for logging; converting into
//! [`AppError`] collapses it to the coarse category callers may see.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use remit_core::error::AppError;
use remit_entity::user::UserStatus;

/// Credential authentication failures.
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("no identity with this email")]
    NotFound,

    #[error("account locked")]
    Locked { until: Option<DateTime<Utc>> },

    #[error("account is {0}")]
    Inactive(UserStatus),

    #[error("password mismatch (attempt {attempts})")]
    PasswordMismatch {
        user_id: Uuid,
        attempts: i32,
        /// Set when this attempt triggered the lock.
        locked_until: Option<DateTime<Utc>>,
    },

    #[error(transparent)]
    Store(#[from] AppError),
}

impl From<CredentialError> for AppError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::NotFound | CredentialError::PasswordMismatch { .. } => {
                AppError::invalid_credential("Invalid email or password")
            }
            CredentialError::Locked { .. } => {
                AppError::account_locked("Account is temporarily locked")
            }
            CredentialError::Inactive(_) => AppError::account_inactive("Account is not active"),
            CredentialError::Store(e) => e,
        }
    }
}

/// Token validation failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,

    #[error("invalid token signature")]
    SignatureInvalid,

    #[error("token expired")]
    Expired,

    #[error("token revoked")]
    Revoked,

    #[error("unexpected token type")]
    WrongType,

    #[error("revocation store unavailable")]
    RevocationUnavailable,
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::RevocationUnavailable => {
                AppError::service_unavailable("Token verification temporarily unavailable")
            }
            _ => AppError::token_invalid("Invalid or expired token"),
        }
    }
}

/// Invitation lifecycle failures.
#[derive(Error, Debug)]
pub enum InvitationError {
    #[error("invitation not found")]
    NotFound,

    #[error("invitation has expired")]
    Expired,

    #[error("invitation has already been accepted")]
    AlreadyAccepted,

    #[error("invitation has been cancelled")]
    Cancelled,

    #[error("role not found")]
    RoleNotFound,

    #[error("user already exists")]
    UserExists,

    #[error("an active invitation already exists for this email")]
    ActiveInvitationExists,

    #[error("cannot resend accepted invitation")]
    NotResendable,

    #[error("cannot cancel accepted invitation")]
    NotCancellable,

    #[error("{0}")]
    InvalidPassword(String),

    #[error(transparent)]
    Store(#[from] AppError),
}

impl From<InvitationError> for AppError {
    fn from(err: InvitationError) -> Self {
        let message = err.to_string();
        match err {
            InvitationError::NotFound | InvitationError::RoleNotFound => {
                AppError::not_found(message)
            }
            InvitationError::Expired => AppError::expired(message),
            InvitationError::AlreadyAccepted
            | InvitationError::Cancelled
            | InvitationError::NotResendable
            | InvitationError::NotCancellable
            | InvitationError::InvalidPassword(_) => AppError::validation(message),
            InvitationError::UserExists | InvitationError::ActiveInvitationExists => {
                AppError::conflict(message)
            }
            InvitationError::Store(e) => e,
        }
    }
}
