//! Invitation lifecycle: create, validate, accept, cancel, resend, list.
//!
//! ```text
//! Pending --accept--> Accepted   (terminal)
//! Pending --cancel--> Cancelled
//! {Pending, Cancelled} --resend--> Pending (new token, new expiry)
//! ```
//!
//! `Expired` is never written; a pending invitation past `expires_at`
//! reads as expired.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use remit_core::config::invitation::InvitationConfig;
use remit_core::error::ErrorKind;
use remit_database::{InvitationStore, RoleStore, UserStore};
use remit_entity::invitation::{CreateInvitation, Invitation, InvitationFilter, InvitationStatus};
use remit_entity::user::{CreateUser, ProfileUpdate, User, UserStatus, username_from_email};

use crate::error::InvitationError;
use crate::password::{PasswordHasher, PasswordValidator};

use super::token;

/// Writes of `accepted_by` tried before acceptance fails.
const ACCEPTOR_WRITE_ATTEMPTS: u32 = 3;

/// Request to invite an email address.
#[derive(Debug, Clone)]
pub struct NewInvitation {
    pub email: String,
    pub role_id: i32,
    pub invited_by: Uuid,
    /// Falls back to the configured default.
    pub ttl_hours: Option<u64>,
    pub message: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
}

/// A created or re-issued invitation with its plaintext token.
///
/// The token is only available here; the store keeps its digest.
#[derive(Debug, Clone)]
pub struct IssuedInvitation {
    pub invitation: Invitation,
    pub token: String,
    pub invite_url: String,
}

/// What an invitee sees before accepting.
#[derive(Debug, Clone)]
pub struct InvitationSummary {
    pub invitation: Invitation,
    pub role: String,
    pub inviter_name: Option<String>,
}

/// Invitee input on acceptance.
#[derive(Debug, Clone)]
pub struct AcceptInvitation {
    pub token: String,
    pub profile: ProfileUpdate,
    pub password: String,
}

/// Outcome of a successful acceptance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedInvitation {
    pub user_id: Uuid,
    pub email: String,
    pub role: String,
    /// `false` when an existing placeholder identity was promoted.
    pub created: bool,
}

#[derive(Debug, Clone)]
pub struct InvitationEngine {
    invitations: Arc<dyn InvitationStore>,
    users: Arc<dyn UserStore>,
    roles: Arc<dyn RoleStore>,
    hasher: PasswordHasher,
    validator: PasswordValidator,
    default_ttl_hours: u64,
    invite_base_url: String,
}

impl InvitationEngine {
    pub fn new(
        invitations: Arc<dyn InvitationStore>,
        users: Arc<dyn UserStore>,
        roles: Arc<dyn RoleStore>,
        hasher: PasswordHasher,
        validator: PasswordValidator,
        config: &InvitationConfig,
    ) -> Self {
        Self {
            invitations,
            users,
            roles,
            hasher,
            validator,
            default_ttl_hours: config.default_ttl_hours,
            invite_base_url: config.invite_base_url.clone(),
        }
    }

    /// Issues an invitation. Fails if the email belongs to an identity that
    /// is past onboarding or already holds an active invitation.
    pub async fn create(&self, req: NewInvitation) -> Result<IssuedInvitation, InvitationError> {
        let email = req.email.trim().to_string();
        let now = Utc::now();

        if self.roles.find_by_id(req.role_id).await?.is_none() {
            return Err(InvitationError::RoleNotFound);
        }

        if let Some(existing) = self.users.find_by_email(&email).await? {
            if !existing.status.is_invitable() {
                return Err(InvitationError::UserExists);
            }
        }

        if self
            .invitations
            .find_active_by_email(&email, now)
            .await?
            .is_some()
        {
            return Err(InvitationError::ActiveInvitationExists);
        }

        let plaintext = token::generate();
        let invitation = self
            .invitations
            .create(&CreateInvitation {
                email,
                token_hash: token::digest(&plaintext),
                role_id: req.role_id,
                invited_by: req.invited_by,
                expires_at: now + self.ttl(req.ttl_hours),
                message: req.message,
                department: req.department,
                position: req.position,
            })
            .await?;

        info!(
            invitation_id = %invitation.id,
            invited_by = %invitation.invited_by,
            role_id = invitation.role_id,
            "Invitation created"
        );
        Ok(self.issued(invitation, plaintext))
    }

    /// Checks a token without consuming it.
    pub async fn validate(&self, token: &str) -> Result<InvitationSummary, InvitationError> {
        let invitation = self.find_usable(token).await?;

        let role = self
            .roles
            .find_by_id(invitation.role_id)
            .await?
            .map(|r| r.name)
            .ok_or(InvitationError::RoleNotFound)?;
        let inviter_name = self
            .users
            .find_by_id(invitation.invited_by)
            .await?
            .map(|u| u.full_name());

        Ok(InvitationSummary {
            invitation,
            role,
            inviter_name,
        })
    }

    /// Consumes a token and provisions the identity.
    ///
    /// A `PendingVerification` identity with the invited email is promoted
    /// in place and keeps its role; otherwise a new active identity is
    /// created with the invitation's role. The invitation is claimed
    /// atomically first, so concurrent acceptances provision at most once.
    pub async fn accept(
        &self,
        req: AcceptInvitation,
    ) -> Result<AcceptedInvitation, InvitationError> {
        let invitation = self.find_usable(&req.token).await?;

        self.validator
            .validate(&req.password)
            .map_err(|e| InvitationError::InvalidPassword(e.message))?;

        let placeholder = match self.users.find_by_email(&invitation.email).await? {
            Some(user) if user.status == UserStatus::PendingVerification => Some(user),
            Some(_) => return Err(InvitationError::UserExists),
            None => None,
        };

        if placeholder.is_none() && self.roles.find_by_id(invitation.role_id).await?.is_none() {
            return Err(InvitationError::RoleNotFound);
        }

        let password_hash = self.hasher.hash_password(&req.password)?;

        let now = Utc::now();
        if !self.invitations.claim(invitation.id, now).await? {
            return Err(self.claim_failure(invitation.id).await);
        }

        let provisioned = match &placeholder {
            Some(user) => {
                self.users
                    .activate_placeholder(user.id, &req.profile, &password_hash)
                    .await
            }
            None => {
                self.users
                    .create(&new_identity(&invitation, &req.profile, password_hash))
                    .await
            }
        };

        let user: User = match provisioned {
            Ok(user) => user,
            Err(e) => {
                if let Err(release) = self.invitations.release_claim(invitation.id).await {
                    error!(
                        invitation_id = %invitation.id,
                        error = %release,
                        "Failed to release invitation claim"
                    );
                }
                return Err(match e.kind {
                    ErrorKind::Conflict => InvitationError::UserExists,
                    _ => InvitationError::Store(e),
                });
            }
        };

        self.record_acceptor(invitation.id, user.id).await?;

        info!(
            invitation_id = %invitation.id,
            user_id = %user.id,
            promoted = placeholder.is_some(),
            "Invitation accepted"
        );

        Ok(AcceptedInvitation {
            user_id: user.id,
            email: user.email,
            role: user.role,
            created: placeholder.is_none(),
        })
    }

    /// Links an accepted invitation to its identity, retrying transient
    /// store failures before giving up.
    async fn record_acceptor(&self, id: Uuid, user_id: Uuid) -> Result<(), InvitationError> {
        let mut attempt = 1;
        loop {
            match self.invitations.set_accepted_by(id, user_id).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < ACCEPTOR_WRITE_ATTEMPTS => {
                    warn!(
                        invitation_id = %id,
                        user_id = %user_id,
                        attempt,
                        error = %e,
                        "Retrying invitation acceptor write"
                    );
                    tokio::time::sleep(StdDuration::from_millis(50 * u64::from(attempt))).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(
                        invitation_id = %id,
                        user_id = %user_id,
                        error = %e,
                        "Failed to record invitation acceptor"
                    );
                    return Err(InvitationError::Store(e));
                }
            }
        }
    }

    /// Cancels a pending invitation. Cancelling twice is a no-op.
    pub async fn cancel(&self, id: Uuid) -> Result<Invitation, InvitationError> {
        let invitation = self
            .invitations
            .find_by_id(id)
            .await?
            .ok_or(InvitationError::NotFound)?;

        match invitation.status {
            InvitationStatus::Accepted => return Err(InvitationError::NotCancellable),
            InvitationStatus::Cancelled => return Ok(invitation),
            _ => {}
        }

        if !self.invitations.cancel(id).await? {
            return Err(InvitationError::NotCancellable);
        }

        info!(invitation_id = %id, "Invitation cancelled");
        self.invitations
            .find_by_id(id)
            .await?
            .ok_or(InvitationError::NotFound)
    }

    /// Replaces the token and extends the expiry. The previous token stops
    /// working immediately.
    pub async fn resend(
        &self,
        id: Uuid,
        ttl_hours: Option<u64>,
    ) -> Result<IssuedInvitation, InvitationError> {
        let invitation = self
            .invitations
            .find_by_id(id)
            .await?
            .ok_or(InvitationError::NotFound)?;

        if !invitation.status.is_resendable() {
            return Err(InvitationError::NotResendable);
        }

        let plaintext = token::generate();
        let expires_at = Utc::now() + self.ttl(ttl_hours);
        let invitation = self
            .invitations
            .reissue(id, &token::digest(&plaintext), expires_at)
            .await?
            .ok_or(InvitationError::NotResendable)?;

        info!(invitation_id = %id, expires_at = %expires_at, "Invitation re-issued");
        Ok(self.issued(invitation, plaintext))
    }

    /// Newest first. The status filter matches the effective status, so
    /// lapsed pending rows are listed as expired.
    pub async fn list(&self, filter: &InvitationFilter) -> Result<Vec<Invitation>, InvitationError> {
        let stored = InvitationFilter {
            status: filter.status.filter(|s| *s != InvitationStatus::Expired),
            email: filter.email.clone(),
        };
        let now = Utc::now();
        let rows = self.invitations.list(&stored).await?;
        Ok(rows
            .into_iter()
            .filter(|inv| filter.status.is_none_or(|s| inv.effective_status(now) == s))
            .collect())
    }

    /// Looks up a token and rejects anything but a pending, unexpired invitation.
    async fn find_usable(&self, token: &str) -> Result<Invitation, InvitationError> {
        let invitation = self
            .invitations
            .find_by_token_hash(&token::digest(token.trim()))
            .await?
            .ok_or(InvitationError::NotFound)?;

        match invitation.effective_status(Utc::now()) {
            InvitationStatus::Pending => Ok(invitation),
            status => Err(status_error(status)),
        }
    }

    /// Explains why a claim lost.
    async fn claim_failure(&self, id: Uuid) -> InvitationError {
        match self.invitations.find_by_id(id).await {
            Ok(Some(current)) => match current.effective_status(Utc::now()) {
                InvitationStatus::Pending => InvitationError::AlreadyAccepted,
                status => status_error(status),
            },
            Ok(None) => InvitationError::NotFound,
            Err(e) => InvitationError::Store(e),
        }
    }

    fn ttl(&self, hours: Option<u64>) -> Duration {
        Duration::hours(hours.unwrap_or(self.default_ttl_hours) as i64)
    }

    fn issued(&self, invitation: Invitation, token: String) -> IssuedInvitation {
        let separator = if self.invite_base_url.contains('?') { '&' } else { '?' };
        IssuedInvitation {
            invite_url: format!("{}{separator}token={token}", self.invite_base_url),
            invitation,
            token,
        }
    }
}

fn status_error(status: InvitationStatus) -> InvitationError {
    match status {
        InvitationStatus::Accepted => InvitationError::AlreadyAccepted,
        InvitationStatus::Cancelled => InvitationError::Cancelled,
        InvitationStatus::Expired | InvitationStatus::Pending => InvitationError::Expired,
    }
}

fn new_identity(invitation: &Invitation, profile: &ProfileUpdate, password_hash: String) -> CreateUser {
    CreateUser {
        username: username_from_email(&invitation.email),
        email: invitation.email.clone(),
        password_hash,
        first_name: profile.first_name.clone(),
        last_name: profile.last_name.clone(),
        phone: profile.phone.clone(),
        department: profile
            .department
            .clone()
            .or_else(|| invitation.department.clone()),
        position: profile
            .position
            .clone()
            .or_else(|| invitation.position.clone()),
        role_id: invitation.role_id,
        status: UserStatus::Active,
        invited_by: Some(invitation.invited_by),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remit_core::config::auth::AuthConfig;
    use remit_database::MemoryStore;

    const PASSWORD: &str = "Amber-Lantern-93!";

    struct Fixture {
        store: Arc<MemoryStore>,
        engine: InvitationEngine,
        admin: User,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::with_default_roles().await);
        let admin = UserStore::create(
            store.as_ref(),
            &CreateUser {
                username: "admin".into(),
                email: "admin@example.com".into(),
                password_hash: "x".into(),
                first_name: "Ada".into(),
                last_name: "Admin".into(),
                phone: None,
                department: None,
                position: None,
                role_id: 1,
                status: UserStatus::Active,
                invited_by: None,
            },
        )
        .await
        .unwrap();
        let engine = InvitationEngine::new(
            store.clone(),
            store.clone(),
            store.clone(),
            PasswordHasher::new(),
            PasswordValidator::new(&AuthConfig::default()),
            &InvitationConfig::default(),
        );
        Fixture {
            store,
            engine,
            admin,
        }
    }

    fn invite(f: &Fixture, email: &str) -> NewInvitation {
        NewInvitation {
            email: email.into(),
            role_id: 2,
            invited_by: f.admin.id,
            ttl_hours: None,
            message: Some("Welcome aboard".into()),
            department: Some("Payments".into()),
            position: None,
        }
    }

    fn acceptance(token: &str) -> AcceptInvitation {
        AcceptInvitation {
            token: token.into(),
            profile: ProfileUpdate {
                first_name: "Nia".into(),
                last_name: "Newcomer".into(),
                ..ProfileUpdate::default()
            },
            password: PASSWORD.into(),
        }
    }

    #[tokio::test]
    async fn test_create_stores_digest_only() {
        let f = fixture().await;
        let issued = f.engine.create(invite(&f, "new@example.com")).await.unwrap();

        assert_eq!(issued.token.len(), 64);
        assert_ne!(issued.invitation.token_hash, issued.token);
        assert_eq!(issued.invitation.token_hash, token::digest(&issued.token));
        assert!(issued.invite_url.ends_with(&format!("?token={}", issued.token)));
        assert_eq!(issued.invitation.status, InvitationStatus::Pending);
        let hours = (issued.invitation.expires_at - issued.invitation.created_at).num_hours();
        assert!((71..=72).contains(&hours));
    }

    #[tokio::test]
    async fn test_create_conflicts() {
        let f = fixture().await;
        assert!(matches!(
            f.engine.create(invite(&f, "ADMIN@example.com")).await,
            Err(InvitationError::UserExists)
        ));

        f.engine.create(invite(&f, "dup@example.com")).await.unwrap();
        assert!(matches!(
            f.engine.create(invite(&f, "Dup@Example.com")).await,
            Err(InvitationError::ActiveInvitationExists)
        ));

        let mut bad_role = invite(&f, "role@example.com");
        bad_role.role_id = 99;
        assert!(matches!(
            f.engine.create(bad_role).await,
            Err(InvitationError::RoleNotFound)
        ));
    }

    #[tokio::test]
    async fn test_validate_summary() {
        let f = fixture().await;
        let issued = f.engine.create(invite(&f, "v@example.com")).await.unwrap();
        let summary = f.engine.validate(&issued.token).await.unwrap();
        assert_eq!(summary.role, "ORG_USER");
        assert_eq!(summary.inviter_name.as_deref(), Some("Ada Admin"));
        assert!(matches!(
            f.engine.validate("deadbeef").await,
            Err(InvitationError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_accept_creates_identity_exactly_once() {
        let f = fixture().await;
        let issued = f.engine.create(invite(&f, "once@example.com")).await.unwrap();

        let accepted = f.engine.accept(acceptance(&issued.token)).await.unwrap();
        assert!(accepted.created);
        assert_eq!(accepted.role, "ORG_USER");

        let user = UserStore::find_by_id(f.store.as_ref(), accepted.user_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.status, UserStatus::Active);
        assert_eq!(user.department.as_deref(), Some("Payments"));
        assert_eq!(user.invited_by, Some(f.admin.id));

        let inv = InvitationStore::find_by_id(f.store.as_ref(), issued.invitation.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(inv.status, InvitationStatus::Accepted);
        assert_eq!(inv.accepted_by, Some(accepted.user_id));
        assert!(inv.accepted_at.is_some());

        assert!(matches!(
            f.engine.accept(acceptance(&issued.token)).await,
            Err(InvitationError::AlreadyAccepted)
        ));
    }

    #[tokio::test]
    async fn test_accept_retries_acceptor_write() {
        let f = fixture().await;
        let issued = f.engine.create(invite(&f, "flaky@example.com")).await.unwrap();
        f.store.fail_acceptor_writes(2).await;

        let accepted = f.engine.accept(acceptance(&issued.token)).await.unwrap();
        let inv = InvitationStore::find_by_id(f.store.as_ref(), issued.invitation.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(inv.accepted_by, Some(accepted.user_id));
    }

    #[tokio::test]
    async fn test_accept_surfaces_persistent_acceptor_failure() {
        let f = fixture().await;
        let issued = f.engine.create(invite(&f, "down@example.com")).await.unwrap();
        f.store.fail_acceptor_writes(ACCEPTOR_WRITE_ATTEMPTS).await;

        assert!(matches!(
            f.engine.accept(acceptance(&issued.token)).await,
            Err(InvitationError::Store(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_accepts_provision_once() {
        let f = fixture().await;
        let issued = f.engine.create(invite(&f, "race@example.com")).await.unwrap();

        let (a, b) = tokio::join!(
            f.engine.accept(acceptance(&issued.token)),
            f.engine.accept(acceptance(&issued.token))
        );
        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
    }

    #[tokio::test]
    async fn test_accept_promotes_placeholder_keeping_role() {
        let f = fixture().await;
        let placeholder = UserStore::create(
            f.store.as_ref(),
            &CreateUser {
                username: "pending".into(),
                email: "pending@example.com".into(),
                password_hash: "x".into(),
                first_name: "Old".into(),
                last_name: "Name".into(),
                phone: None,
                department: None,
                position: None,
                role_id: 2,
                status: UserStatus::PendingVerification,
                invited_by: None,
            },
        )
        .await
        .unwrap();

        let mut req = invite(&f, "pending@example.com");
        req.role_id = 1;
        let issued = f.engine.create(req).await.unwrap();
        let accepted = f.engine.accept(acceptance(&issued.token)).await.unwrap();

        assert!(!accepted.created);
        assert_eq!(accepted.user_id, placeholder.id);
        assert_eq!(accepted.role, "ORG_USER");
        let user = UserStore::find_by_id(f.store.as_ref(), placeholder.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.status, UserStatus::Active);
        assert_eq!(user.first_name, "Nia");
    }

    #[tokio::test]
    async fn test_accept_after_expiry_and_weak_password() {
        let f = fixture().await;
        let issued = f.engine.create(invite(&f, "late@example.com")).await.unwrap();

        let mut weak = acceptance(&issued.token);
        weak.password = "short".into();
        assert!(matches!(
            f.engine.accept(weak).await,
            Err(InvitationError::InvalidPassword(_))
        ));

        f.store
            .set_invitation_expiry(issued.invitation.id, Utc::now() - Duration::minutes(1))
            .await;
        assert!(matches!(
            f.engine.accept(acceptance(&issued.token)).await,
            Err(InvitationError::Expired)
        ));
        assert!(matches!(
            f.engine.validate(&issued.token).await,
            Err(InvitationError::Expired)
        ));
    }

    #[tokio::test]
    async fn test_cancel_and_resend() {
        let f = fixture().await;
        let issued = f.engine.create(invite(&f, "c@example.com")).await.unwrap();
        let id = issued.invitation.id;

        let cancelled = f.engine.cancel(id).await.unwrap();
        assert_eq!(cancelled.status, InvitationStatus::Cancelled);
        assert_eq!(
            f.engine.cancel(id).await.unwrap().status,
            InvitationStatus::Cancelled
        );
        assert!(matches!(
            f.engine.accept(acceptance(&issued.token)).await,
            Err(InvitationError::Cancelled)
        ));

        let resent = f.engine.resend(id, Some(24)).await.unwrap();
        assert_eq!(resent.invitation.status, InvitationStatus::Pending);
        assert_ne!(resent.token, issued.token);
        assert!(matches!(
            f.engine.validate(&issued.token).await,
            Err(InvitationError::NotFound)
        ));

        f.engine.accept(acceptance(&resent.token)).await.unwrap();
        assert!(matches!(
            f.engine.cancel(id).await,
            Err(InvitationError::NotCancellable)
        ));
        assert!(matches!(
            f.engine.resend(id, None).await,
            Err(InvitationError::NotResendable)
        ));
        assert!(matches!(
            f.engine.cancel(Uuid::new_v4()).await,
            Err(InvitationError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_list_filters() {
        let f = fixture().await;
        let a = f.engine.create(invite(&f, "alpha@example.com")).await.unwrap();
        f.engine.create(invite(&f, "beta@example.com")).await.unwrap();
        f.engine.cancel(a.invitation.id).await.unwrap();

        let all = f.engine.list(&InvitationFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let pending = f
            .engine
            .list(&InvitationFilter {
                status: Some(InvitationStatus::Pending),
                email: None,
            })
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].email, "beta@example.com");

        let by_email = f
            .engine
            .list(&InvitationFilter {
                status: None,
                email: Some("ALPHA".into()),
            })
            .await
            .unwrap();
        assert_eq!(by_email.len(), 1);
    }

    #[tokio::test]
    async fn test_list_reports_lapsed_pending_as_expired() {
        let f = fixture().await;
        let lapsed = f.engine.create(invite(&f, "old@example.com")).await.unwrap();
        f.engine.create(invite(&f, "new@example.com")).await.unwrap();
        f.store
            .set_invitation_expiry(lapsed.invitation.id, Utc::now() - Duration::minutes(1))
            .await;

        let expired = f
            .engine
            .list(&InvitationFilter {
                status: Some(InvitationStatus::Expired),
                email: None,
            })
            .await
            .unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].email, "old@example.com");

        let pending = f
            .engine
            .list(&InvitationFilter {
                status: Some(InvitationStatus::Pending),
                email: None,
            })
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].email, "new@example.com");
    }
}
