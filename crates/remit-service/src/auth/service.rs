//! Authentication use cases.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, warn};

use remit_auth::jwt::{Claims, TokenPair};
use remit_auth::session::NewSession;
use remit_auth::{
    CredentialAuthenticator, CredentialError, PasswordHasher, PasswordValidator, SessionManager,
    TokenError, TokenService,
};
use remit_core::error::{AppError, ErrorKind};
use remit_core::result::AppResult;
use remit_database::{RoleStore, UserStore};
use remit_entity::activity::{ActivityType, NewActivity, UserActivity};
use remit_entity::role::DEFAULT_ROLE;
use remit_entity::session::Session;
use remit_entity::user::{CreateUser, User, UserStatus, username_from_email};

use crate::activity::ActivityRecorder;
use crate::context::{ClientInfo, RequestContext};

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginResult {
    pub tokens: TokenPair,
    pub session: Session,
    pub user: User,
}

/// Self-registration input.
#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

/// Orchestrates the credential engine, sessions, and tokens.
#[derive(Debug, Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    roles: Arc<dyn RoleStore>,
    credentials: CredentialAuthenticator,
    tokens: Arc<TokenService>,
    sessions: Arc<SessionManager>,
    hasher: PasswordHasher,
    validator: PasswordValidator,
    activity: ActivityRecorder,
}

impl AuthService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        users: Arc<dyn UserStore>,
        roles: Arc<dyn RoleStore>,
        credentials: CredentialAuthenticator,
        tokens: Arc<TokenService>,
        sessions: Arc<SessionManager>,
        hasher: PasswordHasher,
        validator: PasswordValidator,
        activity: ActivityRecorder,
    ) -> Self {
        Self {
            users,
            roles,
            credentials,
            tokens,
            sessions,
            hasher,
            validator,
            activity,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Creates a `PendingVerification` identity bound to the default role.
    /// It cannot log in until an invitation for its email is accepted.
    pub async fn register(&self, req: RegisterRequest) -> AppResult<User> {
        let email = req.email.trim().to_string();
        self.validator.validate(&req.password)?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::conflict("Email is already registered"));
        }

        let role = self
            .roles
            .find_by_name(DEFAULT_ROLE)
            .await?
            .ok_or_else(|| AppError::configuration(format!("Role {DEFAULT_ROLE} is missing")))?;

        let user = self
            .users
            .create(&CreateUser {
                username: username_from_email(&email),
                password_hash: self.hasher.hash_password(&req.password)?,
                email,
                first_name: req.first_name,
                last_name: req.last_name,
                phone: req.phone,
                department: None,
                position: None,
                role_id: role.id,
                status: UserStatus::PendingVerification,
                invited_by: None,
            })
            .await?;

        info!(user_id = %user.id, "Identity registered, pending verification");
        Ok(user)
    }

    /// Authenticates, opens a session, and issues a token pair bound to it.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        client: &ClientInfo,
    ) -> AppResult<LoginResult> {
        let user = match self.credentials.authenticate(email, password).await {
            Ok(user) => user,
            Err(err) => {
                self.record_credential_failure(&err, client).await;
                return Err(err.into());
            }
        };

        let session = self
            .sessions
            .create(
                NewSession {
                    user_id: user.id,
                    email: user.email.clone(),
                    role: user.role.clone(),
                    ip_address: client.ip_address.clone(),
                    user_agent: client.user_agent.clone(),
                    metadata: None,
                },
                self.sessions.default_ttl(),
            )
            .await?;

        let tokens = match self.tokens.issue_pair(&user, session.id).await {
            Ok(tokens) => tokens,
            Err(e) => {
                if let Err(cleanup) = self.sessions.delete(session.id).await {
                    warn!(session_id = %session.id, error = %cleanup, "Failed to drop session after token failure");
                }
                return Err(e);
            }
        };

        self.activity
            .record(
                NewActivity::new(user.id, ActivityType::Login)
                    .with_client(client.ip_address.clone(), client.user_agent.clone())
                    .with_details(json!({ "session_id": session.id })),
            )
            .await;

        info!(user_id = %user.id, session_id = %session.id, "Login succeeded");
        Ok(LoginResult {
            tokens,
            session,
            user,
        })
    }

    /// Exchanges a refresh token for a new pair and slides the session.
    ///
    /// A session that lapsed from inactivity is resumed under its id; one
    /// ended by logout or revocation makes the refresh token unusable.
    pub async fn refresh(&self, refresh_token: &str, client: &ClientInfo) -> AppResult<TokenPair> {
        let claims = self.tokens.validate_refresh(refresh_token).await?;
        let ttl = self.sessions.default_ttl();

        match self.sessions.refresh(claims.sid, ttl).await {
            Ok(_) => {}
            Err(e) if matches!(e.kind, ErrorKind::NotFound | ErrorKind::Expired) => {
                self.resume_session(&claims, client).await?;
            }
            Err(e) => return Err(e),
        }

        let pair = self.tokens.rotate(&claims).await?;

        self.activity
            .record(
                NewActivity::new(claims.sub, ActivityType::TokenRefresh)
                    .with_client(client.ip_address.clone(), client.user_agent.clone()),
            )
            .await;

        Ok(pair)
    }

    /// Revokes the presented tokens and ends the session.
    pub async fn logout(&self, ctx: &RequestContext, refresh_token: Option<&str>) -> AppResult<()> {
        self.tokens.revoke(&ctx.claims).await?;

        if let Some(token) = refresh_token {
            match self.tokens.validate_refresh(token).await {
                Ok(refresh) if refresh.sid == ctx.session_id() => {
                    self.tokens.revoke(&refresh).await?;
                }
                Ok(_) => warn!(user_id = %ctx.user_id(), "Refresh token from another session ignored on logout"),
                Err(_) => {}
            }
        }

        self.sessions.delete(ctx.session_id()).await?;

        self.activity
            .record(
                NewActivity::new(ctx.user_id(), ActivityType::Logout).with_client(
                    ctx.client.ip_address.clone(),
                    ctx.client.user_agent.clone(),
                ),
            )
            .await;

        info!(user_id = %ctx.user_id(), session_id = %ctx.session_id(), "Logged out");
        Ok(())
    }

    /// Logout for a caller whose access token is gone or expired: the
    /// refresh token identifies the session to end. An unusable refresh
    /// token leaves nothing to revoke.
    pub async fn logout_with_refresh(
        &self,
        refresh_token: &str,
        client: &ClientInfo,
    ) -> AppResult<()> {
        let claims = match self.tokens.validate_refresh(refresh_token).await {
            Ok(claims) => claims,
            Err(TokenError::RevocationUnavailable) => {
                return Err(TokenError::RevocationUnavailable.into());
            }
            Err(e) => {
                debug!(reason = %e, "Logout with unusable refresh token");
                return Ok(());
            }
        };

        self.tokens.revoke(&claims).await?;
        self.sessions.delete(claims.sid).await?;

        self.activity
            .record(
                NewActivity::new(claims.sub, ActivityType::Logout)
                    .with_client(client.ip_address.clone(), client.user_agent.clone()),
            )
            .await;

        info!(user_id = %claims.sub, session_id = %claims.sid, "Logged out by refresh token");
        Ok(())
    }

    /// The caller's identity.
    pub async fn me(&self, ctx: &RequestContext) -> AppResult<User> {
        self.users
            .find_by_id(ctx.user_id())
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// Changes the current user's password.
    pub async fn change_password(
        &self,
        ctx: &RequestContext,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let user = self.me(ctx).await?;

        if !self
            .hasher
            .verify_password(current_password, &user.password_hash)?
        {
            return Err(AppError::validation("Current password is incorrect"));
        }

        self.validator.validate(new_password)?;
        self.validator
            .validate_not_same(current_password, new_password)?;

        let new_hash = self.hasher.hash_password(new_password)?;
        self.users.update_password(user.id, &new_hash).await?;

        self.activity
            .record(
                NewActivity::new(user.id, ActivityType::PasswordChange).with_client(
                    ctx.client.ip_address.clone(),
                    ctx.client.user_agent.clone(),
                ),
            )
            .await;

        info!(user_id = %user.id, "Password changed");
        Ok(())
    }

    /// The caller's live sessions.
    pub async fn list_sessions(&self, ctx: &RequestContext) -> AppResult<Vec<Session>> {
        self.sessions.list_by_identity(ctx.user_id()).await
    }

    /// The caller's latest activity entries, newest first. `limit` is
    /// clamped to `1..=100` and defaults to 20.
    pub async fn recent_activity(
        &self,
        ctx: &RequestContext,
        limit: Option<i64>,
    ) -> AppResult<Vec<UserActivity>> {
        let limit = limit.unwrap_or(20).clamp(1, 100);
        self.activity.recent(ctx.user_id(), limit).await
    }

    /// Ends every session of the caller and revokes the presented access
    /// token. Other outstanding access tokens lapse with their TTL; their
    /// refreshes fail because the session is gone.
    pub async fn revoke_all_sessions(&self, ctx: &RequestContext) -> AppResult<usize> {
        let revoked = self.sessions.revoke_all(ctx.user_id()).await?;
        self.tokens.revoke(&ctx.claims).await?;
        warn!(user_id = %ctx.user_id(), revoked, "Logged out everywhere");
        Ok(revoked)
    }

    async fn resume_session(&self, claims: &Claims, client: &ClientInfo) -> AppResult<()> {
        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| AppError::token_invalid("Invalid or expired token"))?;
        if !user.status.can_login() {
            warn!(user_id = %user.id, status = %user.status, "Refresh refused for inactive account");
            return Err(AppError::token_invalid("Invalid or expired token"));
        }

        let new = NewSession {
            user_id: user.id,
            email: user.email,
            role: user.role,
            ip_address: client.ip_address.clone(),
            user_agent: client.user_agent.clone(),
            metadata: None,
        };
        match self
            .sessions
            .resume(claims.sid, new, self.sessions.default_ttl())
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if e.kind == ErrorKind::NotFound => {
                warn!(user_id = %claims.sub, session_id = %claims.sid, "Refresh for ended session");
                Err(AppError::token_invalid("Invalid or expired token"))
            }
            Err(e) => Err(e),
        }
    }

    async fn record_credential_failure(&self, err: &CredentialError, client: &ClientInfo) {
        match err {
            CredentialError::PasswordMismatch {
                user_id,
                attempts,
                locked_until,
            } => {
                self.activity
                    .record(
                        NewActivity::new(*user_id, ActivityType::FailedLogin)
                            .with_client(client.ip_address.clone(), client.user_agent.clone())
                            .with_details(json!({ "attempts": attempts })),
                    )
                    .await;
                if let Some(until) = locked_until {
                    self.activity
                        .record(
                            NewActivity::new(*user_id, ActivityType::AccountLocked)
                                .with_client(client.ip_address.clone(), client.user_agent.clone())
                                .with_details(json!({ "locked_until": until })),
                        )
                        .await;
                }
            }
            CredentialError::Locked { until } => {
                warn!(locked_until = ?until, ip = ?client.ip_address, "Login attempt on locked account");
            }
            CredentialError::Inactive(status) => {
                warn!(status = %status, ip = ?client.ip_address, "Login attempt on inactive account");
            }
            CredentialError::NotFound => {
                warn!(ip = ?client.ip_address, "Login attempt for unknown email");
            }
            CredentialError::Store(_) => {}
        }
    }
}
