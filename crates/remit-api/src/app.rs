//! Application builder: wires stores, auth components, and services into
//! [`AppState`], then router and middleware into an Axum app.

use std::sync::Arc;

use axum::Router;

use remit_auth::{
    CredentialAuthenticator, InvitationEngine, PasswordHasher, PasswordValidator,
    PermissionResolver, SessionManager, SigningKeys, TokenService,
};
use remit_cache::provider::CacheManager;
use remit_core::config::AppConfig;
use remit_database::repositories::{
    ActivityRepository, InvitationRepository, RoleRepository, UserRepository,
};
use remit_database::{ActivityStore, DatabasePool, InvitationStore, RoleStore, UserStore};
use remit_service::{ActivityRecorder, AdminService, AuthService, InvitationService};

use crate::router::build_router;
use crate::state::AppState;

/// The persistence backends the services run on.
#[derive(Debug, Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub roles: Arc<dyn RoleStore>,
    pub invitations: Arc<dyn InvitationStore>,
    pub activity: Arc<dyn ActivityStore>,
}

impl Stores {
    /// PostgreSQL repositories sharing one pool.
    pub fn postgres(db: &DatabasePool) -> Self {
        let pool = db.pool().clone();
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            roles: Arc::new(RoleRepository::new(pool.clone())),
            invitations: Arc::new(InvitationRepository::new(pool.clone())),
            activity: Arc::new(ActivityRepository::new(pool)),
        }
    }
}

/// Builds every component from configuration. The signing keys are moved in
/// once and shared read-only from here on.
pub fn build_state(
    config: AppConfig,
    stores: Stores,
    cache: Arc<CacheManager>,
    keys: SigningKeys,
    database: Option<DatabasePool>,
) -> AppState {
    let hasher = PasswordHasher::new();
    let validator = PasswordValidator::new(&config.auth);
    let activity = ActivityRecorder::new(stores.activity.clone());

    let tokens = Arc::new(TokenService::new(
        &config.auth,
        keys,
        cache.clone(),
        stores.users.clone(),
        PermissionResolver::new(stores.roles.clone()),
    ));
    let sessions = Arc::new(SessionManager::new(cache.clone(), &config.session));

    let credentials =
        CredentialAuthenticator::new(stores.users.clone(), hasher.clone(), &config.auth);

    let auth = Arc::new(AuthService::new(
        stores.users.clone(),
        stores.roles.clone(),
        credentials,
        tokens.clone(),
        sessions.clone(),
        hasher.clone(),
        validator.clone(),
        activity.clone(),
    ));

    let engine = InvitationEngine::new(
        stores.invitations.clone(),
        stores.users.clone(),
        stores.roles.clone(),
        hasher,
        validator,
        &config.invitation,
    );
    let invitations = Arc::new(InvitationService::new(Arc::new(engine), activity));
    let admin = Arc::new(AdminService::new(
        stores.users.clone(),
        stores.roles.clone(),
        PermissionResolver::new(stores.roles.clone()),
        sessions.clone(),
    ));

    AppState {
        config: Arc::new(config),
        database,
        cache,
        tokens,
        sessions,
        auth,
        invitations,
        admin,
    }
}

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    build_router(state)
}
