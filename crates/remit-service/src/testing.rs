//! Wiring shared by the unit tests of this crate.

use std::sync::Arc;

use remit_auth::{
    CredentialAuthenticator, InvitationEngine, PasswordHasher, PasswordValidator,
    PermissionResolver, SessionManager, SigningKeys, TokenService,
};
use remit_cache::provider::CacheManager;
use remit_core::config::auth::AuthConfig;
use remit_core::config::invitation::InvitationConfig;
use remit_core::config::session::SessionConfig;
use remit_database::{MemoryStore, UserStore};
use remit_entity::user::{CreateUser, User, UserStatus};

use crate::{
    ActivityRecorder, AdminService, AuthService, ClientInfo, InvitationService, RequestContext,
};

pub const PASSWORD: &str = "Copper-Falcon-28!";

const PRIVATE_PEM: &[u8] = include_bytes!("../../../testdata/jwt_private.pem");
const PUBLIC_PEM: &[u8] = include_bytes!("../../../testdata/jwt_public.pem");

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub cache: Arc<CacheManager>,
    pub sessions: Arc<SessionManager>,
    pub auth: AuthService,
    pub invitations: InvitationService,
    pub admin: AdminService,
}

impl Harness {
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::with_default_roles().await);
        let cache = Arc::new(CacheManager::in_memory());
        let auth_config = AuthConfig::default();
        let hasher = PasswordHasher::new();
        let validator = PasswordValidator::new(&auth_config);
        let activity = ActivityRecorder::new(store.clone());

        let tokens = Arc::new(TokenService::new(
            &auth_config,
            SigningKeys::from_pem(PRIVATE_PEM, PUBLIC_PEM).unwrap(),
            cache.clone(),
            store.clone(),
            PermissionResolver::new(store.clone()),
        ));
        let sessions = Arc::new(SessionManager::new(cache.clone(), &SessionConfig::default()));

        let auth = AuthService::new(
            store.clone(),
            store.clone(),
            CredentialAuthenticator::new(store.clone(), hasher.clone(), &auth_config),
            tokens,
            sessions.clone(),
            hasher.clone(),
            validator.clone(),
            activity.clone(),
        );
        let engine = InvitationEngine::new(
            store.clone(),
            store.clone(),
            store.clone(),
            hasher,
            validator,
            &InvitationConfig::default(),
        );
        let invitations = InvitationService::new(Arc::new(engine), activity);
        let admin = AdminService::new(
            store.clone(),
            store.clone(),
            PermissionResolver::new(store.clone()),
            sessions.clone(),
        );

        Self {
            store,
            cache,
            sessions,
            auth,
            invitations,
            admin,
        }
    }

    pub fn client(&self) -> ClientInfo {
        ClientInfo {
            ip_address: Some("198.51.100.4".into()),
            user_agent: Some("unit-test".into()),
        }
    }

    /// An active identity with [`PASSWORD`]. `root@…` emails get ORG_ADMIN.
    pub async fn active_user(&self, email: &str) -> User {
        let role_id = if email.starts_with("root@") { 1 } else { 2 };
        UserStore::create(
            self.store.as_ref(),
            &CreateUser {
                username: email.split('@').next().unwrap_or(email).into(),
                email: email.into(),
                password_hash: PasswordHasher::new().hash_password(PASSWORD).unwrap(),
                first_name: "Test".into(),
                last_name: "User".into(),
                phone: None,
                department: None,
                position: None,
                role_id,
                status: UserStatus::Active,
                invited_by: None,
            },
        )
        .await
        .unwrap()
    }

    /// Logged-in context of a fresh ORG_ADMIN identity.
    pub async fn admin_context(&self) -> RequestContext {
        self.active_user("root@example.com").await;
        let login = self
            .auth
            .login("root@example.com", PASSWORD, &self.client())
            .await
            .unwrap();
        self.context(&login.tokens.access_token).await
    }

    pub async fn context(&self, access_token: &str) -> RequestContext {
        let claims = self
            .auth
            .tokens()
            .validate_access(access_token)
            .await
            .unwrap();
        RequestContext::new(claims, self.client())
    }
}
