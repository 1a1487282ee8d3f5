//! Shared test helpers for integration tests.
//!
//! The router runs against the in-memory store and cache with the fixture
//! RSA key pair, so no external services are needed.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE};
use http::{HeaderMap, Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use remit_api::{AppState, Stores, build_app, build_state};
use remit_auth::{PasswordHasher, SigningKeys};
use remit_cache::provider::CacheManager;
use remit_core::config::AppConfig;
use remit_core::config::auth::AuthConfig;
use remit_core::config::database::DatabaseConfig;
use remit_database::{MemoryStore, UserStore};
use remit_entity::user::{CreateUser, User, UserStatus};

pub const PASSWORD: &str = "Silver-Meadow-64!";

/// Seeded role ids.
pub const ORG_ADMIN: i32 = 1;
pub const ORG_USER: i32 = 2;

const PRIVATE_PEM: &[u8] = include_bytes!("../../testdata/jwt_private.pem");
const PUBLIC_PEM: &[u8] = include_bytes!("../../testdata/jwt_public.pem");

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Backing store for seeding and inspection
    pub store: Arc<MemoryStore>,
    pub state: AppState,
}

impl TestApp {
    /// Create a new test application
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::with_default_roles().await);
        let stores = Stores {
            users: store.clone(),
            roles: store.clone(),
            invitations: store.clone(),
            activity: store.clone(),
        };
        let keys = SigningKeys::from_pem(PRIVATE_PEM, PUBLIC_PEM).expect("fixture keys");
        let cache = Arc::new(CacheManager::in_memory());

        let state = build_state(test_config(), stores, cache, keys, None);
        let router = build_app(state.clone());

        Self {
            router,
            store,
            state,
        }
    }

    /// Create an identity with [`PASSWORD`].
    pub async fn create_user(&self, email: &str, role_id: i32, status: UserStatus) -> User {
        let hash = PasswordHasher::new()
            .hash_password(PASSWORD)
            .expect("Failed to hash password");

        UserStore::create(
            self.store.as_ref(),
            &CreateUser {
                username: email.split('@').next().unwrap_or(email).to_string(),
                email: email.to_string(),
                password_hash: hash,
                first_name: "Test".into(),
                last_name: "User".into(),
                phone: None,
                department: None,
                position: None,
                role_id,
                status,
                invited_by: None,
            },
        )
        .await
        .expect("Failed to create test user")
    }

    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.request(
            "POST",
            "/api/v1/auth/login",
            Some(json!({ "email": email, "password": password })),
            None,
        )
        .await
    }

    /// Log in with [`PASSWORD`] and return the response body.
    pub async fn login_ok(&self, email: &str) -> Value {
        let response = self.login(email, PASSWORD).await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {:?}", response.body);
        response.body
    }

    /// An active ORG_ADMIN and its access token.
    pub async fn admin_token(&self) -> String {
        self.create_user("root@remit.test", ORG_ADMIN, UserStatus::Active)
            .await;
        self.login_ok("root@remit.test").await["accessToken"]
            .as_str()
            .expect("access token")
            .to_string()
    }

    /// Send a request with an optional JSON body and bearer token.
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut req = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            req = req.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(req, body).await
    }

    /// Send a request authenticated by a `Cookie` header only.
    pub async fn request_with_cookie(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        cookie: &str,
    ) -> TestResponse {
        let req = Request::builder()
            .method(method)
            .uri(path)
            .header(COOKIE, cookie);
        self.send(req, body).await
    }

    async fn send(&self, mut req: http::request::Builder, body: Option<Value>) -> TestResponse {
        let body = match body {
            Some(value) => {
                req = req.header(CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&value).expect("Failed to serialize body"))
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(req.body(body).expect("Failed to build request"))
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        server: Default::default(),
        database: DatabaseConfig {
            url: "postgres://unused".into(),
            max_connections: 1,
            min_connections: 0,
            connect_timeout_seconds: 1,
            idle_timeout_seconds: 1,
            statement_timeout_seconds: 1,
            run_migrations: false,
        },
        cache: Default::default(),
        auth: AuthConfig {
            cookie_secure: false,
            ..Default::default()
        },
        session: Default::default(),
        invitation: Default::default(),
        logging: Default::default(),
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Parsed JSON body
    pub body: Value,
}

impl TestResponse {
    /// All `Set-Cookie` header values.
    pub fn set_cookies(&self) -> Vec<String> {
        self.headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect()
    }

    /// The `Set-Cookie` value for `name`.
    pub fn cookie(&self, name: &str) -> Option<String> {
        let prefix = format!("{name}=");
        self.set_cookies()
            .into_iter()
            .find(|c| c.starts_with(&prefix))
    }

    pub fn error_code(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }

    pub fn uuid(&self, field: &str) -> Uuid {
        self.body[field]
            .as_str()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| panic!("missing uuid field {field}: {:?}", self.body))
    }
}
