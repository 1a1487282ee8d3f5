//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use remit_auth::{SessionManager, TokenService};
use remit_cache::provider::CacheManager;
use remit_core::config::AppConfig;
use remit_database::DatabasePool;
use remit_service::{AdminService, AuthService, InvitationService};

/// Application state passed to every handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    pub config: Arc<AppConfig>,

    // ── Infrastructure ───────────────────────────────────────
    /// PostgreSQL pool. Absent when running against in-process stores.
    pub database: Option<DatabasePool>,
    /// Shared fast store (Redis or in-memory).
    pub cache: Arc<CacheManager>,

    // ── Auth ─────────────────────────────────────────────────
    /// Token issuance, validation, and revocation.
    pub tokens: Arc<TokenService>,
    /// Session store, also driven by the background cleanup task.
    pub sessions: Arc<SessionManager>,

    // ── Services ─────────────────────────────────────────────
    pub auth: Arc<AuthService>,
    pub invitations: Arc<InvitationService>,
    pub admin: Arc<AdminService>,
}
