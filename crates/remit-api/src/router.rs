//! Route definitions for the identity HTTP API.
//!
//! All routes are mounted under `/api/v1`.

use std::time::Duration;

use axum::{
    Router,
    extract::{DefaultBodyLimit, Request, State},
    middleware::{self as axum_middleware, Next},
    routing::{delete, get, patch, post},
};
use tower_http::compression::CompressionLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::{self, cors::build_cors_layer, require_permission};
use crate::state::AppState;

/// Permission required to manage invitations.
pub const INVITE_PERMISSION: &str = "users:create";
/// Permission required to change account status.
pub const USER_UPDATE_PERMISSION: &str = "users:update";
/// Permission required to view another identity's grants.
pub const USER_READ_PERMISSION: &str = "users:read";
/// Permission required to list roles.
pub const ROLE_READ_PERMISSION: &str = "roles:read";

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let server = &state.config.server;

    let api_routes = Router::new()
        .merge(auth_routes())
        .merge(invitation_admin_routes(state.clone()))
        .merge(invitation_public_routes())
        .merge(admin_routes(state.clone()))
        .route("/health", get(handlers::health::health));

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(DefaultBodyLimit::max(server.body_limit_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            server.request_timeout_seconds,
        )))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(&server.cors))
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/refresh", post(handlers::auth::refresh))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/me", get(handlers::auth::me))
        .route("/auth/change-password", post(handlers::auth::change_password))
        .route("/auth/activity", get(handlers::auth::activity))
        .route(
            "/auth/sessions",
            get(handlers::auth::list_sessions).delete(handlers::auth::revoke_sessions),
        )
}

fn invitation_admin_routes(state: AppState) -> Router<AppState> {
    let routes = Router::new()
        .route(
            "/invitations",
            post(handlers::invitation::create).get(handlers::invitation::list),
        )
        .route("/invitations/{id}", delete(handlers::invitation::cancel))
        .route("/invitations/{id}/resend", post(handlers::invitation::resend));
    gated(routes, state, INVITE_PERMISSION)
}

fn admin_routes(state: AppState) -> Router<AppState> {
    let status = Router::new().route("/users/{id}/status", patch(handlers::admin::update_status));
    let permissions = Router::new().route(
        "/users/{id}/permissions",
        get(handlers::admin::user_permissions),
    );
    let roles = Router::new().route("/roles", get(handlers::admin::list_roles));

    gated(status, state.clone(), USER_UPDATE_PERMISSION)
        .merge(gated(permissions, state.clone(), USER_READ_PERMISSION))
        .merge(gated(roles, state, ROLE_READ_PERMISSION))
}

/// Puts every route of `router` behind a check for `code`.
fn gated(router: Router<AppState>, state: AppState, code: &'static str) -> Router<AppState> {
    router.route_layer(axum_middleware::from_fn_with_state(
        state,
        move |state: State<AppState>, req: Request, next: Next| {
            require_permission(state, code, req, next)
        },
    ))
}

fn invitation_public_routes() -> Router<AppState> {
    Router::new()
        .route("/invitations/validate", get(handlers::invitation::validate))
        .route("/invitations/accept", post(handlers::invitation::accept))
}
