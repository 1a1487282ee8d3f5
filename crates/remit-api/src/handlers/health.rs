//! Health check handler.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use tracing::warn;

use remit_core::result::AppResult;
use remit_core::traits::cache::CacheProvider;

use crate::dto::response::{HealthResponse, SessionStats};
use crate::state::AppState;

/// GET /api/v1/health
///
/// 503 when a backing store is unreachable.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let cache_ok = state.cache.health_check().await.unwrap_or(false);

    let database = match &state.database {
        Some(db) => {
            if db.health_check().await.unwrap_or(false) {
                "connected"
            } else {
                "unavailable"
            }
        }
        None => "in-memory",
    };

    let sessions = if cache_ok {
        match session_stats(&state).await {
            Ok(stats) => Some(stats),
            Err(e) => {
                warn!(error = %e, "Failed to collect session statistics");
                None
            }
        }
    } else {
        None
    };

    let healthy = cache_ok && database != "unavailable";
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if healthy { "ok" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: database.to_string(),
            cache: if cache_ok { "connected" } else { "unavailable" }.to_string(),
            sessions,
        }),
    )
}

async fn session_stats(state: &AppState) -> AppResult<SessionStats> {
    Ok(SessionStats {
        stored: state.sessions.count().await?,
        active_users: state.sessions.active_identity_count().await?,
    })
}
