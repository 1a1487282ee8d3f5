//! Activity log repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use remit_core::error::{AppError, ErrorKind};
use remit_core::result::AppResult;
use remit_entity::activity::{NewActivity, UserActivity};

use crate::store::ActivityStore;

/// Append-only repository for `user_activity`.
#[derive(Debug, Clone)]
pub struct ActivityRepository {
    pool: PgPool,
}

impl ActivityRepository {
    /// Create a new activity repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityStore for ActivityRepository {
    async fn record(&self, entry: &NewActivity) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO user_activity (user_id, activity_type, ip_address, user_agent, details) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(entry.user_id)
        .bind(entry.activity_type)
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .bind(&entry.details)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to record activity", e))?;
        Ok(())
    }

    async fn recent_for_user(&self, user_id: Uuid, limit: i64) -> AppResult<Vec<UserActivity>> {
        sqlx::query_as::<_, UserActivity>(
            "SELECT * FROM user_activity WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list activity", e))
    }
}
