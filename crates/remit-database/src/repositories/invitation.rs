//! Invitation repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use remit_core::error::{AppError, ErrorKind};
use remit_core::result::AppResult;
use remit_entity::invitation::{CreateInvitation, Invitation, InvitationFilter};

use crate::store::InvitationStore;

/// Upper bound on rows returned by a listing.
const LIST_LIMIT: i64 = 500;

/// Repository for invitation lifecycle operations.
#[derive(Debug, Clone)]
pub struct InvitationRepository {
    pool: PgPool,
}

impl InvitationRepository {
    /// Create a new invitation repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InvitationStore for InvitationRepository {
    async fn create(&self, data: &CreateInvitation) -> AppResult<Invitation> {
        sqlx::query_as::<_, Invitation>(
            "INSERT INTO user_invitations (email, token_hash, role_id, invited_by, expires_at, \
                                           message, department, position) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING *",
        )
        .bind(&data.email)
        .bind(&data.token_hash)
        .bind(data.role_id)
        .bind(data.invited_by)
        .bind(data.expires_at)
        .bind(&data.message)
        .bind(&data.department)
        .bind(&data.position)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("user_invitations_token_hash_key") =>
            {
                AppError::conflict("Invitation token collision")
            }
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("user_invitations_role_id_fkey") =>
            {
                AppError::not_found(format!("Role {} not found", data.role_id))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create invitation", e),
        })
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Invitation>> {
        sqlx::query_as::<_, Invitation>("SELECT * FROM user_invitations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find invitation by id", e)
            })
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> AppResult<Option<Invitation>> {
        sqlx::query_as::<_, Invitation>("SELECT * FROM user_invitations WHERE token_hash = $1")
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find invitation by token", e)
            })
    }

    async fn find_active_by_email(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Invitation>> {
        sqlx::query_as::<_, Invitation>(
            "SELECT * FROM user_invitations \
             WHERE LOWER(email) = LOWER($1) AND status = 'PENDING' AND expires_at > $2 \
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(email)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find active invitation", e)
        })
    }

    async fn claim(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE user_invitations SET status = 'ACCEPTED', accepted_at = $2, updated_at = NOW() \
             WHERE id = $1 AND status = 'PENDING' AND expires_at > $2",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to claim invitation", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn release_claim(&self, id: Uuid) -> AppResult<()> {
        sqlx::query(
            "UPDATE user_invitations SET status = 'PENDING', accepted_at = NULL, \
                                         accepted_by = NULL, updated_at = NOW() \
             WHERE id = $1 AND status = 'ACCEPTED'",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to release invitation claim", e)
        })?;
        Ok(())
    }

    async fn set_accepted_by(&self, id: Uuid, user_id: Uuid) -> AppResult<()> {
        sqlx::query(
            "UPDATE user_invitations SET accepted_by = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to record invitation acceptor", e)
        })?;
        Ok(())
    }

    async fn cancel(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE user_invitations SET status = 'CANCELLED', updated_at = NOW() \
             WHERE id = $1 AND status = 'PENDING'",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to cancel invitation", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn reissue(
        &self,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<Option<Invitation>> {
        sqlx::query_as::<_, Invitation>(
            "UPDATE user_invitations SET token_hash = $2, expires_at = $3, status = 'PENDING', \
                                         updated_at = NOW() \
             WHERE id = $1 AND status <> 'ACCEPTED' \
             RETURNING *",
        )
        .bind(id)
        .bind(token_hash)
        .bind(expires_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to reissue invitation", e))
    }

    async fn list(&self, filter: &InvitationFilter) -> AppResult<Vec<Invitation>> {
        sqlx::query_as::<_, Invitation>(
            "SELECT * FROM user_invitations \
             WHERE ($1::invitation_status IS NULL OR status = $1) \
               AND ($2::text IS NULL OR email ILIKE '%' || $2 || '%') \
             ORDER BY created_at DESC \
             LIMIT $3",
        )
        .bind(filter.status)
        .bind(&filter.email)
        .bind(LIST_LIMIT)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list invitations", e))
    }
}
