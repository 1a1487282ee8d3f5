//! User repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use remit_core::error::{AppError, ErrorKind};
use remit_core::result::AppResult;
use remit_entity::user::{CreateUser, ProfileUpdate, User, UserStatus};

use crate::store::{FailedAttempt, UserStore};

/// Columns of `users` plus the joined primary role name.
const SELECT_USER: &str =
    "SELECT u.*, r.name AS role FROM users u JOIN roles r ON r.id = u.role_id";

/// Repository for identity reads and lockout bookkeeping.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!("{SELECT_USER} WHERE u.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user by id", e))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!("{SELECT_USER} WHERE LOWER(u.email) = LOWER($1)"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find user by email", e)
            })
    }

    async fn create(&self, data: &CreateUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "WITH inserted AS ( \
                INSERT INTO users (username, email, password_hash, first_name, last_name, \
                                   phone, department, position, role_id, status, invited_by) \
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
                RETURNING * \
             ) \
             SELECT inserted.*, r.name AS role FROM inserted JOIN roles r ON r.id = inserted.role_id",
        )
        .bind(&data.username)
        .bind(&data.email)
        .bind(&data.password_hash)
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(&data.phone)
        .bind(&data.department)
        .bind(&data.position)
        .bind(data.role_id)
        .bind(data.status)
        .bind(data.invited_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("users_email_lower_key") =>
            {
                AppError::conflict("Email already in use")
            }
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("users_role_id_fkey") =>
            {
                AppError::not_found(format!("Role {} not found", data.role_id))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create user", e),
        })
    }

    async fn record_failed_attempt(
        &self,
        id: Uuid,
        max_attempts: i32,
        lock_until: DateTime<Utc>,
    ) -> AppResult<FailedAttempt> {
        let row: (i32, Option<DateTime<Utc>>) = sqlx::query_as(
            "UPDATE users SET failed_login_attempts = failed_login_attempts + 1, \
                              locked_until = CASE WHEN failed_login_attempts + 1 >= $2 \
                                                  THEN $3 ELSE locked_until END, \
                              version = version + 1, \
                              updated_at = NOW() \
             WHERE id = $1 RETURNING failed_login_attempts, locked_until",
        )
        .bind(id)
        .bind(max_attempts)
        .bind(lock_until)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to record failed attempt", e)
        })?
        .ok_or_else(|| AppError::not_found(format!("User {id} not found")))?;

        Ok(FailedAttempt {
            attempts: row.0,
            locked_until: row.1,
        })
    }

    async fn clear_lockout(&self, id: Uuid) -> AppResult<()> {
        // Leaves a lock set concurrently by another request in place.
        sqlx::query(
            "UPDATE users SET failed_login_attempts = 0, locked_until = NULL, \
                              version = version + 1, updated_at = NOW() \
             WHERE id = $1 AND (locked_until IS NULL OR locked_until <= NOW())",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to clear lockout", e))?;
        Ok(())
    }

    async fn record_successful_login(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query(
            "UPDATE users SET failed_login_attempts = 0, locked_until = NULL, \
                              last_login_at = $2, version = version + 1, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to record successful login", e)
        })?;
        Ok(())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, version = version + 1, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update password", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("User {id} not found")));
        }
        Ok(())
    }

    async fn update_status(&self, id: Uuid, status: UserStatus) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "WITH updated AS ( \
                UPDATE users SET status = $2, failed_login_attempts = 0, locked_until = NULL, \
                                 version = version + 1, updated_at = NOW() \
                WHERE id = $1 \
                RETURNING * \
             ) \
             SELECT updated.*, r.name AS role FROM updated JOIN roles r ON r.id = updated.role_id",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update user status", e))?
        .ok_or_else(|| AppError::not_found(format!("User {id} not found")))
    }

    async fn activate_placeholder(
        &self,
        id: Uuid,
        profile: &ProfileUpdate,
        password_hash: &str,
    ) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "WITH updated AS ( \
                UPDATE users SET first_name = $2, last_name = $3, phone = $4, \
                                 department = $5, position = $6, password_hash = $7, \
                                 status = 'ACTIVE', failed_login_attempts = 0, \
                                 locked_until = NULL, version = version + 1, updated_at = NOW() \
                WHERE id = $1 AND status = 'PENDING_VERIFICATION' \
                RETURNING * \
             ) \
             SELECT updated.*, r.name AS role FROM updated JOIN roles r ON r.id = updated.role_id",
        )
        .bind(id)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.phone)
        .bind(&profile.department)
        .bind(&profile.position)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to activate pending user", e)
        })?
        .ok_or_else(|| AppError::conflict("User is no longer pending verification"))
    }
}
