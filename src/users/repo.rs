//! Identity store: the opaque persistence collaborator behind a trait, with
//! the Postgres implementation. Unique indexes on username/email/phone are
//! the authoritative backstop for the orchestrator's best-effort pre-checks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::Field;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub email: String,
    // Reversibly encoded, never serialized into a response.
    #[serde(skip_serializing)]
    pub password: String,
    pub phone: String,
    pub address: String,
    pub is_admin: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub address: String,
    pub is_admin: bool,
}

/// One row of the registrations-per-month aggregation.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MonthlyCount {
    pub month: i32,
    pub total: i64,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),

    #[error("unique constraint violated for {0}")]
    ConstraintViolation(Field),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_by_field(&self, field: Field, value: &str) -> Result<Option<User>, StoreError>;
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError>;
    /// Set a single field. `Ok(None)` means no row was updated.
    async fn update_field(
        &self,
        id: Uuid,
        field: Field,
        value: &str,
    ) -> Result<Option<User>, StoreError>;
    /// Returns whether a row was actually removed.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
    async fn list(&self) -> Result<Vec<User>, StoreError>;
    /// Group registrations by calendar month for rows created since the
    /// given boundary.
    async fn monthly_counts(&self, since: OffsetDateTime)
        -> Result<Vec<MonthlyCount>, StoreError>;
}

const USER_COLUMNS: &str =
    "id, username, name, email, password, phone, address, is_admin, created_at";

pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Map a unique-index violation to the field whose constraint fired, so the
/// orchestrator can report `AlreadyExists` even when its pre-check raced.
fn map_sqlx_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            let constraint = db_err.constraint().unwrap_or_default();
            let field = if constraint.contains("username") {
                Some(Field::Username)
            } else if constraint.contains("email") {
                Some(Field::Email)
            } else if constraint.contains("phone") {
                Some(Field::Phone)
            } else {
                None
            };
            if let Some(field) = field {
                return StoreError::ConstraintViolation(field);
            }
        }
    }
    StoreError::Unavailable(e)
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_field(&self, field: Field, value: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE {} = $1",
            field.as_str()
        ))
        .bind(value)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, name, email, password, phone, address, is_admin)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new_user.username)
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.password)
        .bind(&new_user.phone)
        .bind(&new_user.address)
        .bind(new_user.is_admin)
        .fetch_one(&self.db)
        .await
        .map_err(map_sqlx_error)?;
        Ok(user)
    }

    async fn update_field(
        &self,
        id: Uuid,
        field: Field,
        value: &str,
    ) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET {} = $2 WHERE id = $1 RETURNING {USER_COLUMNS}",
            field.as_str()
        ))
        .bind(id)
        .bind(value)
        .fetch_optional(&self.db)
        .await
        .map_err(map_sqlx_error)?;
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(users)
    }

    async fn monthly_counts(
        &self,
        since: OffsetDateTime,
    ) -> Result<Vec<MonthlyCount>, StoreError> {
        let rows = sqlx::query_as::<_, MonthlyCount>(
            r#"
            SELECT CAST(date_part('month', created_at) AS INT4) AS month,
                   COUNT(*) AS total
            FROM users
            WHERE created_at >= $1
            GROUP BY month
            ORDER BY month
            "#,
        )
        .bind(since)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }
}
