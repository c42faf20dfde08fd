//! User directory backed by PostgreSQL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use courier_auth::otp::UserDirectory;
use courier_core::error::AppError;
use courier_core::types::id::UserId;
use courier_entity::user::User;

use crate::connection::map_sqlx_error;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    phone_number: String,
    display_name: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::from_uuid(row.id),
            phone_number: row.phone_number,
            display_name: row.display_name,
            created_at: row.created_at,
        }
    }
}

/// Repository for user rows.
#[derive(Debug, Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    /// Create a new user directory.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_or_create_by_phone(&self, phone_number: &str) -> Result<User, AppError> {
        let candidate = User::new(phone_number);
        // The no-op update makes RETURNING yield the existing row on conflict.
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (id, phone_number, display_name, created_at) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (phone_number) DO UPDATE SET phone_number = EXCLUDED.phone_number \
             RETURNING id, phone_number, display_name, created_at",
        )
        .bind(candidate.id.into_uuid())
        .bind(&candidate.phone_number)
        .bind(&candidate.display_name)
        .bind(candidate.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to find or create user", e))?;

        let user = User::from(row);
        if user.id == candidate.id {
            tracing::info!(user_id = %user.id, "User created");
        }
        Ok(user)
    }
}
