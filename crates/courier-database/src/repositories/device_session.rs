//! Device session store backed by PostgreSQL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use courier_auth::session::DeviceSessionStore;
use courier_core::error::AppError;
use courier_core::types::id::{DeviceSessionId, UserId};
use courier_entity::session::DeviceSession;

use crate::connection::map_sqlx_error;

const COLUMNS: &str = "id, user_id, refresh_token_hash, device_name, device_type, push_token, \
                       last_login_at, revoked_at";

#[derive(sqlx::FromRow)]
struct DeviceSessionRow {
    id: Uuid,
    user_id: Uuid,
    refresh_token_hash: String,
    device_name: String,
    device_type: String,
    push_token: Option<String>,
    last_login_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
}

impl From<DeviceSessionRow> for DeviceSession {
    fn from(row: DeviceSessionRow) -> Self {
        Self {
            id: DeviceSessionId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            refresh_token_hash: row.refresh_token_hash,
            device_name: row.device_name,
            device_type: row.device_type,
            push_token: row.push_token,
            last_login_at: row.last_login_at,
            revoked_at: row.revoked_at,
        }
    }
}

/// Repository for device session rows.
///
/// Revocation is a conditional update on `revoked_at IS NULL`, so only one
/// caller can ever observe the active-to-revoked transition.
#[derive(Debug, Clone)]
pub struct PgDeviceSessionStore {
    pool: PgPool,
}

impl PgDeviceSessionStore {
    /// Create a new device session store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn upsert_with<'e>(executor: impl PgExecutor<'e>, session: &DeviceSession) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO device_sessions \
         (id, user_id, refresh_token_hash, device_name, device_type, push_token, last_login_at, revoked_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         ON CONFLICT (id) DO UPDATE SET \
           refresh_token_hash = EXCLUDED.refresh_token_hash, \
           device_name = EXCLUDED.device_name, \
           device_type = EXCLUDED.device_type, \
           push_token = EXCLUDED.push_token, \
           last_login_at = EXCLUDED.last_login_at, \
           revoked_at = EXCLUDED.revoked_at",
    )
    .bind(session.id.into_uuid())
    .bind(session.user_id.into_uuid())
    .bind(&session.refresh_token_hash)
    .bind(&session.device_name)
    .bind(&session.device_type)
    .bind(&session.push_token)
    .bind(session.last_login_at)
    .bind(session.revoked_at)
    .execute(executor)
    .await
    .map_err(|e| map_sqlx_error("Failed to upsert device session", e))?;
    Ok(())
}

async fn revoke_with<'e>(executor: impl PgExecutor<'e>, id: DeviceSessionId) -> Result<bool, AppError> {
    let result = sqlx::query(
        "UPDATE device_sessions SET revoked_at = NOW() WHERE id = $1 AND revoked_at IS NULL",
    )
    .bind(id.into_uuid())
    .execute(executor)
    .await
    .map_err(|e| map_sqlx_error("Failed to revoke device session", e))?;
    Ok(result.rows_affected() == 1)
}

#[async_trait]
impl DeviceSessionStore for PgDeviceSessionStore {
    async fn upsert(&self, session: &DeviceSession) -> Result<(), AppError> {
        upsert_with(&self.pool, session).await
    }

    async fn find_active_by_user_and_hash(
        &self,
        user_id: UserId,
        refresh_token_hash: &str,
    ) -> Result<Option<DeviceSession>, AppError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM device_sessions \
             WHERE user_id = $1 AND refresh_token_hash = $2 AND revoked_at IS NULL"
        );
        let row = sqlx::query_as::<_, DeviceSessionRow>(&sql)
            .bind(user_id.into_uuid())
            .bind(refresh_token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to find device session", e))?;
        Ok(row.map(DeviceSession::from))
    }

    async fn revoke_by_id(&self, id: DeviceSessionId) -> Result<bool, AppError> {
        revoke_with(&self.pool, id).await
    }

    async fn revoke_all_for_user(&self, user_id: UserId) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE device_sessions SET revoked_at = NOW() WHERE user_id = $1 AND revoked_at IS NULL",
        )
        .bind(user_id.into_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to revoke device sessions", e))?;
        Ok(result.rows_affected())
    }

    async fn rotate(
        &self,
        consumed: DeviceSessionId,
        replacement: &DeviceSession,
    ) -> Result<bool, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("Failed to begin rotation", e))?;

        if !revoke_with(&mut *tx, consumed).await? {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("Failed to roll back rotation", e))?;
            return Ok(false);
        }
        upsert_with(&mut *tx, replacement).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("Failed to commit rotation", e))?;
        Ok(true)
    }
}
