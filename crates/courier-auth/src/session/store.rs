//! Device session persistence boundary.

use async_trait::async_trait;

use courier_core::error::AppError;
use courier_core::types::id::{DeviceSessionId, UserId};
use courier_entity::session::DeviceSession;

/// Persistence operations required by [`SessionManager`](super::SessionManager).
///
/// Implementations must make `revoke_by_id` a compare-and-set: it reports
/// `true` only for the call that moved the session from active to revoked.
/// Refresh-token single use depends on that guarantee.
#[async_trait]
pub trait DeviceSessionStore: Send + Sync + 'static {
    /// Inserts a session, or replaces the record with the same id.
    async fn upsert(&self, session: &DeviceSession) -> Result<(), AppError>;

    /// Finds the non-revoked session for a user with the given token digest.
    async fn find_active_by_user_and_hash(
        &self,
        user_id: UserId,
        refresh_token_hash: &str,
    ) -> Result<Option<DeviceSession>, AppError>;

    /// Revokes one session. Returns `true` only if it was active before.
    async fn revoke_by_id(&self, id: DeviceSessionId) -> Result<bool, AppError>;

    /// Revokes every active session of a user, returning how many changed.
    async fn revoke_all_for_user(&self, user_id: UserId) -> Result<u64, AppError>;

    /// Revokes `consumed` and stores `replacement` as one step.
    ///
    /// Returns `false` without storing anything when `consumed` was already
    /// revoked. Stores that can do both atomically should override this.
    async fn rotate(
        &self,
        consumed: DeviceSessionId,
        replacement: &DeviceSession,
    ) -> Result<bool, AppError> {
        if !self.revoke_by_id(consumed).await? {
            return Ok(false);
        }
        self.upsert(replacement).await?;
        Ok(true)
    }
}
