//! In-process device session store.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use courier_core::error::AppError;
use courier_core::types::id::{DeviceSessionId, UserId};
use courier_entity::session::DeviceSession;

use super::store::DeviceSessionStore;

/// A [`DeviceSessionStore`] held in memory.
///
/// Used when no database is configured and throughout the test suites.
/// Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryDeviceSessionStore {
    inner: Mutex<SessionTable>,
}

/// Session records plus the indexes that keep lookups independent of how
/// many sessions were ever issued.
#[derive(Debug, Default)]
struct SessionTable {
    records: HashMap<DeviceSessionId, DeviceSession>,
    /// Every session id of a user, revoked ones included.
    by_user: HashMap<UserId, Vec<DeviceSessionId>>,
    /// Active sessions only, keyed by owner and token digest.
    active_by_digest: HashMap<(UserId, String), DeviceSessionId>,
    /// Active session ids per user.
    active_by_user: HashMap<UserId, HashSet<DeviceSessionId>>,
}

impl SessionTable {
    fn insert(&mut self, session: DeviceSession) {
        if let Some(previous) = self.records.get(&session.id).cloned() {
            self.unindex_active(&previous);
        } else {
            self.by_user
                .entry(session.user_id)
                .or_default()
                .push(session.id);
        }
        if session.is_active() {
            self.active_by_digest.insert(
                (session.user_id, session.refresh_token_hash.clone()),
                session.id,
            );
            self.active_by_user
                .entry(session.user_id)
                .or_default()
                .insert(session.id);
        }
        self.records.insert(session.id, session);
    }

    fn unindex_active(&mut self, session: &DeviceSession) {
        let key = (session.user_id, session.refresh_token_hash.clone());
        if self.active_by_digest.get(&key) == Some(&session.id) {
            self.active_by_digest.remove(&key);
        }
        if let Some(ids) = self.active_by_user.get_mut(&session.user_id) {
            ids.remove(&session.id);
            if ids.is_empty() {
                self.active_by_user.remove(&session.user_id);
            }
        }
    }

    fn find_active(&self, user_id: UserId, refresh_token_hash: &str) -> Option<&DeviceSession> {
        let id = self
            .active_by_digest
            .get(&(user_id, refresh_token_hash.to_string()))?;
        self.records.get(id).filter(|s| s.is_active())
    }

    /// Compare-and-set revoke; `true` only on the active to revoked step.
    fn revoke(&mut self, id: DeviceSessionId, now: DateTime<Utc>) -> bool {
        let snapshot = match self.records.get_mut(&id) {
            Some(session) if session.is_active() => {
                session.revoked_at = Some(now);
                session.clone()
            }
            _ => return false,
        };
        self.unindex_active(&snapshot);
        true
    }

    fn revoke_user(&mut self, user_id: UserId, now: DateTime<Utc>) -> u64 {
        let ids = self.active_by_user.remove(&user_id).unwrap_or_default();
        ids.into_iter().filter(|id| self.revoke(*id, now)).count() as u64
    }
}

impl MemoryDeviceSessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all sessions of a user, revoked ones included.
    pub async fn list_for_user(&self, user_id: UserId) -> Vec<DeviceSession> {
        let table = self.inner.lock().await;
        let mut found: Vec<DeviceSession> = table
            .by_user
            .get(&user_id)
            .into_iter()
            .flatten()
            .filter_map(|id| table.records.get(id))
            .cloned()
            .collect();
        found.sort_by_key(|s| s.last_login_at);
        found
    }
}

#[async_trait]
impl DeviceSessionStore for MemoryDeviceSessionStore {
    async fn upsert(&self, session: &DeviceSession) -> Result<(), AppError> {
        self.inner.lock().await.insert(session.clone());
        Ok(())
    }

    async fn find_active_by_user_and_hash(
        &self,
        user_id: UserId,
        refresh_token_hash: &str,
    ) -> Result<Option<DeviceSession>, AppError> {
        let table = self.inner.lock().await;
        Ok(table.find_active(user_id, refresh_token_hash).cloned())
    }

    async fn revoke_by_id(&self, id: DeviceSessionId) -> Result<bool, AppError> {
        Ok(self.inner.lock().await.revoke(id, Utc::now()))
    }

    async fn revoke_all_for_user(&self, user_id: UserId) -> Result<u64, AppError> {
        Ok(self.inner.lock().await.revoke_user(user_id, Utc::now()))
    }

    async fn rotate(
        &self,
        consumed: DeviceSessionId,
        replacement: &DeviceSession,
    ) -> Result<bool, AppError> {
        let mut table = self.inner.lock().await;
        if !table.revoke(consumed, Utc::now()) {
            return Ok(false);
        }
        table.insert(replacement.clone());
        Ok(true)
    }
}
