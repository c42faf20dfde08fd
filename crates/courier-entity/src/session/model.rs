//! Device session entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use courier_core::types::id::{DeviceSessionId, UserId};

/// A revocable record binding one refresh token to a user and a device.
///
/// Only the SHA-256 digest of the refresh token is stored. A session is
/// created on login and on every rotation, and is never deleted: revocation
/// sets `revoked_at`, which is terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSession {
    /// Unique session identifier.
    pub id: DeviceSessionId,
    /// The user this session belongs to.
    pub user_id: UserId,
    /// Hex SHA-256 digest of the refresh token.
    #[serde(skip_serializing)]
    pub refresh_token_hash: String,
    /// Human-readable device name.
    pub device_name: String,
    /// Device category (e.g. "mobile", "web").
    pub device_type: String,
    /// Push notification token, if the device registered one.
    pub push_token: Option<String>,
    /// When the session was created by login or rotation.
    pub last_login_at: DateTime<Utc>,
    /// When the session was revoked.
    pub revoked_at: Option<DateTime<Utc>>,
}

impl DeviceSession {
    /// Creates a fresh, active session for the given refresh-token digest.
    pub fn new(user_id: UserId, refresh_token_hash: impl Into<String>, device: DeviceInfo) -> Self {
        Self {
            id: DeviceSessionId::new(),
            user_id,
            refresh_token_hash: refresh_token_hash.into(),
            device_name: device.device_name,
            device_type: device.device_type,
            push_token: device.push_token,
            last_login_at: Utc::now(),
            revoked_at: None,
        }
    }

    /// Check whether the session may still authorize a refresh.
    pub fn is_active(&self) -> bool {
        self.revoked_at.is_none()
    }

    /// Check whether the session has been revoked.
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Device metadata carried forward on rotation.
    pub fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            device_name: self.device_name.clone(),
            device_type: self.device_type.clone(),
            push_token: self.push_token.clone(),
        }
    }
}

/// Device metadata supplied at login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Human-readable device name.
    pub device_name: String,
    /// Device category.
    pub device_type: String,
    /// Push notification token.
    pub push_token: Option<String>,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self {
            device_name: "unknown".to_string(),
            device_type: "mobile".to_string(),
            push_token: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_active() {
        let session = DeviceSession::new(UserId::new(), "abc", DeviceInfo::default());
        assert!(session.is_active());
        assert!(!session.is_revoked());
        assert_eq!(session.device_name, "unknown");
    }

    #[test]
    fn test_hash_not_serialized() {
        let session = DeviceSession::new(UserId::new(), "secret-digest", DeviceInfo::default());
        let json = serde_json::to_string(&session).unwrap();
        assert!(!json.contains("secret-digest"));
    }
}
