//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use courier_core::types::id::UserId;

/// A user identified by a verified phone number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier.
    pub id: UserId,
    /// E.164 phone number used for one-time passcode login.
    pub phone_number: String,
    /// Human-readable display name.
    pub display_name: Option<String>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creates a new user for a verified phone number.
    pub fn new(phone_number: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            phone_number: phone_number.into(),
            display_name: None,
            created_at: Utc::now(),
        }
    }
}
