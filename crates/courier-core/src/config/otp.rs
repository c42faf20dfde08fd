//! One-time passcode configuration.

use serde::{Deserialize, Serialize};

/// One-time passcode configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpConfig {
    /// Accept the fixed development code instead of calling a provider.
    #[serde(default = "default_true")]
    pub dev_mode: bool,
    /// The code accepted in development mode.
    #[serde(default = "default_dev_code")]
    pub dev_code: String,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            dev_mode: true,
            dev_code: default_dev_code(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_dev_code() -> String {
    "123456".to_string()
}
