//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Minimum accepted length of the HMAC signing secret, in bytes.
pub const MIN_SECRET_BYTES: usize = 32;

/// Token signing and lifetime configuration.
///
/// The secret has no default: a deployment that does not set it fails to
/// start instead of signing with a well-known key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for JWT signing (HMAC-SHA256), at least 32 bytes.
    pub jwt_secret: String,
    /// Access token TTL in minutes.
    #[serde(default = "default_access_ttl")]
    pub access_ttl_minutes: u64,
    /// Refresh token TTL in hours.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl_hours: u64,
    /// `iss` claim written into every token.
    #[serde(default = "default_issuer")]
    pub issuer: String,
    /// `aud` claim of access tokens (client-facing services).
    #[serde(default = "default_access_audience")]
    pub access_audience: String,
    /// `aud` claim of refresh tokens (the issuing authority only).
    #[serde(default = "default_refresh_audience")]
    pub refresh_audience: String,
}

impl AuthConfig {
    /// Builds a configuration with the given secret and default lifetimes.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: secret.into(),
            access_ttl_minutes: default_access_ttl(),
            refresh_ttl_hours: default_refresh_ttl(),
            issuer: default_issuer(),
            access_audience: default_access_audience(),
            refresh_audience: default_refresh_audience(),
        }
    }
}

fn default_access_ttl() -> u64 {
    15
}

fn default_refresh_ttl() -> u64 {
    7 * 24
}

fn default_issuer() -> String {
    "courier-auth".to_string()
}

fn default_access_audience() -> String {
    "courier-client".to_string()
}

fn default_refresh_audience() -> String {
    "courier-auth".to_string()
}
