//! JWT token encoding, decoding, and claims management.

pub mod claims;
pub mod decoder;
pub mod encoder;

pub use claims::{Claims, TokenType};
pub use decoder::JwtDecoder;
pub use encoder::{JwtEncoder, TokenPair};

use courier_core::config::AuthConfig;
use courier_core::config::auth::MIN_SECRET_BYTES;
use courier_core::error::AppError;

/// Rejects configurations that would produce weak or ambiguous tokens.
pub(crate) fn check_config(config: &AuthConfig) -> Result<(), AppError> {
    if config.jwt_secret.len() < MIN_SECRET_BYTES {
        return Err(AppError::configuration(format!(
            "JWT secret must be at least {MIN_SECRET_BYTES} bytes"
        )));
    }
    if config.access_ttl_minutes == 0 || config.refresh_ttl_hours == 0 {
        return Err(AppError::configuration(
            "Token lifetimes must be positive values",
        ));
    }
    if config.access_audience == config.refresh_audience {
        return Err(AppError::configuration(
            "Access and refresh tokens must use different audiences",
        ));
    }
    Ok(())
}
