//! Refresh token digesting.

use sha2::{Digest, Sha256};

/// Returns the lowercase hex SHA-256 digest of a refresh token.
///
/// Only this digest is ever persisted.
pub fn hash_refresh_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(digest)
}
