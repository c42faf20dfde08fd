//! Stream authentication: resolves the subject of an incoming connection.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use courier_auth::jwt::JwtDecoder;
use courier_core::error::AppError;
use courier_core::types::id::UserId;

/// Identity attached to a connection before it reaches the hub.
///
/// The hub and adapter trust it without re-validating the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedSubject {
    /// The authenticated user.
    pub user_id: UserId,
    /// `jti` of the access token used.
    pub token_id: Uuid,
    /// When the access token expires.
    pub expires_at: DateTime<Utc>,
}

impl AuthenticatedSubject {
    /// A subject for a user without a backing token.
    pub fn trusted(user_id: UserId) -> Self {
        Self {
            user_id,
            token_id: Uuid::nil(),
            expires_at: DateTime::<Utc>::MAX_UTC,
        }
    }
}

/// Authenticates stream connections using access tokens.
#[derive(Clone)]
pub struct StreamAuthenticator {
    decoder: Arc<JwtDecoder>,
}

impl std::fmt::Debug for StreamAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamAuthenticator").finish()
    }
}

impl StreamAuthenticator {
    /// Creates a new stream authenticator.
    pub fn new(decoder: Arc<JwtDecoder>) -> Self {
        Self { decoder }
    }

    /// Authenticates an `Authorization` header value (`Bearer <token>`).
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<AuthenticatedSubject, AppError> {
        let token = authorization
            .and_then(bearer_token)
            .ok_or_else(|| {
                tracing::debug!("Stream rejected: missing or malformed authorization");
                AppError::invalid_token()
            })?;
        self.authenticate_token(token)
    }

    /// Authenticates a raw access token.
    pub fn authenticate_token(&self, token: &str) -> Result<AuthenticatedSubject, AppError> {
        let claims = self.decoder.decode_access_token(token)?;
        Ok(AuthenticatedSubject {
            user_id: claims.user_id(),
            token_id: claims.jti,
            expires_at: claims.expires_at(),
        })
    }
}

/// Extracts the token from a `Bearer` header value; the scheme is case-insensitive.
pub fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use courier_auth::jwt::JwtEncoder;
    use courier_core::config::AuthConfig;

    use super::*;

    fn setup() -> (JwtEncoder, StreamAuthenticator) {
        let config = AuthConfig::with_secret("0123456789abcdef0123456789abcdef");
        (
            JwtEncoder::new(&config).unwrap(),
            StreamAuthenticator::new(Arc::new(JwtDecoder::new(&config).unwrap())),
        )
    }

    #[test]
    fn test_bearer_parsing() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer   abc "), Some("abc"));
        assert_eq!(bearer_token("BEARER abc"), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer"), None);
        assert_eq!(bearer_token("Bearer  "), None);
    }

    #[test]
    fn test_access_token_accepted() {
        let (encoder, auth) = setup();
        let user = UserId::new();
        let pair = encoder.generate_token_pair(user).unwrap();

        let header = format!("Bearer {}", pair.access_token);
        let subject = auth.authenticate(Some(&header)).unwrap();
        assert_eq!(subject.user_id, user);
    }

    #[test]
    fn test_refresh_token_and_missing_header_rejected() {
        let (encoder, auth) = setup();
        let pair = encoder.generate_token_pair(UserId::new()).unwrap();

        let header = format!("Bearer {}", pair.refresh_token);
        assert!(auth.authenticate(Some(&header)).unwrap_err().is_unauthenticated());
        assert!(auth.authenticate(None).unwrap_err().is_unauthenticated());
    }
}
