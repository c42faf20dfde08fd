//! Session lifecycle manager: issuance, validation, rotation, revocation.

use std::sync::Arc;

use tracing::{debug, info};

use courier_core::config::AuthConfig;
use courier_core::error::AppError;
use courier_core::types::id::UserId;
use courier_entity::session::{DeviceInfo, DeviceSession};

use crate::jwt::{Claims, JwtDecoder, JwtEncoder, TokenPair};

use super::hash::hash_refresh_token;
use super::store::DeviceSessionStore;

/// Manages the token pair and device session lifecycle.
///
/// Every token or session failure leaves this type as
/// [`AppError::invalid_token`]; store failures keep their own kind.
#[derive(Clone)]
pub struct SessionManager {
    /// JWT encoder for token generation.
    jwt_encoder: Arc<JwtEncoder>,
    /// JWT decoder for token validation.
    jwt_decoder: Arc<JwtDecoder>,
    /// Device session persistence.
    store: Arc<dyn DeviceSessionStore>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("jwt_encoder", &self.jwt_encoder)
            .field("jwt_decoder", &self.jwt_decoder)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Creates a manager from prepared parts.
    pub fn new(
        jwt_encoder: Arc<JwtEncoder>,
        jwt_decoder: Arc<JwtDecoder>,
        store: Arc<dyn DeviceSessionStore>,
    ) -> Self {
        Self {
            jwt_encoder,
            jwt_decoder,
            store,
        }
    }

    /// Builds the codec from configuration and attaches it to a store.
    pub fn from_config(
        config: &AuthConfig,
        store: Arc<dyn DeviceSessionStore>,
    ) -> Result<Self, AppError> {
        Ok(Self::new(
            Arc::new(JwtEncoder::new(config)?),
            Arc::new(JwtDecoder::new(config)?),
            store,
        ))
    }

    /// Returns the decoder shared with stream authentication.
    pub fn decoder(&self) -> Arc<JwtDecoder> {
        Arc::clone(&self.jwt_decoder)
    }

    /// Issues a fresh pair for `user_id` without persisting anything.
    pub fn issue_token_pair(&self, user_id: UserId) -> Result<TokenPair, AppError> {
        self.jwt_encoder.generate_token_pair(user_id)
    }

    /// Validates any token and returns its claims.
    pub fn validate(&self, token: &str) -> Result<Claims, AppError> {
        self.jwt_decoder.validate(token)
    }

    /// Probes an access token without erroring.
    pub fn validate_access_token(&self, token: &str) -> (bool, Option<UserId>) {
        match self.jwt_decoder.decode_access_token(token) {
            Ok(claims) => (true, Some(claims.user_id())),
            Err(_) => (false, None),
        }
    }

    /// Issues a pair and records a device session for its refresh token.
    pub async fn login(&self, user_id: UserId, device: DeviceInfo) -> Result<TokenPair, AppError> {
        let tokens = self.issue_token_pair(user_id)?;
        let session = DeviceSession::new(user_id, hash_refresh_token(&tokens.refresh_token), device);
        self.store.upsert(&session).await?;

        info!(
            user_id = %user_id,
            session_id = %session.id,
            device_type = %session.device_type,
            "Device session created"
        );
        Ok(tokens)
    }

    /// Exchanges a refresh token for a new pair, consuming it.
    ///
    /// The consumed session is revoked and a replacement carrying the same
    /// device metadata is stored in one store operation. A second use of
    /// the same refresh token, including a concurrent one, fails.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AppError> {
        let claims = self.jwt_decoder.decode_refresh_token(refresh_token)?;
        let user_id = claims.user_id();

        let consumed = self
            .store
            .find_active_by_user_and_hash(user_id, &hash_refresh_token(refresh_token))
            .await?
            .ok_or_else(|| {
                debug!(user_id = %user_id, jti = %claims.jti, "Refresh rejected: no active session");
                AppError::invalid_token()
            })?;

        let tokens = self.issue_token_pair(user_id)?;
        let replacement = DeviceSession::new(
            user_id,
            hash_refresh_token(&tokens.refresh_token),
            consumed.device_info(),
        );

        if !self.store.rotate(consumed.id, &replacement).await? {
            debug!(
                user_id = %user_id,
                session_id = %consumed.id,
                "Refresh rejected: session consumed concurrently"
            );
            return Err(AppError::invalid_token());
        }

        info!(
            user_id = %user_id,
            old_session_id = %consumed.id,
            new_session_id = %replacement.id,
            "Refresh token rotated"
        );
        Ok(tokens)
    }

    /// Revokes the session bound to a refresh token.
    ///
    /// The token must validate as a refresh token. A session that is
    /// unknown or already revoked is left as is.
    pub async fn revoke_session(&self, refresh_token: &str) -> Result<(), AppError> {
        let claims = self.jwt_decoder.decode_refresh_token(refresh_token)?;
        let user_id = claims.user_id();

        let session = self
            .store
            .find_active_by_user_and_hash(user_id, &hash_refresh_token(refresh_token))
            .await?;

        match session {
            Some(session) => {
                let revoked = self.store.revoke_by_id(session.id).await?;
                info!(user_id = %user_id, session_id = %session.id, revoked, "Device session revoked");
            }
            None => debug!(user_id = %user_id, "Revoke skipped: no active session"),
        }
        Ok(())
    }

    /// Revokes every active session of the access token's subject.
    pub async fn revoke_all_sessions(&self, access_token: &str) -> Result<u64, AppError> {
        let claims = self.jwt_decoder.decode_access_token(access_token)?;
        let user_id = claims.user_id();

        let count = self.store.revoke_all_for_user(user_id).await?;
        info!(user_id = %user_id, count, "All device sessions revoked");
        Ok(count)
    }
}
