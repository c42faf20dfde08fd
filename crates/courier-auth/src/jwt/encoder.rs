//! JWT token creation with configurable signing and TTL.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use courier_core::config::AuthConfig;
use courier_core::error::AppError;
use courier_core::types::id::UserId;

use super::claims::{Claims, TokenType};

/// Creates signed JWT access and refresh tokens.
#[derive(Clone)]
pub struct JwtEncoder {
    /// HMAC secret key for signing.
    encoding_key: EncodingKey,
    /// Access token lifetime.
    access_ttl: Duration,
    /// Refresh token lifetime.
    refresh_ttl: Duration,
    /// `iss` claim for every token.
    issuer: String,
    /// `aud` claim for access tokens.
    access_audience: String,
    /// `aud` claim for refresh tokens.
    refresh_audience: String,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

/// Result of a successful token pair generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived access token.
    pub access_token: String,
    /// Long-lived refresh token.
    pub refresh_token: String,
    /// Access token expiration timestamp.
    pub access_expires_at: DateTime<Utc>,
    /// Refresh token expiration timestamp.
    pub refresh_expires_at: DateTime<Utc>,
}

impl JwtEncoder {
    /// Creates a new encoder from auth configuration.
    ///
    /// Fails when the secret is shorter than the minimum, a lifetime is
    /// zero, or both token types would share an audience.
    pub fn new(config: &AuthConfig) -> Result<Self, AppError> {
        super::check_config(config)?;
        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            access_ttl: Duration::minutes(config.access_ttl_minutes as i64),
            refresh_ttl: Duration::hours(config.refresh_ttl_hours as i64),
            issuer: config.issuer.clone(),
            access_audience: config.access_audience.clone(),
            refresh_audience: config.refresh_audience.clone(),
        })
    }

    /// Generates a new access + refresh token pair for the given user.
    pub fn generate_token_pair(&self, user_id: UserId) -> Result<TokenPair, AppError> {
        let now = Utc::now();
        let access_claims = self.claims_for(user_id, TokenType::Access, now);
        let refresh_claims = self.claims_for(user_id, TokenType::Refresh, now);

        let access_token = self.sign(&access_claims)?;
        let refresh_token = self.sign(&refresh_claims)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_expires_at: access_claims.expires_at(),
            refresh_expires_at: refresh_claims.expires_at(),
        })
    }

    /// Builds the claim set for one token of the given type issued at `now`.
    pub fn claims_for(&self, user_id: UserId, token_type: TokenType, now: DateTime<Utc>) -> Claims {
        let (ttl, audience) = match token_type {
            TokenType::Access => (self.access_ttl, &self.access_audience),
            TokenType::Refresh => (self.refresh_ttl, &self.refresh_audience),
        };
        Claims {
            sub: user_id.into_uuid(),
            token_type,
            iss: self.issuer.clone(),
            aud: audience.clone(),
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    /// Signs an arbitrary claim set with HS256.
    pub fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to sign {} token: {e}", claims.token_type)))
    }
}
