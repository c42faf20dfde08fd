//! JWT token validation and claims extraction.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use courier_core::config::AuthConfig;
use courier_core::error::AppError;

use super::claims::{Claims, TokenType};

/// Validates and decodes JWT tokens.
///
/// Every rejection, whatever its cause, surfaces as
/// [`AppError::invalid_token`]. The precise reason is only logged.
#[derive(Clone)]
pub struct JwtDecoder {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
    /// Expected `aud` for access tokens.
    access_audience: String,
    /// Expected `aud` for refresh tokens.
    refresh_audience: String,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("access_audience", &self.access_audience)
            .field("refresh_audience", &self.refresh_audience)
            .finish_non_exhaustive()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Result<Self, AppError> {
        super::check_config(config)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[
            config.access_audience.as_str(),
            config.refresh_audience.as_str(),
        ]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        Ok(Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            access_audience: config.access_audience.clone(),
            refresh_audience: config.refresh_audience.clone(),
        })
    }

    /// Decodes and validates a token, returning its claims.
    ///
    /// Checks the signature, algorithm, issuer, audience, and expiry, and
    /// that the audience matches the token type.
    pub fn validate(&self, token: &str) -> Result<Claims, AppError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "Token rejected");
            AppError::invalid_token()
        })?;
        let claims = data.claims;

        if claims.exp <= Utc::now().timestamp() {
            tracing::debug!(jti = %claims.jti, "Token rejected: expired");
            return Err(AppError::invalid_token());
        }

        let expected_audience = match claims.token_type {
            TokenType::Access => &self.access_audience,
            TokenType::Refresh => &self.refresh_audience,
        };
        if &claims.aud != expected_audience {
            tracing::debug!(
                jti = %claims.jti,
                token_type = %claims.token_type,
                "Token rejected: audience does not match type"
            );
            return Err(AppError::invalid_token());
        }

        Ok(claims)
    }

    /// Decodes and validates an access token specifically.
    pub fn decode_access_token(&self, token: &str) -> Result<Claims, AppError> {
        self.decode_typed(token, TokenType::Access)
    }

    /// Decodes and validates a refresh token specifically.
    pub fn decode_refresh_token(&self, token: &str) -> Result<Claims, AppError> {
        self.decode_typed(token, TokenType::Refresh)
    }

    fn decode_typed(&self, token: &str, expected: TokenType) -> Result<Claims, AppError> {
        let claims = self.validate(token)?;
        if claims.token_type != expected {
            tracing::debug!(
                jti = %claims.jti,
                expected = %expected,
                actual = %claims.token_type,
                "Token rejected: wrong type"
            );
            return Err(AppError::invalid_token());
        }
        Ok(claims)
    }
}
