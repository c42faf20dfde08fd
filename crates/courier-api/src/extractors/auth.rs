//! Credential extractors.
//!
//! [`BearerToken`] hands the raw access token to handlers that pass it on to
//! the session manager. [`StreamSubject`] authenticates a stream upgrade
//! before the socket is accepted.

use axum::extract::{FromRequestParts, Query};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use serde::Deserialize;

use courier_core::error::AppError;
use courier_realtime::{AuthenticatedSubject, bearer_token};

use crate::error::ApiError;
use crate::state::AppState;

/// Raw token taken from an `Authorization: Bearer` header.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl FromRequestParts<AppState> for BearerToken {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(bearer_token)
            .ok_or_else(AppError::invalid_token)?;

        Ok(BearerToken(token.to_string()))
    }
}

/// Query parameter accepted by browser clients that cannot set headers.
#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Authenticated identity of a stream upgrade.
///
/// The `Authorization` header wins; `?token=` is the fallback.
#[derive(Debug, Clone)]
pub struct StreamSubject(pub AuthenticatedSubject);

impl FromRequestParts<AppState> for StreamSubject {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        if header.is_some() {
            let subject = state.authenticator.authenticate(header)?;
            return Ok(StreamSubject(subject));
        }

        let token = Query::<TokenQuery>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(q)| q.token)
            .filter(|t| !t.is_empty())
            .ok_or_else(AppError::invalid_token)?;

        let subject = state.authenticator.authenticate_token(&token)?;
        Ok(StreamSubject(subject))
    }
}
