//! Auth handlers: passcode login, validate, refresh, revoke, logout-all.

use axum::Json;
use axum::extract::State;

use crate::dto::request::{
    RefreshRequest, RevokeRequest, SendOtpRequest, ValidateRequest, VerifyOtpRequest,
    validate_request,
};
use crate::dto::response::{
    ApiResponse, LoginResponse, MessageResponse, RevokeAllResponse, SendOtpResponse,
    TokenPairResponse, ValidateResponse,
};
use crate::error::ApiError;
use crate::extractors::BearerToken;
use crate::state::AppState;

/// POST /api/auth/otp/send
pub async fn send_otp(
    State(state): State<AppState>,
    Json(req): Json<SendOtpRequest>,
) -> Result<Json<ApiResponse<SendOtpResponse>>, ApiError> {
    validate_request(&req)?;
    let status = state.otp_login.send_otp(&req.phone_number).await?;
    Ok(Json(ApiResponse::ok(SendOtpResponse { status })))
}

/// POST /api/auth/otp/verify
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(req): Json<VerifyOtpRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    validate_request(&req)?;
    let result = state
        .otp_login
        .verify_otp(&req.phone_number, &req.code, req.device_info())
        .await?;

    Ok(Json(ApiResponse::ok(LoginResponse {
        tokens: result.tokens.into(),
        user: result.user.into(),
    })))
}

/// POST /api/auth/validate
///
/// Never fails on a bad token; reports `valid: false` instead.
pub async fn validate(
    State(state): State<AppState>,
    Json(req): Json<ValidateRequest>,
) -> Json<ApiResponse<ValidateResponse>> {
    let (valid, user_id) = state.session_manager.validate_access_token(&req.access_token);
    Json(ApiResponse::ok(ValidateResponse {
        valid,
        user_id: user_id.map(|id| id.into_uuid()),
    }))
}

/// POST /api/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<ApiResponse<TokenPairResponse>>, ApiError> {
    validate_request(&req)?;
    let tokens = state.session_manager.refresh(&req.refresh_token).await?;
    Ok(Json(ApiResponse::ok(tokens.into())))
}

/// POST /api/auth/revoke
pub async fn revoke(
    State(state): State<AppState>,
    Json(req): Json<RevokeRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    validate_request(&req)?;
    state.session_manager.revoke_session(&req.refresh_token).await?;
    Ok(Json(ApiResponse::ok(MessageResponse {
        message: "Session revoked".to_string(),
    })))
}

/// POST /api/auth/logout-all
pub async fn logout_all(
    State(state): State<AppState>,
    BearerToken(access_token): BearerToken,
) -> Result<Json<ApiResponse<RevokeAllResponse>>, ApiError> {
    let revoked = state
        .session_manager
        .revoke_all_sessions(&access_token)
        .await?;
    Ok(Json(ApiResponse::ok(RevokeAllResponse { revoked })))
}
