//! Route definitions for the Courier HTTP API.
//!
//! REST routes are mounted under `/api`; the stream endpoint lives at `/ws`.

use axum::{
    Router,
    routing::{get, post},
};

use crate::handlers;
use crate::state::AppState;

/// Build the router with every route, threading `AppState` through
/// `.with_state(state)`.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new().merge(auth_routes()).merge(health_routes());

    Router::new()
        .nest("/api", api_routes)
        .route("/ws", get(handlers::ws::ws_upgrade))
        .with_state(state)
}

/// Auth endpoints: passcode login and token lifecycle
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/otp/send", post(handlers::auth::send_otp))
        .route("/auth/otp/verify", post(handlers::auth::verify_otp))
        .route("/auth/validate", post(handlers::auth::validate))
        .route("/auth/refresh", post(handlers::auth::refresh))
        .route("/auth/revoke", post(handlers::auth::revoke))
        .route("/auth/logout-all", post(handlers::auth::logout_all))
}

/// Health check endpoints (no auth required)
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
