//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use courier_auth::{OtpLoginService, SessionManager};
use courier_core::config::AppConfig;
use courier_realtime::{ConnectionAdapter, Hub, StreamAuthenticator};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`. Every field is
/// cheap to clone.
#[derive(Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,

    // ── Auth ─────────────────────────────────────────────────
    /// Token pair and device session lifecycle
    pub session_manager: SessionManager,
    /// Passcode login flow
    pub otp_login: OtpLoginService,

    // ── Realtime ─────────────────────────────────────────────
    /// Live event hub
    pub hub: Hub,
    /// Serves authenticated WebSocket streams against the hub
    pub connections: ConnectionAdapter,
    /// Authenticates stream upgrades
    pub authenticator: StreamAuthenticator,

    /// Process start, for uptime reporting
    pub started_at: Instant,
}

impl AppState {
    /// Assembles state from its parts; the stream authenticator shares
    /// the session manager's decoder.
    pub fn new(
        config: Arc<AppConfig>,
        session_manager: SessionManager,
        otp_login: OtpLoginService,
        connections: ConnectionAdapter,
    ) -> Self {
        let authenticator = StreamAuthenticator::new(session_manager.decoder());
        Self {
            config,
            session_manager,
            otp_login,
            hub: connections.hub().clone(),
            connections,
            authenticator,
            started_at: Instant::now(),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("session_manager", &self.session_manager)
            .field("hub", &self.hub)
            .finish_non_exhaustive()
    }
}
