//! Shared test helpers for integration tests.

use std::sync::Arc;
use std::time::Duration;

use courier_auth::{
    DevOtpVerifier, LoginResult, MemoryDeviceSessionStore, MemoryUserDirectory, OtpLoginService,
    SessionManager,
};
use courier_core::config::{AuthConfig, OtpConfig, RealtimeConfig};
use courier_entity::session::DeviceInfo;
use courier_realtime::{
    AuthenticatedSubject, ConnectionAdapter, DisconnectReason, Hub, LoopbackClient, ServerEvent,
    StreamAuthenticator, loopback,
};
use tokio::task::JoinHandle;

pub const DEV_CODE: &str = "123456";

/// Every service the server wires together, over in-memory stores.
pub struct TestEnv {
    pub sessions: SessionManager,
    pub otp: OtpLoginService,
    pub hub: Hub,
    pub adapter: ConnectionAdapter,
    pub authenticator: StreamAuthenticator,
}

impl TestEnv {
    pub fn new() -> Self {
        let auth = AuthConfig::with_secret("integration-secret-0123456789abcdef");
        let sessions =
            SessionManager::from_config(&auth, Arc::new(MemoryDeviceSessionStore::new()))
                .expect("session manager");
        let otp = OtpLoginService::new(
            Arc::new(DevOtpVerifier::from_config(&OtpConfig::default()).expect("verifier")),
            Arc::new(MemoryUserDirectory::new()),
            sessions.clone(),
        );
        let hub = Hub::start(&RealtimeConfig::default());
        let adapter = ConnectionAdapter::without_hooks(hub.clone());
        let authenticator = StreamAuthenticator::new(sessions.decoder());

        Self {
            sessions,
            otp,
            hub,
            adapter,
            authenticator,
        }
    }

    /// Logs in with the development passcode.
    pub async fn login(&self, phone_number: &str) -> LoginResult {
        self.otp
            .verify_otp(phone_number, DEV_CODE, DeviceInfo::default())
            .await
            .expect("login")
    }

    /// Opens a stream for `subject` and returns the client end with the
    /// task serving it.
    pub fn connect(
        &self,
        subject: AuthenticatedSubject,
    ) -> (LoopbackClient, JoinHandle<DisconnectReason>) {
        let (client, source, sink) = loopback(32);
        let adapter = self.adapter.clone();
        let task = tokio::spawn(async move {
            adapter
                .serve(subject, source, sink)
                .await
                .expect("serve")
        });
        (client, task)
    }
}

/// Receives events until one matches, failing after a second.
pub async fn recv_until(
    client: &mut LoopbackClient,
    mut matches: impl FnMut(&ServerEvent) -> bool,
) -> ServerEvent {
    tokio::time::timeout(Duration::from_secs(1), async {
        loop {
            match client.recv().await {
                Some(event) if matches(&event) => return event,
                Some(_) => continue,
                None => panic!("stream closed before the expected event"),
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}
