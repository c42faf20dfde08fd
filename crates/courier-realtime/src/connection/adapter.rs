//! Connection adapter: bridges one client stream to the hub.
//!
//! Each connection runs an inbound read loop on the caller's task and an
//! outbound pump on its own task. The read loop owns unregistration: it
//! unregisters on end of stream, on a receive error, or when the hub
//! cancels the connection.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use courier_core::error::AppError;

use crate::hub::Hub;
use crate::message::types::{ClientEvent, Pong, ServerEvent};

use super::authenticator::AuthenticatedSubject;
use super::handle::ClientHandle;
use super::hooks::{InboundHooks, NoopHooks};
use super::stream::{ClientEventSource, ServerEventSink};

/// How long a disconnected client's pump may keep writing queued events
/// before it is aborted.
const PUMP_DRAIN_GRACE: Duration = Duration::from_secs(5);

/// Why a connection's read loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The client closed the stream.
    EndOfStream,
    /// Receiving from the stream failed.
    StreamError,
    /// The hub cancelled the connection (replacement or shutdown).
    Cancelled,
}

/// Serves authenticated client streams against a [`Hub`].
#[derive(Clone)]
pub struct ConnectionAdapter {
    hub: Hub,
    hooks: Arc<dyn InboundHooks>,
}

impl std::fmt::Debug for ConnectionAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionAdapter")
            .field("hub", &self.hub)
            .finish_non_exhaustive()
    }
}

impl ConnectionAdapter {
    /// Creates an adapter that forwards informational events to `hooks`.
    pub fn new(hub: Hub, hooks: Arc<dyn InboundHooks>) -> Self {
        Self { hub, hooks }
    }

    /// Creates an adapter whose hooks only log.
    pub fn without_hooks(hub: Hub) -> Self {
        Self::new(hub, Arc::new(NoopHooks))
    }

    /// The hub this adapter registers with.
    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    /// Runs a connection to completion.
    ///
    /// Registers `subject`, starts the outbound pump, reads client events
    /// until the stream ends, then unregisters and gives the pump up to
    /// a short grace period to drain.
    pub async fn serve<S, K>(
        &self,
        subject: AuthenticatedSubject,
        mut source: S,
        sink: K,
    ) -> Result<DisconnectReason, AppError>
    where
        S: ClientEventSource,
        K: ServerEventSink,
    {
        let (client, queue) = self.hub.register(subject.user_id).await?;
        let mut pump = tokio::spawn(run_pump(Arc::clone(&client), queue, sink));
        let cancel = client.cancellation_token();

        info!(user_id = %subject.user_id, conn_id = %client.id, "Stream connected");

        let reason = loop {
            tokio::select! {
                _ = cancel.cancelled() => break DisconnectReason::Cancelled,
                received = source.receive() => match received {
                    Ok(Some(event)) => self.handle_inbound(&client, event).await,
                    Ok(None) => break DisconnectReason::EndOfStream,
                    Err(e) => {
                        warn!(conn_id = %client.id, error = %e, "Stream receive failed");
                        break DisconnectReason::StreamError;
                    }
                },
            }
        };

        self.hub.unregister(&client).await;
        match tokio::time::timeout(PUMP_DRAIN_GRACE, &mut pump).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(conn_id = %client.id, error = %e, "Outbound pump task failed"),
            Err(_) => {
                warn!(conn_id = %client.id, "Outbound pump stalled, aborting");
                pump.abort();
            }
        }

        info!(
            user_id = %subject.user_id,
            conn_id = %client.id,
            reason = ?reason,
            "Stream disconnected"
        );
        Ok(reason)
    }

    async fn handle_inbound(&self, client: &ClientHandle, event: ClientEvent) {
        debug!(conn_id = %client.id, event = event.kind(), "Client event received");

        let outcome = match event {
            ClientEvent::Ping(ping) => {
                let pong = ServerEvent::Pong(Pong {
                    timestamp: ping.timestamp,
                });
                if let Err(reason) = client.try_enqueue(pong) {
                    self.hub.metrics().missed(reason);
                    debug!(conn_id = %client.id, reason = %reason, "Pong dropped");
                }
                Ok(())
            }
            ClientEvent::TypingIndicator(signal) => self.hooks.on_typing(client.user_id, signal).await,
            ClientEvent::ReadReceipt(receipt) => {
                self.hooks.on_read_receipt(client.user_id, receipt).await
            }
        };

        if let Err(e) = outcome {
            warn!(conn_id = %client.id, error = %e, "Inbound hook failed");
        }
    }
}

/// Drains the client's queue into the sink in FIFO order.
///
/// Stops when the queue is closed and empty, when a write fails, or when
/// the client is cancelled while a write is pending. A failed write does
/// not unregister the client.
async fn run_pump<K: ServerEventSink>(
    client: Arc<ClientHandle>,
    mut queue: mpsc::Receiver<ServerEvent>,
    mut sink: K,
) {
    let cancel = client.cancellation_token();
    while let Some(event) = queue.recv().await {
        tokio::select! {
            biased;
            written = sink.send(event) => {
                if let Err(e) = written {
                    warn!(conn_id = %client.id, error = %e, "Outbound write failed, pump stopped");
                    return;
                }
            }
            _ = cancel.cancelled() => {
                debug!(conn_id = %client.id, "Outbound write abandoned on cancel");
                return;
            }
        }
    }
    if let Err(e) = sink.close().await {
        debug!(conn_id = %client.id, error = %e, "Closing outbound stream failed");
    }
    debug!(conn_id = %client.id, "Outbound pump finished");
}
