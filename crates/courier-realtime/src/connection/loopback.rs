//! In-process stream built on channels.
//!
//! Lets a caller drive a connection as if it were the remote client.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::message::types::{ClientEvent, ServerEvent};

use super::stream::{ClientEventSource, ServerEventSink, StreamError};

/// The remote-client end of a loopback stream.
#[derive(Debug)]
pub struct LoopbackClient {
    outgoing: Option<mpsc::Sender<Result<ClientEvent, StreamError>>>,
    incoming: mpsc::Receiver<ServerEvent>,
}

impl LoopbackClient {
    /// Sends an event to the server side.
    pub async fn send(&self, event: ClientEvent) -> bool {
        match &self.outgoing {
            Some(tx) => tx.send(Ok(event)).await.is_ok(),
            None => false,
        }
    }

    /// Injects a transport failure into the server's read loop.
    pub async fn fail(&self, reason: impl Into<String>) -> bool {
        match &self.outgoing {
            Some(tx) => tx.send(Err(StreamError::Transport(reason.into()))).await.is_ok(),
            None => false,
        }
    }

    /// Ends the inbound stream as an orderly disconnect would.
    pub fn hang_up(&mut self) {
        self.outgoing = None;
    }

    /// Waits for the next server event; `None` once the server side closed.
    pub async fn recv(&mut self) -> Option<ServerEvent> {
        self.incoming.recv().await
    }
}

/// Server-side inbound half of a loopback stream.
#[derive(Debug)]
pub struct LoopbackSource {
    rx: mpsc::Receiver<Result<ClientEvent, StreamError>>,
}

#[async_trait]
impl ClientEventSource for LoopbackSource {
    async fn receive(&mut self) -> Result<Option<ClientEvent>, StreamError> {
        match self.rx.recv().await {
            Some(Ok(event)) => Ok(Some(event)),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }
}

/// Server-side outbound half of a loopback stream.
#[derive(Debug)]
pub struct LoopbackSink {
    tx: mpsc::Sender<ServerEvent>,
}

#[async_trait]
impl ServerEventSink for LoopbackSink {
    async fn send(&mut self, event: ServerEvent) -> Result<(), StreamError> {
        self.tx
            .send(event)
            .await
            .map_err(|_| StreamError::Transport("loopback client gone".to_string()))
    }
}

/// Creates a connected loopback stream buffering `capacity` frames each way.
pub fn loopback(capacity: usize) -> (LoopbackClient, LoopbackSource, LoopbackSink) {
    let (client_tx, server_rx) = mpsc::channel(capacity.max(1));
    let (server_tx, client_rx) = mpsc::channel(capacity.max(1));
    (
        LoopbackClient {
            outgoing: Some(client_tx),
            incoming: client_rx,
        },
        LoopbackSource { rx: server_rx },
        LoopbackSink { tx: server_tx },
    )
}
