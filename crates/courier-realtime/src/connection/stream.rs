//! Transport-neutral halves of a client stream.

use async_trait::async_trait;
use thiserror::Error;

use crate::message::types::{ClientEvent, ServerEvent};

/// A failure on the underlying transport.
#[derive(Debug, Clone, Error)]
pub enum StreamError {
    /// The transport failed or was reset.
    #[error("stream transport error: {0}")]
    Transport(String),
    /// A frame could not be encoded.
    #[error("stream encode error: {0}")]
    Encode(String),
}

/// Inbound half: yields client events until the stream ends.
#[async_trait]
pub trait ClientEventSource: Send {
    /// Returns the next event, `Ok(None)` at end of stream.
    ///
    /// Must be cancel safe: the adapter drops a pending call when the
    /// connection is cancelled.
    async fn receive(&mut self) -> Result<Option<ClientEvent>, StreamError>;
}

/// Outbound half: writes server events to the client.
#[async_trait]
pub trait ServerEventSink: Send + 'static {
    /// Writes one event.
    async fn send(&mut self, event: ServerEvent) -> Result<(), StreamError>;

    /// Flushes and closes the outbound half.
    async fn close(&mut self) -> Result<(), StreamError> {
        Ok(())
    }
}
