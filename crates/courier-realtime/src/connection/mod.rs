//! Per-connection state and the stream-facing adapter.

pub mod adapter;
pub mod authenticator;
pub mod handle;
pub mod hooks;
pub mod loopback;
pub mod stream;

pub use adapter::{ConnectionAdapter, DisconnectReason};
pub use authenticator::{AuthenticatedSubject, StreamAuthenticator};
pub use handle::{ClientHandle, DeliveryMiss};
pub use stream::{ClientEventSource, ServerEventSink, StreamError};
