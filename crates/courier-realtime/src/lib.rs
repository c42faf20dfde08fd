//! # courier-realtime
//!
//! Live event delivery for Courier. Provides:
//!
//! - The [`Hub`]: an actor that serializes registration, unregistration,
//!   and presence fan-out, plus a shared-lock path for targeted broadcast
//! - Per-connection client handles with bounded outbound queues
//! - The [`ConnectionAdapter`] that pumps a client's stream to and from the hub
//! - Bearer-token authentication for incoming streams
//! - Delivery metrics
//!
//! ## Ordering
//!
//! Presence events are totally ordered with respect to register and
//! unregister, because all three run on the actor. Targeted broadcasts
//! read the registry directly and are only ordered among themselves,
//! per recipient queue. A targeted event may therefore overtake or trail
//! a presence event that was triggered around the same time.

pub mod connection;
pub mod hub;
pub mod message;
pub mod metrics;

pub use connection::adapter::{ConnectionAdapter, DisconnectReason};
pub use connection::authenticator::{AuthenticatedSubject, StreamAuthenticator, bearer_token};
pub use connection::handle::{ClientHandle, DeliveryMiss};
pub use connection::hooks::{
    InboundHooks, MemoryParticipants, NoopHooks, ParticipantRelay, ParticipantResolver,
};
pub use connection::loopback::{LoopbackClient, loopback};
pub use hub::{DeliveryReport, Hub};
pub use message::types::{ClientEvent, ServerEvent};
pub use metrics::{MetricsSnapshot, RealtimeMetrics};
