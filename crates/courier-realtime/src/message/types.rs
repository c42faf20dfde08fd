//! Inbound and outbound stream event definitions.
//!
//! Both directions are closed tagged unions serialized with a `"type"`
//! discriminator, for example `{"type":"pong","timestamp":1700000000}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use courier_core::types::id::{ConversationId, MessageId, UserId};
use courier_entity::presence::PresenceStatus;

/// Events pushed from the server to a connected client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A message was posted to one of the client's conversations.
    NewMessage(NewMessage),
    /// Another participant started or stopped typing.
    TypingIndicator(TypingIndicator),
    /// A user came online or went offline.
    PresenceUpdate(PresenceUpdate),
    /// Reply to a client ping.
    Pong(Pong),
    /// A message reached a recipient.
    Delivered(Delivered),
}

impl ServerEvent {
    /// Short variant name for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NewMessage(_) => "new_message",
            Self::TypingIndicator(_) => "typing_indicator",
            Self::PresenceUpdate(_) => "presence_update",
            Self::Pong(_) => "pong",
            Self::Delivered(_) => "delivered",
        }
    }
}

/// Events sent by a client over its stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Keepalive; answered with a pong carrying the same timestamp.
    Ping(Ping),
    /// The client started or stopped typing in a conversation.
    TypingIndicator(TypingSignal),
    /// The client read a message.
    ReadReceipt(ReadReceipt),
}

impl ClientEvent {
    /// Short variant name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ping(_) => "ping",
            Self::TypingIndicator(_) => "typing_indicator",
            Self::ReadReceipt(_) => "read_receipt",
        }
    }
}

/// A chat message as delivered to participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessage {
    pub message_id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

/// Typing state of `user_id` in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingIndicator {
    pub conversation_id: ConversationId,
    pub user_id: UserId,
    pub is_typing: bool,
}

/// Presence transition of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceUpdate {
    pub user_id: UserId,
    pub status: PresenceStatus,
    pub last_seen: DateTime<Utc>,
}

/// Reply to [`Ping`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pong {
    /// The timestamp echoed from the ping.
    pub timestamp: i64,
}

/// Delivery acknowledgement for a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivered {
    pub message_id: MessageId,
    pub conversation_id: ConversationId,
    /// The recipient the message reached.
    pub user_id: UserId,
    pub delivered_at: DateTime<Utc>,
}

/// Client keepalive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ping {
    /// Client clock, echoed back in the pong.
    pub timestamp: i64,
}

/// Inbound typing signal. The typer is the connection's subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingSignal {
    pub conversation_id: ConversationId,
    pub is_typing: bool,
}

/// Inbound read receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadReceipt {
    pub message_id: MessageId,
    pub conversation_id: ConversationId,
}
