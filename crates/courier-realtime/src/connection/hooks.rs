//! Application hooks for informational client events.
//!
//! The hub does not know conversation membership. Typing indicators and
//! read receipts are handed to an [`InboundHooks`] implementation, which
//! may resolve participants and re-enter the hub's targeted path.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tracing::debug;

use courier_core::error::AppError;
use courier_core::types::id::{ConversationId, UserId};

use crate::hub::Hub;
use crate::message::types::{Delivered, ReadReceipt, TypingSignal};

/// Receives typing and read-receipt events from connections.
#[async_trait]
pub trait InboundHooks: Send + Sync + 'static {
    /// Called when `user_id` starts or stops typing.
    async fn on_typing(&self, user_id: UserId, signal: TypingSignal) -> Result<(), AppError> {
        debug!(user_id = %user_id, conversation_id = %signal.conversation_id, "Typing signal ignored");
        Ok(())
    }

    /// Called when `user_id` reads a message.
    async fn on_read_receipt(&self, user_id: UserId, receipt: ReadReceipt) -> Result<(), AppError> {
        debug!(user_id = %user_id, message_id = %receipt.message_id, "Read receipt ignored");
        Ok(())
    }
}

/// Hooks that only log.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl InboundHooks for NoopHooks {}

/// Looks up the members of a conversation.
#[async_trait]
pub trait ParticipantResolver: Send + Sync + 'static {
    /// Members of `conversation_id`, or an empty list if it is unknown.
    async fn participants(&self, conversation_id: ConversationId) -> Result<Vec<UserId>, AppError>;
}

/// A [`ParticipantResolver`] held in memory.
#[derive(Debug, Default)]
pub struct MemoryParticipants {
    conversations: DashMap<ConversationId, Vec<UserId>>,
}

impl MemoryParticipants {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the members of a conversation.
    pub fn set(&self, conversation_id: ConversationId, members: Vec<UserId>) {
        self.conversations.insert(conversation_id, members);
    }
}

#[async_trait]
impl ParticipantResolver for MemoryParticipants {
    async fn participants(&self, conversation_id: ConversationId) -> Result<Vec<UserId>, AppError> {
        Ok(self
            .conversations
            .get(&conversation_id)
            .map(|m| m.clone())
            .unwrap_or_default())
    }
}

/// Relays typing signals and read receipts to the other participants of a
/// conversation. A read receipt reaches them as a `delivered` event.
#[derive(Clone)]
pub struct ParticipantRelay {
    hub: Hub,
    resolver: Arc<dyn ParticipantResolver>,
}

impl std::fmt::Debug for ParticipantRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParticipantRelay").finish_non_exhaustive()
    }
}

impl ParticipantRelay {
    /// Creates a relay over `hub`.
    pub fn new(hub: Hub, resolver: Arc<dyn ParticipantResolver>) -> Self {
        Self { hub, resolver }
    }
}

#[async_trait]
impl InboundHooks for ParticipantRelay {
    async fn on_typing(&self, user_id: UserId, signal: TypingSignal) -> Result<(), AppError> {
        let participants = self.resolver.participants(signal.conversation_id).await?;
        if !participants.contains(&user_id) {
            debug!(
                user_id = %user_id,
                conversation_id = %signal.conversation_id,
                "Typing signal from non-participant dropped"
            );
            return Ok(());
        }

        self.hub
            .broadcast_typing(signal.conversation_id, user_id, &participants, signal.is_typing)
            .await;
        Ok(())
    }

    async fn on_read_receipt(&self, user_id: UserId, receipt: ReadReceipt) -> Result<(), AppError> {
        let participants = self.resolver.participants(receipt.conversation_id).await?;
        if !participants.contains(&user_id) {
            debug!(
                user_id = %user_id,
                conversation_id = %receipt.conversation_id,
                "Read receipt from non-participant dropped"
            );
            return Ok(());
        }

        let others: Vec<UserId> = participants
            .into_iter()
            .filter(|id| *id != user_id)
            .collect();
        let delivered = Delivered {
            message_id: receipt.message_id,
            conversation_id: receipt.conversation_id,
            user_id,
            delivered_at: Utc::now(),
        };
        self.hub.broadcast_delivered(delivered, &others).await;
        Ok(())
    }
}
