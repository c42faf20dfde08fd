//! Individual client connection handle.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use courier_core::types::id::{ConnectionId, UserId};

use crate::message::types::ServerEvent;

/// Why an event did not reach a recipient's queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMiss {
    /// The bounded outbound queue was at capacity.
    QueueFull,
    /// No client is registered for the recipient.
    RecipientOffline,
    /// The recipient's queue was closed by unregistration.
    Closed,
}

impl std::fmt::Display for DeliveryMiss {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::QueueFull => write!(f, "queue_full"),
            Self::RecipientOffline => write!(f, "recipient_offline"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// A registered client: identity, bounded outbound queue, and cancellation.
///
/// The queue's receiving half belongs to the connection's outbound pump.
/// Closing the handle drops the sending half, so the pump drains what is
/// already queued and then stops.
#[derive(Debug)]
pub struct ClientHandle {
    /// Unique connection ID.
    pub id: ConnectionId,
    /// User who owns this connection.
    pub user_id: UserId,
    sender: Mutex<Option<mpsc::Sender<ServerEvent>>>,
    cancel: CancellationToken,
}

impl ClientHandle {
    /// Creates a handle with a queue of `capacity` events.
    pub fn new(user_id: UserId, capacity: usize) -> (Arc<Self>, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = Arc::new(Self {
            id: ConnectionId::new(),
            user_id,
            sender: Mutex::new(Some(tx)),
            cancel: CancellationToken::new(),
        });
        (handle, rx)
    }

    fn sender(&self) -> MutexGuard<'_, Option<mpsc::Sender<ServerEvent>>> {
        self.sender.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Attempts a non-blocking enqueue.
    pub fn try_enqueue(&self, event: ServerEvent) -> Result<(), DeliveryMiss> {
        let guard = self.sender();
        let Some(sender) = guard.as_ref() else {
            return Err(DeliveryMiss::Closed);
        };
        sender.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryMiss::QueueFull,
            mpsc::error::TrySendError::Closed(_) => DeliveryMiss::Closed,
        })
    }

    /// Closes the outbound queue. Returns `false` if it was already closed.
    pub fn close(&self) -> bool {
        self.sender().take().is_some()
    }

    /// Check whether the outbound queue has been closed.
    pub fn is_closed(&self) -> bool {
        self.sender().is_none()
    }

    /// Signals the connection's read loop to stop.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Check whether the connection has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Token observed by the connection's read loop.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::types::Pong;

    fn pong(timestamp: i64) -> ServerEvent {
        ServerEvent::Pong(Pong { timestamp })
    }

    #[tokio::test]
    async fn test_full_queue_reports_miss() {
        let (handle, mut rx) = ClientHandle::new(UserId::new(), 2);
        assert!(handle.try_enqueue(pong(1)).is_ok());
        assert!(handle.try_enqueue(pong(2)).is_ok());
        assert_eq!(handle.try_enqueue(pong(3)), Err(DeliveryMiss::QueueFull));

        assert_eq!(rx.recv().await, Some(pong(1)));
        assert!(handle.try_enqueue(pong(4)).is_ok());
    }

    #[tokio::test]
    async fn test_close_drains_then_ends() {
        let (handle, mut rx) = ClientHandle::new(UserId::new(), 4);
        handle.try_enqueue(pong(1)).unwrap();

        assert!(handle.close());
        assert!(!handle.close());
        assert_eq!(handle.try_enqueue(pong(2)), Err(DeliveryMiss::Closed));

        assert_eq!(rx.recv().await, Some(pong(1)));
        assert_eq!(rx.recv().await, None);
    }

    #[test]
    fn test_dropped_receiver_is_closed_miss() {
        let (handle, rx) = ClientHandle::new(UserId::new(), 4);
        drop(rx);
        assert_eq!(handle.try_enqueue(pong(1)), Err(DeliveryMiss::Closed));
    }
}
