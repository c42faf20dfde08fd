//! The hub: registry of live clients, actor loop, and broadcast paths.
//!
//! Structural changes (register, unregister) and presence fan-out go
//! through a single actor task that owns write access to the registry.
//! Targeted broadcasts take a read lock on the same registry directly.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{RwLock, mpsc, oneshot};
use tracing::{debug, info, warn};

use courier_core::config::RealtimeConfig;
use courier_core::error::AppError;
use courier_core::types::id::{ConversationId, UserId};
use courier_entity::presence::PresenceStatus;

use crate::connection::handle::{ClientHandle, DeliveryMiss};
use crate::message::types::{Delivered, NewMessage, PresenceUpdate, ServerEvent, TypingIndicator};
use crate::metrics::{MetricsSnapshot, RealtimeMetrics};

type Registry = Arc<RwLock<HashMap<UserId, Arc<ClientHandle>>>>;

/// Outcome of a targeted broadcast.
///
/// Misses are informational; a broadcast never fails because of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    /// Recipients whose queue accepted the event.
    pub delivered: usize,
    /// Recipients that missed the event, with the reason.
    pub misses: Vec<(UserId, DeliveryMiss)>,
}

impl DeliveryReport {
    /// Check whether every target received the event.
    pub fn is_complete(&self) -> bool {
        self.misses.is_empty()
    }

    /// Reason `user_id` missed the event, if it did.
    pub fn miss_for(&self, user_id: UserId) -> Option<DeliveryMiss> {
        self.misses
            .iter()
            .find(|(id, _)| *id == user_id)
            .map(|(_, reason)| *reason)
    }
}

enum HubCommand {
    Register {
        client: Arc<ClientHandle>,
        ack: oneshot::Sender<()>,
    },
    Unregister {
        client: Arc<ClientHandle>,
        ack: oneshot::Sender<bool>,
    },
    Presence {
        user_id: UserId,
        status: PresenceStatus,
    },
    Shutdown {
        ack: oneshot::Sender<usize>,
    },
}

/// Handle to the realtime hub.
///
/// Cloning is cheap; all clones talk to the same actor and registry. The
/// actor stops on [`Hub::shutdown`] or once every handle is dropped.
#[derive(Clone)]
pub struct Hub {
    registry: Registry,
    commands: mpsc::Sender<HubCommand>,
    metrics: Arc<RealtimeMetrics>,
    client_queue_capacity: usize,
}

impl std::fmt::Debug for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub")
            .field("client_queue_capacity", &self.client_queue_capacity)
            .finish_non_exhaustive()
    }
}

impl Hub {
    /// Spawns the actor loop and returns a handle to it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: &RealtimeConfig) -> Self {
        let (commands, rx) = mpsc::channel(config.hub_queue_capacity.max(1));
        let registry: Registry = Arc::new(RwLock::new(HashMap::new()));
        let metrics = Arc::new(RealtimeMetrics::new());

        let actor = HubActor {
            registry: Arc::clone(&registry),
            metrics: Arc::clone(&metrics),
            commands: rx,
        };
        tokio::spawn(actor.run());

        info!(
            client_queue_capacity = config.client_queue_capacity,
            hub_queue_capacity = config.hub_queue_capacity,
            "Realtime hub started"
        );

        Self {
            registry,
            commands,
            metrics,
            client_queue_capacity: config.client_queue_capacity,
        }
    }

    /// Registers a client for `user_id`.
    ///
    /// Returns once the client is in the registry. The receiver is the
    /// client's outbound queue and belongs to its pump. A client already
    /// registered for the same user is closed and replaced.
    pub async fn register(
        &self,
        user_id: UserId,
    ) -> Result<(Arc<ClientHandle>, mpsc::Receiver<ServerEvent>), AppError> {
        let (client, rx) = ClientHandle::new(user_id, self.client_queue_capacity);
        let (ack, done) = oneshot::channel();

        self.commands
            .send(HubCommand::Register {
                client: Arc::clone(&client),
                ack,
            })
            .await
            .map_err(|_| hub_stopped())?;
        done.await.map_err(|_| hub_stopped())?;

        Ok((client, rx))
    }

    /// Unregisters a client and closes its queue.
    ///
    /// Returns `false` when the client was no longer registered, for
    /// example after being replaced or on a repeated call.
    pub async fn unregister(&self, client: &Arc<ClientHandle>) -> bool {
        let (ack, done) = oneshot::channel();
        let sent = self
            .commands
            .send(HubCommand::Unregister {
                client: Arc::clone(client),
                ack,
            })
            .await;

        if sent.is_err() {
            client.close();
            return false;
        }
        done.await.unwrap_or(false)
    }

    /// Delivers `event` to each listed user without blocking.
    pub async fn broadcast_to_users(&self, event: &ServerEvent, targets: &[UserId]) -> DeliveryReport {
        let registry = self.registry.read().await;
        let mut report = DeliveryReport::default();

        for user_id in targets {
            let outcome = match registry.get(user_id) {
                Some(client) => client.try_enqueue(event.clone()),
                None => Err(DeliveryMiss::RecipientOffline),
            };
            match outcome {
                Ok(()) => report.delivered += 1,
                Err(reason) => {
                    self.metrics.missed(reason);
                    report.misses.push((*user_id, reason));
                }
            }
        }
        drop(registry);

        self.metrics.delivered(report.delivered as u64);
        for (user_id, reason) in &report.misses {
            match reason {
                DeliveryMiss::RecipientOffline => {
                    debug!(user_id = %user_id, event = event.kind(), "Recipient offline, event dropped")
                }
                _ => warn!(
                    user_id = %user_id,
                    event = event.kind(),
                    reason = %reason,
                    "Event dropped for recipient"
                ),
            }
        }
        report
    }

    /// Delivers a new message to the conversation's participants.
    pub async fn broadcast_message(&self, message: NewMessage, participants: &[UserId]) -> DeliveryReport {
        let message_id = message.message_id;
        let conversation_id = message.conversation_id;
        let report = self
            .broadcast_to_users(&ServerEvent::NewMessage(message), participants)
            .await;

        debug!(
            message_id = %message_id,
            conversation_id = %conversation_id,
            delivered = report.delivered,
            targets = participants.len(),
            "Message broadcast"
        );
        report
    }

    /// Delivers a typing indicator to every participant except the typer.
    pub async fn broadcast_typing(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        participants: &[UserId],
        is_typing: bool,
    ) -> DeliveryReport {
        let targets: Vec<UserId> = participants
            .iter()
            .copied()
            .filter(|id| *id != user_id)
            .collect();
        let event = ServerEvent::TypingIndicator(TypingIndicator {
            conversation_id,
            user_id,
            is_typing,
        });
        self.broadcast_to_users(&event, &targets).await
    }

    /// Delivers a delivery acknowledgement to the listed users.
    pub async fn broadcast_delivered(&self, delivered: Delivered, recipients: &[UserId]) -> DeliveryReport {
        self.broadcast_to_users(&ServerEvent::Delivered(delivered), recipients)
            .await
    }

    /// Queues a presence update for fan-out to every registered client.
    pub async fn broadcast_presence(&self, user_id: UserId, status: PresenceStatus) -> Result<(), AppError> {
        self.commands
            .send(HubCommand::Presence { user_id, status })
            .await
            .map_err(|_| hub_stopped())
    }

    /// Check whether `user_id` has a registered client.
    pub async fn is_online(&self, user_id: UserId) -> bool {
        self.registry.read().await.contains_key(&user_id)
    }

    /// Users with a registered client.
    pub async fn online_users(&self) -> Vec<UserId> {
        self.registry.read().await.keys().copied().collect()
    }

    /// Number of registered clients.
    pub async fn connection_count(&self) -> usize {
        self.registry.read().await.len()
    }

    /// Shared counters.
    pub fn metrics(&self) -> Arc<RealtimeMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Current counter values.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Closes every client and stops the actor.
    pub async fn shutdown(&self) {
        let (ack, done) = oneshot::channel();
        if self.commands.send(HubCommand::Shutdown { ack }).await.is_err() {
            debug!("Realtime hub already stopped");
            return;
        }
        let closed = done.await.unwrap_or(0);
        info!(closed, "Realtime hub shut down");
    }
}

fn hub_stopped() -> AppError {
    AppError::service_unavailable("Realtime hub is not running")
}

/// The single writer of the registry.
struct HubActor {
    registry: Registry,
    metrics: Arc<RealtimeMetrics>,
    commands: mpsc::Receiver<HubCommand>,
}

impl HubActor {
    async fn run(mut self) {
        while let Some(command) = self.commands.recv().await {
            match command {
                HubCommand::Register { client, ack } => {
                    self.register(client).await;
                    let _ = ack.send(());
                }
                HubCommand::Unregister { client, ack } => {
                    let removed = self.unregister(&client).await;
                    let _ = ack.send(removed);
                }
                HubCommand::Presence { user_id, status } => {
                    self.fan_out_presence(user_id, status).await;
                }
                HubCommand::Shutdown { ack } => {
                    let closed = self.close_all().await;
                    let _ = ack.send(closed);
                    break;
                }
            }
        }
        debug!("Realtime hub actor stopped");
    }

    async fn register(&self, client: Arc<ClientHandle>) {
        let previous = {
            let mut registry = self.registry.write().await;
            registry.insert(client.user_id, Arc::clone(&client))
        };

        match previous {
            Some(previous) => {
                previous.close();
                previous.cancel();
                self.metrics.connection_replaced();
                info!(
                    user_id = %client.user_id,
                    conn_id = %client.id,
                    replaced_conn_id = %previous.id,
                    "Client replaced existing connection"
                );
            }
            None => {
                self.metrics.connection_opened();
                info!(user_id = %client.user_id, conn_id = %client.id, "Client registered");
                self.fan_out_presence(client.user_id, PresenceStatus::Online)
                    .await;
            }
        }
    }

    async fn unregister(&self, client: &Arc<ClientHandle>) -> bool {
        let removed = {
            let mut registry = self.registry.write().await;
            match registry.get(&client.user_id) {
                Some(current) if current.id == client.id => registry.remove(&client.user_id).is_some(),
                _ => false,
            }
        };
        client.close();

        if removed {
            self.metrics.connection_closed();
            info!(user_id = %client.user_id, conn_id = %client.id, "Client unregistered");
            self.fan_out_presence(client.user_id, PresenceStatus::Offline)
                .await;
        } else {
            debug!(conn_id = %client.id, "Unregister ignored for inactive client");
        }
        removed
    }

    async fn fan_out_presence(&self, user_id: UserId, status: PresenceStatus) {
        let event = ServerEvent::PresenceUpdate(PresenceUpdate {
            user_id,
            status,
            last_seen: Utc::now(),
        });

        let registry = self.registry.read().await;
        let mut delivered = 0u64;
        for client in registry.values() {
            match client.try_enqueue(event.clone()) {
                Ok(()) => delivered += 1,
                Err(reason) => {
                    self.metrics.missed(reason);
                    warn!(
                        user_id = %client.user_id,
                        reason = %reason,
                        "Presence update dropped for recipient"
                    );
                }
            }
        }
        drop(registry);

        self.metrics.delivered(delivered);
        self.metrics.presence_broadcast();
        debug!(user_id = %user_id, status = %status, delivered, "Presence fanned out");
    }

    async fn close_all(&self) -> usize {
        let clients: Vec<Arc<ClientHandle>> = {
            let mut registry = self.registry.write().await;
            registry.drain().map(|(_, client)| client).collect()
        };
        for client in &clients {
            client.close();
            client.cancel();
            self.metrics.connection_closed();
        }
        clients.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hub(capacity: usize) -> Hub {
        Hub::start(&RealtimeConfig {
            client_queue_capacity: capacity,
            hub_queue_capacity: 16,
        })
    }

    #[tokio::test]
    async fn test_register_emits_online_presence() {
        let hub = hub(8);
        let user = UserId::new();
        let (_client, mut rx) = hub.register(user).await.unwrap();

        match rx.recv().await {
            Some(ServerEvent::PresenceUpdate(update)) => {
                assert_eq!(update.user_id, user);
                assert_eq!(update.status, PresenceStatus::Online);
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(hub.is_online(user).await);
    }

    #[tokio::test]
    async fn test_double_unregister_is_noop() {
        let hub = hub(8);
        let (client, _rx) = hub.register(UserId::new()).await.unwrap();

        assert!(hub.unregister(&client).await);
        assert!(!hub.unregister(&client).await);
        assert_eq!(hub.connection_count().await, 0);
        assert_eq!(hub.metrics_snapshot().connections_active, 0);
    }

    #[tokio::test]
    async fn test_reregistration_replaces_prior_client() {
        let hub = hub(8);
        let observer = UserId::new();
        let (_observer_client, mut observer_rx) = hub.register(observer).await.unwrap();
        observer_rx.recv().await.unwrap();

        let user = UserId::new();
        let (first, mut first_rx) = hub.register(user).await.unwrap();
        let (second, _second_rx) = hub.register(user).await.unwrap();

        assert!(first.is_closed());
        assert!(first.is_cancelled());
        assert!(!second.is_closed());

        // The displaced queue drains its own online event and then ends.
        assert!(matches!(first_rx.recv().await, Some(ServerEvent::PresenceUpdate(_))));
        assert_eq!(first_rx.recv().await, None);

        assert!(!hub.unregister(&first).await);
        assert!(hub.is_online(user).await);
        assert_eq!(hub.connection_count().await, 2);

        // Exactly one online event for the user reached the observer.
        let mut seen = Vec::new();
        while let Ok(event) = observer_rx.try_recv() {
            seen.push(event);
        }
        let online = seen
            .iter()
            .filter(|e| matches!(e, ServerEvent::PresenceUpdate(u) if u.user_id == user))
            .count();
        assert_eq!(online, 1);
        assert_eq!(hub.metrics_snapshot().connections_replaced, 1);
    }

    #[tokio::test]
    async fn test_broadcast_presence_reaches_everyone() {
        let hub = hub(8);
        let (_a, mut a_rx) = hub.register(UserId::new()).await.unwrap();
        let (_b, mut b_rx) = hub.register(UserId::new()).await.unwrap();
        let away = UserId::new();

        hub.broadcast_presence(away, PresenceStatus::Offline).await.unwrap();
        // A registration is serialized behind the presence command.
        let (_c, _c_rx) = hub.register(UserId::new()).await.unwrap();

        for rx in [&mut a_rx, &mut b_rx] {
            let mut found = false;
            while let Ok(event) = rx.try_recv() {
                if let ServerEvent::PresenceUpdate(update) = event {
                    found |= update.user_id == away && update.status == PresenceStatus::Offline;
                }
            }
            assert!(found);
        }
    }

    #[tokio::test]
    async fn test_shutdown_closes_clients() {
        let hub = hub(8);
        let (client, _rx) = hub.register(UserId::new()).await.unwrap();

        hub.shutdown().await;
        assert!(client.is_closed());
        assert!(client.is_cancelled());
        assert!(hub.register(UserId::new()).await.is_err());
        assert!(!hub.unregister(&client).await);
    }
}
