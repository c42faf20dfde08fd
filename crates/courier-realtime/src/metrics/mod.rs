//! Realtime hub metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::connection::handle::DeliveryMiss;

/// Hub-level counters.
#[derive(Debug, Default)]
pub struct RealtimeMetrics {
    /// Connections registered since start.
    pub connections_total: AtomicU64,
    /// Currently registered connections.
    pub connections_active: AtomicU64,
    /// Connections displaced by a newer one for the same user.
    pub connections_replaced: AtomicU64,
    /// Events placed on a client queue.
    pub events_delivered: AtomicU64,
    /// Events dropped because the recipient queue was full.
    pub missed_queue_full: AtomicU64,
    /// Events dropped because the recipient was not registered.
    pub missed_offline: AtomicU64,
    /// Events dropped because the recipient queue was already closed.
    pub missed_closed: AtomicU64,
    /// Presence events fanned out by the actor.
    pub presence_broadcasts: AtomicU64,
}

impl RealtimeMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly registered connection.
    pub fn connection_opened(&self) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
        self.connections_active.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a removed connection.
    pub fn connection_closed(&self) {
        let _ = self
            .connections_active
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| v.checked_sub(1));
    }

    /// Record a same-user replacement. The active count is unchanged.
    pub fn connection_replaced(&self) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
        self.connections_replaced.fetch_add(1, Ordering::Relaxed);
    }

    /// Record `count` successful enqueues.
    pub fn delivered(&self, count: u64) {
        self.events_delivered.fetch_add(count, Ordering::Relaxed);
    }

    /// Record one delivery miss.
    pub fn missed(&self, reason: DeliveryMiss) {
        let counter = match reason {
            DeliveryMiss::QueueFull => &self.missed_queue_full,
            DeliveryMiss::RecipientOffline => &self.missed_offline,
            DeliveryMiss::Closed => &self.missed_closed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one presence fan-out.
    pub fn presence_broadcast(&self) {
        self.presence_broadcasts.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_total: self.connections_total.load(Ordering::Relaxed),
            connections_active: self.connections_active.load(Ordering::Relaxed),
            connections_replaced: self.connections_replaced.load(Ordering::Relaxed),
            events_delivered: self.events_delivered.load(Ordering::Relaxed),
            missed_queue_full: self.missed_queue_full.load(Ordering::Relaxed),
            missed_offline: self.missed_offline.load(Ordering::Relaxed),
            missed_closed: self.missed_closed.load(Ordering::Relaxed),
            presence_broadcasts: self.presence_broadcasts.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub connections_total: u64,
    pub connections_active: u64,
    pub connections_replaced: u64,
    pub events_delivered: u64,
    pub missed_queue_full: u64,
    pub missed_offline: u64,
    pub missed_closed: u64,
    pub presence_broadcasts: u64,
}

impl MetricsSnapshot {
    /// Sum of every miss reason.
    pub fn total_missed(&self) -> u64 {
        self.missed_queue_full + self.missed_offline + self.missed_closed
    }
}
