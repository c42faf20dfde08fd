//! Realtime hub configuration.

use serde::{Deserialize, Serialize};

/// Realtime hub configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Capacity of each client's outbound event queue.
    #[serde(default = "default_client_queue")]
    pub client_queue_capacity: usize,
    /// Capacity of the hub actor's command channel.
    #[serde(default = "default_hub_queue")]
    pub hub_queue_capacity: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            client_queue_capacity: default_client_queue(),
            hub_queue_capacity: default_hub_queue(),
        }
    }
}

fn default_client_queue() -> usize {
    256
}

fn default_hub_queue() -> usize {
    256
}
