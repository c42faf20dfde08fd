//! Device sessions: refresh-token digests, persistence, and rotation.

pub mod hash;
pub mod manager;
pub mod memory;
pub mod store;

pub use hash::hash_refresh_token;
pub use manager::SessionManager;
pub use memory::MemoryDeviceSessionStore;
pub use store::DeviceSessionStore;
