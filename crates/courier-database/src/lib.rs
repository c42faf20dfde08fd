//! # courier-database
//!
//! PostgreSQL connection management and the persistent implementations
//! of the device session store and user directory.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
pub use repositories::{PgDeviceSessionStore, PgUserDirectory};
