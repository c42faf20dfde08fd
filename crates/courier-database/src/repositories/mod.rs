//! PostgreSQL implementations of the stores used by `courier-auth`.

pub mod device_session;
pub mod user;

pub use device_session::PgDeviceSessionStore;
pub use user::PgUserDirectory;
