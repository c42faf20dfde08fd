//! # courier-entity
//!
//! Domain entity models for Courier. Every struct in this crate
//! represents a stored record or a domain value object. All entities
//! derive `Debug`, `Clone`, `Serialize`, and `Deserialize`; row mapping
//! lives in `courier-database`.

pub mod presence;
pub mod session;
pub mod user;
