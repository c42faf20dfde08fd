//! Core type definitions used across the Courier workspace.

pub mod id;

pub use id::*;
