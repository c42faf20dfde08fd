//! One-time passcode login.
//!
//! The passcode provider and the user directory are capabilities supplied
//! by the caller; [`OtpLoginService`] joins them to the session manager.

pub mod directory;
pub mod service;
pub mod verifier;

pub use directory::{MemoryUserDirectory, UserDirectory};
pub use service::{LoginResult, OtpLoginService, validate_phone_number};
pub use verifier::{DevOtpVerifier, OtpVerifier};
