//! # courier-auth
//!
//! Token lifecycle for Courier: signing and validating compact token
//! pairs, binding refresh tokens to revocable device sessions, rotating
//! refresh tokens on use, and the one-time passcode login that issues
//! the first pair.
//!
//! ## Modules
//!
//! - `jwt` — claim sets, HS256 encoding, and validation
//! - `session` — device session store, digesting, and the lifecycle manager
//! - `otp` — passcode capability, user directory, and the login flow

pub mod jwt;
pub mod otp;
pub mod session;

pub use jwt::{Claims, JwtDecoder, JwtEncoder, TokenPair, TokenType};
pub use otp::{
    DevOtpVerifier, LoginResult, MemoryUserDirectory, OtpLoginService, OtpVerifier, UserDirectory,
};
pub use session::{DeviceSessionStore, MemoryDeviceSessionStore, SessionManager};
