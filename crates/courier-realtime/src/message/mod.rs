//! Wire event definitions.

pub mod types;

pub use types::{
    ClientEvent, Delivered, NewMessage, Ping, Pong, PresenceUpdate, ReadReceipt, ServerEvent,
    TypingIndicator, TypingSignal,
};
