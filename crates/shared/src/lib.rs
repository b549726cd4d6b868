//! Crossduel Protocol - wire types shared by the engine and players.
//!
//! - [`Envelope`]: the `{"type", "data"}` wrapper around every frame
//! - [`ClientMessage`]: inbound envelopes decoded into a closed sum type
//! - [`codec`]: text frame <-> envelope
//!
//! No business logic lives here; pure data and serialization.

pub mod codec;
pub mod error;
pub mod messages;

pub use error::ProtocolError;
pub use messages::{
    tags, BoardUpdateData, ClientMessage, Envelope, GameOverData, SessionStartData,
};
