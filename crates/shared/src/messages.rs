//! WebSocket message types exchanged between the engine and players.
//!
//! Every frame is an [`Envelope`]: a type tag plus a payload whose shape is
//! decided entirely by the tag. Inbound envelopes are decoded once into the
//! closed [`ClientMessage`] sum type.
//!
//! ## Versioning Policy
//!
//! - New tags can be added at any time (forward compatible)
//! - Unknown tags decode to [`ClientMessage::Unknown`] and are never fatal
//! - Renaming a tag or a payload field is a breaking change

use chrono::{DateTime, Utc};
use crossduel_domain::Puzzle;
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Wire tags.
pub mod tags {
    pub const BOARD_UPDATE: &str = "board_update";
    pub const HEARTBEAT: &str = "heartbeat";
    pub const GAME_OVER: &str = "game_over";
    pub const SESSION_START: &str = "session_start";
}

/// Typed wrapper around every message on a connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    /// Opaque until `kind` is known. Absent on the wire reads as `null`.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Envelope {
    pub fn new(kind: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }

    /// Build an envelope from a typed payload.
    pub fn with_payload<T: Serialize>(
        kind: impl Into<String>,
        payload: &T,
    ) -> Result<Self, ProtocolError> {
        let data = serde_json::to_value(payload).map_err(ProtocolError::Encode)?;
        Ok(Self::new(kind, data))
    }

    pub fn session_start(data: &SessionStartData) -> Result<Self, ProtocolError> {
        Self::with_payload(tags::SESSION_START, data)
    }

    fn payload<T: for<'de> Deserialize<'de>>(&self) -> Result<T, ProtocolError> {
        serde_json::from_value(self.data.clone()).map_err(|source| {
            ProtocolError::MalformedPayload {
                kind: self.kind.clone(),
                source,
            }
        })
    }
}

/// Payload of `board_update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardUpdateData {
    pub cell: String,
    pub letter: String,
}

/// Payload of `game_over`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOverData {
    pub winner: String,
}

/// Payload of `session_start`, sent by the engine to both sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStartData {
    pub puzzle: Puzzle,
    pub start_time: DateTime<Utc>,
}

// =============================================================================
// Client Messages (Player -> Engine)
// =============================================================================

/// Messages a player may send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// Player entered a letter in one of their cells
    BoardUpdate(BoardUpdateData),
    /// Keep-alive; payload is not interpreted
    Heartbeat,
    /// Player declares the game over
    GameOver(GameOverData),
    /// Tag this engine does not know
    Unknown(String),
}

impl ClientMessage {
    /// Interpret an envelope. Fails only when a known tag carries a payload
    /// that does not match its shape.
    pub fn from_envelope(envelope: &Envelope) -> Result<Self, ProtocolError> {
        match envelope.kind.as_str() {
            tags::BOARD_UPDATE => Ok(Self::BoardUpdate(envelope.payload()?)),
            tags::HEARTBEAT => Ok(Self::Heartbeat),
            tags::GAME_OVER => Ok(Self::GameOver(envelope.payload()?)),
            other => Ok(Self::Unknown(other.to_string())),
        }
    }
}
