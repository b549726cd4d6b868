//! Envelope codec: text frame <-> [`Envelope`].

use crate::error::ProtocolError;
use crate::messages::Envelope;

/// Parse one text frame.
pub fn decode(frame: &str) -> Result<Envelope, ProtocolError> {
    serde_json::from_str(frame).map_err(ProtocolError::MalformedEnvelope)
}

/// Render an envelope as one text frame.
pub fn encode(envelope: &Envelope) -> Result<String, ProtocolError> {
    serde_json::to_string(envelope).map_err(ProtocolError::Encode)
}
