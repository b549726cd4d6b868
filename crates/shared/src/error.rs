//! Errors raised while reading or writing envelopes.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The frame is not an envelope at all.
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(#[source] serde_json::Error),

    /// A known tag carried a payload of the wrong shape.
    #[error("Malformed {kind} payload: {source}")]
    MalformedPayload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode envelope: {0}")]
    Encode(#[source] serde_json::Error),
}
