//! Connection abstraction shared by the matchmaker and the relay.
//!
//! A [`Participant`] is one open connection: an [`Outbound`] queue drained
//! by the connection's writer task, and an [`Inbound`] stream of text
//! frames. Any `Err` or the end of the inbound stream means the peer is
//! gone.

use std::fmt;

use crossduel_domain::ParticipantId;
use crossduel_shared::Envelope;
use futures_util::stream::BoxStream;
use tokio::sync::mpsc;

/// Errors on a participant's channel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    #[error("Connection closed")]
    Closed,
    #[error("Outbound queue full")]
    Full,
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Inbound text frames. Items after the first `Err` are never read.
pub type Inbound = BoxStream<'static, Result<String, ChannelError>>;

/// Sending half of a connection.
#[derive(Debug, Clone)]
pub struct Outbound {
    tx: mpsc::Sender<Envelope>,
}

impl Outbound {
    pub fn new(tx: mpsc::Sender<Envelope>) -> Self {
        Self { tx }
    }

    /// Create a bounded outbound queue and the receiver a writer drains.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<Envelope>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self::new(tx), rx)
    }

    /// Queue an envelope without waiting. Best effort: a full or closed
    /// queue drops the envelope.
    pub fn send(&self, envelope: Envelope) -> Result<(), ChannelError> {
        self.tx.try_send(envelope).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => ChannelError::Full,
            mpsc::error::TrySendError::Closed(_) => ChannelError::Closed,
        })
    }
}

/// One connected player.
pub struct Participant {
    pub id: ParticipantId,
    /// Best-effort label, usually the remote address.
    pub identity: String,
    pub outbound: Outbound,
    pub inbound: Inbound,
}

impl Participant {
    pub fn new(identity: impl Into<String>, outbound: Outbound, inbound: Inbound) -> Self {
        Self {
            id: ParticipantId::new(),
            identity: identity.into(),
            outbound,
            inbound,
        }
    }
}

impl fmt::Debug for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Participant")
            .field("id", &self.id)
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}
