//! Matchmaker: a single waiting slot that pairs arrivals into sessions.
//!
//! The slot lock is held only to take or set the occupant. While a
//! participant waits, a background task owns its inbound stream and answers
//! heartbeats. Pairing cancels that task and takes the stream back from its
//! join handle, so the wait loop has always exited before the relay starts
//! reading the same connection.

use std::sync::Arc;

use crossduel_domain::{ParticipantId, SessionId};
use crossduel_shared::codec;
use futures_util::{FutureExt, StreamExt};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api::connections::{ChannelError, Inbound, Outbound, Participant};
use crate::use_cases::dispatch::{dispatch, DispatchContext};

/// Two participants paired for one game. Membership never changes.
#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    /// The participant that was waiting.
    pub player_one: Participant,
    /// The arrival that formed the session.
    pub player_two: Participant,
}

/// Result of offering a participant to the matchmaker.
#[derive(Debug)]
pub enum Offer {
    /// Parked in the waiting slot; the matchmaker now owns the connection.
    Waiting,
    /// Paired with the previous waiter; the caller must run the session.
    Paired(Session),
}

/// The slot occupant. The participant's inbound stream lives in `reader`.
struct WaitingEntry {
    participant_id: ParticipantId,
    identity: String,
    outbound: Outbound,
    release: CancellationToken,
    reader: JoinHandle<Option<Inbound>>,
}

impl WaitingEntry {
    /// Stop the wait loop and reclaim the participant. `None` if it
    /// disconnected before the loop noticed the release.
    async fn release(self) -> Option<Participant> {
        self.release.cancel();
        match self.reader.await {
            Ok(Some(inbound)) => Some(Participant {
                id: self.participant_id,
                identity: self.identity,
                outbound: self.outbound,
                inbound,
            }),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(
                    participant_id = %self.participant_id,
                    error = %e,
                    "Wait loop failed"
                );
                None
            }
        }
    }
}

type WaitingSlot = Arc<Mutex<Option<WaitingEntry>>>;

pub struct Matchmaker {
    slot: WaitingSlot,
    shutdown: CancellationToken,
}

impl Matchmaker {
    pub fn new(shutdown: CancellationToken) -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
            shutdown,
        }
    }

    /// Park `participant` if nobody is waiting, otherwise pair it with the
    /// waiter.
    pub async fn offer(&self, participant: Participant) -> Offer {
        loop {
            let occupant = {
                let mut slot = self.slot.lock().await;
                match slot.take() {
                    Some(occupant) => occupant,
                    None => {
                        tracing::info!(
                            participant_id = %participant.id,
                            identity = %participant.identity,
                            "Participant waiting"
                        );
                        *slot = Some(self.park(participant));
                        return Offer::Waiting;
                    }
                }
            };

            let stale_id = occupant.participant_id;
            match occupant.release().await {
                Some(player_one) => {
                    let session = Session {
                        id: SessionId::new(),
                        player_one,
                        player_two: participant,
                    };
                    tracing::info!(
                        session_id = %session.id,
                        player1 = %session.player_one.identity,
                        player2 = %session.player_two.identity,
                        "Session formed"
                    );
                    return Offer::Paired(session);
                }
                None => {
                    tracing::debug!(
                        participant_id = %stale_id,
                        "Waiter left before pairing, offering again"
                    );
                }
            }
        }
    }

    /// Id of the participant currently waiting, if any. Inspection only;
    /// pairing never consults it.
    pub async fn waiting(&self) -> Option<ParticipantId> {
        self.slot
            .lock()
            .await
            .as_ref()
            .map(|entry| entry.participant_id)
    }

    fn park(&self, participant: Participant) -> WaitingEntry {
        let Participant {
            id,
            identity,
            outbound,
            inbound,
        } = participant;
        let release = CancellationToken::new();
        let reader = tokio::spawn(wait_loop(
            id,
            inbound,
            self.slot.clone(),
            release.clone(),
            self.shutdown.clone(),
        ));
        WaitingEntry {
            participant_id: id,
            identity,
            outbound,
            release,
            reader,
        }
    }
}

/// Read the waiter's connection until it is paired (returns the stream) or
/// goes away (clears the slot, returns `None`).
async fn wait_loop(
    participant_id: ParticipantId,
    mut inbound: Inbound,
    slot: WaitingSlot,
    release: CancellationToken,
    shutdown: CancellationToken,
) -> Option<Inbound> {
    let context = DispatchContext::Waiting { participant_id };
    loop {
        tokio::select! {
            biased;
            _ = release.cancelled() => return drain_ready(participant_id, inbound, &context).await,
            _ = shutdown.cancelled() => {
                tracing::debug!(participant_id = %participant_id, "Shutting down while waiting");
                break;
            }
            frame = inbound.next() => {
                if !handle_frame(participant_id, frame, &context).await {
                    break;
                }
            }
        }
    }

    let mut slot = slot.lock().await;
    if slot
        .as_ref()
        .is_some_and(|entry| entry.participant_id == participant_id)
    {
        *slot = None;
    }
    None
}

/// Apply every frame that has already arrived before handing the stream
/// over. `None` if the stream ended or failed in the meantime.
async fn drain_ready(
    participant_id: ParticipantId,
    mut inbound: Inbound,
    context: &DispatchContext<'_>,
) -> Option<Inbound> {
    while let Some(frame) = inbound.next().now_or_never() {
        if !handle_frame(participant_id, frame, context).await {
            return None;
        }
    }
    Some(inbound)
}

/// Dispatch one inbound item. `false` once the participant is gone.
async fn handle_frame(
    participant_id: ParticipantId,
    frame: Option<Result<String, ChannelError>>,
    context: &DispatchContext<'_>,
) -> bool {
    match frame {
        Some(Ok(text)) => {
            match codec::decode(&text) {
                Ok(envelope) => dispatch(envelope, context).await,
                Err(e) => {
                    tracing::warn!(participant_id = %participant_id, error = %e, "Dropping message");
                }
            }
            true
        }
        Some(Err(e)) => {
            tracing::info!(participant_id = %participant_id, error = %e, "Participant disconnected while waiting");
            false
        }
        None => {
            tracing::info!(participant_id = %participant_id, "Participant disconnected while waiting");
            false
        }
    }
}
