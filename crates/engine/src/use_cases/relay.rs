//! Session relay: runs a formed session to completion.
//!
//! One pump per side reads that side's envelopes and hands them to the
//! dispatcher with the opponent's outbound queue. The first pump to stop
//! cancels the session token, which stops the other one; the session ends
//! when both have returned.

use std::sync::Arc;

use crossduel_domain::{Puzzle, PuzzleId, SessionId, SessionState, Side};
use crossduel_shared::{codec, Envelope, SessionStartData};
use futures_util::StreamExt;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::api::connections::{Inbound, Outbound};
use crate::infrastructure::ports::{ClockPort, PuzzleRepo, RepoError};
use crate::use_cases::dispatch::{dispatch, DispatchContext, SharedSessionState};
use crate::use_cases::matchmaking::Session;

/// Final state of a session after both pumps stopped.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub session_id: SessionId,
    pub state: SessionState,
}

pub struct SessionRelay {
    puzzles: Arc<dyn PuzzleRepo>,
    clock: Arc<dyn ClockPort>,
    puzzle_id: PuzzleId,
    shutdown: CancellationToken,
}

impl SessionRelay {
    pub fn new(
        puzzles: Arc<dyn PuzzleRepo>,
        clock: Arc<dyn ClockPort>,
        puzzle_id: PuzzleId,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            puzzles,
            clock,
            puzzle_id,
            shutdown,
        }
    }

    pub async fn run(&self, session: Session) -> SessionReport {
        let Session {
            id: session_id,
            player_one,
            player_two,
        } = session;

        let puzzle = self.load_puzzle(session_id).await;
        let state = SessionState::new(puzzle, self.clock.now());

        let start = SessionStartData {
            puzzle: state.puzzle().clone(),
            start_time: state.started_at(),
        };
        match Envelope::session_start(&start) {
            Ok(envelope) => {
                for (side, outbound) in [
                    (Side::PlayerOne, &player_one.outbound),
                    (Side::PlayerTwo, &player_two.outbound),
                ] {
                    if let Err(e) = outbound.send(envelope.clone()) {
                        tracing::warn!(
                            session_id = %session_id,
                            side = %side,
                            error = %e,
                            "Failed to send session_start"
                        );
                    }
                }
            }
            Err(e) => {
                tracing::error!(session_id = %session_id, error = %e, "Failed to build session_start");
            }
        }

        let state: SharedSessionState = Arc::new(Mutex::new(state));
        let cancel = self.shutdown.child_token();

        let pump_one = tokio::spawn(pump(
            session_id,
            Side::PlayerOne,
            player_one.inbound,
            player_two.outbound,
            state.clone(),
            cancel.clone(),
        ));
        let pump_two = tokio::spawn(pump(
            session_id,
            Side::PlayerTwo,
            player_two.inbound,
            player_one.outbound,
            state.clone(),
            cancel,
        ));

        let (one, two) = tokio::join!(pump_one, pump_two);
        for (side, result) in [(Side::PlayerOne, one), (Side::PlayerTwo, two)] {
            if let Err(e) = result {
                tracing::error!(session_id = %session_id, side = %side, error = %e, "Pump task failed");
            }
        }

        let state = state.lock().await.clone();
        tracing::info!(
            session_id = %session_id,
            finished = state.is_finished(),
            "Session ended"
        );
        SessionReport { session_id, state }
    }

    /// Load the configured puzzle, falling back to [`Puzzle::fallback`] on
    /// any failure.
    async fn load_puzzle(&self, session_id: SessionId) -> Puzzle {
        let error = match self.puzzles.get(self.puzzle_id).await {
            Ok(Some(stored)) => return stored.into_puzzle(),
            Ok(None) => RepoError::not_found("Puzzle", self.puzzle_id),
            Err(e) => e,
        };
        tracing::warn!(
            session_id = %session_id,
            puzzle_id = %self.puzzle_id,
            error = %error,
            "Error loading puzzle, using fallback"
        );
        Puzzle::fallback()
    }
}

/// Read one side until it disconnects or the session is cancelled.
async fn pump(
    session_id: SessionId,
    side: Side,
    mut inbound: Inbound,
    opponent: Outbound,
    state: SharedSessionState,
    cancel: CancellationToken,
) {
    let context = DispatchContext::Paired {
        session_id,
        side,
        state: &state,
        opponent: &opponent,
    };

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(session_id = %session_id, side = %side, "Session cancelled, stopping pump");
                break;
            }
            frame = inbound.next() => match frame {
                Some(Ok(text)) => match codec::decode(&text) {
                    Ok(envelope) => dispatch(envelope, &context).await,
                    Err(e) => {
                        tracing::warn!(session_id = %session_id, side = %side, error = %e, "Dropping message");
                    }
                },
                Some(Err(e)) => {
                    tracing::info!(session_id = %session_id, side = %side, error = %e, "Participant disconnected");
                    break;
                }
                None => {
                    tracing::info!(session_id = %session_id, side = %side, "Participant disconnected");
                    break;
                }
            },
        }
    }

    cancel.cancel();
}
