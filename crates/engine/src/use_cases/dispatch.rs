//! Message dispatcher.
//!
//! Applies one inbound envelope: mutate the session state, then forward to
//! the opponent. Nothing here returns an error; failures are logged and the
//! message is dropped so the pump keeps running.

use std::sync::Arc;

use crossduel_domain::{ParticipantId, SessionId, SessionState, Side};
use crossduel_shared::{ClientMessage, Envelope};
use tokio::sync::Mutex;

use crate::api::connections::Outbound;

/// Session state shared by the two pumps of one session.
pub type SharedSessionState = Arc<Mutex<SessionState>>;

/// Where an envelope came from.
///
/// A waiting participant has no session state and no opponent, so only
/// heartbeats mean anything there.
pub enum DispatchContext<'a> {
    Waiting {
        participant_id: ParticipantId,
    },
    Paired {
        session_id: SessionId,
        side: Side,
        state: &'a SharedSessionState,
        opponent: &'a Outbound,
    },
}

pub async fn dispatch(envelope: Envelope, context: &DispatchContext<'_>) {
    let message = match ClientMessage::from_envelope(&envelope) {
        Ok(message) => message,
        Err(e) => {
            log_dropped(context, &e.to_string());
            return;
        }
    };

    match (message, context) {
        (ClientMessage::Heartbeat, DispatchContext::Waiting { participant_id }) => {
            tracing::debug!(participant_id = %participant_id, "Heartbeat received while waiting");
        }
        (
            ClientMessage::Heartbeat,
            DispatchContext::Paired {
                session_id, side, ..
            },
        ) => {
            tracing::debug!(session_id = %session_id, side = %side, "Heartbeat received");
        }
        (ClientMessage::Unknown(kind), _) => {
            log_dropped(context, &format!("unknown message type `{kind}`"));
        }
        (
            ClientMessage::BoardUpdate(update),
            DispatchContext::Paired {
                session_id,
                side,
                state,
                opponent,
            },
        ) => {
            tracing::debug!(
                session_id = %session_id,
                side = %side,
                cell = %update.cell,
                letter = %update.letter,
                "Board update"
            );
            state.lock().await.enter(*side, update.cell, update.letter);
            forward(envelope, *session_id, *side, opponent);
        }
        (
            ClientMessage::GameOver(over),
            DispatchContext::Paired {
                session_id,
                side,
                state,
                opponent,
            },
        ) => {
            let first = state.lock().await.finish();
            tracing::info!(
                session_id = %session_id,
                side = %side,
                winner = %over.winner,
                first,
                "Game over received"
            );
            forward(envelope, *session_id, *side, opponent);
        }
        (
            ClientMessage::BoardUpdate(_) | ClientMessage::GameOver(_),
            DispatchContext::Waiting { participant_id },
        ) => {
            tracing::debug!(
                participant_id = %participant_id,
                kind = %envelope.kind,
                "Ignoring game message before pairing"
            );
        }
    }
}

fn forward(envelope: Envelope, session_id: SessionId, side: Side, opponent: &Outbound) {
    let kind = envelope.kind.clone();
    if let Err(e) = opponent.send(envelope) {
        tracing::warn!(
            session_id = %session_id,
            to = %side.opponent(),
            kind = %kind,
            error = %e,
            "Failed to forward message"
        );
    }
}

fn log_dropped(context: &DispatchContext<'_>, reason: &str) {
    match context {
        DispatchContext::Waiting { participant_id } => {
            tracing::warn!(participant_id = %participant_id, reason, "Dropping message");
        }
        DispatchContext::Paired {
            session_id, side, ..
        } => {
            tracing::warn!(session_id = %session_id, side = %side, reason, "Dropping message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crossduel_domain::Puzzle;
    use serde_json::json;
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct Fixture {
        session_id: SessionId,
        state: SharedSessionState,
        opponent: Outbound,
        opponent_rx: mpsc::Receiver<Envelope>,
    }

    fn fixture() -> Fixture {
        let (opponent, opponent_rx) = Outbound::channel(8);
        Fixture {
            session_id: SessionId::new(),
            state: Arc::new(Mutex::new(SessionState::new(Puzzle::fallback(), Utc::now()))),
            opponent,
            opponent_rx,
        }
    }

    impl Fixture {
        async fn dispatch_from(&self, side: Side, value: serde_json::Value) {
            let envelope: Envelope = serde_json::from_value(value).unwrap();
            let context = DispatchContext::Paired {
                session_id: self.session_id,
                side,
                state: &self.state,
                opponent: &self.opponent,
            };
            dispatch(envelope, &context).await;
        }

        fn assert_nothing_forwarded(&mut self) {
            assert!(self.opponent_rx.try_recv().is_err());
        }
    }

    #[tokio::test]
    async fn board_update_sets_own_cell_and_forwards_identical_envelope() {
        let mut fx = fixture();
        let sent = json!({"type": "board_update", "data": {"cell": "1A1", "letter": "C"}});

        fx.dispatch_from(Side::PlayerOne, sent.clone()).await;

        let state = fx.state.lock().await;
        assert_eq!(state.grid(Side::PlayerOne)["1A1"], "C");
        assert!(state.grid(Side::PlayerTwo).is_empty());
        drop(state);

        let forwarded = fx.opponent_rx.try_recv().unwrap();
        assert_eq!(serde_json::to_value(&forwarded).unwrap(), sent);
        fx.assert_nothing_forwarded();
    }

    #[tokio::test]
    async fn board_update_keeps_extra_payload_fields_when_forwarding() {
        let mut fx = fixture();
        let sent = json!({"type": "board_update", "data": {"cell": "3D2", "letter": "Q", "seq": 4}});

        fx.dispatch_from(Side::PlayerTwo, sent.clone()).await;

        let forwarded = fx.opponent_rx.try_recv().unwrap();
        assert_eq!(serde_json::to_value(&forwarded).unwrap(), sent);
        assert_eq!(fx.state.lock().await.grid(Side::PlayerTwo)["3D2"], "Q");
    }

    #[tokio::test]
    async fn board_update_missing_letter_is_dropped() {
        let mut fx = fixture();

        fx.dispatch_from(
            Side::PlayerOne,
            json!({"type": "board_update", "data": {"cell": "1A1"}}),
        )
        .await;

        assert!(fx.state.lock().await.grid(Side::PlayerOne).is_empty());
        fx.assert_nothing_forwarded();
    }

    #[tokio::test]
    async fn game_over_finishes_once_and_forwards_every_time() {
        let mut fx = fixture();
        let sent = json!({"type": "game_over", "data": {"winner": "player1"}});

        fx.dispatch_from(Side::PlayerOne, sent.clone()).await;
        fx.dispatch_from(Side::PlayerTwo, sent.clone()).await;

        assert!(fx.state.lock().await.is_finished());
        assert_eq!(
            serde_json::to_value(fx.opponent_rx.try_recv().unwrap()).unwrap(),
            sent
        );
        assert_eq!(
            serde_json::to_value(fx.opponent_rx.try_recv().unwrap()).unwrap(),
            sent
        );
    }

    #[tokio::test]
    async fn malformed_game_over_leaves_session_running() {
        let mut fx = fixture();

        fx.dispatch_from(Side::PlayerTwo, json!({"type": "game_over", "data": {"winner": 3}}))
            .await;

        assert!(!fx.state.lock().await.is_finished());
        fx.assert_nothing_forwarded();
    }

    #[tokio::test]
    async fn heartbeat_and_unknown_types_change_nothing() {
        let mut fx = fixture();

        fx.dispatch_from(Side::PlayerOne, json!({"type": "heartbeat"})).await;
        fx.dispatch_from(Side::PlayerOne, json!({"type": "foo", "data": {"cell": "1A1"}}))
            .await;

        let state = fx.state.lock().await;
        assert!(state.grid(Side::PlayerOne).is_empty());
        assert!(!state.is_finished());
        drop(state);
        fx.assert_nothing_forwarded();
    }

    #[tokio::test]
    async fn full_opponent_queue_does_not_undo_the_update() {
        let (opponent, mut opponent_rx) = Outbound::channel(1);
        opponent.send(Envelope::new("filler", json!(null))).unwrap();
        let state: SharedSessionState =
            Arc::new(Mutex::new(SessionState::new(Puzzle::fallback(), Utc::now())));

        let envelope = Envelope::new("board_update", json!({"cell": "5A", "letter": "Z"}));
        let context = DispatchContext::Paired {
            session_id: SessionId::new(),
            side: Side::PlayerTwo,
            state: &state,
            opponent: &opponent,
        };
        dispatch(envelope, &context).await;

        assert_eq!(state.lock().await.grid(Side::PlayerTwo)["5A"], "Z");
        assert_eq!(opponent_rx.recv().await.unwrap().kind, "filler");
        let next = tokio::time::timeout(Duration::from_millis(50), opponent_rx.recv()).await;
        assert!(next.is_err());
    }

    #[tokio::test]
    async fn waiting_context_accepts_everything_without_effect() {
        let context = DispatchContext::Waiting {
            participant_id: ParticipantId::new(),
        };

        dispatch(Envelope::new("heartbeat", json!(null)), &context).await;
        dispatch(
            Envelope::new("board_update", json!({"cell": "1A1", "letter": "C"})),
            &context,
        )
        .await;
        dispatch(Envelope::new("game_over", json!({"winner": "me"})), &context).await;
        dispatch(Envelope::new("foo", json!(null)), &context).await;
    }
}
