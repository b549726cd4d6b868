//! WebSocket handling for player connections.
//!
//! Each upgraded socket becomes a [`Participant`]: a writer task drains the
//! outbound queue into the socket, and the read half is exposed as an
//! [`Inbound`] stream of text frames. The participant is offered to the
//! matchmaker; the connection that completes a pair runs the session.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        ConnectInfo, State,
    },
    response::Response,
};
use crossduel_domain::ParticipantId;
use crossduel_shared::{codec, Envelope};
use futures_util::{future, stream::SplitSink, SinkExt, StreamExt};
use tokio::sync::mpsc;

use super::connections::{ChannelError, Inbound, Outbound, Participant};
use crate::app::App;
use crate::use_cases::Offer;

/// WebSocket upgrade handler - entry point for new connections.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(app): State<Arc<App>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, addr, app))
}

/// Handle an individual WebSocket connection.
async fn handle_socket(socket: WebSocket, addr: SocketAddr, app: Arc<App>) {
    let (ws_sender, ws_receiver) = socket.split();

    let (outbound, rx) = Outbound::channel(app.connection_buffer);
    let inbound: Inbound = ws_receiver
        .filter_map(|frame| future::ready(read_frame(frame)))
        .boxed();
    let participant = Participant::new(addr.to_string(), outbound, inbound);
    let participant_id = participant.id;

    tracing::info!(participant_id = %participant_id, remote = %addr, "WebSocket connection established");

    tokio::spawn(write_frames(ws_sender, rx, participant_id));

    match app.matchmaker.offer(participant).await {
        Offer::Waiting => {}
        Offer::Paired(session) => {
            app.relay.run(session).await;
        }
    }
}

/// Map one socket read to an inbound item. Control frames are skipped.
fn read_frame(frame: Result<Message, axum::Error>) -> Option<Result<String, ChannelError>> {
    match frame {
        Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
        Ok(Message::Binary(bytes)) => Some(Ok(String::from_utf8_lossy(&bytes).into_owned())),
        Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => None,
        Ok(Message::Close(_)) => Some(Err(ChannelError::Closed)),
        Err(e) => Some(Err(ChannelError::Transport(e.to_string()))),
    }
}

/// Drain the outbound queue into the socket. Once every sender is gone the
/// connection is closed.
async fn write_frames(
    mut ws_sender: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<Envelope>,
    participant_id: ParticipantId,
) {
    while let Some(envelope) = rx.recv().await {
        let frame = match codec::encode(&envelope) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(participant_id = %participant_id, error = %e, "Failed to encode envelope");
                continue;
            }
        };
        if ws_sender.send(Message::Text(frame.into())).await.is_err() {
            tracing::debug!(participant_id = %participant_id, "Socket gone, stopping writer");
            return;
        }
    }

    // Best effort; the peer may already be gone.
    let _ = ws_sender.send(Message::Close(None)).await;
    tracing::info!(participant_id = %participant_id, "WebSocket connection terminated");
}
