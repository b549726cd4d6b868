//! In-memory participants and a loopback server for tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use crossduel_shared::Envelope;
use futures_channel::mpsc::{unbounded, UnboundedSender};
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use super::connections::{ChannelError, Outbound, Participant};
use crate::app::App;
use crate::infrastructure::clock::FixedClock;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::ports::MockPuzzleRepo;

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// The far end of a test participant: what the "client" writes and reads.
pub(crate) struct TestPeer {
    inbound_tx: Option<UnboundedSender<Result<String, ChannelError>>>,
    outbound_rx: mpsc::Receiver<Envelope>,
}

pub(crate) fn test_participant(identity: &str) -> (Participant, TestPeer) {
    let (inbound_tx, inbound_rx) = unbounded();
    let (outbound, outbound_rx) = Outbound::channel(16);
    let participant = Participant::new(identity, outbound, inbound_rx.boxed());
    (
        participant,
        TestPeer {
            inbound_tx: Some(inbound_tx),
            outbound_rx,
        },
    )
}

impl TestPeer {
    pub(crate) fn send_text(&self, frame: &str) {
        self.inbound_tx
            .as_ref()
            .expect("peer already disconnected")
            .unbounded_send(Ok(frame.to_string()))
            .unwrap();
    }

    pub(crate) fn send_json(&self, value: serde_json::Value) {
        self.send_text(&value.to_string());
    }

    /// End the inbound stream, as a closed socket would.
    pub(crate) fn disconnect(&mut self) {
        self.inbound_tx = None;
    }

    /// Report a transport failure on the inbound stream.
    pub(crate) fn fail(&self, reason: &str) {
        self.inbound_tx
            .as_ref()
            .expect("peer already disconnected")
            .unbounded_send(Err(ChannelError::Transport(reason.to_string())))
            .unwrap();
    }

    pub(crate) async fn recv(&mut self) -> Envelope {
        timeout(RECV_TIMEOUT, self.outbound_rx.recv())
            .await
            .expect("timed out waiting for envelope")
            .expect("outbound channel closed")
    }

    /// Assert nothing arrives for `window`.
    pub(crate) async fn expect_silence(&mut self, window: Duration) {
        if let Ok(Some(envelope)) = timeout(window, self.outbound_rx.recv()).await {
            panic!("unexpected envelope: {:?}", envelope);
        }
    }

    /// Assert every sender for this peer has been dropped.
    pub(crate) async fn expect_closed(&mut self) {
        let next = timeout(RECV_TIMEOUT, self.outbound_rx.recv())
            .await
            .expect("timed out waiting for close");
        assert!(next.is_none(), "expected closed channel, got {:?}", next);
    }
}

/// Serve the full router on an ephemeral loopback port. Cancel the returned
/// token to shut the server down.
pub(crate) async fn spawn_server(puzzles: MockPuzzleRepo) -> (SocketAddr, CancellationToken) {
    let shutdown = CancellationToken::new();
    let app = Arc::new(App::new(
        Arc::new(puzzles),
        Arc::new(FixedClock(chrono::Utc::now())),
        &AppConfig::default(),
        shutdown.clone(),
    ));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = axum::serve(
        listener,
        super::router(app).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown.clone().cancelled_owned());
    tokio::spawn(async move { server.await });

    (addr, shutdown)
}
