//! Application state and composition.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::infrastructure::config::AppConfig;
use crate::infrastructure::ports::{ClockPort, PuzzleRepo};
use crate::use_cases::{Matchmaker, SessionRelay};

/// Main application state.
///
/// One matchmaker per process; passed to the WebSocket handler via Axum state.
pub struct App {
    pub matchmaker: Arc<Matchmaker>,
    pub relay: Arc<SessionRelay>,
    /// Outbound queue capacity for each new connection.
    pub connection_buffer: usize,
}

impl App {
    pub fn new(
        puzzles: Arc<dyn PuzzleRepo>,
        clock: Arc<dyn ClockPort>,
        config: &AppConfig,
        shutdown: CancellationToken,
    ) -> Self {
        let matchmaker = Arc::new(Matchmaker::new(shutdown.clone()));
        let relay = Arc::new(SessionRelay::new(puzzles, clock, config.puzzle_id, shutdown));

        Self {
            matchmaker,
            relay,
            connection_buffer: config.connection_buffer,
        }
    }
}
