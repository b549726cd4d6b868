//! Shared state of a paired session.
//!
//! Each side writes only its own grid. The `finished` flag is shared and
//! may be set by either side any number of times; only the first call
//! changes it.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::puzzle::Puzzle;

/// Cell id (e.g. `"1A1"`) to the letter entered there.
pub type Grid = BTreeMap<String, String>;

/// Which of the two participants a message came from.
///
/// `PlayerOne` is the participant that was waiting; `PlayerTwo` is the
/// arrival that formed the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    PlayerOne,
    PlayerTwo,
}

impl Side {
    pub fn opponent(self) -> Self {
        match self {
            Side::PlayerOne => Side::PlayerTwo,
            Side::PlayerTwo => Side::PlayerOne,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::PlayerOne => write!(f, "player1"),
            Side::PlayerTwo => write!(f, "player2"),
        }
    }
}

/// Mutable record both sides of one session affect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    puzzle: Puzzle,
    #[serde(rename = "player1_state")]
    player_one_grid: Grid,
    #[serde(rename = "player2_state")]
    player_two_grid: Grid,
    #[serde(rename = "start_time")]
    started_at: DateTime<Utc>,
    #[serde(rename = "is_finished")]
    finished: bool,
}

impl SessionState {
    pub fn new(puzzle: Puzzle, started_at: DateTime<Utc>) -> Self {
        Self {
            puzzle,
            player_one_grid: Grid::new(),
            player_two_grid: Grid::new(),
            started_at,
            finished: false,
        }
    }

    pub fn puzzle(&self) -> &Puzzle {
        &self.puzzle
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn grid(&self, side: Side) -> &Grid {
        match side {
            Side::PlayerOne => &self.player_one_grid,
            Side::PlayerTwo => &self.player_two_grid,
        }
    }

    /// Record `letter` at `cell` in `side`'s own grid.
    pub fn enter(&mut self, side: Side, cell: impl Into<String>, letter: impl Into<String>) {
        let grid = match side {
            Side::PlayerOne => &mut self.player_one_grid,
            Side::PlayerTwo => &mut self.player_two_grid,
        };
        grid.insert(cell.into(), letter.into());
    }

    /// Mark the session finished. Returns `true` only for the call that
    /// flipped the flag.
    pub fn finish(&mut self) -> bool {
        !std::mem::replace(&mut self.finished, true)
    }
}
