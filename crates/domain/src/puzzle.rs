//! Puzzle records shared by both sides of a session.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::PuzzleId;

/// Clue id (e.g. `"7-Across"`) to text.
pub type ClueMap = BTreeMap<String, String>;

/// The playable content of a puzzle. Read-only once a session has loaded it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Puzzle {
    pub grid: String,
    pub clues: ClueMap,
    pub answers: ClueMap,
}

impl Puzzle {
    /// Create a puzzle, rejecting an empty grid.
    pub fn new(
        grid: impl Into<String>,
        clues: ClueMap,
        answers: ClueMap,
    ) -> Result<Self, DomainError> {
        let grid = grid.into();
        if grid.trim().is_empty() {
            return Err(DomainError::validation("Puzzle grid cannot be empty"));
        }
        Ok(Self {
            grid,
            clues,
            answers,
        })
    }

    /// The puzzle every session falls back to when the store cannot supply one.
    pub fn fallback() -> Self {
        let clues = BTreeMap::from([
            ("7-Across".to_string(), "Example clue for 7-Across".to_string()),
            ("7-Down".to_string(), "Example clue for 7-Down".to_string()),
        ]);
        let answers = BTreeMap::from([
            ("7-Across".to_string(), "EXAMPLE".to_string()),
            ("7-Down".to_string(), "EXAMPLE".to_string()),
        ]);
        Self {
            grid: "dummy grid layout".to_string(),
            clues,
            answers,
        }
    }
}

/// A puzzle as persisted in the puzzle store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPuzzle {
    pub id: PuzzleId,
    pub title: String,
    #[serde(flatten)]
    pub puzzle: Puzzle,
    pub created_at: DateTime<Utc>,
}

impl StoredPuzzle {
    pub fn new(
        id: PuzzleId,
        title: impl Into<String>,
        puzzle: Puzzle,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(DomainError::validation("Puzzle title cannot be empty"));
        }
        Ok(Self {
            id,
            title,
            puzzle,
            created_at,
        })
    }

    /// Drop the storage metadata, keeping only what a session plays.
    pub fn into_puzzle(self) -> Puzzle {
        self.puzzle
    }
}
