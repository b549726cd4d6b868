//! Repository port traits for database access.

use async_trait::async_trait;
use crossduel_domain::{PuzzleId, StoredPuzzle};

use super::error::RepoError;

// =============================================================================
// Puzzle Storage
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PuzzleRepo: Send + Sync {
    /// `Ok(None)` when no puzzle has this id.
    async fn get(&self, id: PuzzleId) -> Result<Option<StoredPuzzle>, RepoError>;
    /// Insert or replace by id. Sessions only read; this is the seeding
    /// path for operators and tests.
    async fn save(&self, puzzle: &StoredPuzzle) -> Result<(), RepoError>;
}
