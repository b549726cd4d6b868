//! Crossduel Domain - the vocabulary shared by every other crate.
//!
//! Pure data and invariants: no I/O, no async.

pub mod error;
pub mod ids;
pub mod puzzle;
pub mod session;

pub use error::DomainError;
pub use ids::{ParticipantId, PuzzleId, SessionId};
pub use puzzle::{ClueMap, Puzzle, StoredPuzzle};
pub use session::{Grid, SessionState, Side};
