//! Port traits for infrastructure boundaries.
//!
//! Ports exist for:
//! - Puzzle storage (could swap SQLite -> Postgres)
//! - Clock (for testing)

mod error;
mod repos;
mod testing;

pub use error::RepoError;
pub use repos::PuzzleRepo;
pub use testing::ClockPort;

#[cfg(test)]
pub use repos::MockPuzzleRepo;
#[cfg(test)]
pub use testing::MockClockPort;
