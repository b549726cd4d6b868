//! Use cases - pairing participants and running their sessions.

pub mod dispatch;
pub mod matchmaking;
pub mod relay;

pub use matchmaking::{Matchmaker, Offer, Session};
pub use relay::{SessionRelay, SessionReport};
