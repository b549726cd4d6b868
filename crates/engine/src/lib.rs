//! Crossduel Engine library.
//!
//! Pairs WebSocket connections into two-player crossword sessions and relays
//! their moves.
//!
//! ## Structure
//!
//! - `use_cases/` - matchmaking, message dispatch, session relay
//! - `infrastructure/` - ports and their adapters (puzzle store, clock, config)
//! - `api/` - HTTP and WebSocket entry points
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod infrastructure;
pub mod use_cases;

pub use app::App;
