//! Chess game state
//!
//! Rules come from `shakmaty`; this module adds what the front ends need
//! around them.
//!
//! # Module Organization
//!
//! - `session` - [`GameSession`]: position, SAN history, PGN, game mode
//! - `snapshot` - [`PositionSnapshot`] handed to the AI for one turn
//! - `outcome` - [`GameOutcome`]: checkmate and draw conditions with messages
//! - `error` - [`GameError`] for rejected moves and positions

pub mod error;
pub mod outcome;
pub mod session;
pub mod snapshot;

pub use error::{GameError, GameResult};
pub use outcome::{color_name, GameOutcome};
pub use session::{GameMode, GameSession, MoveSummary, PlayedMove};
pub use snapshot::PositionSnapshot;
