pub mod ai;
pub mod core;
pub mod game;

pub use ai::{AcquiredMove, Difficulty, MoveAcquirer};
pub use game::{GameMode, GameSession, PositionSnapshot};
