//! Error types for game module
//!
//! Provides custom error types for move validation and game state management.

/// Errors that can occur in game logic
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// FEN could not be parsed or describes an impossible position
    #[error("Invalid FEN {fen:?}: {message}")]
    InvalidFen { fen: String, message: String },

    /// Move is unparsable or not legal in the current position
    #[error("Illegal move: {notation}")]
    IllegalMove { notation: String },

    /// A pawn reached the last rank and no promotion piece was chosen
    #[error("Move {from}{to} is a promotion; choose a piece (q, r, b, n)")]
    PromotionRequired { from: String, to: String },

    /// The game has already ended
    #[error("The game is over")]
    GameOver,

    /// A move computed for an earlier position arrived after the game moved on
    #[error("Move {san} was computed for a position that is no longer current")]
    StaleMove { san: String },
}

/// Result type alias for game operations
pub type GameResult<T> = Result<T, GameError>;
