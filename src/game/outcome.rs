//! Game over state and result messages
//!
//! # Game Over Conditions
//!
//! ## Checkmate
//! - The side to move is in check with no legal moves; the other side wins
//!
//! ## Draw Conditions
//! - **Stalemate**: side to move has no legal moves but is NOT in check
//! - **InsufficientMaterial**: neither player can deliver checkmate
//! - **FiftyMoveRule**: 100 half-moves without a capture or pawn move
//! - **ThreefoldRepetition**: the same position occurred three times
//!
//! All of these are terminal: the session refuses further moves.

use shakmaty::Color;

/// Why the game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Checkmate { winner: Color },
    Stalemate,
    InsufficientMaterial,
    FiftyMoveRule,
    ThreefoldRepetition,
}

impl GameOutcome {
    /// Dialog title shown to the player
    pub fn title(self) -> &'static str {
        match self {
            GameOutcome::Checkmate { .. } => "Checkmate!",
            GameOutcome::Stalemate => "Stalemate!",
            GameOutcome::InsufficientMaterial
            | GameOutcome::FiftyMoveRule
            | GameOutcome::ThreefoldRepetition => "Draw!",
        }
    }

    pub fn message(self) -> String {
        match self {
            GameOutcome::Checkmate { winner } => format!("{} wins.", color_name(winner)),
            GameOutcome::Stalemate => "The game is a stalemate.".to_string(),
            GameOutcome::InsufficientMaterial => {
                "The game is a draw by insufficient material.".to_string()
            }
            GameOutcome::FiftyMoveRule => "The game is a draw by the fifty-move rule.".to_string(),
            GameOutcome::ThreefoldRepetition => {
                "The game is a draw by threefold repetition.".to_string()
            }
        }
    }

    pub fn winner(self) -> Option<Color> {
        match self {
            GameOutcome::Checkmate { winner } => Some(winner),
            _ => None,
        }
    }

    pub fn is_draw(self) -> bool {
        self.winner().is_none()
    }

    /// PGN result token
    pub fn result_token(self) -> &'static str {
        match self.winner() {
            Some(Color::White) => "1-0",
            Some(Color::Black) => "0-1",
            None => "1/2-1/2",
        }
    }
}

pub fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "White",
        Color::Black => "Black",
    }
}
