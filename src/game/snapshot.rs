use serde::{Deserialize, Serialize};

/// Immutable view of a position handed to the move acquisition component
///
/// Built fresh for every AI turn by [`crate::game::GameSession::snapshot`].
/// `legal_moves` is the exhaustive list of SAN moves for the side to move, in
/// the rules library's generation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub pgn: String,
    pub fen: String,
    pub legal_moves: Vec<String>,
    /// Session the position belongs to; 0 when not taken from a session
    #[serde(default)]
    pub game_id: u64,
}

impl PositionSnapshot {
    pub fn new(pgn: impl Into<String>, fen: impl Into<String>, legal_moves: Vec<String>) -> Self {
        Self {
            pgn: pgn.into(),
            fen: fen.into(),
            legal_moves,
            game_id: 0,
        }
    }

    pub fn with_game_id(mut self, game_id: u64) -> Self {
        self.game_id = game_id;
        self
    }

    /// True when the side to move has no legal moves (checkmate or stalemate)
    pub fn is_terminal(&self) -> bool {
        self.legal_moves.is_empty()
    }

    pub fn contains(&self, san: &str) -> bool {
        self.legal_moves.iter().any(|m| m == san)
    }
}
