//! Prompt construction
//!
//! Turns a [`PositionSnapshot`] and a [`Difficulty`] into the system and user
//! messages of a chat-completion request. Pure and deterministic: the same
//! inputs always produce byte-identical prompts.

use super::difficulty::Difficulty;
use crate::game::PositionSnapshot;

/// The two messages sent to the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Build the prompt for one move request
pub fn build_prompt(snapshot: &PositionSnapshot, difficulty: Difficulty) -> Prompt {
    let system = format!(
        "You are a chess engine. Your task is to analyze the given chess game and determine the best next move for the current player.\n\
         The game history is provided in PGN format, and the current board state in FEN format.\n\
         \n\
         {persona}\n\
         \n\
         From the list of legal moves provided, choose the single best move.\n\
         You must respond with only the move from the list, no other text, explanation, or commentary.",
        persona = difficulty.persona(),
    );

    let user = format!(
        "Game history (PGN):\n{pgn}\n\nCurrent position (FEN):\n{fen}\n\nLegal moves:\n[{moves}]",
        pgn = snapshot.pgn,
        fen = snapshot.fen,
        moves = snapshot.legal_moves.join(", "),
    );

    Prompt { system, user }
}
