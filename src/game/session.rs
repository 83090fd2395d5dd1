//! Authoritative game state
//!
//! [`GameSession`] wraps a `shakmaty` position. The rules library does all the
//! chess: legality, SAN, FEN, checkmate and draw detection. The session adds
//! the parts a front end needs on top of it:
//!
//! - SAN history and PGN export
//! - the game mode, and whose turn belongs to the AI
//! - snapshots for the move acquisition component
//! - re-validation of AI moves that arrive after the position changed

use super::error::{GameError, GameResult};
use super::outcome::{color_name, GameOutcome};
use super::snapshot::PositionSnapshot;
use crate::ai::{AcquiredMove, Difficulty};
use shakmaty::fen::Fen;
use shakmaty::san::{San, SanPlus};
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, File, Move, Position, Rank, Role, Square};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

static NEXT_GAME_ID: AtomicU64 = AtomicU64::new(1);

/// Who controls each side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    /// One human against the language model
    VsAi {
        ai_color: Color,
        difficulty: Difficulty,
    },
    /// Two humans sharing the board
    Friend,
}

impl GameMode {
    pub fn ai_color(self) -> Option<Color> {
        match self {
            GameMode::VsAi { ai_color, .. } => Some(ai_color),
            GameMode::Friend => None,
        }
    }
}

/// Verbose legal move, as a board UI needs it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveSummary {
    pub from: Square,
    pub to: Square,
    pub san: String,
    pub promotion: Option<Role>,
}

/// A move that has been applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayedMove {
    pub san: String,
    pub uci: String,
}

/// One game from start position (or a FEN) to its end
#[derive(Debug, Clone)]
pub struct GameSession {
    /// Unique per process; two games from the same FEN still differ
    game_id: u64,
    position: Chess,
    mode: GameMode,
    start_fen: Option<String>,
    start_turn: Color,
    start_fullmove: u32,
    history: Vec<String>,
    position_keys: Vec<String>,
}

impl GameSession {
    /// New game from the standard starting position
    pub fn new(mode: GameMode) -> Self {
        Self::with_position(mode, Chess::default(), None)
    }

    /// New game from an arbitrary FEN
    pub fn from_fen(mode: GameMode, fen: &str) -> GameResult<Self> {
        let invalid = |message: String| GameError::InvalidFen {
            fen: fen.to_string(),
            message,
        };
        let parsed: Fen = fen.trim().parse().map_err(|e| invalid(format!("{e}")))?;
        let position: Chess = parsed
            .into_position(CastlingMode::Standard)
            .map_err(|e| invalid(format!("{e}")))?;
        Ok(Self::with_position(mode, position, Some(fen.trim().to_string())))
    }

    fn with_position(mode: GameMode, position: Chess, start_fen: Option<String>) -> Self {
        let start_turn = position.turn();
        let start_fullmove = position.fullmoves().get();
        let mut session = Self {
            game_id: NEXT_GAME_ID.fetch_add(1, Ordering::Relaxed),
            position,
            mode,
            start_fen,
            start_turn,
            start_fullmove,
            history: Vec::new(),
            position_keys: Vec::new(),
        };
        session.position_keys.push(session.position_key());
        info!("[GAME] New game ({:?}) at {}", mode, session.fen());
        session
    }

    pub fn game_id(&self) -> u64 {
        self.game_id
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn turn(&self) -> Color {
        self.position.turn()
    }

    pub fn position(&self) -> &Chess {
        &self.position
    }

    /// SAN of every move played so far
    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn fen(&self) -> String {
        Fen::from_position(self.position.clone(), EnPassantMode::Legal).to_string()
    }

    /// Movetext, preceded by `SetUp`/`FEN` headers when the game did not start
    /// from the initial position
    pub fn pgn(&self) -> String {
        let mut pgn = String::new();
        if let Some(fen) = &self.start_fen {
            pgn.push_str("[SetUp \"1\"]\n");
            pgn.push_str(&format!("[FEN \"{fen}\"]\n\n"));
        }

        let mut number = self.start_fullmove;
        let mut color = self.start_turn;
        let mut tokens = Vec::with_capacity(self.history.len() + self.history.len() / 2 + 1);
        for (i, san) in self.history.iter().enumerate() {
            match color {
                Color::White => tokens.push(format!("{number}.")),
                Color::Black if i == 0 => tokens.push(format!("{number}...")),
                Color::Black => {}
            }
            tokens.push(san.clone());
            if color == Color::Black {
                number += 1;
            }
            color = !color;
        }
        if let Some(outcome) = self.outcome() {
            tokens.push(outcome.result_token().to_string());
        }
        pgn.push_str(&tokens.join(" "));
        pgn
    }

    /// Legal moves for the side to move, as SAN with check suffixes
    pub fn legal_moves(&self) -> Vec<String> {
        if self.outcome().is_some() {
            return Vec::new();
        }
        self.position
            .legal_moves()
            .iter()
            .map(|m| self.san_of(m))
            .collect()
    }

    /// Legal moves starting on `from`, in verbose form
    pub fn moves_from(&self, from: Square) -> Vec<MoveSummary> {
        self.position
            .legal_moves()
            .iter()
            .filter(|m| m.from() == Some(from))
            .map(|m| MoveSummary {
                from,
                to: destination(m),
                san: self.san_of(m),
                promotion: m.promotion(),
            })
            .collect()
    }

    /// Snapshot handed to the move acquisition component
    pub fn snapshot(&self) -> PositionSnapshot {
        PositionSnapshot::new(self.pgn(), self.fen(), self.legal_moves())
            .with_game_id(self.game_id)
    }

    /// True when the side to move is played by the AI and the game is live
    pub fn is_ai_turn(&self) -> bool {
        self.mode.ai_color() == Some(self.turn()) && !self.is_game_over()
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        let pos = &self.position;
        if pos.is_checkmate() {
            Some(GameOutcome::Checkmate { winner: !pos.turn() })
        } else if pos.is_stalemate() {
            Some(GameOutcome::Stalemate)
        } else if pos.is_insufficient_material() {
            Some(GameOutcome::InsufficientMaterial)
        } else if pos.halfmoves() >= 100 {
            Some(GameOutcome::FiftyMoveRule)
        } else if self.repetitions() >= 3 {
            Some(GameOutcome::ThreefoldRepetition)
        } else {
            None
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.outcome().is_some()
    }

    /// One-line status, e.g. "White's turn" or "Checkmate! Black wins."
    pub fn status(&self) -> String {
        match self.outcome() {
            Some(outcome) => format!("{} {}", outcome.title(), outcome.message()),
            None if self.position.is_check() => format!("{}'s turn (check)", color_name(self.turn())),
            None => format!("{}'s turn", color_name(self.turn())),
        }
    }

    /// Play a move given in SAN (`Nf3`, `exd5`, `O-O`, `e8=Q+`)
    pub fn play_san(&mut self, san: &str) -> GameResult<PlayedMove> {
        self.ensure_live()?;
        let illegal = || GameError::IllegalMove {
            notation: san.to_string(),
        };
        let parsed: SanPlus = san.trim().parse().map_err(|_| illegal())?;
        let m = parsed.san.to_move(&self.position).map_err(|_| illegal())?;
        Ok(self.apply(&m))
    }

    /// Play a move given by squares, the way a board UI reports a drag
    ///
    /// A pawn move onto the last rank without `promotion` is refused with
    /// [`GameError::PromotionRequired`] so the caller can ask for a piece.
    pub fn play_squares(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<Role>,
    ) -> GameResult<PlayedMove> {
        self.ensure_live()?;
        let candidates: Vec<Move> = self
            .position
            .legal_moves()
            .into_iter()
            .filter(|m| m.from() == Some(from) && destination(m) == to)
            .collect();

        if promotion.is_none() && candidates.iter().any(|m| m.promotion().is_some()) {
            return Err(GameError::PromotionRequired {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        let m = candidates
            .into_iter()
            .find(|m| m.promotion() == promotion)
            .ok_or_else(|| GameError::IllegalMove {
                notation: format!(
                    "{from}{to}{}",
                    promotion.map(|r| r.char().to_string()).unwrap_or_default()
                ),
            })?;
        Ok(self.apply(&m))
    }

    /// Parse `e2e4` / `e7e8q` style input and play it
    pub fn play_coordinates(&mut self, input: &str) -> GameResult<PlayedMove> {
        let illegal = || GameError::IllegalMove {
            notation: input.to_string(),
        };
        let input = input.trim();
        if !(4..=5).contains(&input.len()) || !input.is_ascii() {
            return Err(illegal());
        }
        let from: Square = input[0..2].parse().map_err(|_| illegal())?;
        let to: Square = input[2..4].parse().map_err(|_| illegal())?;
        let promotion = match input[4..].chars().next() {
            Some(c) => Some(Role::from_char(c.to_ascii_lowercase()).ok_or_else(illegal)?),
            None => None,
        };
        self.play_squares(from, to, promotion)
    }

    /// Apply a move obtained from the AI, if it still belongs to this position
    ///
    /// A result that arrives after the position changed (any other move in
    /// between) or for another game, even one showing the same position, is
    /// refused and the session is left untouched.
    pub fn apply_acquired(&mut self, acquired: &AcquiredMove) -> GameResult<PlayedMove> {
        if acquired.game_id != self.game_id || acquired.snapshot_fen != self.fen() {
            return Err(GameError::StaleMove {
                san: acquired.san.clone(),
            });
        }
        self.play_san(&acquired.san)
    }

    /// Plain-text board, White at the bottom unless `flipped`
    pub fn board_diagram(&self, flipped: bool) -> String {
        let mut ranks: Vec<Rank> = Rank::ALL.to_vec();
        let mut files: Vec<File> = File::ALL.to_vec();
        if flipped {
            files.reverse();
        } else {
            ranks.reverse();
        }

        let board = self.position.board();
        let mut out = String::new();
        for rank in &ranks {
            out.push(rank.char());
            out.push(' ');
            for file in &files {
                let square = Square::from_coords(*file, *rank);
                out.push(' ');
                out.push(board.piece_at(square).map_or('.', |p| p.char()));
            }
            out.push('\n');
        }
        out.push_str("  ");
        for file in &files {
            out.push(' ');
            out.push(file.char());
        }
        out
    }

    fn ensure_live(&self) -> GameResult<()> {
        if self.is_game_over() {
            Err(GameError::GameOver)
        } else {
            Ok(())
        }
    }

    fn apply(&mut self, m: &Move) -> PlayedMove {
        let uci = UciMove::from_move(m, CastlingMode::Standard).to_string();
        let san = self.san_of(m);
        self.position.play_unchecked(m);
        self.history.push(san.clone());
        self.position_keys.push(self.position_key());
        debug!("[GAME] {} ({}) -> {}", san, uci, self.fen());
        PlayedMove { san, uci }
    }

    /// SAN with `+` or `#` appended
    fn san_of(&self, m: &Move) -> String {
        let san = San::from_move(&self.position, m);
        let mut after = self.position.clone();
        after.play_unchecked(m);
        if after.is_checkmate() {
            format!("{san}#")
        } else if after.is_check() {
            format!("{san}+")
        } else {
            san.to_string()
        }
    }

    /// FEN without the move clocks: board, side to move, castling, en passant
    fn position_key(&self) -> String {
        self.fen()
            .split_whitespace()
            .take(4)
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn repetitions(&self) -> usize {
        match self.position_keys.last() {
            Some(current) => self.position_keys.iter().filter(|k| *k == current).count(),
            None => 0,
        }
    }
}

/// Destination square as a player sees it (king square for castling)
fn destination(m: &Move) -> Square {
    match m {
        Move::Castle { king, rook } => {
            let rank = king.rank();
            if rook.file() > king.file() {
                Square::from_coords(File::G, rank)
            } else {
                Square::from_coords(File::C, rank)
            }
        }
        other => other.to(),
    }
}
