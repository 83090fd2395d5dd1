//! Legality gate for model output
//!
//! The model is an untrusted text generator. Whatever it says, the move that
//! leaves this module is a member of the position's legal-move list:
//!
//! - exact match: returned unchanged
//! - anything else: replaced by a uniformly random legal move
//! - empty list: [`AcquireError::NoLegalMoves`]
//!
//! The random generator is passed in, so a seeded generator makes the
//! fallback reproducible.

use super::error::AcquireError;
use rand::Rng;
use tracing::warn;

/// Outcome of gating one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The model's move, untouched
    Accepted(String),
    /// The model's move was not legal; `fallback` was picked instead
    Substituted { rejected: String, fallback: String },
}

impl Verdict {
    /// The move to play
    pub fn san(&self) -> &str {
        match self {
            Verdict::Accepted(san) => san,
            Verdict::Substituted { fallback, .. } => fallback,
        }
    }

    pub fn into_san(self) -> String {
        match self {
            Verdict::Accepted(san) => san,
            Verdict::Substituted { fallback, .. } => fallback,
        }
    }

    pub fn was_substituted(&self) -> bool {
        matches!(self, Verdict::Substituted { .. })
    }
}

/// Gate a candidate move against the legal-move list
pub fn check_move<R: Rng>(
    candidate: &str,
    legal_moves: &[String],
    rng: &mut R,
) -> Result<Verdict, AcquireError> {
    if legal_moves.iter().any(|m| m == candidate) {
        return Ok(Verdict::Accepted(candidate.to_string()));
    }
    if legal_moves.is_empty() {
        return Err(AcquireError::NoLegalMoves);
    }

    let fallback = legal_moves[rng.random_range(0..legal_moves.len())].clone();
    warn!(
        "[AI] Model returned {:?}, which is not in the legal moves list [{}]. Falling back to {}",
        candidate,
        legal_moves.join(", "),
        fallback
    );
    Ok(Verdict::Substituted {
        rejected: candidate.to_string(),
        fallback,
    })
}
