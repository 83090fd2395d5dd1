//! Difficulty tiers for the language-model opponent
//!
//! There is no search depth or time budget behind a tier. Each one maps to a
//! fixed persona sentence that is placed in the system prompt; how well the
//! model honours it is outside our control.
//!
//! | Difficulty | Persona                               |
//! |------------|---------------------------------------|
//! | Easy       | Beginner, sometimes makes mistakes    |
//! | Medium     | Intermediate, avoids obvious blunders |
//! | Hard       | Grandmaster, picks the best move      |

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// AI difficulty levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Difficulty {
    /// Beginner persona
    #[default]
    Easy,
    /// Intermediate persona
    Medium,
    /// Grandmaster persona
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Persona sentence embedded in the system prompt
    pub fn persona(self) -> &'static str {
        match self {
            Difficulty::Easy => {
                "You are a beginner chess player. Pick a reasonable but not optimal move. Sometimes make a mistake."
            }
            Difficulty::Medium => {
                "You are an intermediate chess player. Analyze the position and pick a strong move. Avoid obvious blunders."
            }
            Difficulty::Hard => {
                "You are a world-class chess grandmaster. Analyze the position deeply and pick the absolute best move."
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known tier
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown difficulty {0:?} (expected easy, medium or hard)")]
pub struct ParseDifficultyError(pub String);

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(ParseDifficultyError(s.to_string())),
        }
    }
}
