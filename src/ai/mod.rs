//! Language-model opponent
//!
//! Turns a position into a legal move supplied by an external text
//! generation service, over an unreliable network.
//!
//! # Architecture
//!
//! - [`prompt`]: system and user messages for a snapshot and difficulty
//! - [`transport`]: one HTTP exchange per attempt behind [`MoveEndpoint`]
//! - [`extract`]: candidate move out of a chat-completion reply
//! - [`legality`]: candidate checked against the legal-move list, random
//!   legal fallback on mismatch
//! - [`retry`]: attempt cap, exponential backoff with jitter
//! - [`acquire`]: [`MoveAcquirer`] wires the above together
//! - [`health`]: optional reachability probe
//!
//! # Flow
//!
//! ```text
//! snapshot → build_prompt → request ─ok→ extract_move → check_move → AcquiredMove
//!                              ▲  └fail→ backoff ─┐
//!                              └──────────────────┘ (until max_attempts)
//! ```
//!
//! The component never mutates game state; the caller applies the result.

pub mod acquire;
pub mod difficulty;
pub mod error;
pub mod extract;
pub mod health;
pub mod legality;
pub mod prompt;
pub mod retry;
pub mod transport;

// Re-export for convenience
pub use acquire::{AcquiredMove, MoveAcquirer, MoveSource};
pub use difficulty::Difficulty;
pub use error::{AcquireError, AttemptFailure, TransportError};
pub use prompt::{build_prompt, Prompt};
pub use retry::RetryPolicy;
pub use transport::{MoveEndpoint, Reply};
