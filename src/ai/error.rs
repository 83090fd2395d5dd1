//! Error types for move acquisition
//!
//! Three layers, from the wire outwards:
//!
//! - [`TransportError`]: one HTTP exchange failed, already classified
//! - [`AttemptFailure`]: one attempt produced no candidate move
//! - [`AcquireError`]: the whole acquisition gave up and the caller must react
//!
//! Only [`AcquireError`] ever leaves [`crate::ai::MoveAcquirer::acquire`].
//! An illegal model reply is not an error at all; the legality gate corrects it.

use thiserror::Error;

/// Markers that flag a rate-limit or quota failure in an error message
pub const RATE_LIMIT_MARKERS: [&str; 3] = ["rate limit", "quota", "too many requests"];

/// A classified failure of a single HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The endpoint could not be reached at all
    #[error("network error: {0}")]
    Network(String),

    /// HTTP 429, or an error body mentioning a rate limit or quota
    #[error("rate limited{}: {message}", http_suffix(.status))]
    RateLimited {
        status: Option<u16>,
        message: String,
    },

    /// Any other non-2xx response
    #[error("server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    /// 2xx response whose body is not the expected JSON
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl TransportError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, TransportError::RateLimited { .. })
    }
}

/// Classify a failed exchange
///
/// The status code decides first: 429 is always a rate limit. Otherwise the
/// message is scanned for [`RATE_LIMIT_MARKERS`], since some providers report
/// quota exhaustion with other codes. A remaining status is a server error and
/// no status at all means the request never got an answer.
pub fn classify_failure(status: Option<u16>, message: impl Into<String>) -> TransportError {
    let message = message.into();
    if status == Some(429) || mentions_rate_limit(&message) {
        return TransportError::RateLimited { status, message };
    }
    match status {
        Some(status) => TransportError::Server { status, message },
        None => TransportError::Network(message),
    }
}

fn http_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

fn mentions_rate_limit(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    RATE_LIMIT_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Why a single attempt produced no candidate move
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptFailure {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// 2xx response without usable move text
    #[error("no move returned from the inference endpoint")]
    EmptyResponse,
}

impl AttemptFailure {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, AttemptFailure::Transport(e) if e.is_rate_limited())
    }
}

/// Terminal failure of a move acquisition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcquireError {
    /// Acquisition was invoked on a position with no legal moves
    #[error("no legal moves in this position; the game is already over")]
    NoLegalMoves,

    /// Every attempt failed to reach the endpoint
    #[error("failed to connect to AI server at {endpoint} after {attempts} attempts ({source}). Check that the server is running and reachable")]
    Unreachable {
        endpoint: String,
        attempts: u32,
        source: TransportError,
    },

    /// The last attempt was rejected by a rate limit
    #[error("AI service is currently rate limited after {attempts} attempts. Please try again in a few minutes")]
    RateLimited { attempts: u32 },

    /// Retries exhausted for any other reason
    #[error("failed to get move from AI after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: AttemptFailure },
}

impl AcquireError {
    /// Map the last attempt failure to the error surfaced after exhaustion
    pub fn exhausted(endpoint: String, attempts: u32, last: AttemptFailure) -> Self {
        match last {
            AttemptFailure::Transport(source @ TransportError::Network(_)) => {
                AcquireError::Unreachable {
                    endpoint,
                    attempts,
                    source,
                }
            }
            AttemptFailure::Transport(TransportError::RateLimited { .. }) => {
                AcquireError::RateLimited { attempts }
            }
            last => AcquireError::Exhausted { attempts, last },
        }
    }

    /// Number of endpoint attempts made before giving up
    pub fn attempts(&self) -> u32 {
        match self {
            AcquireError::NoLegalMoves => 0,
            AcquireError::Unreachable { attempts, .. }
            | AcquireError::RateLimited { attempts }
            | AcquireError::Exhausted { attempts, .. } => *attempts,
        }
    }
}
