//! Move acquisition: prompt → endpoint → extract → gate, with retries
//!
//! [`MoveAcquirer::acquire`] is the only entry point. It never touches game
//! state. The caller applies the returned move and should re-validate it
//! against the current position first (see
//! [`crate::game::GameSession::apply_acquired`]).

use super::difficulty::Difficulty;
use super::error::{AcquireError, AttemptFailure};
use super::extract::extract_move;
use super::legality::{check_move, Verdict};
use super::prompt::{build_prompt, Prompt};
use super::retry::{Attempt, RetryPolicy, RetryState};
use super::transport::{endpoint_from_config, MoveEndpoint};
use crate::core::config::AiConfig;
use crate::core::error::ConfigResult;
use crate::game::PositionSnapshot;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::{error, info, warn};

/// Where the returned move came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveSource {
    /// The model answered with a legal move
    Model,
    /// The model's answer was illegal and a random legal move was substituted
    Fallback,
}

/// A legal move for the snapshot it was requested for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquiredMove {
    pub san: String,
    pub source: MoveSource,
    /// Endpoint attempts used, including the successful one
    pub attempts: u32,
    /// FEN of the position the move was requested for
    pub snapshot_fen: String,
    /// Game the snapshot was taken from
    pub game_id: u64,
}

/// Drives one move request at a time against an inference endpoint
pub struct MoveAcquirer {
    endpoint: Box<dyn MoveEndpoint>,
    policy: RetryPolicy,
    rng: Mutex<StdRng>,
}

impl MoveAcquirer {
    pub fn new(endpoint: Box<dyn MoveEndpoint>, policy: RetryPolicy) -> Self {
        Self {
            endpoint,
            policy,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Same as [`MoveAcquirer::new`] with a seeded generator, for reproducible
    /// fallbacks and jitter
    pub fn with_seed(endpoint: Box<dyn MoveEndpoint>, policy: RetryPolicy, seed: u64) -> Self {
        Self {
            endpoint,
            policy,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn from_config(config: &AiConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self::new(endpoint_from_config(config)?, config.retry))
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Obtain a legal move for `snapshot`
    ///
    /// Fails immediately with [`AcquireError::NoLegalMoves`] when the position
    /// has no legal moves; no request is sent in that case.
    pub async fn acquire(
        &self,
        snapshot: &PositionSnapshot,
        difficulty: Difficulty,
    ) -> Result<AcquiredMove, AcquireError> {
        if snapshot.is_terminal() {
            error!("[AI] Move requested for a position with no legal moves");
            return Err(AcquireError::NoLegalMoves);
        }

        let prompt = build_prompt(snapshot, difficulty);
        info!(
            "[AI] Requesting move from {} | Difficulty: {} | Legal moves: {}",
            self.endpoint.describe(),
            difficulty,
            snapshot.legal_moves.len()
        );

        let mut state = RetryState::initial();
        let mut last_failure = AttemptFailure::EmptyResponse;
        let mut acquired = None;

        while let RetryState::Attempting(n) = state {
            let attempt = Attempt::begin(n);

            match self.candidate(&prompt).await {
                Ok(candidate) => {
                    let verdict = {
                        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
                        check_move(&candidate, &snapshot.legal_moves, &mut *rng)?
                    };
                    let source = match verdict {
                        Verdict::Accepted(_) => MoveSource::Model,
                        Verdict::Substituted { .. } => MoveSource::Fallback,
                    };
                    info!(
                        "[AI] Attempt {}/{} succeeded in {:?}: {} ({:?})",
                        n,
                        self.policy.max_attempts,
                        attempt.elapsed(),
                        verdict.san(),
                        source
                    );
                    acquired = Some(AcquiredMove {
                        san: verdict.into_san(),
                        source,
                        attempts: n,
                        snapshot_fen: snapshot.fen.clone(),
                        game_id: snapshot.game_id,
                    });
                    state = state.succeed();
                }
                Err(failure) => {
                    if failure.is_rate_limited() {
                        warn!(
                            "[AI] Rate limit detected on attempt {}/{}: {}",
                            n, self.policy.max_attempts, failure
                        );
                    } else {
                        warn!(
                            "[AI] Attempt {}/{} failed after {:?}: {}",
                            n,
                            self.policy.max_attempts,
                            attempt.elapsed(),
                            failure
                        );
                    }
                    last_failure = failure;
                    state = state.advance(&self.policy);

                    if let RetryState::Attempting(_) = state {
                        let delay = self.next_delay(n);
                        info!("[AI] Retrying in {:?}", delay);
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        match (state, acquired) {
            (RetryState::Succeeded, Some(acquired)) => Ok(acquired),
            _ => {
                let err = AcquireError::exhausted(
                    self.endpoint.describe(),
                    self.policy.max_attempts,
                    last_failure,
                );
                error!("[AI] All retry attempts failed: {}", err);
                Err(err)
            }
        }
    }

    /// One endpoint round trip, up to the extracted candidate
    async fn candidate(&self, prompt: &Prompt) -> Result<String, AttemptFailure> {
        let reply = self.endpoint.request(prompt).await?;
        extract_move(&reply)
    }

    fn next_delay(&self, attempt: u32) -> Duration {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        self.policy.delay_for(attempt, &mut *rng)
    }
}
