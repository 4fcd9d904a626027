use crate::error::{LedgerError, Result};
use log::{debug, warn};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// A proof is valid when `sha256("{last_proof}{proof}")` starts with this.
pub const PROOF_PREFIX: &str = "0000";

// How many candidates are tried between checks of the stop flags.
const STOP_CHECK_INTERVAL: u64 = 4096;

pub fn is_valid_proof(last_proof: u64, proof: u64) -> bool {
    let guess = format!("{}{}", last_proof, proof);
    hex::encode(Sha256::digest(guess.as_bytes())).starts_with(PROOF_PREFIX)
}

/// Smallest non-negative proof valid against `last_proof`. Unbounded.
pub fn find_proof(last_proof: u64) -> u64 {
    let mut proof = 0;
    while !is_valid_proof(last_proof, proof) {
        proof += 1;
    }
    proof
}

/// Shared flag that stops any running search holding a clone of it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofOutcome {
    pub last_proof: u64,
    pub proof: u64,
    pub attempts: u64,
    pub elapsed: Duration,
}

/// Proof-of-work search with optional attempt bound, wall-clock timeout and
/// cancellation. The default is unbounded and finds the same proof as
/// [`find_proof`].
#[derive(Debug, Clone, Default)]
pub struct ProofSearch {
    max_attempts: Option<u64>,
    timeout: Option<Duration>,
    cancel: CancelToken,
}

impl ProofSearch {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(mut self, max_attempts: u64) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn max_attempts(&self) -> Option<u64> {
        self.max_attempts
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Runs on the current thread. The timeout is not applied here; see
    /// [`ProofSearch::run_blocking`].
    pub fn run(&self, last_proof: u64) -> Result<ProofOutcome> {
        self.search(last_proof, &AtomicBool::new(false))
    }

    /// Runs on tokio's blocking pool so async callers (and lock holders) are
    /// not stalled, applying the configured timeout.
    pub async fn run_blocking(&self, last_proof: u64) -> Result<ProofOutcome> {
        let expired = Arc::new(AtomicBool::new(false));
        let search = self.clone();
        let flag = expired.clone();
        let handle = tokio::task::spawn_blocking(move || search.search(last_proof, &flag));

        let joined = match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    expired.store(true, Ordering::Relaxed);
                    warn!(
                        "proof search for last proof {} timed out after {:?}",
                        last_proof, timeout
                    );
                    return Err(LedgerError::ProofSearchTimedOut {
                        last_proof,
                        timeout,
                    });
                }
            },
            None => handle.await,
        };

        joined.map_err(|e| LedgerError::SearchTask(e.to_string()))?
    }

    fn search(&self, last_proof: u64, expired: &AtomicBool) -> Result<ProofOutcome> {
        let start = Instant::now();
        let mut proof = 0u64;

        loop {
            if self.max_attempts.is_some_and(|max| proof >= max)
                || (proof % STOP_CHECK_INTERVAL == 0
                    && (self.cancel.is_cancelled() || expired.load(Ordering::Relaxed)))
            {
                warn!(
                    "proof search for last proof {} stopped after {} attempts",
                    last_proof, proof
                );
                return Err(LedgerError::ProofSearchAborted {
                    last_proof,
                    attempts: proof,
                });
            }

            if is_valid_proof(last_proof, proof) {
                let outcome = ProofOutcome {
                    last_proof,
                    proof,
                    attempts: proof + 1,
                    elapsed: start.elapsed(),
                };
                debug!(
                    "found proof {} for last proof {} in {} attempts ({:?})",
                    proof, last_proof, outcome.attempts, outcome.elapsed
                );
                return Ok(outcome);
            }

            proof += 1;
        }
    }
}
