use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("proof search for last proof {last_proof} aborted after {attempts} attempts")]
    ProofSearchAborted { last_proof: u64, attempts: u64 },

    #[error("proof search for last proof {last_proof} timed out after {timeout:?}")]
    ProofSearchTimedOut { last_proof: u64, timeout: Duration },

    #[error("proof search task failed: {0}")]
    SearchTask(String),

    #[error("invalid booking: {0}")]
    InvalidBooking(String),

    #[error("booking for {0} was not found in the chain after mining")]
    BookingLost(String),

    #[error("chain audit failed: {}", .0.join("; "))]
    InvalidChain(Vec<String>),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
