use crate::blockchain::ProofSearch;
use crate::error::{LedgerError, Result};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct LedgerConfig {
    /// Upper bound on proof candidates per search; `None` searches forever.
    pub max_proof_attempts: Option<u64>,
    pub proof_timeout: Option<Duration>,
    /// Optional CSV of `holder,bus_number,seat_number,date` rows to book.
    pub bookings_csv: Option<PathBuf>,
    pub metrics_csv: PathBuf,
    pub chain_json: Option<PathBuf>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_proof_attempts: None,
            proof_timeout: None,
            bookings_csv: None,
            metrics_csv: PathBuf::from("ledger_metrics.csv"),
            chain_json: None,
        }
    }
}

impl LedgerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            max_proof_attempts: parse_u64(&var, "LEDGER_MAX_PROOF_ATTEMPTS")?,
            proof_timeout: parse_u64(&var, "LEDGER_PROOF_TIMEOUT_SECS")?
                .map(Duration::from_secs),
            bookings_csv: var("LEDGER_BOOKINGS_CSV").map(PathBuf::from),
            metrics_csv: var("LEDGER_METRICS_CSV")
                .map(PathBuf::from)
                .unwrap_or(defaults.metrics_csv),
            chain_json: var("LEDGER_CHAIN_JSON").map(PathBuf::from),
        })
    }

    pub fn proof_search(&self) -> ProofSearch {
        let mut search = ProofSearch::unbounded();
        if let Some(max) = self.max_proof_attempts {
            search = search.with_max_attempts(max);
        }
        if let Some(timeout) = self.proof_timeout {
            search = search.with_timeout(timeout);
        }
        search
    }
}

fn parse_u64<F>(var: &F, key: &str) -> Result<Option<u64>>
where
    F: Fn(&str) -> Option<String>,
{
    var(key)
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .map_err(|e| LedgerError::Config(format!("{key}={raw:?}: {e}")))
        })
        .transpose()
}
