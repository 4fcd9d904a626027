pub mod block;
pub mod chain;
pub mod proof;
pub mod transaction;

pub use block::{Block, compute_hash};
pub use chain::{Ledger, LedgerState, MinedBlock, validate_chain};
pub use proof::{CancelToken, ProofOutcome, ProofSearch, find_proof, is_valid_proof};
pub use transaction::Transaction;
