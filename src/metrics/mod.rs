pub mod performance;

pub use performance::LedgerMetrics;
