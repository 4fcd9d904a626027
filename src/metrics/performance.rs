use crate::blockchain::{Ledger, ProofOutcome};
use crate::error::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerMetrics {
    pub timestamp: String,
    pub block_count: usize,
    pub sealed_transactions: usize,
    pub pending_transactions: usize,
    pub chain_size_kb: f64,
    pub chain_valid: bool,
    pub proof_searches: usize,
    pub avg_proof_attempts: f64,
    pub avg_proof_search_ms: f64,
    pub proof_search_p50_ms: f64,
    pub proof_search_p95_ms: f64,
    pub proof_search_p99_ms: f64,
    pub booking_throughput: f64,
    pub uptime_secs: u64,
}

impl LedgerMetrics {
    pub async fn collect(ledger: &Ledger, proofs: &[ProofOutcome], uptime: Duration) -> Self {
        let snapshot = ledger.snapshot().await;
        let sealed_transactions: usize =
            snapshot.chain().iter().map(|b| b.transactions.len()).sum();

        let mut search_ms: Vec<f64> = proofs
            .iter()
            .map(|p| p.elapsed.as_secs_f64() * 1000.0)
            .collect();
        search_ms.sort_by(f64::total_cmp);

        let avg_proof_attempts = if proofs.is_empty() {
            0.0
        } else {
            proofs.iter().map(|p| p.attempts as f64).sum::<f64>() / proofs.len() as f64
        };
        let avg_proof_search_ms = if search_ms.is_empty() {
            0.0
        } else {
            search_ms.iter().sum::<f64>() / search_ms.len() as f64
        };

        let secs = uptime.as_secs_f64();
        Self {
            timestamp: Utc::now().to_rfc3339(),
            block_count: snapshot.chain().len(),
            sealed_transactions,
            pending_transactions: snapshot.pending().len(),
            chain_size_kb: ledger.chain_size_bytes().await as f64 / 1024.0,
            chain_valid: crate::blockchain::validate_chain(snapshot.chain()).is_ok(),
            proof_searches: proofs.len(),
            avg_proof_attempts,
            avg_proof_search_ms,
            proof_search_p50_ms: nearest_rank(&search_ms, 0.50),
            proof_search_p95_ms: nearest_rank(&search_ms, 0.95),
            proof_search_p99_ms: nearest_rank(&search_ms, 0.99),
            booking_throughput: if secs > 0.0 {
                sealed_transactions as f64 / secs
            } else {
                0.0
            },
            uptime_secs: uptime.as_secs(),
        }
    }

    pub fn print_report(&self) {
        println!("\n╔═══════════════════════════════════════════════════════╗");
        println!("║          Ticket Ledger Metrics Report                 ║");
        println!("╠═══════════════════════════════════════════════════════╣");
        println!("║ Timestamp: {:<42} ║", self.timestamp);
        println!("║                                                       ║");
        println!("║ 1. Chain                                              ║");
        println!("║    → Blocks: {:<41} ║", self.block_count);
        println!("║    → Sealed bookings: {:<32} ║", self.sealed_transactions);
        println!("║    → Pending bookings: {:<31} ║", self.pending_transactions);
        println!("║    → Size: {:<40.2} KB ║", self.chain_size_kb);
        println!(
            "║    → Audit: {:<42} ║",
            if self.chain_valid { "valid" } else { "INVALID" }
        );
        println!("║                                                       ║");
        println!("║ 2. Proof-of-Work Search                               ║");
        println!("║    → Searches: {:<39} ║", self.proof_searches);
        println!("║    → Avg attempts: {:<35.0} ║", self.avg_proof_attempts);
        println!("║    → Avg: {:<40.2} ms ║", self.avg_proof_search_ms);
        println!("║    → p50: {:<40.2} ms ║", self.proof_search_p50_ms);
        println!("║    → p95: {:<40.2} ms ║", self.proof_search_p95_ms);
        println!("║    → p99: {:<40.2} ms ║", self.proof_search_p99_ms);
        println!("║                                                       ║");
        println!("║ 3. Throughput                                         ║");
        println!("║    → {:<38.2} bookings/sec ║", self.booking_throughput);
        println!("║                                                       ║");
        println!("║ Uptime: {:<41} sec ║", self.uptime_secs);
        println!("╚═══════════════════════════════════════════════════════╝\n");
    }

    /// Appends one row, writing the header only when the file is new.
    pub fn save_to_csv(&self, path: &Path) -> Result<()> {
        let file_exists = path.exists();
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;

        let mut wtr = csv::WriterBuilder::new()
            .has_headers(!file_exists)
            .from_writer(file);
        wtr.serialize(self)?;
        wtr.flush()?;
        Ok(())
    }
}

fn nearest_rank(sorted: &[f64], quant: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let n = sorted.len();
    let idx = ((quant * n as f64).ceil() as usize).clamp(1, n) - 1;
    sorted[idx]
}
