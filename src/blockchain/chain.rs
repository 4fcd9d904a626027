use super::block::{Block, GENESIS_PREVIOUS_HASH, GENESIS_PROOF, compute_hash};
use super::proof::{ProofOutcome, ProofSearch, is_valid_proof};
use super::transaction::Transaction;
use crate::error::{LedgerError, Result};
use log::{debug, info};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Chain and pending pool. Always holds at least the genesis block.
#[derive(Debug, Clone)]
pub struct LedgerState {
    chain: Vec<Block>,
    pending: Vec<Transaction>,
}

impl LedgerState {
    fn new() -> Self {
        let genesis = Block::genesis();
        debug!("created genesis block at {}", genesis.timestamp);
        Self {
            chain: vec![genesis],
            pending: vec![],
        }
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn last_block(&self) -> &Block {
        self.chain
            .last()
            .expect("ledger chain always contains the genesis block")
    }

    pub fn next_index(&self) -> u64 {
        self.chain.len() as u64 + 1
    }

    pub fn submit_transaction(&mut self, tx: Transaction) -> u64 {
        debug!(
            "pending transaction for {} on {} seat {} ({})",
            tx.holder, tx.resource_id, tx.sub_resource_id, tx.date
        );
        self.pending.push(tx);
        self.next_index()
    }

    /// Seals the pending pool into a new block. `proof` is trusted as given.
    pub fn seal_block(&mut self, proof: u64) -> Block {
        let previous_hash = compute_hash(self.last_block());
        let transactions = std::mem::take(&mut self.pending);
        let block = Block::new(self.next_index(), transactions, proof, previous_hash);

        self.chain.push(block.clone());
        info!(
            "sealed block {} with {} transaction(s), proof {}, hash {}",
            block.index,
            block.transactions.len(),
            block.proof,
            &compute_hash(&block)[..12]
        );
        block
    }
}

#[derive(Debug, Clone)]
pub struct MinedBlock {
    pub block: Block,
    pub outcome: ProofOutcome,
}

/// Shared handle to one ledger. Clones refer to the same chain.
///
/// Every mutation goes through a single write lock, so a submission racing a
/// seal lands wholly in that block or wholly in the next one. Readers get
/// cloned snapshots and never observe a half-applied seal.
#[derive(Debug, Clone)]
pub struct Ledger {
    state: Arc<RwLock<LedgerState>>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(LedgerState::new())),
        }
    }

    /// Queues a booking and returns the index the next sealed block will
    /// have. The index is advisory: several submissions before a seal all
    /// report the same value.
    pub async fn submit_transaction(
        &self,
        holder: impl Into<String>,
        resource_id: impl Into<String>,
        sub_resource_id: impl Into<String>,
        date: impl Into<String>,
    ) -> u64 {
        self.add_transaction(Transaction::new(holder, resource_id, sub_resource_id, date))
            .await
    }

    pub async fn add_transaction(&self, tx: Transaction) -> u64 {
        self.state.write().await.submit_transaction(tx)
    }

    pub async fn seal_block(&self, proof: u64) -> Block {
        self.state.write().await.seal_block(proof)
    }

    /// Searches for a proof against the current last block without holding
    /// the lock, then seals the pending pool. If another seal landed while
    /// searching, the search restarts against the new last proof.
    pub async fn mine_pending(&self, search: &ProofSearch) -> Result<MinedBlock> {
        loop {
            let last_proof = self.state.read().await.last_block().proof;
            let outcome = search.run_blocking(last_proof).await?;

            let mut state = self.state.write().await;
            if state.last_block().proof == last_proof {
                let block = state.seal_block(outcome.proof);
                return Ok(MinedBlock { block, outcome });
            }
            debug!(
                "last proof moved from {} to {} during search, retrying",
                last_proof,
                state.last_block().proof
            );
        }
    }

    pub async fn chain(&self) -> Vec<Block> {
        self.state.read().await.chain().to_vec()
    }

    pub async fn last_block(&self) -> Block {
        self.state.read().await.last_block().clone()
    }

    pub async fn pending_transactions(&self) -> Vec<Transaction> {
        self.state.read().await.pending().to_vec()
    }

    pub async fn snapshot(&self) -> LedgerState {
        self.state.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.chain().len()
    }

    pub async fn sealed_transaction_count(&self) -> usize {
        self.state
            .read()
            .await
            .chain()
            .iter()
            .map(|b| b.transactions.len())
            .sum()
    }

    pub async fn chain_size_bytes(&self) -> usize {
        let state = self.state.read().await;
        bincode::serialize(state.chain()).map_or(0, |bytes| bytes.len())
    }

    pub async fn validate(&self) -> Result<()> {
        validate_chain(self.state.read().await.chain())
    }

    /// Writes the chain snapshot as pretty JSON in its external shape.
    pub async fn export_json(&self, path: &Path) -> Result<()> {
        let chain = self.chain().await;
        let json = serde_json::to_vec_pretty(&chain)?;
        tokio::fs::write(path, json).await?;
        info!("exported {} block(s) to {}", chain.len(), path.display());
        Ok(())
    }
}

/// Checks genesis parameters, positions, hash links and proofs.
pub fn validate_chain(blocks: &[Block]) -> Result<()> {
    let mut errors = vec![];

    match blocks.first() {
        None => errors.push("chain is empty".to_string()),
        Some(genesis) => {
            if genesis.previous_hash != GENESIS_PREVIOUS_HASH {
                errors.push("genesis previous_hash is not the sentinel".to_string());
            }
            if genesis.proof != GENESIS_PROOF {
                errors.push(format!("genesis proof is {}", genesis.proof));
            }
            if !genesis.transactions.is_empty() {
                errors.push("genesis carries transactions".to_string());
            }
        }
    }

    for (pos, block) in blocks.iter().enumerate() {
        if block.index != pos as u64 + 1 {
            errors.push(format!(
                "block at position {} has index {}",
                pos + 1,
                block.index
            ));
        }
        if pos == 0 {
            continue;
        }

        let prev = &blocks[pos - 1];
        if block.previous_hash != compute_hash(prev) {
            errors.push(format!("block {} previous_hash mismatch", block.index));
        }
        if !is_valid_proof(prev.proof, block.proof) {
            errors.push(format!("block {} proof {} invalid", block.index, block.proof));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(LedgerError::InvalidChain(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::proof::find_proof;

    #[tokio::test]
    async fn fresh_ledger_holds_only_genesis() {
        let ledger = Ledger::new();
        let chain = ledger.chain().await;
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].index, 1);
        assert_eq!(chain[0].previous_hash, "1");
        assert_eq!(chain[0].proof, 100);
        assert!(chain[0].transactions.is_empty());
        assert!(ledger.pending_transactions().await.is_empty());
    }

    #[tokio::test]
    async fn submit_reports_next_index_without_validation() {
        let ledger = Ledger::new();
        assert_eq!(ledger.submit_transaction("Alice", "B123", "A1", "2024-05-01").await, 2);
        assert_eq!(ledger.submit_transaction("", "", "", "").await, 2);
        assert_eq!(ledger.pending_transactions().await.len(), 2);
    }

    #[tokio::test]
    async fn seal_moves_pending_into_block_in_order() {
        let ledger = Ledger::new();
        let t1 = Transaction::new("Alice", "B123", "A1", "2024-05-01");
        let t2 = Transaction::new("Bob", "B123", "A2", "2024-05-01");
        ledger.add_transaction(t1.clone()).await;
        ledger.add_transaction(t2.clone()).await;

        let block = ledger.seal_block(find_proof(100)).await;
        assert_eq!(block.transactions, vec![t1, t2]);
        assert!(ledger.pending_transactions().await.is_empty());

        let t3 = Transaction::new("Carol", "B7", "C1", "2024-05-02");
        assert_eq!(ledger.add_transaction(t3.clone()).await, 3);
        let chain = ledger.chain().await;
        assert!(!chain[1].transactions.contains(&t3));
        assert_eq!(ledger.pending_transactions().await, vec![t3]);
    }

    #[tokio::test]
    async fn sealed_blocks_link_to_predecessor() {
        let ledger = Ledger::new();
        let mut last_proof = 100;
        for i in 0..3 {
            ledger
                .submit_transaction(format!("holder-{i}"), "B1", format!("S{i}"), "2024-01-01")
                .await;
            last_proof = find_proof(last_proof);
            ledger.seal_block(last_proof).await;
        }

        let chain = ledger.chain().await;
        assert_eq!(chain.len(), 4);
        for (i, block) in chain.iter().enumerate() {
            assert_eq!(block.index, i as u64 + 1);
        }
        for pair in chain.windows(2) {
            assert_eq!(pair[1].previous_hash, compute_hash(&pair[0]));
        }
        assert!(validate_chain(&chain).is_ok());
    }

    #[tokio::test]
    async fn seal_accepts_unchecked_proof() {
        let ledger = Ledger::new();
        let block = ledger.seal_block(7).await;
        assert_eq!(block.proof, 7);
        assert!(block.transactions.is_empty());
        assert!(matches!(ledger.validate().await, Err(LedgerError::InvalidChain(_))));
    }

    #[tokio::test]
    async fn reads_are_idempotent() {
        let ledger = Ledger::new();
        ledger.submit_transaction("Alice", "B123", "A1", "2024-05-01").await;
        ledger.seal_block(find_proof(100)).await;
        assert_eq!(ledger.chain().await, ledger.chain().await);
        assert_eq!(ledger.last_block().await, ledger.last_block().await);
    }

    #[tokio::test]
    async fn mine_pending_seals_with_smallest_proof() {
        let ledger = Ledger::new();
        ledger.submit_transaction("Alice", "B123", "A1", "2024-05-01").await;

        let mined = ledger.mine_pending(&ProofSearch::unbounded()).await.unwrap();
        assert_eq!(mined.block.index, 2);
        assert_eq!(mined.block.proof, 35293);
        assert_eq!(mined.outcome.last_proof, 100);
        assert_eq!(ledger.len().await, 2);
        assert!(ledger.validate().await.is_ok());
    }

    #[tokio::test]
    async fn aborted_search_leaves_ledger_untouched() {
        let ledger = Ledger::new();
        ledger.submit_transaction("Alice", "B123", "A1", "2024-05-01").await;

        let search = ProofSearch::unbounded().with_max_attempts(10);
        let err = ledger.mine_pending(&search).await.unwrap_err();
        assert!(matches!(err, LedgerError::ProofSearchAborted { .. }));
        assert_eq!(ledger.len().await, 1);
        assert_eq!(ledger.pending_transactions().await.len(), 1);
    }

    #[test]
    fn audit_detects_tampering() {
        let mut state = LedgerState::new();
        state.submit_transaction(Transaction::new("Alice", "B123", "A1", "2024-05-01"));
        state.seal_block(find_proof(100));
        let mut chain = state.chain().to_vec();
        assert!(validate_chain(&chain).is_ok());

        chain[0].transactions.push(Transaction::new("Mallory", "B123", "A1", "2024-05-01"));
        let Err(LedgerError::InvalidChain(errors)) = validate_chain(&chain) else {
            panic!("tampered chain passed audit");
        };
        assert!(errors.iter().any(|e| e.contains("genesis carries transactions")));
        assert!(errors.iter().any(|e| e.contains("block 2 previous_hash mismatch")));
    }

    #[test]
    fn audit_rejects_empty_chain() {
        assert!(matches!(validate_chain(&[]), Err(LedgerError::InvalidChain(_))));
    }

    #[tokio::test]
    async fn export_writes_external_shape() {
        let ledger = Ledger::new();
        ledger.submit_transaction("Alice", "B123", "A1", "2024-05-01").await;
        ledger.seal_block(find_proof(100)).await;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.json");
        ledger.export_json(&path).await.unwrap();

        let value: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        let blocks = value.as_array().unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1]["index"], 2);
        assert_eq!(blocks[1]["transactions"][0]["holder"], "Alice");
        assert_eq!(blocks[1]["previous_hash"], compute_hash(&ledger.chain().await[0]));
    }

    #[tokio::test]
    async fn chain_size_grows_with_blocks() {
        let ledger = Ledger::new();
        let before = ledger.chain_size_bytes().await;
        ledger.submit_transaction("Alice", "B123", "A1", "2024-05-01").await;
        ledger.seal_block(find_proof(100)).await;
        assert!(ledger.chain_size_bytes().await > before);
        assert_eq!(ledger.sealed_transaction_count().await, 1);
    }
}
