use super::request::BookingRequest;
use crate::blockchain::{
    Block, Ledger, MinedBlock, ProofOutcome, ProofSearch, Transaction, compute_hash,
};
use crate::error::{LedgerError, Result};
use log::{debug, info};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingReceipt {
    pub block_index: u64,
    pub block_hash: String,
    pub previous_hash: String,
    pub proof: u64,
    pub transaction: Transaction,
}

/// Books tickets one at a time: each accepted booking is mined into its own
/// block before the next one is taken.
///
/// Other holders of the same [`Ledger`] may seal between the submit and the
/// mine. The receipt then names the block that actually holds the booking,
/// which can be earlier than the block this desk mined.
#[derive(Clone)]
pub struct BookingDesk {
    ledger: Ledger,
    search: ProofSearch,
    proof_history: Arc<Mutex<Vec<ProofOutcome>>>,
}

impl BookingDesk {
    pub fn new(ledger: Ledger, search: ProofSearch) -> Self {
        Self {
            ledger,
            search,
            proof_history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub async fn book(&self, request: &BookingRequest) -> Result<BookingReceipt> {
        request.validate()?;

        let mut history = self.proof_history.lock().await;
        let transaction = request.to_transaction();
        self.ledger.add_transaction(transaction.clone()).await;

        let mined = self.ledger.mine_pending(&self.search).await?;
        history.push(mined.outcome);

        let receipt = self.receipt_for(transaction, mined).await?;
        info!(
            "booked {} on bus {} seat {} into block {}",
            receipt.transaction.holder,
            receipt.transaction.resource_id,
            receipt.transaction.sub_resource_id,
            receipt.block_index
        );
        Ok(receipt)
    }

    async fn receipt_for(
        &self,
        transaction: Transaction,
        mined: MinedBlock,
    ) -> Result<BookingReceipt> {
        let block = if mined.block.transactions.contains(&transaction) {
            mined.block
        } else {
            let chain = self.ledger.chain().await;
            let sealed_by_other = chain
                .into_iter()
                .rev()
                .find(|b| b.transactions.contains(&transaction));
            match sealed_by_other {
                Some(block) => {
                    debug!(
                        "booking for {} was sealed into block {} by another writer",
                        transaction.holder, block.index
                    );
                    block
                }
                None => return Err(LedgerError::BookingLost(transaction.holder)),
            }
        };
        Ok(receipt_from_block(&block, transaction))
    }

    pub async fn proof_history(&self) -> Vec<ProofOutcome> {
        self.proof_history.lock().await.clone()
    }
}

fn receipt_from_block(block: &Block, transaction: Transaction) -> BookingReceipt {
    BookingReceipt {
        block_index: block.index,
        block_hash: compute_hash(block),
        previous_hash: block.previous_hash.clone(),
        proof: block.proof,
        transaction,
    }
}
