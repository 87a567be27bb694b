use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use fal_crypto::{block_hash, transaction_hash, ChainError, ChainHasher, HashChainVerifier};
use fal_types::{
    Block, Timestamp, Transaction, TransactionFields, TransactionId, TransactionStatus,
    GENESIS_PREVIOUS_HASH,
};
use serde::Serialize;
use tracing::debug;

use crate::error::LedgerError;

/// Summary of the in-memory chain.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainInfo {
    /// Number of blocks, genesis included.
    pub length: usize,
    pub is_valid: bool,
    /// Number of wrapped transactions (blocks after genesis).
    pub total_transactions: usize,
    pub latest_block: Block,
}

/// The block that starts every chain.
pub fn genesis_block() -> Block {
    Block {
        index: 0,
        timestamp: Timestamp::now(),
        transactions: Vec::new(),
        previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
        hash: ChainHasher::genesis_hash(),
        nonce: 0,
    }
}

/// In-memory hash chain of single-transaction blocks.
///
/// The block list sits behind a `RwLock`: reads run concurrently and the
/// read-latest/compute/push sequence of an append runs under the write lock,
/// so two appends can never link to the same predecessor.
pub struct Chain {
    blocks: RwLock<Vec<Block>>,
}

impl Chain {
    /// A chain holding only the genesis block.
    pub fn new() -> Self {
        Self {
            blocks: RwLock::new(vec![genesis_block()]),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Block>>, LedgerError> {
        self.blocks.read().map_err(|_| LedgerError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<Block>>, LedgerError> {
        self.blocks.write().map_err(|_| LedgerError::LockPoisoned)
    }

    /// Build a hashed transaction linked to the current latest block.
    ///
    /// Pure construction: the chain is not modified. `block_index` defaults
    /// to the current chain length.
    pub fn create_transaction(
        &self,
        fields: TransactionFields,
        block_index: Option<u64>,
    ) -> Result<Transaction, LedgerError> {
        let blocks = self.read()?;
        let previous_hash = blocks
            .last()
            .map(|b| b.hash.clone())
            .unwrap_or_else(ChainHasher::genesis_hash);
        let block_index = block_index.unwrap_or(blocks.len() as u64);
        drop(blocks);

        let mut tx = Transaction {
            id: TransactionId::generate(),
            amount: fields.amount,
            from: fields.from,
            to: fields.to,
            description: fields.description,
            auditor: fields.auditor,
            timestamp: Timestamp::now(),
            block_index,
            previous_hash,
            hash: String::new(),
            status: TransactionStatus::Pending,
            verified_by: None,
            verified_at: None,
            created_by: None,
        };
        tx.hash = transaction_hash(&tx);
        Ok(tx)
    }

    /// Wrap `transaction` in a new block after the latest one.
    pub fn append_transaction(&self, transaction: Transaction) -> Result<Block, LedgerError> {
        let mut blocks = self.write()?;
        let previous_hash = blocks
            .last()
            .map(|b| b.hash.clone())
            .unwrap_or_else(ChainHasher::genesis_hash);

        let mut block = Block {
            index: blocks.len() as u64,
            timestamp: Timestamp::now(),
            transactions: vec![transaction],
            previous_hash,
            hash: String::new(),
            nonce: 0,
        };
        block.hash = block_hash(&block)?;
        blocks.push(block.clone());

        debug!(index = block.index, hash = %block.hash, "block appended");
        Ok(block)
    }

    pub fn latest_block(&self) -> Result<Block, LedgerError> {
        let blocks = self.read()?;
        Ok(blocks.last().cloned().unwrap_or_else(genesis_block))
    }

    /// Number of blocks, genesis included.
    pub fn len(&self) -> Result<usize, LedgerError> {
        Ok(self.read()?.len())
    }

    /// First link or hash failure, if any.
    pub fn first_violation(&self) -> Result<Option<ChainError>, LedgerError> {
        let blocks = self.read()?;
        Ok(HashChainVerifier::verify_chain(&blocks).err())
    }

    /// `true` if every adjacent pair links and every block hash recomputes.
    pub fn validate(&self) -> Result<bool, LedgerError> {
        Ok(self.first_violation()?.is_none())
    }

    /// Snapshot of every block.
    pub fn blocks(&self) -> Result<Vec<Block>, LedgerError> {
        Ok(self.read()?.clone())
    }

    /// Every wrapped transaction, in chain order.
    pub fn transactions(&self) -> Result<Vec<Transaction>, LedgerError> {
        let blocks = self.read()?;
        Ok(blocks
            .iter()
            .flat_map(|b| b.transactions.iter().cloned())
            .collect())
    }

    pub fn info(&self) -> Result<ChainInfo, LedgerError> {
        let blocks = self.read()?;
        let latest_block = blocks.last().cloned().unwrap_or_else(genesis_block);
        Ok(ChainInfo {
            length: blocks.len(),
            is_valid: HashChainVerifier::is_valid(&blocks),
            total_transactions: blocks.iter().map(|b| b.transactions.len()).sum(),
            latest_block,
        })
    }

    #[cfg(test)]
    pub(crate) fn tamper_block(&self, index: usize, f: impl FnOnce(&mut Block)) {
        let mut blocks = self.blocks.write().unwrap();
        f(&mut blocks[index]);
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}
