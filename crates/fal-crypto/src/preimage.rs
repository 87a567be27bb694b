//! Canonical hash pre-images.
//!
//! The concatenation order below is a persisted contract: transaction hashes
//! are stored at creation time and recomputed during integrity checks, so
//! creation and verification must both go through [`TransactionPreimage`].

use fal_types::{Amount, Block, Timestamp, Transaction, TransactionId};

use crate::hasher::{ChainHasher, HasherError};

/// The fields covered by a transaction hash, in hash order.
#[derive(Clone, Copy, Debug)]
pub struct TransactionPreimage<'a> {
    pub id: &'a TransactionId,
    pub amount: Amount,
    pub from: &'a str,
    pub to: &'a str,
    pub description: &'a str,
    pub auditor: &'a str,
    pub timestamp: &'a Timestamp,
    pub block_index: u64,
    pub previous_hash: &'a str,
}

impl TransactionPreimage<'_> {
    /// `id ++ amount ++ from ++ to ++ description ++ auditor ++ timestamp ++
    /// blockIndex ++ previousHash`, each in its display form.
    pub fn render(&self) -> String {
        format!(
            "{}{}{}{}{}{}{}{}{}",
            self.id,
            self.amount,
            self.from,
            self.to,
            self.description,
            self.auditor,
            self.timestamp,
            self.block_index,
            self.previous_hash,
        )
    }

    pub fn hash(&self) -> String {
        ChainHasher::digest(&self.render())
    }
}

impl<'a> From<&'a Transaction> for TransactionPreimage<'a> {
    fn from(tx: &'a Transaction) -> Self {
        Self {
            id: &tx.id,
            amount: tx.amount,
            from: &tx.from,
            to: &tx.to,
            description: &tx.description,
            auditor: &tx.auditor,
            timestamp: &tx.timestamp,
            block_index: tx.block_index,
            previous_hash: &tx.previous_hash,
        }
    }
}

/// Recompute a transaction's hash from its current field values.
pub fn transaction_hash(tx: &Transaction) -> String {
    TransactionPreimage::from(tx).hash()
}

/// The fields covered by a block hash, in hash order.
#[derive(Clone, Copy, Debug)]
pub struct BlockPreimage<'a> {
    pub index: u64,
    pub previous_hash: &'a str,
    pub transactions: &'a [Transaction],
    pub timestamp: &'a Timestamp,
    pub nonce: u64,
}

impl BlockPreimage<'_> {
    /// `index ++ previousHash ++ json(transactions) ++ timestamp ++ nonce`.
    pub fn render(&self) -> Result<String, HasherError> {
        let transactions = serde_json::to_string(self.transactions)
            .map_err(|e| HasherError::Serialization(e.to_string()))?;
        Ok(format!(
            "{}{}{}{}{}",
            self.index, self.previous_hash, transactions, self.timestamp, self.nonce
        ))
    }

    pub fn hash(&self) -> Result<String, HasherError> {
        Ok(ChainHasher::digest(&self.render()?))
    }
}

impl<'a> From<&'a Block> for BlockPreimage<'a> {
    fn from(block: &'a Block) -> Self {
        Self {
            index: block.index,
            previous_hash: &block.previous_hash,
            transactions: &block.transactions,
            timestamp: &block.timestamp,
            nonce: block.nonce,
        }
    }
}

/// Recompute a block's hash from its current contents.
pub fn block_hash(block: &Block) -> Result<String, HasherError> {
    BlockPreimage::from(block).hash()
}
