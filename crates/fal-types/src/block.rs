use serde::{Deserialize, Serialize};

use crate::temporal::Timestamp;
use crate::transaction::Transaction;

/// `previous_hash` of the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// A chain node wrapping zero (genesis) or one transaction.
///
/// `hash` covers `index`, `previous_hash`, the serialized `transactions`,
/// `timestamp` and `nonce`. The nonce is always zero; no proof-of-work is
/// performed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub index: u64,
    pub timestamp: Timestamp,
    pub transactions: Vec<Transaction>,
    pub previous_hash: String,
    pub hash: String,
    pub nonce: u64,
}

impl Block {
    /// Returns `true` for the first block of a chain.
    pub fn is_genesis(&self) -> bool {
        self.index == 0 && self.previous_hash == GENESIS_PREVIOUS_HASH
    }

    /// The wrapped transaction, if any.
    pub fn transaction(&self) -> Option<&Transaction> {
        self.transactions.first()
    }
}
