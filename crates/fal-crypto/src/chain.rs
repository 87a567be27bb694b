use fal_types::Block;

use crate::hasher::HasherError;
use crate::preimage::block_hash;

/// Hash chain integrity verifier.
///
/// Walks adjacent block pairs: each block's `previous_hash` must equal the
/// preceding block's `hash`, and each block's `hash` must equal the hash
/// recomputed from its contents. The walk stops at the first failure. A chain
/// of zero or one block is trivially valid; the genesis block's own hash is a
/// fixed seed digest and is not recomputed.
pub struct HashChainVerifier;

impl HashChainVerifier {
    /// Verify a chain of blocks, reporting the first violation.
    pub fn verify_chain(blocks: &[Block]) -> Result<(), ChainError> {
        for index in 1..blocks.len() {
            let previous = &blocks[index - 1];
            let current = &blocks[index];

            if current.previous_hash != previous.hash {
                return Err(ChainError::BrokenLink { index });
            }

            let computed = block_hash(current).map_err(|e| match e {
                HasherError::Serialization(reason) => {
                    ChainError::Serialization { index, reason }
                }
            })?;
            if computed != current.hash {
                return Err(ChainError::HashMismatch { index });
            }
        }
        Ok(())
    }

    /// `true` if [`verify_chain`](Self::verify_chain) finds no violation.
    pub fn is_valid(blocks: &[Block]) -> bool {
        Self::verify_chain(blocks).is_ok()
    }
}

/// Errors from chain verification.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("broken link at index {index}: previous hash does not match")]
    BrokenLink { index: usize },

    #[error("hash mismatch at index {index}: computed hash differs from stored")]
    HashMismatch { index: usize },

    #[error("block {index} could not be serialized: {reason}")]
    Serialization { index: usize, reason: String },
}

impl ChainError {
    /// Position of the offending block.
    pub fn index(&self) -> usize {
        match self {
            Self::BrokenLink { index }
            | Self::HashMismatch { index }
            | Self::Serialization { index, .. } => *index,
        }
    }
}
