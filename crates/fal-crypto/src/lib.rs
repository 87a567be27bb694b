//! Hashing primitives for the Financial Audit Ledger.
//!
//! Provides the SHA-256 hex digest used for every ledger hash, the single
//! canonical pre-image builder for transactions and blocks, and the
//! full-chain walk that checks back-links and recomputed block hashes.
//!
//! All crypto operations wrap established libraries; there is no custom cryptography.

pub mod chain;
pub mod hasher;
pub mod preimage;

pub use chain::{ChainError, HashChainVerifier};
pub use hasher::{ChainHasher, HasherError, GENESIS_SEED};
pub use preimage::{block_hash, transaction_hash, BlockPreimage, TransactionPreimage};
