use sha2::{Digest, Sha256};

/// Input hashed to produce the genesis block's hash.
pub const GENESIS_SEED: &str = "genesis_block";

/// SHA-256 digest over UTF-8 text, hex encoded.
///
/// No salt, no key, no domain tag: the digest is a pure function of the
/// input string. Hashes produced here are persisted alongside transactions
/// and must stay reproducible byte-for-byte.
pub struct ChainHasher;

impl ChainHasher {
    /// Hash a string and return 64 lowercase hex characters.
    pub fn digest(input: &str) -> String {
        hex::encode(Self::raw_digest(input.as_bytes()))
    }

    /// Check that `input` hashes to `expected`.
    pub fn verify(input: &str, expected: &str) -> bool {
        Self::digest(input).eq_ignore_ascii_case(expected)
    }

    /// The hash carried by every genesis block.
    pub fn genesis_hash() -> String {
        Self::digest(GENESIS_SEED)
    }

    /// Raw SHA-256 over bytes.
    pub fn raw_digest(data: &[u8]) -> [u8; 32] {
        Sha256::digest(data).into()
    }
}

/// Errors from hashing operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HasherError {
    #[error("serialization error: {0}")]
    Serialization(String),
}
