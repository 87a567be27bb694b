use fal_store::StoreError;
use fal_types::TransactionId;

/// Errors produced by ledger operations.
///
/// An integrity mismatch is not an error: it is reported through
/// [`IntegrityReport`](crate::IntegrityReport).
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Malformed or out-of-range input, rejected before any hashing.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("transaction not found: {0}")]
    NotFound(TransactionId),

    #[error("transaction already verified: {0}")]
    AlreadyVerified(TransactionId),

    #[error("invalid transaction id: {0}")]
    InvalidTransactionId(String),

    /// Strict replay found persisted rows that no longer match their hashes.
    #[error("{} persisted transaction(s) fail their own hash on replay", ids.len())]
    TamperedOnReplay { ids: Vec<TransactionId> },

    #[error("chain lock poisoned")]
    LockPoisoned,

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl From<fal_types::TypeError> for LedgerError {
    fn from(err: fal_types::TypeError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<fal_crypto::HasherError> for LedgerError {
    fn from(err: fal_crypto::HasherError) -> Self {
        Self::Serialization(err.to_string())
    }
}
