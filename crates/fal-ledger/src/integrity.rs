use fal_crypto::transaction_hash;
use fal_types::Transaction;
use serde::Serialize;

/// Outcome of recomputing a persisted transaction's hash.
///
/// `is_valid == false` is the expected signal of tampering, not an error.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityReport {
    pub is_valid: bool,
    pub stored_hash: String,
    pub calculated_hash: String,
}

impl IntegrityReport {
    /// Recompute `transaction`'s hash from its current field values and
    /// compare it with the hash stored alongside them.
    pub fn check(transaction: &Transaction) -> Self {
        let calculated_hash = transaction_hash(transaction);
        Self {
            is_valid: calculated_hash == transaction.hash,
            stored_hash: transaction.hash.clone(),
            calculated_hash,
        }
    }
}
