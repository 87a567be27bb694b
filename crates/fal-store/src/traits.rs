use std::sync::Arc;

use fal_types::{ActorId, Amount, AuditEntry, Timestamp, Transaction, TransactionId};

use crate::error::StoreResult;

/// Durable storage for transaction rows and the audit trail.
///
/// All implementations must satisfy these invariants:
/// - Transaction rows are never deleted, and a row's `hash` is never
///   rewritten by any method on this trait.
/// - `all_transactions` is ordered by `block_index` ascending, ties broken by
///   `timestamp`.
/// - Audit entries are append-only; the store assigns each a strictly
///   increasing `id`.
/// - Mutations of a missing transaction return `Ok(false)` rather than an
///   error, leaving the decision to the caller.
pub trait RecordStore: Send + Sync {
    /// Every stored transaction, in chain order.
    fn all_transactions(&self) -> StoreResult<Vec<Transaction>>;

    /// Highest stored `block_index`, or 0 when the store is empty.
    fn latest_block_index(&self) -> StoreResult<u64>;

    /// Read a transaction by id. Returns `Ok(None)` if it does not exist.
    fn transaction(&self, id: &TransactionId) -> StoreResult<Option<Transaction>>;

    /// Persist a new transaction, recording which actor created it.
    ///
    /// Fails with [`StoreError::DuplicateTransaction`](crate::StoreError)
    /// if the id is already stored.
    fn insert_transaction(
        &self,
        transaction: &Transaction,
        actor: Option<&ActorId>,
    ) -> StoreResult<()>;

    /// Overwrite the mutable `amount` and `description` columns of a row.
    /// The stored hash is left untouched.
    fn update_transaction(
        &self,
        id: &TransactionId,
        amount: Amount,
        description: &str,
    ) -> StoreResult<bool>;

    /// Mark a transaction `Verified` by `actor` at `at`.
    fn mark_verified(&self, id: &TransactionId, actor: &ActorId, at: Timestamp)
        -> StoreResult<bool>;

    /// Overwrite only the stored amount, bypassing every ledger check.
    ///
    /// This models a privileged party editing storage directly; it exists to
    /// demonstrate tamper detection.
    fn overwrite_amount(&self, id: &TransactionId, amount: Amount) -> StoreResult<bool>;

    /// Append an audit entry and return the id assigned to it.
    fn append_audit(&self, entry: &AuditEntry) -> StoreResult<u64>;

    /// Audit entries for one transaction, oldest first.
    fn audit_trail(&self, id: &TransactionId) -> StoreResult<Vec<AuditEntry>>;

    /// Number of stored transactions.
    ///
    /// Default implementation counts [`all_transactions`](Self::all_transactions).
    fn transaction_count(&self) -> StoreResult<usize> {
        Ok(self.all_transactions()?.len())
    }
}

impl<T: RecordStore + ?Sized> RecordStore for Arc<T> {
    fn all_transactions(&self) -> StoreResult<Vec<Transaction>> {
        (**self).all_transactions()
    }

    fn latest_block_index(&self) -> StoreResult<u64> {
        (**self).latest_block_index()
    }

    fn transaction(&self, id: &TransactionId) -> StoreResult<Option<Transaction>> {
        (**self).transaction(id)
    }

    fn insert_transaction(
        &self,
        transaction: &Transaction,
        actor: Option<&ActorId>,
    ) -> StoreResult<()> {
        (**self).insert_transaction(transaction, actor)
    }

    fn update_transaction(
        &self,
        id: &TransactionId,
        amount: Amount,
        description: &str,
    ) -> StoreResult<bool> {
        (**self).update_transaction(id, amount, description)
    }

    fn mark_verified(&self, id: &TransactionId, actor: &ActorId, at: Timestamp)
        -> StoreResult<bool> {
        (**self).mark_verified(id, actor, at)
    }

    fn overwrite_amount(&self, id: &TransactionId, amount: Amount) -> StoreResult<bool> {
        (**self).overwrite_amount(id, amount)
    }

    fn append_audit(&self, entry: &AuditEntry) -> StoreResult<u64> {
        (**self).append_audit(entry)
    }

    fn audit_trail(&self, id: &TransactionId) -> StoreResult<Vec<AuditEntry>> {
        (**self).audit_trail(id)
    }

    fn transaction_count(&self) -> StoreResult<usize> {
        (**self).transaction_count()
    }
}
