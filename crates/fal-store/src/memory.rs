use std::collections::HashMap;
use std::sync::RwLock;

use fal_types::{
    ActorId, Amount, AuditEntry, Timestamp, Transaction, TransactionId, TransactionStatus,
};

use crate::error::{StoreError, StoreResult};
use crate::journal::StoreEvent;
use crate::traits::RecordStore;

/// Materialized store contents shared by every backend.
///
/// Each backend mutates it only through [`StoreState::apply`], so the
/// in-memory store and the journal replay path agree on event semantics.
#[derive(Debug, Default)]
pub(crate) struct StoreState {
    transactions: HashMap<TransactionId, Transaction>,
    audit: Vec<AuditEntry>,
    last_audit_id: u64,
}

impl StoreState {
    /// Whether `event` can be applied. `Ok(false)` means its target is missing.
    pub(crate) fn admit(&self, event: &StoreEvent) -> StoreResult<bool> {
        match event {
            StoreEvent::TransactionInserted { transaction } => {
                if self.transactions.contains_key(&transaction.id) {
                    Err(StoreError::DuplicateTransaction(transaction.id.clone()))
                } else {
                    Ok(true)
                }
            }
            StoreEvent::TransactionUpdated { id, .. }
            | StoreEvent::TransactionVerified { id, .. }
            | StoreEvent::AmountOverwritten { id, .. } => Ok(self.transactions.contains_key(id)),
            StoreEvent::AuditAppended { .. } => Ok(true),
        }
    }

    /// Apply an event. Returns a reason string if it does not fit the state.
    pub(crate) fn apply(&mut self, event: StoreEvent) -> Result<(), String> {
        match event {
            StoreEvent::TransactionInserted { transaction } => {
                if self.transactions.contains_key(&transaction.id) {
                    return Err(format!("duplicate transaction {}", transaction.id));
                }
                self.transactions.insert(transaction.id.clone(), transaction);
            }
            StoreEvent::TransactionUpdated {
                id,
                amount,
                description,
            } => {
                let tx = self.row_mut(&id)?;
                tx.amount = amount;
                tx.description = description;
            }
            StoreEvent::TransactionVerified {
                id,
                verified_by,
                verified_at,
            } => {
                let tx = self.row_mut(&id)?;
                tx.status = TransactionStatus::Verified;
                tx.verified_by = Some(verified_by);
                tx.verified_at = Some(verified_at);
            }
            StoreEvent::AmountOverwritten { id, amount } => {
                self.row_mut(&id)?.amount = amount;
            }
            StoreEvent::AuditAppended { entry } => {
                if entry.id <= self.last_audit_id {
                    return Err(format!(
                        "audit id {} does not follow {}",
                        entry.id, self.last_audit_id
                    ));
                }
                self.last_audit_id = entry.id;
                self.audit.push(entry);
            }
        }
        Ok(())
    }

    fn row_mut(&mut self, id: &TransactionId) -> Result<&mut Transaction, String> {
        self.transactions
            .get_mut(id)
            .ok_or_else(|| format!("unknown transaction {id}"))
    }

    /// Id the next audit entry will receive.
    pub(crate) fn next_audit_id(&self) -> u64 {
        self.last_audit_id + 1
    }

    pub(crate) fn ordered_transactions(&self) -> Vec<Transaction> {
        let mut rows: Vec<Transaction> = self.transactions.values().cloned().collect();
        rows.sort_by(|a, b| {
            a.block_index
                .cmp(&b.block_index)
                .then(a.timestamp.cmp(&b.timestamp))
                .then_with(|| a.id.cmp(&b.id))
        });
        rows
    }

    pub(crate) fn latest_block_index(&self) -> u64 {
        self.transactions
            .values()
            .map(|tx| tx.block_index)
            .max()
            .unwrap_or(0)
    }

    pub(crate) fn transaction(&self, id: &TransactionId) -> Option<Transaction> {
        self.transactions.get(id).cloned()
    }

    pub(crate) fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    pub(crate) fn audit_trail(&self, id: &TransactionId) -> Vec<AuditEntry> {
        self.audit
            .iter()
            .filter(|entry| &entry.transaction_id == id)
            .cloned()
            .collect()
    }
}

/// Build the insert event for a new row, stamping its creator.
pub(crate) fn insert_event(transaction: &Transaction, actor: Option<&ActorId>) -> StoreEvent {
    let mut row = transaction.clone();
    if actor.is_some() {
        row.created_by = actor.cloned();
    }
    StoreEvent::TransactionInserted { transaction: row }
}

/// Build the append event for an audit entry, assigning its id.
pub(crate) fn audit_event(state: &StoreState, entry: &AuditEntry) -> (u64, StoreEvent) {
    let id = state.next_audit_id();
    let mut entry = entry.clone();
    entry.id = id;
    (id, StoreEvent::AuditAppended { entry })
}

/// In-memory, HashMap-based record store.
///
/// Intended for tests and embedding. Contents are lost on drop.
#[derive(Default)]
pub struct InMemoryRecordStore {
    state: RwLock<StoreState>,
}

impl InMemoryRecordStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, StoreState>> {
        self.state.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn commit(&self, event: StoreEvent) -> StoreResult<bool> {
        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        if !state.admit(&event)? {
            return Ok(false);
        }
        state
            .apply(event)
            .map_err(|reason| StoreError::CorruptJournal { offset: 0, reason })?;
        Ok(true)
    }
}

impl RecordStore for InMemoryRecordStore {
    fn all_transactions(&self) -> StoreResult<Vec<Transaction>> {
        Ok(self.read()?.ordered_transactions())
    }

    fn latest_block_index(&self) -> StoreResult<u64> {
        Ok(self.read()?.latest_block_index())
    }

    fn transaction(&self, id: &TransactionId) -> StoreResult<Option<Transaction>> {
        Ok(self.read()?.transaction(id))
    }

    fn insert_transaction(
        &self,
        transaction: &Transaction,
        actor: Option<&ActorId>,
    ) -> StoreResult<()> {
        self.commit(insert_event(transaction, actor)).map(|_| ())
    }

    fn update_transaction(
        &self,
        id: &TransactionId,
        amount: Amount,
        description: &str,
    ) -> StoreResult<bool> {
        self.commit(StoreEvent::TransactionUpdated {
            id: id.clone(),
            amount,
            description: description.to_string(),
        })
    }

    fn mark_verified(
        &self,
        id: &TransactionId,
        actor: &ActorId,
        at: Timestamp,
    ) -> StoreResult<bool> {
        self.commit(StoreEvent::TransactionVerified {
            id: id.clone(),
            verified_by: actor.clone(),
            verified_at: at,
        })
    }

    fn overwrite_amount(&self, id: &TransactionId, amount: Amount) -> StoreResult<bool> {
        self.commit(StoreEvent::AmountOverwritten {
            id: id.clone(),
            amount,
        })
    }

    fn append_audit(&self, entry: &AuditEntry) -> StoreResult<u64> {
        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        let (id, event) = audit_event(&state, entry);
        state
            .apply(event)
            .map_err(|reason| StoreError::CorruptJournal { offset: 0, reason })?;
        Ok(id)
    }

    fn audit_trail(&self, id: &TransactionId) -> StoreResult<Vec<AuditEntry>> {
        Ok(self.read()?.audit_trail(id))
    }

    fn transaction_count(&self) -> StoreResult<usize> {
        Ok(self.read()?.transaction_count())
    }
}
