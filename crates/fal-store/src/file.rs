use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard};

use fal_types::{ActorId, Amount, AuditEntry, Timestamp, Transaction, TransactionId};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::journal::{Journal, JournalConfig, StoreEvent};
use crate::memory::{audit_event, insert_event, StoreState};
use crate::traits::RecordStore;

/// Journal-backed record store.
///
/// Every mutation is appended to the [`Journal`] before it is applied to the
/// in-memory state, and the state write lock is held across both steps so
/// journal order always matches apply order. Opening the store replays the
/// journal.
pub struct FileRecordStore {
    journal: Journal,
    state: RwLock<StoreState>,
}

impl FileRecordStore {
    /// Open (or create) a store backed by the journal at `path`.
    ///
    /// Fails with [`StoreError::CorruptJournal`] if an intact frame holds an
    /// event that does not fit the state built so far.
    pub fn open(path: &Path, config: JournalConfig) -> StoreResult<Self> {
        let journal = Journal::open(path, config)?;
        let mut state = StoreState::default();

        let events = journal.recover()?;
        let replayed = events.len();
        for (offset, event) in events {
            state
                .apply(event)
                .map_err(|reason| StoreError::CorruptJournal { offset, reason })?;
        }

        info!(
            path = %path.display(),
            events = replayed,
            transactions = state.transaction_count(),
            "record store opened"
        );

        Ok(Self {
            journal,
            state: RwLock::new(state),
        })
    }

    /// Path to the underlying journal file.
    pub fn path(&self) -> &Path {
        self.journal.path()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, StoreState>> {
        self.state.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn commit(&self, event: StoreEvent) -> StoreResult<bool> {
        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        if !state.admit(&event)? {
            return Ok(false);
        }
        let offset = self.journal.append(&event)?;
        state
            .apply(event)
            .map_err(|reason| StoreError::CorruptJournal { offset, reason })?;
        debug!(offset, "store event committed");
        Ok(true)
    }
}

impl RecordStore for FileRecordStore {
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
        let offset = self.journal.append(&event)?;
        state
            .apply(event)
            .map_err(|reason| StoreError::CorruptJournal { offset, reason })?;
        Ok(id)
    }

    fn audit_trail(&self, id: &TransactionId) -> StoreResult<Vec<AuditEntry>> {
        Ok(self.read()?.audit_trail(id))
    }

    fn transaction_count(&self) -> StoreResult<usize> {
        Ok(self.read()?.transaction_count())
    }
}
