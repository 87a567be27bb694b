use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

use fal_store::RecordStore;
use fal_types::{
    ActorId, Amount, AuditAction, AuditEntry, Block, Timestamp, Transaction, TransactionFields,
    TransactionId, TransactionStatus,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::chain::{Chain, ChainInfo};
use crate::error::LedgerError;
use crate::integrity::IntegrityReport;
use crate::replay::{ReplayEngine, ReplayMode, ReplayReport};
use crate::validation::{AmendmentDraft, TransactionDraft};

/// Name recorded as the performer of a simulated storage edit.
pub const UNKNOWN_ACTOR: &str = "UNKNOWN_ACTOR";

/// Who is acting on the ledger: a stable id plus a display name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    pub id: ActorId,
    pub name: String,
}

impl Actor {
    pub fn new(id: impl Into<ActorId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Result of an amendment.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmendmentOutcome {
    /// The original row after its amount and description were updated.
    /// Its stored hash is unchanged.
    pub original: Transaction,
    /// The correcting transaction appended to the chain.
    pub amendment: Transaction,
    pub block: Block,
}

/// Chain health as seen by `/api/health`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub is_valid: bool,
    pub blocks: usize,
    pub transactions: usize,
    pub stored_transactions: usize,
    /// Rows flagged during startup replay.
    pub replay_mismatches: usize,
    pub timestamp: Timestamp,
}

/// The audit ledger service.
///
/// Owns the in-memory [`Chain`] and the record store and keeps them in step.
/// Every mutating operation runs under one append lock, so "read next index,
/// create, persist, append" is never interleaved; a failed persist leaves no
/// block behind. Read operations do not take the append lock.
pub struct AuditLedger<S> {
    store: S,
    chain: Chain,
    append_lock: Mutex<()>,
    replay: ReplayReport,
}

impl<S: RecordStore> AuditLedger<S> {
    /// Rebuild the chain from `store` and wrap both.
    pub fn open(store: S, mode: ReplayMode) -> Result<Self, LedgerError> {
        let (chain, replay) = ReplayEngine::rebuild(&store, mode)?;
        Ok(Self {
            store,
            chain,
            append_lock: Mutex::new(()),
            replay,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    /// Findings of the startup replay.
    pub fn replay_report(&self) -> &ReplayReport {
        &self.replay
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>, LedgerError> {
        self.append_lock.lock().map_err(|_| LedgerError::LockPoisoned)
    }

    fn existing(&self, id: &TransactionId) -> Result<Transaction, LedgerError> {
        self.store
            .transaction(id)?
            .ok_or_else(|| LedgerError::NotFound(id.clone()))
    }

    /// Persist and chain one transaction. Caller holds the append lock.
    fn commit(
        &self,
        mut tx: Transaction,
        actor: &ActorId,
    ) -> Result<(Transaction, Block), LedgerError> {
        tx.created_by = Some(actor.clone());
        self.store.insert_transaction(&tx, Some(actor))?;
        let block = self.chain.append_transaction(tx.clone())?;
        Ok((tx, block))
    }

    /// Validate, create, persist and chain a new transaction.
    ///
    /// Its block index is one past the highest persisted index, so ordering
    /// survives restarts.
    pub fn record_transaction(
        &self,
        draft: &TransactionDraft,
        actor: &Actor,
    ) -> Result<Transaction, LedgerError> {
        let fields = draft.validate()?;

        let _guard = self.lock()?;
        let block_index = self.store.latest_block_index()? + 1;
        let tx = self.chain.create_transaction(fields, Some(block_index))?;
        let (tx, block) = self.commit(tx, &actor.id)?;

        self.store.append_audit(
            &AuditEntry::new(tx.id.clone(), AuditAction::Created, actor.name.clone())
                .with_new_data(to_json(&tx)?)
                .with_actor(Some(actor.id.clone())),
        )?;

        info!(transaction = %tx.id, block = block.index, amount = %tx.amount, "transaction recorded");
        Ok(tx)
    }

    /// Correct a transaction by appending an amendment.
    ///
    /// A new transaction carrying the correction is chained at the current
    /// chain length. Only once it is persisted and chained are the original
    /// row's amount and description updated in the store, immediately
    /// followed by the `UPDATED` audit entry. The original's hash is not
    /// recomputed and its block is untouched. A failed insert leaves the
    /// original row as it was.
    pub fn amend_transaction(
        &self,
        id: &TransactionId,
        draft: &AmendmentDraft,
        actor: &Actor,
    ) -> Result<AmendmentOutcome, LedgerError> {
        let amendment = draft.validate()?;

        let _guard = self.lock()?;
        let old = self.existing(id)?;

        let fields = TransactionFields {
            amount: amendment.amount,
            from: old.from.clone(),
            to: old.to.clone(),
            description: format!("[AMENDMENT] {} (Ref: {})", amendment.description, id),
            auditor: actor.name.clone(),
        };
        let block_index = self.chain.len()? as u64;
        let created = self.chain.create_transaction(fields, Some(block_index))?;
        let (created, block) = self.commit(created, &actor.id)?;

        if !self
            .store
            .update_transaction(id, amendment.amount, &amendment.description)?
        {
            return Err(LedgerError::NotFound(id.clone()));
        }
        let mut updated = old.clone();
        updated.amount = amendment.amount;
        updated.description = amendment.description;

        self.store.append_audit(
            &AuditEntry::new(id.clone(), AuditAction::Updated, actor.name.clone())
                .with_old_data(to_json(&old)?)
                .with_new_data(to_json(&updated)?)
                .with_actor(Some(actor.id.clone())),
        )?;
        self.store.append_audit(
            &AuditEntry::new(created.id.clone(), AuditAction::Created, actor.name.clone())
                .with_new_data(to_json(&created)?)
                .with_actor(Some(actor.id.clone())),
        )?;

        info!(
            transaction = %id,
            amendment = %created.id,
            block = block.index,
            "transaction amended"
        );
        Ok(AmendmentOutcome {
            original: updated,
            amendment: created,
            block,
        })
    }

    /// Move a transaction from `Pending` to `Verified`. Allowed once.
    pub fn verify_transaction(
        &self,
        id: &TransactionId,
        actor: &Actor,
    ) -> Result<Transaction, LedgerError> {
        let _guard = self.lock()?;
        let tx = self.existing(id)?;
        if tx.is_verified() {
            return Err(LedgerError::AlreadyVerified(id.clone()));
        }

        let at = Timestamp::now();
        if !self.store.mark_verified(id, &actor.id, at)? {
            return Err(LedgerError::NotFound(id.clone()));
        }
        self.store.append_audit(
            &AuditEntry::new(id.clone(), AuditAction::Verified, actor.name.clone())
                .with_old_data(json!({ "status": TransactionStatus::Pending }))
                .with_new_data(json!({ "status": TransactionStatus::Verified }))
                .with_actor(Some(actor.id.clone())),
        )?;

        info!(transaction = %id, by = %actor.id, "transaction verified");
        Ok(Transaction {
            status: TransactionStatus::Verified,
            verified_by: Some(actor.id.clone()),
            verified_at: Some(at),
            ..tx
        })
    }

    /// Overwrite a stored amount behind the chain's back.
    ///
    /// Demonstrates tamper detection: the stored hash is left stale, so
    /// [`verify_integrity`](Self::verify_integrity) reports the row invalid
    /// afterwards. The audit entry is attributed to [`UNKNOWN_ACTOR`].
    pub fn simulate_tamper(
        &self,
        id: &TransactionId,
        amount: Option<f64>,
        requested_by: Option<&ActorId>,
    ) -> Result<(), LedgerError> {
        let amount = match amount {
            Some(value) if value != 0.0 => Amount::from_stored(value)?,
            _ => return Err(LedgerError::Validation("new amount required".into())),
        };

        let _guard = self.lock()?;
        if !self.store.overwrite_amount(id, amount)? {
            return Err(LedgerError::NotFound(id.clone()));
        }
        self.store.append_audit(
            &AuditEntry::new(id.clone(), AuditAction::UnauthorizedEdit, UNKNOWN_ACTOR)
                .with_new_data(json!({ "amount": amount }))
                .with_actor(requested_by.cloned()),
        )?;

        warn!(transaction = %id, amount = %amount, "stored amount overwritten without rehashing");
        Ok(())
    }

    /// Recompute a persisted transaction's hash from its stored fields.
    pub fn verify_integrity(&self, id: &TransactionId) -> Result<IntegrityReport, LedgerError> {
        let tx = self.existing(id)?;
        Ok(IntegrityReport::check(&tx))
    }

    pub fn chain_info(&self) -> Result<ChainInfo, LedgerError> {
        self.chain.info()
    }

    /// Transactions as held by the in-memory chain.
    pub fn chain_transactions(&self) -> Result<Vec<Transaction>, LedgerError> {
        self.chain.transactions()
    }

    pub fn full_chain(&self) -> Result<Vec<Block>, LedgerError> {
        self.chain.blocks()
    }

    /// Transactions as currently persisted, in chain order.
    pub fn transactions(&self) -> Result<Vec<Transaction>, LedgerError> {
        Ok(self.store.all_transactions()?)
    }

    pub fn transaction(&self, id: &TransactionId) -> Result<Transaction, LedgerError> {
        self.existing(id)
    }

    /// Audit entries for a transaction, oldest first.
    pub fn audit_trail(&self, id: &TransactionId) -> Result<Vec<AuditEntry>, LedgerError> {
        if !id.is_well_formed() {
            return Err(LedgerError::InvalidTransactionId(id.to_string()));
        }
        self.existing(id)?;
        Ok(self.store.audit_trail(id)?)
    }

    /// Distinct auditor names, sorted.
    pub fn auditors(&self) -> Result<Vec<String>, LedgerError> {
        let names: BTreeSet<String> = self
            .store
            .all_transactions()?
            .into_iter()
            .map(|tx| tx.auditor)
            .filter(|name| !name.is_empty())
            .collect();
        Ok(names.into_iter().collect())
    }

    pub fn health(&self) -> Result<HealthReport, LedgerError> {
        let info = self.chain.info()?;
        Ok(HealthReport {
            is_valid: info.is_valid,
            blocks: info.length,
            transactions: info.total_transactions,
            stored_transactions: self.store.transaction_count()?,
            replay_mismatches: self.replay.mismatched.len(),
            timestamp: Timestamp::now(),
        })
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, LedgerError> {
    serde_json::to_value(value).map_err(|e| LedgerError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fal_crypto::{transaction_hash, ChainHasher};
    use fal_store::{FileRecordStore, InMemoryRecordStore, JournalConfig, StoreError};
    use std::sync::Arc;

    fn ledger() -> AuditLedger<InMemoryRecordStore> {
        AuditLedger::open(InMemoryRecordStore::new(), ReplayMode::Flag).unwrap()
    }

    fn alice() -> Actor {
        Actor::new("u-alice", "Alice")
    }

    fn manager() -> Actor {
        Actor::new("u-mgr", "Morgan")
    }

    fn draft() -> TransactionDraft {
        TransactionDraft::new(100.0, "A", "B", "test", "aud1")
    }

    #[test]
    fn first_record_links_to_genesis_and_self_verifies() {
        let ledger = ledger();
        let tx = ledger.record_transaction(&draft(), &alice()).unwrap();

        assert_eq!(tx.block_index, 1);
        assert_eq!(tx.previous_hash, ChainHasher::genesis_hash());
        assert_eq!(transaction_hash(&tx), tx.hash);
        assert_eq!(tx.created_by, Some(ActorId::new("u-alice")));
        assert!(ledger.verify_integrity(&tx.id).unwrap().is_valid);

        let trail = ledger.audit_trail(&tx.id).unwrap();
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].action, AuditAction::Created);
        assert_eq!(trail[0].performed_by, "Alice");
        assert_eq!(trail[0].new_data.as_ref().unwrap()["hash"], tx.hash.as_str());
    }

    #[test]
    fn invalid_draft_changes_nothing() {
        let ledger = ledger();
        let mut bad = draft();
        bad.to = "a".into();
        assert!(matches!(
            ledger.record_transaction(&bad, &alice()),
            Err(LedgerError::Validation(_))
        ));
        assert_eq!(ledger.chain_info().unwrap().length, 1);
        assert!(ledger.transactions().unwrap().is_empty());
    }

    #[test]
    fn block_indices_follow_persisted_maximum() {
        let ledger = ledger();
        let a = ledger.record_transaction(&draft(), &alice()).unwrap();
        let b = ledger.record_transaction(&draft(), &alice()).unwrap();
        assert_eq!((a.block_index, b.block_index), (1, 2));
        assert_eq!(b.previous_hash, ledger.full_chain().unwrap()[1].hash);
    }

    #[test]
    fn amendment_keeps_original_hash_and_appends_block() {
        let ledger = ledger();
        let original = ledger.record_transaction(&draft(), &alice()).unwrap();
        let length_before = ledger.chain_info().unwrap().length;

        let outcome = ledger
            .amend_transaction(&original.id, &AmendmentDraft::new(200.0, "fixed"), &alice())
            .unwrap();

        let stored = ledger.transaction(&original.id).unwrap();
        assert_eq!(stored.hash, original.hash);
        assert_eq!(stored.amount.value(), 200.0);
        assert_eq!(stored.description, "fixed");
        assert_eq!(outcome.original, stored);

        assert_eq!(outcome.amendment.block_index, length_before as u64);
        assert_eq!(outcome.amendment.from, "A");
        assert_eq!(outcome.amendment.to, "B");
        assert_eq!(outcome.amendment.auditor, "Alice");
        assert_eq!(
            outcome.amendment.description,
            format!("[AMENDMENT] fixed (Ref: {})", original.id)
        );
        assert_eq!(ledger.chain_info().unwrap().length, length_before + 1);

        let ids: Vec<TransactionId> =
            ledger.transactions().unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![original.id.clone(), outcome.amendment.id.clone()]);

        // The amended row no longer reproduces its hash; the amendment does.
        assert!(!ledger.verify_integrity(&original.id).unwrap().is_valid);
        assert!(ledger.verify_integrity(&outcome.amendment.id).unwrap().is_valid);
        assert!(ledger.chain_info().unwrap().is_valid);

        let trail = ledger.audit_trail(&original.id).unwrap();
        assert_eq!(trail.last().unwrap().action, AuditAction::Updated);
        let updated = trail.last().unwrap();
        assert_eq!(updated.old_data.as_ref().unwrap()["amount"], 100);
        assert_eq!(updated.new_data.as_ref().unwrap()["amount"], 200);
        assert_eq!(
            ledger.audit_trail(&outcome.amendment.id).unwrap()[0].action,
            AuditAction::Created
        );
    }

    /// Store that refuses every transaction insert once `limit` have landed.
    struct InsertLimited {
        inner: InMemoryRecordStore,
        limit: usize,
    }

    impl RecordStore for InsertLimited {
        fn all_transactions(&self) -> fal_store::StoreResult<Vec<Transaction>> {
            self.inner.all_transactions()
        }

        fn latest_block_index(&self) -> fal_store::StoreResult<u64> {
            self.inner.latest_block_index()
        }

        fn transaction(&self, id: &TransactionId) -> fal_store::StoreResult<Option<Transaction>> {
            self.inner.transaction(id)
        }

        fn insert_transaction(
            &self,
            transaction: &Transaction,
            actor: Option<&ActorId>,
        ) -> fal_store::StoreResult<()> {
            if self.inner.transaction_count()? >= self.limit {
                return Err(StoreError::Io(std::io::Error::other("disk full")));
            }
            self.inner.insert_transaction(transaction, actor)
        }

        fn update_transaction(
            &self,
            id: &TransactionId,
            amount: Amount,
            description: &str,
        ) -> fal_store::StoreResult<bool> {
            self.inner.update_transaction(id, amount, description)
        }

        fn mark_verified(
            &self,
            id: &TransactionId,
            actor: &ActorId,
            at: Timestamp,
        ) -> fal_store::StoreResult<bool> {
            self.inner.mark_verified(id, actor, at)
        }

        fn overwrite_amount(&self, id: &TransactionId, amount: Amount) -> fal_store::StoreResult<bool> {
            self.inner.overwrite_amount(id, amount)
        }

        fn append_audit(&self, entry: &AuditEntry) -> fal_store::StoreResult<u64> {
            self.inner.append_audit(entry)
        }

        fn audit_trail(&self, id: &TransactionId) -> fal_store::StoreResult<Vec<AuditEntry>> {
            self.inner.audit_trail(id)
        }
    }

    #[test]
    fn failed_amendment_insert_leaves_original_untouched() {
        let store = Arc::new(InsertLimited {
            inner: InMemoryRecordStore::new(),
            limit: 1,
        });
        let ledger = AuditLedger::open(Arc::clone(&store), ReplayMode::Flag).unwrap();
        let original = ledger.record_transaction(&draft(), &alice()).unwrap();

        let err = ledger
            .amend_transaction(&original.id, &AmendmentDraft::new(200.0, "fixed"), &alice())
            .unwrap_err();
        assert!(matches!(err, LedgerError::Store(StoreError::Io(_))));

        let stored = ledger.transaction(&original.id).unwrap();
        assert_eq!(stored, original);
        assert!(ledger.verify_integrity(&original.id).unwrap().is_valid);
        assert_eq!(ledger.chain_info().unwrap().length, 2);
        let actions: Vec<AuditAction> = ledger
            .audit_trail(&original.id)
            .unwrap()
            .into_iter()
            .map(|e| e.action)
            .collect();
        assert_eq!(actions, vec![AuditAction::Created]);

        let reopened = AuditLedger::open(store, ReplayMode::Strict).unwrap();
        assert!(reopened.replay_report().is_clean());
        assert!(reopened.replay_report().amended.is_empty());
    }

    #[test]
    fn amending_unknown_transaction_is_not_found() {
        let ledger = ledger();
        let err = ledger
            .amend_transaction(
                &TransactionId::new("tx_0_missing00"),
                &AmendmentDraft::new(1.0, "x"),
                &alice(),
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));
        assert_eq!(ledger.chain_info().unwrap().length, 1);
    }

    #[test]
    fn verification_happens_once() {
        let ledger = ledger();
        let tx = ledger.record_transaction(&draft(), &alice()).unwrap();

        let verified = ledger.verify_transaction(&tx.id, &manager()).unwrap();
        assert!(verified.is_verified());
        assert_eq!(verified.verified_by, Some(ActorId::new("u-mgr")));
        assert!(ledger.transaction(&tx.id).unwrap().is_verified());

        assert!(matches!(
            ledger.verify_transaction(&tx.id, &manager()),
            Err(LedgerError::AlreadyVerified(_))
        ));

        let trail = ledger.audit_trail(&tx.id).unwrap();
        let entry = trail.last().unwrap();
        assert_eq!(entry.action, AuditAction::Verified);
        assert_eq!(entry.old_data, Some(json!({ "status": "Pending" })));
        assert_eq!(entry.new_data, Some(json!({ "status": "Verified" })));

        // Status is outside the hash.
        assert!(ledger.verify_integrity(&tx.id).unwrap().is_valid);
    }

    #[test]
    fn verifying_unknown_transaction_is_not_found() {
        let ledger = ledger();
        assert!(matches!(
            ledger.verify_transaction(&TransactionId::new("tx_1_nothere00"), &manager()),
            Err(LedgerError::NotFound(_))
        ));
    }

    #[test]
    fn tamper_is_detected_but_chain_stays_valid() {
        let ledger = ledger();
        let tx = ledger.record_transaction(&draft(), &alice()).unwrap();
        ledger
            .simulate_tamper(&tx.id, Some(1_000_000.0), Some(&ActorId::new("u-admin")))
            .unwrap();

        let report = ledger.verify_integrity(&tx.id).unwrap();
        assert!(!report.is_valid);
        assert_eq!(report.stored_hash, tx.hash);
        assert_ne!(report.calculated_hash, tx.hash);
        assert!(ledger.chain_info().unwrap().is_valid);

        let entry = ledger.audit_trail(&tx.id).unwrap().pop().unwrap();
        assert_eq!(entry.action, AuditAction::UnauthorizedEdit);
        assert_eq!(entry.performed_by, UNKNOWN_ACTOR);
        assert_eq!(entry.old_data, None);
        assert_eq!(entry.new_data, Some(json!({ "amount": 1_000_000 })));
        assert_eq!(entry.actor_id, Some(ActorId::new("u-admin")));
    }

    #[test]
    fn tamper_requires_amount_and_existing_row() {
        let ledger = ledger();
        let tx = ledger.record_transaction(&draft(), &alice()).unwrap();
        assert!(matches!(
            ledger.simulate_tamper(&tx.id, None, None),
            Err(LedgerError::Validation(_))
        ));
        assert!(matches!(
            ledger.simulate_tamper(&tx.id, Some(0.0), None),
            Err(LedgerError::Validation(_))
        ));
        assert!(matches!(
            ledger.simulate_tamper(&TransactionId::new("tx_9_zzzzzzzzz"), Some(5.0), None),
            Err(LedgerError::NotFound(_))
        ));
    }

    #[test]
    fn audit_trail_checks_id_shape_then_existence() {
        let ledger = ledger();
        assert!(matches!(
            ledger.audit_trail(&TransactionId::new("abc")),
            Err(LedgerError::InvalidTransactionId(_))
        ));
        assert!(matches!(
            ledger.audit_trail(&TransactionId::new("tx_123_missing")),
            Err(LedgerError::NotFound(_))
        ));
    }

    #[test]
    fn auditors_are_distinct_and_sorted() {
        let ledger = ledger();
        for name in ["zed", "amy", "zed", "bob"] {
            let mut d = draft();
            d.auditor = name.into();
            ledger.record_transaction(&d, &alice()).unwrap();
        }
        assert_eq!(ledger.auditors().unwrap(), vec!["amy", "bob", "zed"]);
    }

    #[test]
    fn health_reports_chain_and_store_counts() {
        let ledger = ledger();
        ledger.record_transaction(&draft(), &alice()).unwrap();
        let health = ledger.health().unwrap();
        assert!(health.is_valid);
        assert_eq!(health.blocks, 2);
        assert_eq!(health.transactions, 1);
        assert_eq!(health.stored_transactions, 1);
        assert_eq!(health.replay_mismatches, 0);
        assert_eq!(ledger.chain_transactions().unwrap().len(), 1);
    }

    #[test]
    fn restart_rebuilds_chain_of_k_plus_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.journal");
        let first_id;
        {
            let store = FileRecordStore::open(&path, JournalConfig::default()).unwrap();
            let ledger = AuditLedger::open(store, ReplayMode::Strict).unwrap();
            first_id = ledger.record_transaction(&draft(), &alice()).unwrap().id;
            ledger.record_transaction(&draft(), &alice()).unwrap();
            ledger.record_transaction(&draft(), &alice()).unwrap();
        }

        let store = FileRecordStore::open(&path, JournalConfig::default()).unwrap();
        let ledger = AuditLedger::open(store, ReplayMode::Strict).unwrap();
        let info = ledger.chain_info().unwrap();
        assert_eq!(info.length, 4);
        assert_eq!(info.total_transactions, 3);
        assert!(info.is_valid);
        assert!(ledger.replay_report().is_clean());

        let next = ledger.record_transaction(&draft(), &alice()).unwrap();
        assert_eq!(next.block_index, 4);
        assert_eq!(ledger.audit_trail(&first_id).unwrap().len(), 1);
    }

    #[test]
    fn restart_after_tamper_flags_the_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.journal");
        let id;
        {
            let store = FileRecordStore::open(&path, JournalConfig::default()).unwrap();
            let ledger = AuditLedger::open(store, ReplayMode::Flag).unwrap();
            id = ledger.record_transaction(&draft(), &alice()).unwrap().id;
            ledger.simulate_tamper(&id, Some(7.0), None).unwrap();
        }

        let store = FileRecordStore::open(&path, JournalConfig::default()).unwrap();
        let ledger = AuditLedger::open(store, ReplayMode::Flag).unwrap();
        assert_eq!(ledger.replay_report().mismatched, vec![id.clone()]);
        assert_eq!(ledger.health().unwrap().replay_mismatches, 1);

        let store = FileRecordStore::open(&path, JournalConfig::default()).unwrap();
        assert!(matches!(
            AuditLedger::open(store, ReplayMode::Strict),
            Err(LedgerError::TamperedOnReplay { .. })
        ));
    }

    #[test]
    fn strict_restart_accepts_amended_rows() {
        let store = Arc::new(InMemoryRecordStore::new());
        let original = {
            let ledger = AuditLedger::open(Arc::clone(&store), ReplayMode::Strict).unwrap();
            let tx = ledger.record_transaction(&draft(), &alice()).unwrap();
            ledger
                .amend_transaction(&tx.id, &AmendmentDraft::new(150.0, "late fee"), &alice())
                .unwrap();
            tx
        };

        let ledger = AuditLedger::open(store, ReplayMode::Strict).unwrap();
        assert_eq!(ledger.replay_report().amended, vec![original.id]);
        assert_eq!(ledger.chain_info().unwrap().length, 3);
    }

    #[test]
    fn concurrent_records_get_distinct_indices() {
        let ledger = Arc::new(ledger());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                std::thread::spawn(move || {
                    for _ in 0..5 {
                        ledger.record_transaction(&draft(), &alice()).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let indices: Vec<u64> = ledger
            .transactions()
            .unwrap()
            .into_iter()
            .map(|t| t.block_index)
            .collect();
        assert_eq!(indices, (1..=20).collect::<Vec<u64>>());
        assert!(ledger.chain_info().unwrap().is_valid);
    }
}
