use fal_store::RecordStore;
use fal_types::{AuditAction, Transaction, TransactionId};
use serde::Serialize;
use tracing::{info, warn};

use crate::chain::Chain;
use crate::error::LedgerError;
use crate::integrity::IntegrityReport;

/// How replay treats persisted rows that no longer reproduce their hash.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReplayMode {
    /// Rebuild from current storage content and report the mismatches.
    #[default]
    Flag,
    /// Refuse to rebuild if any row mismatches.
    Strict,
}

/// Result of rebuilding the chain from the record store.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReport {
    /// Transactions appended to the rebuilt chain.
    pub replayed: usize,
    /// Rows whose stored fields fail their own stored hash with no
    /// amendment on record to account for it.
    pub mismatched: Vec<TransactionId>,
    /// Rows that fail their own hash only because they were amended.
    pub amended: Vec<TransactionId>,
}

impl ReplayReport {
    pub fn is_clean(&self) -> bool {
        self.mismatched.is_empty()
    }
}

/// Startup reconstruction of the in-memory chain.
pub struct ReplayEngine;

impl ReplayEngine {
    /// Seed genesis and append every persisted transaction in store order
    /// (block index, then timestamp).
    ///
    /// Each row's own hash is re-verified first. In [`ReplayMode::Flag`] a
    /// mismatching row is logged and still appended, so the rebuilt chain is
    /// internally valid even when storage was edited; the report keeps the
    /// evidence. [`ReplayMode::Strict`] returns
    /// [`LedgerError::TamperedOnReplay`] instead.
    pub fn rebuild<S: RecordStore + ?Sized>(
        store: &S,
        mode: ReplayMode,
    ) -> Result<(Chain, ReplayReport), LedgerError> {
        let rows = store.all_transactions()?;
        let mut mismatched = Vec::new();
        let mut amended = Vec::new();
        for tx in rows.iter().filter(|tx| !IntegrityReport::check(tx).is_valid) {
            if explained_by_amendment(store, tx)? {
                amended.push(tx.id.clone());
            } else {
                mismatched.push(tx.id.clone());
            }
        }

        for id in &mismatched {
            warn!(transaction = %id, "persisted transaction does not match its stored hash");
        }
        if mode == ReplayMode::Strict && !mismatched.is_empty() {
            return Err(LedgerError::TamperedOnReplay { ids: mismatched });
        }

        let chain = Chain::new();
        let replayed = rows.len();
        for tx in rows {
            chain.append_transaction(tx)?;
        }

        info!(
            blocks = replayed + 1,
            amended = amended.len(),
            mismatched = mismatched.len(),
            "chain rebuilt from record store"
        );
        Ok((
            chain,
            ReplayReport {
                replayed,
                mismatched,
                amended,
            },
        ))
    }
}

/// A hash mismatch is accounted for when the audit trail holds the row as it
/// was before its first amendment, that snapshot reproduces the stored hash,
/// the current amount and description equal the latest amendment, and no
/// unauthorized edit followed it.
fn explained_by_amendment<S: RecordStore + ?Sized>(
    store: &S,
    tx: &Transaction,
) -> Result<bool, LedgerError> {
    let trail = store.audit_trail(&tx.id)?;
    let mut updates = trail.iter().filter(|e| e.action == AuditAction::Updated);
    let Some(first) = updates.next() else {
        return Ok(false);
    };
    let last = updates.last().unwrap_or(first);

    let edited_after = trail
        .iter()
        .any(|e| e.action == AuditAction::UnauthorizedEdit && e.id > last.id);
    if edited_after {
        return Ok(false);
    }

    let original = first
        .old_data
        .clone()
        .and_then(|v| serde_json::from_value::<Transaction>(v).ok());
    let current = last
        .new_data
        .clone()
        .and_then(|v| serde_json::from_value::<Transaction>(v).ok());
    Ok(match (original, current) {
        (Some(original), Some(current)) => {
            original.hash == tx.hash
                && IntegrityReport::check(&original).is_valid
                && current.amount == tx.amount
                && current.description == tx.description
        }
        _ => false,
    })
}
