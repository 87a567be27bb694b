//! Append-only audit trail records.
//!
//! Every action taken against a transaction (creation, amendment, sign-off,
//! out-of-band edits) leaves an [`AuditEntry`]. Entries are never mutated or
//! deleted.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identity::ActorId;
use crate::temporal::Timestamp;
use crate::transaction::TransactionId;

/// What happened to a transaction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AuditAction {
    Created,
    Updated,
    Verified,
    UnauthorizedEdit,
    Other(String),
}

impl AuditAction {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Created => "CREATED",
            Self::Updated => "UPDATED",
            Self::Verified => "VERIFIED",
            Self::UnauthorizedEdit => "UNAUTHORIZED_EDIT",
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for AuditAction {
    fn from(value: String) -> Self {
        match value.as_str() {
            "CREATED" => Self::Created,
            "UPDATED" => Self::Updated,
            "VERIFIED" => Self::Verified,
            "UNAUTHORIZED_EDIT" => Self::UnauthorizedEdit,
            _ => Self::Other(value),
        }
    }
}

impl From<AuditAction> for String {
    fn from(value: AuditAction) -> Self {
        match value {
            AuditAction::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single audit trail record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    /// Sequence number assigned by the record store (0 until stored).
    #[serde(default)]
    pub id: u64,
    pub transaction_id: TransactionId,
    pub action: AuditAction,
    pub old_data: Option<Value>,
    pub new_data: Option<Value>,
    /// Display name of whoever performed the action.
    pub performed_by: String,
    pub actor_id: Option<ActorId>,
    pub timestamp: Timestamp,
}

impl AuditEntry {
    /// Start an entry stamped with the current time.
    pub fn new(
        transaction_id: TransactionId,
        action: AuditAction,
        performed_by: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            transaction_id,
            action,
            old_data: None,
            new_data: None,
            performed_by: performed_by.into(),
            actor_id: None,
            timestamp: Timestamp::now(),
        }
    }

    pub fn with_old_data(mut self, data: Value) -> Self {
        self.old_data = Some(data);
        self
    }

    pub fn with_new_data(mut self, data: Value) -> Self {
        self.new_data = Some(data);
        self
    }

    pub fn with_actor(mut self, actor: Option<ActorId>) -> Self {
        self.actor_id = actor;
        self
    }
}
