//! Foundation types for the Financial Audit Ledger (FAL).
//!
//! This crate provides the data model shared by every other FAL crate: the
//! hash-covered [`Transaction`] record, the single-transaction [`Block`], the
//! append-only [`AuditEntry`], and the identity and temporal primitives they
//! are built from.
//!
//! # Key Types
//!
//! - [`Transaction`]: A recorded financial transaction and its chain hash
//! - [`TransactionId`]: Time-based, randomly suffixed transaction identifier
//! - [`Amount`]: Positive monetary value with a stable string rendering
//! - [`Block`]: Chain node wrapping zero (genesis) or one transaction
//! - [`AuditEntry`]: Record of an action taken against a transaction
//! - [`ActorId`] / [`Role`]: Who acted, and with what authority
//! - [`Timestamp`]: Millisecond-precision UTC instant

pub mod audit;
pub mod block;
pub mod error;
pub mod identity;
pub mod temporal;
pub mod transaction;

pub use audit::{AuditAction, AuditEntry};
pub use block::{Block, GENESIS_PREVIOUS_HASH};
pub use error::TypeError;
pub use identity::{ActorId, Role};
pub use temporal::Timestamp;
pub use transaction::{
    Amount, Transaction, TransactionFields, TransactionId, TransactionStatus, MAX_AMOUNT,
};
