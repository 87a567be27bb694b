//! Ledger core for the Financial Audit Ledger (FAL).
//!
//! This crate is the heart of FAL. It provides:
//! - `Chain`: the in-memory hash chain of single-transaction blocks
//! - Input validation for the record and amend flows
//! - Per-transaction integrity checks against the record store
//! - Startup replay from the record store, with tamper flagging
//! - `AuditLedger`: the service that keeps chain and store in step

pub mod chain;
pub mod error;
pub mod integrity;
pub mod replay;
pub mod service;
pub mod validation;

pub use chain::{genesis_block, Chain, ChainInfo};
pub use error::LedgerError;
pub use integrity::IntegrityReport;
pub use replay::{ReplayEngine, ReplayMode, ReplayReport};
pub use service::{Actor, AmendmentOutcome, AuditLedger, HealthReport, UNKNOWN_ACTOR};
pub use validation::{lenient_amount, Amendment, AmendmentDraft, TransactionDraft};
