//! Record store for the Financial Audit Ledger.
//!
//! The record store is the durable, *mutable* side of the ledger: it holds
//! the transaction rows the chain was built from, their sign-off state, and
//! the append-only audit trail. The in-memory chain is rebuilt from it at
//! startup, and integrity checks read the store's current copy of a
//! transaction, which may have been altered without going through the chain.
//!
//! # Storage Backends
//!
//! All backends implement the [`RecordStore`] trait:
//!
//! - [`InMemoryRecordStore`] -- `HashMap`-based store for tests and embedding
//! - [`FileRecordStore`] -- journal-backed store that survives restarts
//!
//! # Design Rules
//!
//! 1. Transaction rows are never deleted.
//! 2. Audit entries are append-only and numbered by the store.
//! 3. Reads of all transactions are ordered by `block_index`, then timestamp.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod file;
pub mod journal;
pub mod memory;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{StoreError, StoreResult};
pub use file::FileRecordStore;
pub use journal::{Journal, JournalConfig, StoreEvent, SyncMode};
pub use memory::InMemoryRecordStore;
pub use traits::RecordStore;
