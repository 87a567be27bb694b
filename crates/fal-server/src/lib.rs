//! HTTP server for the Financial Audit Ledger.
//!
//! Exposes the ledger over a JSON API with bearer-token authentication
//! and role checks. Every response carries a `success` flag; failures add an
//! `error` message.

pub mod auth;
pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use auth::{AuthProvider, Credentials, Identity, StaticTokenAuth};
pub use config::{ServerConfig, TokenGrant};
pub use error::{ServerError, ServerResult};
pub use handler::{AppState, SharedStore};
pub use server::FalServer;
