use std::sync::Arc;

use fal_ledger::{AuditLedger, ReplayMode};
use fal_store::{FileRecordStore, JournalConfig, SyncMode};
use tokio::net::TcpListener;

use crate::auth::{AuthProvider, StaticTokenAuth};
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::{AppState, SharedStore};
use crate::router::build_router;

/// FAL HTTP server.
pub struct FalServer {
    config: ServerConfig,
    state: AppState,
}

impl FalServer {
    /// Open the configured journal, rebuild the chain, and wire the
    /// static-token auth provider.
    pub fn open(config: ServerConfig) -> ServerResult<Self> {
        let journal = JournalConfig {
            sync_mode: if config.sync_writes {
                SyncMode::EveryWrite
            } else {
                SyncMode::OsDefault
            },
        };
        let store: SharedStore = Arc::new(FileRecordStore::open(&config.journal_path, journal)?);
        let auth: Arc<dyn AuthProvider> = Arc::new(StaticTokenAuth::new(&config.tokens));
        Self::with_parts(config, store, auth)
    }

    /// Build a server over an existing store and auth provider.
    pub fn with_parts(
        config: ServerConfig,
        store: SharedStore,
        auth: Arc<dyn AuthProvider>,
    ) -> ServerResult<Self> {
        let mode = if config.strict_replay {
            ReplayMode::Strict
        } else {
            ReplayMode::Flag
        };
        let ledger = AuditLedger::open(store, mode)?;
        let report = ledger.replay_report();
        if !report.is_clean() {
            tracing::warn!(
                mismatched = report.mismatched.len(),
                "record store holds transactions that fail their own hash"
            );
        }
        Ok(Self {
            config,
            state: AppState::new(ledger, auth),
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone(), self.config.max_body_bytes)
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!("FAL server listening on {}", self.config.bind_addr);
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
