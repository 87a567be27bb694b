use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Json;
use fal_ledger::{lenient_amount, AmendmentDraft, AuditLedger, LedgerError, TransactionDraft};
use fal_store::RecordStore;
use fal_types::{Role, TransactionId};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{AuthProvider, Credentials, Identity};
use crate::error::{ServerError, ServerResult};

/// Record store shared by the ledger and the handlers.
pub type SharedStore = Arc<dyn RecordStore>;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<AuditLedger<SharedStore>>,
    pub auth: Arc<dyn AuthProvider>,
}

impl AppState {
    pub fn new(ledger: AuditLedger<SharedStore>, auth: Arc<dyn AuthProvider>) -> Self {
        Self {
            ledger: Arc::new(ledger),
            auth,
        }
    }

    /// Run a mutating ledger operation on the blocking pool.
    ///
    /// Mutations hold the append lock across a journal write (and an fsync
    /// when `sync_writes` is set), which must not stall a runtime worker.
    async fn mutate<T, F>(&self, op: F) -> ServerResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&AuditLedger<SharedStore>) -> Result<T, LedgerError> + Send + 'static,
    {
        let ledger = Arc::clone(&self.ledger);
        let result = tokio::task::spawn_blocking(move || op(&ledger))
            .await
            .map_err(|e| ServerError::Internal(format!("ledger task failed: {e}")))?;
        Ok(result?)
    }

    /// Authenticate the caller and check their role.
    async fn authorize(&self, headers: &HeaderMap, required: Role) -> ServerResult<Identity> {
        let identity = self
            .auth
            .authenticate(&Credentials::from_headers(headers))
            .await?;
        identity.require(required)?;
        Ok(identity)
    }
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ServerResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ServerError::BadRequest(rejection.body_text()))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TamperRequest {
    #[serde(rename = "newAmount", deserialize_with = "lenient_amount")]
    pub new_amount: Option<f64>,
}

/// `GET /api/health`
pub async fn health(State(state): State<AppState>) -> ServerResult<Json<Value>> {
    let health = state.ledger.health()?;
    Ok(Json(json!({
        "success": true,
        "message": "Financial Audit API is running",
        "database": "Connected",
        "blockchain": {
            "isValid": health.is_valid,
            "blocks": health.blocks,
            "transactions": health.transactions,
        },
        "databaseTransactions": health.stored_transactions,
        "replayMismatches": health.replay_mismatches,
        "timestamp": health.timestamp,
    })))
}

/// `GET /api/transactions`
pub async fn list_transactions(State(state): State<AppState>) -> ServerResult<Json<Value>> {
    let transactions = state.ledger.transactions()?;
    Ok(Json(json!({
        "success": true,
        "count": transactions.len(),
        "transactions": transactions,
    })))
}

/// `GET /api/transactions/:id`
pub async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Json<Value>> {
    let transaction = state.ledger.transaction(&TransactionId::new(id))?;
    Ok(Json(json!({ "success": true, "transaction": transaction })))
}

/// `POST /api/transactions`
pub async fn record_transaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<TransactionDraft>, JsonRejection>,
) -> ServerResult<Json<Value>> {
    let identity = state.authorize(&headers, Role::Auditor).await?;
    let draft = body(payload)?;
    let actor = identity.actor();
    let transaction = state
        .mutate(move |ledger| ledger.record_transaction(&draft, &actor))
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Transaction recorded successfully",
        "transaction": transaction,
    })))
}

/// `PUT /api/transactions/:id`
pub async fn amend_transaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    payload: Result<Json<AmendmentDraft>, JsonRejection>,
) -> ServerResult<Json<Value>> {
    let identity = state.authorize(&headers, Role::Auditor).await?;
    let draft = body(payload)?;
    let actor = identity.actor();
    let outcome = state
        .mutate(move |ledger| ledger.amend_transaction(&TransactionId::new(id), &draft, &actor))
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Transaction updated and new block added to chain",
        "transaction": outcome.original,
        "amendment": outcome.amendment,
        "block": outcome.block,
    })))
}

/// `POST /api/transactions/:id/verify`
pub async fn verify_transaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ServerResult<Json<Value>> {
    let identity = state.authorize(&headers, Role::Manager).await?;
    let actor = identity.actor();
    let transaction = state
        .mutate(move |ledger| ledger.verify_transaction(&TransactionId::new(id), &actor))
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Transaction verified successfully",
        "transaction": transaction,
    })))
}

/// `POST /api/transactions/:id/tamper`
pub async fn tamper_transaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    payload: Result<Json<TamperRequest>, JsonRejection>,
) -> ServerResult<Json<Value>> {
    let identity = state.authorize(&headers, Role::Admin).await?;
    let request = body(payload)?;
    let requested_by = identity.actor_id;
    state
        .mutate(move |ledger| {
            ledger.simulate_tamper(&TransactionId::new(id), request.new_amount, Some(&requested_by))
        })
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Transaction successfully corrupted",
    })))
}

/// `GET /api/transactions/:id/validate`
pub async fn validate_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Json<Value>> {
    let report = state.ledger.verify_integrity(&TransactionId::new(id))?;
    Ok(Json(json!({
        "success": true,
        "isValid": report.is_valid,
        "storedHash": report.stored_hash,
        "calculatedHash": report.calculated_hash,
    })))
}

/// `GET /api/audit-trail/:id`
pub async fn audit_trail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Json<Value>> {
    let id = TransactionId::new(id);
    let trail = state.ledger.audit_trail(&id)?;
    let transaction = state.ledger.transaction(&id)?;
    Ok(Json(json!({
        "success": true,
        "transaction": transaction,
        "auditTrail": trail,
    })))
}

/// `GET /api/auditors`
pub async fn auditors(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ServerResult<Json<Value>> {
    state.authorize(&headers, Role::Viewer).await?;
    let auditors = state.ledger.auditors()?;
    Ok(Json(json!({ "success": true, "auditors": auditors })))
}

/// `GET /api/blockchain/info`
pub async fn chain_info(State(state): State<AppState>) -> ServerResult<Json<Value>> {
    let info = state.ledger.chain_info()?;
    let stored = state.ledger.store().transaction_count()?;
    Ok(Json(json!({
        "success": true,
        "blockchain": info,
        "database": { "totalTransactions": stored },
    })))
}

/// `GET /api/blockchain/blocks`
pub async fn blocks(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ServerResult<Json<Value>> {
    state.authorize(&headers, Role::Viewer).await?;
    let chain = state.ledger.full_chain()?;
    Ok(Json(json!({ "success": true, "chain": chain })))
}
