use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handler::{self, AppState};

/// Build the axum router with all FAL endpoints.
pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/api/health", get(handler::health))
        .route(
            "/api/transactions",
            get(handler::list_transactions).post(handler::record_transaction),
        )
        .route(
            "/api/transactions/:id",
            get(handler::get_transaction).put(handler::amend_transaction),
        )
        .route("/api/transactions/:id/verify", post(handler::verify_transaction))
        .route("/api/transactions/:id/tamper", post(handler::tamper_transaction))
        .route("/api/transactions/:id/validate", get(handler::validate_transaction))
        .route("/api/audit-trail/:id", get(handler::audit_trail))
        .route("/api/auditors", get(handler::auditors))
        .route("/api/blockchain/info", get(handler::chain_info))
        .route("/api/blockchain/blocks", get(handler::blocks))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
