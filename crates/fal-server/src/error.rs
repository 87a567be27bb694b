use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use fal_ledger::LedgerError;
use fal_types::Role;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    BadRequest(String),

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("insufficient permissions. required role: {required}")]
    Forbidden { required: Role },

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("store error: {0}")]
    Store(#[from] fal_store::StoreError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::AuthFailed(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::Ledger(err) => match err {
                LedgerError::Validation(_)
                | LedgerError::AlreadyVerified(_)
                | LedgerError::InvalidTransactionId(_) => StatusCode::BAD_REQUEST,
                LedgerError::NotFound(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Store(_) | Self::Config(_) | Self::Io(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Ledger(LedgerError::Validation(reason)) => reason.clone(),
            Self::Ledger(LedgerError::NotFound(_)) => "transaction not found".into(),
            Self::Ledger(LedgerError::AlreadyVerified(_)) => {
                "transaction is already verified".into()
            }
            Self::Ledger(LedgerError::InvalidTransactionId(_)) => {
                "invalid transaction id format".into()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "success": false, "error": self.message() }))).into_response()
    }
}
