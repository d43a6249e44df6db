use axum::{http::StatusCode, response::IntoResponse, Json};
use ledger::LedgerError;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

pub use server::{run, run_with_graceful_shutdown, run_with_listener, spawn_with_listener};

mod buckets;
mod dashboard;
mod investment;
mod server;
mod transactions;

pub enum ServerError {
    Ledger(LedgerError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_ledger_error(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::NotFound(_) => StatusCode::NOT_FOUND,
        LedgerError::Unsupported(_) => StatusCode::NOT_IMPLEMENTED,
        LedgerError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        LedgerError::InvalidAmount(_)
        | LedgerError::InvalidType(_)
        | LedgerError::InvalidRule(_)
        | LedgerError::InvalidId(_)
        | LedgerError::OutOfRange(_)
        | LedgerError::AllocationOverflow(_)
        | LedgerError::AllocationImbalance(_)
        | LedgerError::LayerImbalance(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_ledger_error(err: LedgerError) -> String {
    match err {
        LedgerError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Ledger(err) => {
                (status_for_ledger_error(&err), message_for_ledger_error(err))
            }
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<LedgerError> for ServerError {
    fn from(value: LedgerError) -> Self {
        Self::Ledger(value)
    }
}

/// Parse a decimal string from the wire.
fn parse_amount(value: &str, label: &str) -> Result<Decimal, ServerError> {
    value.trim().parse().map_err(|_| {
        ServerError::Ledger(LedgerError::InvalidAmount(format!(
            "invalid {label}: {value}"
        )))
    })
}

/// Parse a textual UUID from the wire.
fn parse_id(value: &str, label: &str) -> Result<Uuid, ServerError> {
    Uuid::parse_str(value)
        .map_err(|_| ServerError::Ledger(LedgerError::InvalidId(format!("invalid {label} id"))))
}
