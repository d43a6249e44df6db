//! The module contains the errors the ledger can throw.

use sea_orm::DbErr;
use thiserror::Error;

/// Ledger custom errors.
///
/// Every validation failure names the rule it broke; storage failures wrap
/// the underlying [`DbErr`] so the adapter can log the detail and surface an
/// opaque internal error instead.
#[derive(Error, Debug, PartialEq)]
pub enum LedgerError {
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("invalid bucket type: {0}")]
    InvalidType(String),
    #[error("invalid split rule: {0}")]
    InvalidRule(String),
    #[error("invalid identifier: {0}")]
    InvalidId(String),
    #[error("out of range: {0}")]
    OutOfRange(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("unsupported operation: {0}")]
    Unsupported(String),
    #[error("allocation overflow: {0}")]
    AllocationOverflow(String),
    #[error("allocation imbalance: {0}")]
    AllocationImbalance(String),
    #[error("layer imbalance: {0}")]
    LayerImbalance(String),
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}
