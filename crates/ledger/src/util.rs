//! Internal helpers for parsing and validation.
//!
//! These utilities are **not** part of the public API. They centralize
//! conversions between storage rows and domain values so the ledger enforces
//! consistent invariants.

use uuid::Uuid;

use crate::{LedgerError, ResultLedger};

/// Parse a UUID from its textual form and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultLedger<Uuid> {
    Uuid::parse_str(value).map_err(|_| LedgerError::InvalidId(format!("invalid {label} id")))
}

/// Trim a display name, rejecting names that are empty after trimming.
pub(crate) fn trimmed_name(value: &str, label: &str) -> ResultLedger<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::InvalidType(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}
