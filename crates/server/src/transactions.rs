//! Posting and listing endpoints.

use api_types::transaction::{
    EntryView, ExpenseCreated, ExpenseNew, InflowCreated, InflowNew, TransactionList,
    TransactionListResponse, TransactionView,
};
use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use rust_decimal::Decimal;

use crate::{parse_amount, parse_id, server::ServerState, ServerError};
use ledger::{EntryDirection, EntryLayer, ExpenseCmd, InflowCmd, Transaction};

pub async fn inflow_new(
    State(state): State<ServerState>,
    Json(payload): Json<InflowNew>,
) -> Result<Json<InflowCreated>, ServerError> {
    let amount = parse_amount(&payload.amount, "amount")?;
    let source_bucket_id = parse_id(&payload.source_bucket_id, "source bucket")?;

    let tx = state
        .ledger
        .record_inflow(InflowCmd {
            amount,
            description: payload.description,
            source_bucket_id,
            is_external: payload.is_external,
            occurred_at: Utc::now(),
        })
        .await?;

    Ok(Json(InflowCreated {
        transaction_id: tx.id.to_string(),
        created_at: tx.occurred_at,
    }))
}

pub async fn expense_new(
    State(state): State<ServerState>,
    Json(payload): Json<ExpenseNew>,
) -> Result<Json<ExpenseCreated>, ServerError> {
    let amount = parse_amount(&payload.amount, "amount")?;
    let virtual_bucket_id = parse_id(&payload.virtual_bucket_id, "virtual bucket")?;
    let category_bucket_id = parse_id(&payload.category_bucket_id, "category bucket")?;
    let physical_override_id = payload
        .physical_bucket_override_id
        .as_deref()
        .map(|id| parse_id(id, "physical override bucket"))
        .transpose()?;

    let (tx, physical_bucket_id) = state
        .ledger
        .log_expense(ExpenseCmd {
            amount,
            description: payload.description,
            virtual_bucket_id,
            category_bucket_id,
            physical_override_id,
            occurred_at: Utc::now(),
        })
        .await?;

    Ok(Json(ExpenseCreated {
        transaction_id: tx.id.to_string(),
        created_at: tx.occurred_at,
        physical_bucket_id: physical_bucket_id.to_string(),
    }))
}

/// The headline amount of a transaction: the money that left (or entered)
/// the physical world, i.e. the physical-layer credit total.
fn headline_amount(tx: &Transaction) -> Decimal {
    tx.entries
        .iter()
        .filter(|entry| {
            entry.layer == EntryLayer::Physical && entry.direction == EntryDirection::Credit
        })
        .fold(Decimal::ZERO, |sum, entry| sum + entry.amount)
}

pub async fn list(
    State(state): State<ServerState>,
    Query(payload): Query<TransactionList>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let bucket_id = payload
        .bucket_id
        .as_deref()
        .map(|id| parse_id(id, "bucket"))
        .transpose()?;

    let page = state
        .ledger
        .list_transactions(payload.limit, payload.offset, bucket_id)
        .await?;

    let transactions = page
        .transactions
        .iter()
        .map(|tx| TransactionView {
            id: tx.id.to_string(),
            description: tx.description.clone(),
            amount: headline_amount(tx).to_string(),
            occurred_at: tx.occurred_at,
            is_external_inflow: tx.is_external_inflow,
            is_internal_transfer: tx.is_internal_transfer,
            entries: tx
                .entries
                .iter()
                .map(|entry| EntryView {
                    bucket_id: entry.bucket_id.to_string(),
                    amount: entry.amount.to_string(),
                    direction: entry.direction.as_str().to_string(),
                    layer: entry.layer.as_str().to_string(),
                })
                .collect(),
        })
        .collect();

    let bucket_names = page
        .bucket_names
        .into_iter()
        .map(|(id, name)| (id.to_string(), name))
        .collect();

    Ok(Json(TransactionListResponse {
        transactions,
        total_count: page.total_count,
        bucket_names,
    }))
}
