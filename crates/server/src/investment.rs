//! Investment API endpoints.

use api_types::investment::{InvestmentNew, InvestmentRecorded};
use axum::{extract::State, Json};
use chrono::Utc;

use crate::{parse_amount, parse_id, server::ServerState, ServerError};

pub async fn update(
    State(state): State<ServerState>,
    Json(payload): Json<InvestmentNew>,
) -> Result<Json<InvestmentRecorded>, ServerError> {
    let bucket_id = parse_id(&payload.bucket_id, "bucket")?;
    let market_value = parse_amount(&payload.market_value, "market value")?;

    let point = state
        .ledger
        .update_market_value(bucket_id, market_value, Utc::now())
        .await?;

    Ok(Json(InvestmentRecorded {
        entry_id: point.id.to_string(),
        created_at: point.recorded_at,
    }))
}
