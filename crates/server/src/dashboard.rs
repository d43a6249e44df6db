//! Net worth endpoint.

use api_types::stats::NetWorthView;
use axum::{extract::State, Json};

use crate::{server::ServerState, ServerError};

pub async fn net_worth(
    State(state): State<ServerState>,
) -> Result<Json<NetWorthView>, ServerError> {
    let net_worth = state.ledger.net_worth().await?;

    Ok(Json(NetWorthView {
        total_net_worth: net_worth.total.to_string(),
        liquidity: net_worth.liquidity.to_string(),
        equity: net_worth.equity.to_string(),
    }))
}
