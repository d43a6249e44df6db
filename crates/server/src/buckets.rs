//! Bucket API endpoints.

use api_types::bucket::{BucketList, BucketListResponse, BucketView};
use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{parse_id, server::ServerState, ServerError};
use ledger::{Bucket, BucketType};

fn api_bucket_type(value: BucketType) -> api_types::BucketType {
    match value {
        BucketType::Physical => api_types::BucketType::Physical,
        BucketType::Virtual => api_types::BucketType::Virtual,
        BucketType::Income => api_types::BucketType::Income,
        BucketType::Expense => api_types::BucketType::Expense,
        BucketType::Equity => api_types::BucketType::Equity,
        BucketType::System => api_types::BucketType::System,
    }
}

fn ledger_bucket_type(value: api_types::BucketType) -> BucketType {
    match value {
        api_types::BucketType::Physical => BucketType::Physical,
        api_types::BucketType::Virtual => BucketType::Virtual,
        api_types::BucketType::Income => BucketType::Income,
        api_types::BucketType::Expense => BucketType::Expense,
        api_types::BucketType::Equity => BucketType::Equity,
        api_types::BucketType::System => BucketType::System,
    }
}

fn bucket_view(bucket: Bucket) -> BucketView {
    BucketView {
        id: bucket.id.to_string(),
        name: bucket.name,
        bucket_type: api_bucket_type(bucket.bucket_type),
        parent_id: bucket.parent_physical_bucket_id.map(|id| id.to_string()),
        current_balance: bucket.current_balance.to_string(),
    }
}

pub async fn list(
    State(state): State<ServerState>,
    Query(payload): Query<BucketList>,
) -> Result<Json<BucketListResponse>, ServerError> {
    let filter = payload.bucket_type.map(ledger_bucket_type);
    let buckets = state.ledger.list_buckets(filter).await?;

    Ok(Json(BucketListResponse {
        buckets: buckets.into_iter().map(bucket_view).collect(),
    }))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<BucketView>, ServerError> {
    let bucket_id = parse_id(&id, "bucket")?;
    let bucket = state.ledger.bucket(bucket_id).await?;
    Ok(Json(bucket_view(bucket)))
}
