//! Market value history.
//!
//! Equity buckets keep their cost basis in the running balance; what the
//! position is actually worth is recorded here as append-only, time-stamped
//! points. The latest point per bucket is the one with the highest timestamp.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::{prelude::*, ActiveValue};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketValuePoint {
    pub id: Uuid,
    pub bucket_id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub market_value: Decimal,
}

impl MarketValuePoint {
    pub fn new(bucket_id: Uuid, recorded_at: DateTime<Utc>, market_value: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            bucket_id,
            recorded_at,
            market_value,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "market_value_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub bucket_id: Uuid,
    pub recorded_at: DateTimeUtc,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub market_value: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::buckets::Entity",
        from = "Column::BucketId",
        to = "super::buckets::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Buckets,
}

impl Related<super::buckets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Buckets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&MarketValuePoint> for ActiveModel {
    fn from(point: &MarketValuePoint) -> Self {
        Self {
            id: ActiveValue::Set(point.id),
            bucket_id: ActiveValue::Set(point.bucket_id),
            recorded_at: ActiveValue::Set(point.recorded_at),
            market_value: ActiveValue::Set(point.market_value),
        }
    }
}

impl From<Model> for MarketValuePoint {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            bucket_id: model.bucket_id,
            recorded_at: model.recorded_at,
            market_value: model.market_value,
        }
    }
}
