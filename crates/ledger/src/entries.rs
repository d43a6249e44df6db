//! Transaction entries.
//!
//! An [`Entry`] is a single balance change applied to a bucket as part of a
//! [`Transaction`](crate::Transaction). Amounts are stored as **absolute**
//! decimals; the direction carries the sign:
//!
//! - `Debit` increases the bucket's running balance
//! - `Credit` decreases it
//!
//! Every entry belongs to one layer, and each layer of a transaction must
//! balance on its own. Entries are immutable once persisted.

use rust_decimal::Decimal;
use sea_orm::entity::{prelude::*, ActiveValue};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The direction of an entry.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryDirection {
    #[sea_orm(string_value = "DEBIT")]
    Debit,
    #[sea_orm(string_value = "CREDIT")]
    Credit,
}

impl EntryDirection {
    /// Returns the string representation used in the database.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debit => "DEBIT",
            Self::Credit => "CREDIT",
        }
    }
}

/// The view an entry participates in.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryLayer {
    #[sea_orm(string_value = "PHYSICAL")]
    Physical,
    #[sea_orm(string_value = "VIRTUAL")]
    Virtual,
}

impl EntryLayer {
    /// Returns the string representation used in the database.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Physical => "PHYSICAL",
            Self::Virtual => "VIRTUAL",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub bucket_id: Uuid,
    /// Absolute value, strictly positive.
    pub amount: Decimal,
    pub direction: EntryDirection,
    pub layer: EntryLayer,
}

impl Entry {
    pub fn new(
        transaction_id: Uuid,
        bucket_id: Uuid,
        amount: Decimal,
        direction: EntryDirection,
        layer: EntryLayer,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            transaction_id,
            bucket_id,
            amount,
            direction,
            layer,
        }
    }

    /// The balance change this entry applies to its bucket.
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        match self.direction {
            EntryDirection::Debit => self.amount,
            EntryDirection::Credit => -self.amount,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transaction_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub bucket_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub amount: Decimal,
    pub direction: EntryDirection,
    pub layer: EntryLayer,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transactions::Entity",
        from = "Column::TransactionId",
        to = "super::transactions::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Transactions,
    #[sea_orm(
        belongs_to = "super::buckets::Entity",
        from = "Column::BucketId",
        to = "super::buckets::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Buckets,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::buckets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Buckets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Entry> for ActiveModel {
    fn from(entry: &Entry) -> Self {
        Self {
            id: ActiveValue::Set(entry.id),
            transaction_id: ActiveValue::Set(entry.transaction_id),
            bucket_id: ActiveValue::Set(entry.bucket_id),
            amount: ActiveValue::Set(entry.amount),
            direction: ActiveValue::Set(entry.direction),
            layer: ActiveValue::Set(entry.layer),
        }
    }
}

impl From<Model> for Entry {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            transaction_id: model.transaction_id,
            bucket_id: model.bucket_id,
            amount: model.amount,
            direction: model.direction,
            layer: model.layer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn signed_amount_follows_direction() {
        let tx_id = Uuid::new_v4();
        let bucket_id = Uuid::new_v4();

        let debit = Entry::new(
            tx_id,
            bucket_id,
            dec!(12.50),
            EntryDirection::Debit,
            EntryLayer::Physical,
        );
        assert_eq!(debit.signed_amount(), dec!(12.50));

        let credit = Entry::new(
            tx_id,
            bucket_id,
            dec!(12.50),
            EntryDirection::Credit,
            EntryLayer::Virtual,
        );
        assert_eq!(credit.signed_amount(), dec!(-12.50));
    }
}
