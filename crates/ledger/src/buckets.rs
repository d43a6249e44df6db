//! Buckets.
//!
//! A bucket is the single account-like node of the ledger. Its type decides
//! how postings may use it:
//!
//! - `Physical`: a real-world account (bank account, brokerage cash).
//! - `Virtual`: a named subdivision of one physical bucket; the virtual
//!   balances of a physical bucket are claims on its balance.
//! - `Income` / `Expense`: external counterparties classifying the other side
//!   of a posting.
//! - `Equity`: an investment position; the running balance is cost basis,
//!   current worth lives in the market-value history.
//! - `System`: internal bookkeeping buckets with reserved identifiers.

use rust_decimal::Decimal;
use sea_orm::entity::{prelude::*, ActiveValue};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, ResultLedger};

/// Reserved identifier of the virtual-clearing system bucket.
pub const SYSTEM_VIRTUAL_CLEARING: Uuid = Uuid::from_u128(0x1);
/// Reserved identifier of the lost/misc reconciliation system bucket.
pub const SYSTEM_LOST_MISC: Uuid = Uuid::from_u128(0x2);
/// Reserved identifier of the extra-income system bucket.
pub const SYSTEM_EXTRA_INCOME: Uuid = Uuid::from_u128(0x3);

/// The system buckets the seeder guarantees, with their reserved ids.
pub(crate) const SYSTEM_BUCKETS: [(Uuid, &str); 3] = [
    (SYSTEM_VIRTUAL_CLEARING, "System Virtual Clearing"),
    (SYSTEM_LOST_MISC, "System Lost/Misc"),
    (SYSTEM_EXTRA_INCOME, "System Extra Income"),
];

/// The type of a bucket.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BucketType {
    #[sea_orm(string_value = "PHYSICAL")]
    Physical,
    #[sea_orm(string_value = "VIRTUAL")]
    Virtual,
    #[sea_orm(string_value = "INCOME")]
    Income,
    #[sea_orm(string_value = "EXPENSE")]
    Expense,
    #[sea_orm(string_value = "EQUITY")]
    Equity,
    #[sea_orm(string_value = "SYSTEM")]
    System,
}

impl BucketType {
    /// Returns the string representation used in the database.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Physical => "PHYSICAL",
            Self::Virtual => "VIRTUAL",
            Self::Income => "INCOME",
            Self::Expense => "EXPENSE",
            Self::Equity => "EQUITY",
            Self::System => "SYSTEM",
        }
    }
}

impl TryFrom<&str> for BucketType {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "PHYSICAL" => Ok(Self::Physical),
            "VIRTUAL" => Ok(Self::Virtual),
            "INCOME" => Ok(Self::Income),
            "EXPENSE" => Ok(Self::Expense),
            "EQUITY" => Ok(Self::Equity),
            "SYSTEM" => Ok(Self::System),
            other => Err(LedgerError::InvalidType(format!(
                "invalid bucket type: {other}"
            ))),
        }
    }
}

/// A bucket.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    /// Stable identifier. Generated once and persisted, so the bucket can be
    /// renamed without breaking references.
    pub id: Uuid,
    pub name: String,
    pub bucket_type: BucketType,
    /// Present iff the bucket is `Virtual`; references a `Physical` bucket.
    pub parent_physical_bucket_id: Option<Uuid>,
    /// Book value: the running balance computed from posted entries.
    pub current_balance: Decimal,
}

impl Bucket {
    pub fn new(
        name: String,
        bucket_type: BucketType,
        parent_physical_bucket_id: Option<Uuid>,
    ) -> ResultLedger<Self> {
        let bucket = Self {
            id: Uuid::new_v4(),
            name,
            bucket_type,
            parent_physical_bucket_id,
            current_balance: Decimal::ZERO,
        };
        bucket.validate()?;
        Ok(bucket)
    }

    /// Checks the structural invariants of a bucket.
    ///
    /// A `Virtual` bucket must carry a parent reference; every other type
    /// must not. Whether the parent row actually is `Physical` is checked
    /// where the parent is loaded.
    pub fn validate(&self) -> ResultLedger<()> {
        if self.name.trim().is_empty() {
            return Err(LedgerError::InvalidType(
                "bucket name must not be empty".to_string(),
            ));
        }
        match (self.bucket_type, self.parent_physical_bucket_id) {
            (BucketType::Virtual, None) => Err(LedgerError::InvalidType(
                "virtual bucket must have a parent physical bucket".to_string(),
            )),
            (BucketType::Virtual, Some(_)) => Ok(()),
            (_, Some(_)) => Err(LedgerError::InvalidType(format!(
                "{} bucket must not have a parent",
                self.bucket_type.as_str()
            ))),
            (_, None) => Ok(()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "buckets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub bucket_type: BucketType,
    pub parent_physical_bucket_id: Option<Uuid>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub current_balance: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::entries::Entity")]
    Entries,
    #[sea_orm(has_many = "super::market_values::Entity")]
    MarketValues,
}

impl Related<super::entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entries.def()
    }
}

impl Related<super::market_values::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MarketValues.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Bucket> for ActiveModel {
    fn from(bucket: &Bucket) -> Self {
        Self {
            id: ActiveValue::Set(bucket.id),
            name: ActiveValue::Set(bucket.name.clone()),
            bucket_type: ActiveValue::Set(bucket.bucket_type),
            parent_physical_bucket_id: ActiveValue::Set(bucket.parent_physical_bucket_id),
            current_balance: ActiveValue::Set(bucket.current_balance),
        }
    }
}

impl From<Model> for Bucket {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            bucket_type: model.bucket_type,
            parent_physical_bucket_id: model.parent_physical_bucket_id,
            current_balance: model.current_balance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn virtual_requires_parent() {
        let err = Bucket::new("Groceries".to_string(), BucketType::Virtual, None).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InvalidType("virtual bucket must have a parent physical bucket".to_string())
        );

        let parent = Uuid::new_v4();
        let bucket =
            Bucket::new("Groceries".to_string(), BucketType::Virtual, Some(parent)).unwrap();
        assert_eq!(bucket.parent_physical_bucket_id, Some(parent));
        assert_eq!(bucket.current_balance, Decimal::ZERO);
    }

    #[test]
    fn non_virtual_rejects_parent() {
        let err = Bucket::new(
            "Main Bank".to_string(),
            BucketType::Physical,
            Some(Uuid::new_v4()),
        )
        .unwrap_err();
        assert_eq!(
            err,
            LedgerError::InvalidType("PHYSICAL bucket must not have a parent".to_string())
        );
    }

    #[test]
    fn empty_name_is_rejected() {
        let err = Bucket::new("   ".to_string(), BucketType::Income, None).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InvalidType("bucket name must not be empty".to_string())
        );
    }

    #[test]
    fn system_ids_are_stable() {
        assert_eq!(
            SYSTEM_VIRTUAL_CLEARING.to_string(),
            "00000000-0000-0000-0000-000000000001"
        );
        assert_eq!(
            SYSTEM_LOST_MISC.to_string(),
            "00000000-0000-0000-0000-000000000002"
        );
        assert_eq!(
            SYSTEM_EXTRA_INCOME.to_string(),
            "00000000-0000-0000-0000-000000000003"
        );
    }
}
