//! Split rules.
//!
//! A split rule attaches to one income bucket and describes how an external
//! inflow from that source is distributed across virtual envelopes. Items
//! execute in ascending priority order: fixed amounts first, then percentages
//! of what the fixed items left, then exactly one catch-all remainder.

use rust_decimal::Decimal;
use sea_orm::entity::{prelude::*, ActiveValue};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::{LedgerError, ResultLedger};

/// The kind of a split rule item.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SplitKind {
    /// Allocate exactly `value`.
    #[sea_orm(string_value = "FIXED")]
    Fixed,
    /// Allocate `value` percent of what remains after the fixed items.
    #[sea_orm(string_value = "PERCENT")]
    Percent,
    /// Allocate whatever is left. `value` is ignored.
    #[sea_orm(string_value = "REMAINDER")]
    Remainder,
}

impl SplitKind {
    /// Returns the string representation used in the database.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fixed => "FIXED",
            Self::Percent => "PERCENT",
            Self::Remainder => "REMAINDER",
        }
    }
}

impl TryFrom<&str> for SplitKind {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "FIXED" => Ok(Self::Fixed),
            "PERCENT" => Ok(Self::Percent),
            "REMAINDER" => Ok(Self::Remainder),
            other => Err(LedgerError::InvalidRule(format!(
                "invalid split kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SplitRuleItem {
    pub id: Uuid,
    pub split_rule_id: Uuid,
    pub target_bucket_id: Uuid,
    pub kind: SplitKind,
    /// Amount for `Fixed`, percentage in [0, 100] for `Percent`, ignored for
    /// `Remainder`.
    pub value: Decimal,
    /// Lower executes first.
    pub priority: i32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SplitRule {
    pub id: Uuid,
    pub name: String,
    pub source_bucket_id: Uuid,
    pub items: Vec<SplitRuleItem>,
}

impl SplitRule {
    /// Checks the split rule invariants.
    ///
    /// - at least one item
    /// - exactly one `Remainder` item
    /// - `Fixed` values strictly positive
    /// - `Percent` values in [0, 100]
    /// - target buckets pairwise distinct
    pub fn validate(&self) -> ResultLedger<()> {
        if self.items.is_empty() {
            return Err(LedgerError::InvalidRule(
                "split rule must have at least one item".to_string(),
            ));
        }

        let mut remainder_count = 0usize;
        let mut targets = HashSet::new();
        for item in &self.items {
            if !targets.insert(item.target_bucket_id) {
                return Err(LedgerError::InvalidRule(
                    "split rule items must target distinct buckets".to_string(),
                ));
            }
            match item.kind {
                SplitKind::Fixed => {
                    if item.value <= Decimal::ZERO {
                        return Err(LedgerError::InvalidRule(
                            "FIXED item value must be positive".to_string(),
                        ));
                    }
                }
                SplitKind::Percent => {
                    if item.value < Decimal::ZERO || item.value > Decimal::ONE_HUNDRED {
                        return Err(LedgerError::InvalidRule(
                            "PERCENT item value must be between 0 and 100".to_string(),
                        ));
                    }
                }
                SplitKind::Remainder => remainder_count += 1,
            }
        }

        if remainder_count != 1 {
            return Err(LedgerError::InvalidRule(
                "split rule must have exactly one REMAINDER item".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "split_rules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub source_bucket_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "items::Entity")]
    Items,
    #[sea_orm(
        belongs_to = "super::buckets::Entity",
        from = "Column::SourceBucketId",
        to = "super::buckets::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Buckets,
}

impl Related<items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl Related<super::buckets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Buckets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&SplitRule> for ActiveModel {
    fn from(rule: &SplitRule) -> Self {
        Self {
            id: ActiveValue::Set(rule.id),
            name: ActiveValue::Set(rule.name.clone()),
            source_bucket_id: ActiveValue::Set(rule.source_bucket_id),
        }
    }
}

/// Storage model for split rule items.
pub mod items {
    use super::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "split_rule_items")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub split_rule_id: Uuid,
        pub target_bucket_id: Uuid,
        pub kind: SplitKind,
        #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
        pub value: Decimal,
        pub priority: i32,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::Entity",
            from = "Column::SplitRuleId",
            to = "super::Column::Id",
            on_update = "NoAction",
            on_delete = "Cascade"
        )]
        SplitRules,
    }

    impl Related<super::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::SplitRules.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}

    impl From<&SplitRuleItem> for ActiveModel {
        fn from(item: &SplitRuleItem) -> Self {
            Self {
                id: ActiveValue::Set(item.id),
                split_rule_id: ActiveValue::Set(item.split_rule_id),
                target_bucket_id: ActiveValue::Set(item.target_bucket_id),
                kind: ActiveValue::Set(item.kind),
                value: ActiveValue::Set(item.value),
                priority: ActiveValue::Set(item.priority),
            }
        }
    }

    impl From<Model> for SplitRuleItem {
        fn from(model: Model) -> Self {
            Self {
                id: model.id,
                split_rule_id: model.split_rule_id,
                target_bucket_id: model.target_bucket_id,
                kind: model.kind,
                value: model.value,
                priority: model.priority,
            }
        }
    }
}
