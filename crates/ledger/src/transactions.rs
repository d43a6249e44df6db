//! Transaction primitives.
//!
//! A `Transaction` is an atomic monetary event. It owns an ordered set of
//! entries split across the physical and virtual layers, and it is only
//! valid when every layer it touches balances exactly.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::{prelude::*, ActiveValue};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    entries::{Entry, EntryDirection, EntryLayer},
    LedgerError, ResultLedger,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
    pub is_internal_transfer: bool,
    pub is_external_inflow: bool,
    pub entries: Vec<Entry>,
}

impl Transaction {
    pub fn new(
        description: String,
        occurred_at: DateTime<Utc>,
        is_internal_transfer: bool,
        is_external_inflow: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            description,
            occurred_at,
            is_internal_transfer,
            is_external_inflow,
            entries: Vec::new(),
        }
    }

    /// Appends an entry targeting `bucket_id`.
    pub fn push_entry(
        &mut self,
        bucket_id: Uuid,
        amount: Decimal,
        direction: EntryDirection,
        layer: EntryLayer,
    ) {
        self.entries
            .push(Entry::new(self.id, bucket_id, amount, direction, layer));
    }

    /// Checks the double-entry invariants before persistence.
    ///
    /// - at least one entry
    /// - every amount strictly positive
    /// - each layer present in the entry set balances exactly
    ///   (Σ debits = Σ credits, decimal equality)
    ///
    /// A layer may legitimately be absent; if present it must balance.
    pub fn validate(&self) -> ResultLedger<()> {
        if self.entries.is_empty() {
            return Err(LedgerError::InvalidAmount(
                "transaction must have at least one entry".to_string(),
            ));
        }

        for entry in &self.entries {
            if entry.amount <= Decimal::ZERO {
                return Err(LedgerError::InvalidAmount(
                    "entry amount must be positive".to_string(),
                ));
            }
        }

        for layer in [EntryLayer::Physical, EntryLayer::Virtual] {
            self.validate_layer_balance(layer)?;
        }

        Ok(())
    }

    fn validate_layer_balance(&self, layer: EntryLayer) -> ResultLedger<()> {
        let mut debits = Decimal::ZERO;
        let mut credits = Decimal::ZERO;
        for entry in self.entries.iter().filter(|entry| entry.layer == layer) {
            match entry.direction {
                EntryDirection::Debit => debits += entry.amount,
                EntryDirection::Credit => credits += entry.amount,
            }
        }

        if debits != credits {
            return Err(LedgerError::LayerImbalance(format!(
                "sum of debits must equal sum of credits for the {} layer",
                layer.as_str()
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub description: String,
    pub occurred_at: DateTimeUtc,
    pub is_internal_transfer: bool,
    pub is_external_inflow: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::entries::Entity")]
    Entries,
}

impl Related<super::entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id),
            description: ActiveValue::Set(tx.description.clone()),
            occurred_at: ActiveValue::Set(tx.occurred_at),
            is_internal_transfer: ActiveValue::Set(tx.is_internal_transfer),
            is_external_inflow: ActiveValue::Set(tx.is_external_inflow),
        }
    }
}

impl From<Model> for Transaction {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            description: model.description,
            occurred_at: model.occurred_at,
            is_internal_transfer: model.is_internal_transfer,
            is_external_inflow: model.is_external_inflow,
            entries: Vec::new(),
        }
    }
}
