//! Transfer tasks.
//!
//! A transfer task records a real-world transfer the user still has to
//! execute: a posted transaction moved money between envelopes anchored in
//! different physical accounts, so the books only reconcile once the matching
//! bank transfer happens. Tasks start pending and are closed by referencing
//! the transaction that performed the real move.

use rust_decimal::Decimal;
use sea_orm::entity::{prelude::*, ActiveValue};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransferTask {
    pub id: Uuid,
    pub related_transaction_id: Uuid,
    /// Set once the user books the real transfer.
    pub completed_transaction_id: Option<Uuid>,
    pub from_physical_bucket_id: Uuid,
    pub to_physical_bucket_id: Uuid,
    pub amount: Decimal,
    pub is_completed: bool,
}

impl TransferTask {
    pub fn pending(
        related_transaction_id: Uuid,
        from_physical_bucket_id: Uuid,
        to_physical_bucket_id: Uuid,
        amount: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            related_transaction_id,
            completed_transaction_id: None,
            from_physical_bucket_id,
            to_physical_bucket_id,
            amount,
            is_completed: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transfer_tasks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub related_transaction_id: Uuid,
    pub completed_transaction_id: Option<Uuid>,
    pub from_physical_bucket_id: Uuid,
    pub to_physical_bucket_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub amount: Decimal,
    pub is_completed: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transactions::Entity",
        from = "Column::RelatedTransactionId",
        to = "super::transactions::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Transactions,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&TransferTask> for ActiveModel {
    fn from(task: &TransferTask) -> Self {
        Self {
            id: ActiveValue::Set(task.id),
            related_transaction_id: ActiveValue::Set(task.related_transaction_id),
            completed_transaction_id: ActiveValue::Set(task.completed_transaction_id),
            from_physical_bucket_id: ActiveValue::Set(task.from_physical_bucket_id),
            to_physical_bucket_id: ActiveValue::Set(task.to_physical_bucket_id),
            amount: ActiveValue::Set(task.amount),
            is_completed: ActiveValue::Set(task.is_completed),
        }
    }
}

impl From<Model> for TransferTask {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            related_transaction_id: model.related_transaction_id,
            completed_transaction_id: model.completed_transaction_id,
            from_physical_bucket_id: model.from_physical_bucket_id,
            to_physical_bucket_id: model.to_physical_bucket_id,
            amount: model.amount,
            is_completed: model.is_completed,
        }
    }
}
