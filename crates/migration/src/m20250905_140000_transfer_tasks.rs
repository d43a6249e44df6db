use sea_orm_migration::prelude::*;

use crate::m20250902_101500_buckets::Buckets;
use crate::m20250902_103000_transactions::Transactions;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum TransferTasks {
    Table,
    Id,
    RelatedTransactionId,
    CompletedTransactionId,
    FromPhysicalBucketId,
    ToPhysicalBucketId,
    Amount,
    IsCompleted,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TransferTasks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TransferTasks::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TransferTasks::RelatedTransactionId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TransferTasks::CompletedTransactionId).uuid())
                    .col(
                        ColumnDef::new(TransferTasks::FromPhysicalBucketId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransferTasks::ToPhysicalBucketId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransferTasks::Amount)
                            .decimal_len(16, 4)
                            .not_null(),
                    )
                    .col(ColumnDef::new(TransferTasks::IsCompleted).boolean().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transfer_tasks-related_transaction_id")
                            .from(TransferTasks::Table, TransferTasks::RelatedTransactionId)
                            .to(Transactions::Table, Transactions::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transfer_tasks-from_physical_bucket_id")
                            .from(TransferTasks::Table, TransferTasks::FromPhysicalBucketId)
                            .to(Buckets::Table, Buckets::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transfer_tasks-to_physical_bucket_id")
                            .from(TransferTasks::Table, TransferTasks::ToPhysicalBucketId)
                            .to(Buckets::Table, Buckets::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transfer_tasks-related_transaction_id")
                    .table(TransferTasks::Table)
                    .col(TransferTasks::RelatedTransactionId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TransferTasks::Table).to_owned())
            .await?;
        Ok(())
    }
}
