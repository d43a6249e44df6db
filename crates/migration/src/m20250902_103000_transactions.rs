use sea_orm_migration::prelude::*;

use crate::m20250902_101500_buckets::Buckets;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
pub enum Transactions {
    Table,
    Id,
    Description,
    OccurredAt,
    IsInternalTransfer,
    IsExternalInflow,
}

#[derive(Iden)]
enum TransactionEntries {
    Table,
    Id,
    TransactionId,
    BucketId,
    Amount,
    Direction,
    Layer,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::Description).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::OccurredAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::IsInternalTransfer)
                            .boolean()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::IsExternalInflow)
                            .boolean()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-occurred_at")
                    .table(Transactions::Table)
                    .col(Transactions::OccurredAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TransactionEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TransactionEntries::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TransactionEntries::TransactionId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TransactionEntries::BucketId).uuid().not_null())
                    .col(
                        ColumnDef::new(TransactionEntries::Amount)
                            .decimal_len(16, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransactionEntries::Direction)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TransactionEntries::Layer).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transaction_entries-transaction_id")
                            .from(TransactionEntries::Table, TransactionEntries::TransactionId)
                            .to(Transactions::Table, Transactions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transaction_entries-bucket_id")
                            .from(TransactionEntries::Table, TransactionEntries::BucketId)
                            .to(Buckets::Table, Buckets::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transaction_entries-transaction_id")
                    .table(TransactionEntries::Table)
                    .col(TransactionEntries::TransactionId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transaction_entries-bucket_id")
                    .table(TransactionEntries::Table)
                    .col(TransactionEntries::BucketId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TransactionEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        Ok(())
    }
}
