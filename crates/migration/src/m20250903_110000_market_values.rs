use sea_orm_migration::prelude::*;

use crate::m20250902_101500_buckets::Buckets;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum MarketValueHistory {
    Table,
    Id,
    BucketId,
    RecordedAt,
    MarketValue,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MarketValueHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MarketValueHistory::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MarketValueHistory::BucketId).uuid().not_null())
                    .col(
                        ColumnDef::new(MarketValueHistory::RecordedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MarketValueHistory::MarketValue)
                            .decimal_len(16, 4)
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-market_value_history-bucket_id")
                            .from(MarketValueHistory::Table, MarketValueHistory::BucketId)
                            .to(Buckets::Table, Buckets::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-market_value_history-bucket_id-recorded_at")
                    .table(MarketValueHistory::Table)
                    .col(MarketValueHistory::BucketId)
                    .col(MarketValueHistory::RecordedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MarketValueHistory::Table).to_owned())
            .await?;
        Ok(())
    }
}
