use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
pub enum Buckets {
    Table,
    Id,
    Name,
    BucketType,
    ParentPhysicalBucketId,
    CurrentBalance,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Buckets::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Buckets::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Buckets::Name).string().not_null())
                    .col(ColumnDef::new(Buckets::BucketType).string().not_null())
                    .col(ColumnDef::new(Buckets::ParentPhysicalBucketId).uuid())
                    .col(
                        ColumnDef::new(Buckets::CurrentBalance)
                            .decimal_len(16, 4)
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-buckets-parent_physical_bucket_id")
                            .from(Buckets::Table, Buckets::ParentPhysicalBucketId)
                            .to(Buckets::Table, Buckets::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-buckets-bucket_type")
                    .table(Buckets::Table)
                    .col(Buckets::BucketType)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Buckets::Table).to_owned())
            .await?;
        Ok(())
    }
}
