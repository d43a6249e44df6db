use sea_orm_migration::prelude::*;

use crate::m20250902_101500_buckets::Buckets;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum SplitRules {
    Table,
    Id,
    Name,
    SourceBucketId,
}

#[derive(Iden)]
enum SplitRuleItems {
    Table,
    Id,
    SplitRuleId,
    TargetBucketId,
    Kind,
    Value,
    Priority,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SplitRules::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SplitRules::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SplitRules::Name).string().not_null())
                    .col(ColumnDef::new(SplitRules::SourceBucketId).uuid().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-split_rules-source_bucket_id")
                            .from(SplitRules::Table, SplitRules::SourceBucketId)
                            .to(Buckets::Table, Buckets::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // One rule per income source.
        manager
            .create_index(
                Index::create()
                    .name("idx-split_rules-source_bucket_id")
                    .table(SplitRules::Table)
                    .col(SplitRules::SourceBucketId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SplitRuleItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SplitRuleItems::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SplitRuleItems::SplitRuleId).uuid().not_null())
                    .col(
                        ColumnDef::new(SplitRuleItems::TargetBucketId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SplitRuleItems::Kind).string().not_null())
                    .col(
                        ColumnDef::new(SplitRuleItems::Value)
                            .decimal_len(16, 4)
                            .not_null(),
                    )
                    .col(ColumnDef::new(SplitRuleItems::Priority).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-split_rule_items-split_rule_id")
                            .from(SplitRuleItems::Table, SplitRuleItems::SplitRuleId)
                            .to(SplitRules::Table, SplitRules::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-split_rule_items-target_bucket_id")
                            .from(SplitRuleItems::Table, SplitRuleItems::TargetBucketId)
                            .to(Buckets::Table, Buckets::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-split_rule_items-split_rule_id")
                    .table(SplitRuleItems::Table)
                    .col(SplitRuleItems::SplitRuleId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SplitRuleItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SplitRules::Table).to_owned())
            .await?;
        Ok(())
    }
}
