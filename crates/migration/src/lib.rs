pub use sea_orm_migration::prelude::*;

mod m20250902_101500_buckets;
mod m20250902_103000_transactions;
mod m20250903_090000_split_rules;
mod m20250903_110000_market_values;
mod m20250905_140000_transfer_tasks;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250902_101500_buckets::Migration),
            Box::new(m20250902_103000_transactions::Migration),
            Box::new(m20250903_090000_split_rules::Migration),
            Box::new(m20250903_110000_market_values::Migration),
            Box::new(m20250905_140000_transfer_tasks::Migration),
        ]
    }
}
