//! The double-entry core of bilancio.
//!
//! Money lives in [`Bucket`]s and only moves through balanced
//! [`Transaction`]s. Every transaction carries entries in up to two layers:
//! the physical layer tracks real accounts, the virtual layer tracks the
//! envelopes that subdivide them, and each layer must balance on its own.
//!
//! [`Ledger`] is the single handle over the database. Every posting operation
//! is one atomic unit of work: the transaction header, its entries, the
//! induced bucket-balance updates and any generated transfer tasks all commit
//! together or not at all.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    prelude::*, ActiveValue, DatabaseTransaction, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};
use std::collections::HashMap;
use uuid::Uuid;

pub use allocator::{allocate, Allocation};
pub use buckets::{
    Bucket, BucketType, SYSTEM_EXTRA_INCOME, SYSTEM_LOST_MISC, SYSTEM_VIRTUAL_CLEARING,
};
pub use entries::{Entry, EntryDirection, EntryLayer};
pub use error::LedgerError;
pub use market_values::MarketValuePoint;
pub use split_rules::{SplitKind, SplitRule, SplitRuleItem};
pub use transactions::Transaction;
pub use transfer_tasks::TransferTask;

pub mod allocator;
pub mod buckets;
pub mod entries;
mod error;
pub mod market_values;
pub mod split_rules;
mod task_planner;
pub mod transactions;
pub mod transfer_tasks;
mod util;

type ResultLedger<T> = Result<T, LedgerError>;

/// Input for [`Ledger::record_inflow`].
#[derive(Clone, Debug)]
pub struct InflowCmd {
    pub amount: Decimal,
    pub description: String,
    pub source_bucket_id: Uuid,
    pub is_external: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Input for [`Ledger::log_expense`].
#[derive(Clone, Debug)]
pub struct ExpenseCmd {
    pub amount: Decimal,
    pub description: String,
    pub virtual_bucket_id: Uuid,
    pub category_bucket_id: Uuid,
    pub physical_override_id: Option<Uuid>,
    pub occurred_at: DateTime<Utc>,
}

/// Input for [`Ledger::create_bucket`] (administrative path).
#[derive(Clone, Debug)]
pub struct NewBucket {
    /// Explicit id for seeded buckets; generated when absent.
    pub id: Option<Uuid>,
    pub name: String,
    pub bucket_type: BucketType,
    pub parent_physical_bucket_id: Option<Uuid>,
}

/// Input for [`Ledger::create_split_rule`] (administrative path).
#[derive(Clone, Debug)]
pub struct NewSplitRule {
    pub name: String,
    pub source_bucket_id: Uuid,
    pub items: Vec<NewSplitRuleItem>,
}

#[derive(Clone, Debug)]
pub struct NewSplitRuleItem {
    pub target_bucket_id: Uuid,
    pub kind: SplitKind,
    pub value: Decimal,
    pub priority: i32,
}

/// Net worth decomposition returned by [`Ledger::net_worth`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NetWorth {
    /// Sum of physical bucket balances.
    pub liquidity: Decimal,
    /// Sum of the latest market value of each equity bucket.
    pub equity: Decimal,
    pub total: Decimal,
}

/// One page of [`Ledger::list_transactions`] results.
#[derive(Clone, Debug)]
pub struct TransactionPage {
    /// Most recent first, entries included.
    pub transactions: Vec<Transaction>,
    pub total_count: u64,
    /// Display names for every bucket referenced by the page's entries.
    pub bucket_names: HashMap<Uuid, String>,
}

#[derive(Debug)]
pub struct Ledger {
    database: DatabaseConnection,
}

impl Ledger {
    /// Return a builder for `Ledger`.
    pub fn builder() -> LedgerBuilder {
        LedgerBuilder::default()
    }

    async fn require_bucket(
        &self,
        db: &DatabaseTransaction,
        bucket_id: Uuid,
    ) -> ResultLedger<Bucket> {
        let model = buckets::Entity::find_by_id(bucket_id)
            .one(db)
            .await?
            .ok_or_else(|| LedgerError::NotFound("bucket".to_string()))?;
        Ok(model.into())
    }

    async fn require_split_rule(
        &self,
        db: &DatabaseTransaction,
        source_bucket_id: Uuid,
    ) -> ResultLedger<SplitRule> {
        let rule_model = split_rules::Entity::find()
            .filter(split_rules::Column::SourceBucketId.eq(source_bucket_id))
            .one(db)
            .await?
            .ok_or_else(|| LedgerError::NotFound("split rule".to_string()))?;

        let item_models = split_rules::items::Entity::find()
            .filter(split_rules::items::Column::SplitRuleId.eq(rule_model.id))
            .order_by_asc(split_rules::items::Column::Priority)
            .all(db)
            .await?;

        Ok(SplitRule {
            id: rule_model.id,
            name: rule_model.name,
            source_bucket_id: rule_model.source_bucket_id,
            items: item_models.into_iter().map(Into::into).collect(),
        })
    }

    fn physical_anchor(bucket: &Bucket) -> Option<Uuid> {
        match bucket.bucket_type {
            BucketType::Physical => Some(bucket.id),
            BucketType::Virtual => bucket.parent_physical_bucket_id,
            BucketType::Income | BucketType::Expense | BucketType::Equity | BucketType::System => {
                None
            }
        }
    }

    /// Persists a validated transaction: header, entries, the bucket-balance
    /// adjustments the entries induce, and any transfer tasks — all inside
    /// the caller's open database transaction.
    ///
    /// Balance rule: a DEBIT moves the bucket by `+amount`, a CREDIT by
    /// `-amount`, so `current_balance` always equals the signed sum of the
    /// bucket's posted entries.
    async fn persist_transaction(
        &self,
        db: &DatabaseTransaction,
        tx: &Transaction,
        tasks: &[TransferTask],
    ) -> ResultLedger<()> {
        transactions::ActiveModel::from(tx).insert(db).await?;

        let mut new_balances: HashMap<Uuid, Decimal> = HashMap::new();
        for entry in &tx.entries {
            let current = match new_balances.get(&entry.bucket_id) {
                Some(balance) => *balance,
                None => {
                    self.require_bucket(db, entry.bucket_id)
                        .await?
                        .current_balance
                }
            };
            new_balances.insert(entry.bucket_id, current + entry.signed_amount());

            entries::ActiveModel::from(entry).insert(db).await?;
        }

        for (bucket_id, balance) in new_balances {
            let bucket_model = buckets::ActiveModel {
                id: ActiveValue::Set(bucket_id),
                current_balance: ActiveValue::Set(balance),
                ..Default::default()
            };
            bucket_model.update(db).await?;
        }

        for task in tasks {
            transfer_tasks::ActiveModel::from(task).insert(db).await?;
        }

        Ok(())
    }

    /// Records an income event.
    ///
    /// External inflows are split across the source bucket's rule: the
    /// physical layer debits the (single) destination bank, the virtual layer
    /// debits each allocated envelope, and both layers credit the income
    /// source. Internal inflows are not supported.
    pub async fn record_inflow(&self, cmd: InflowCmd) -> ResultLedger<Transaction> {
        if cmd.amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(
                "inflow amount must be positive".to_string(),
            ));
        }

        let db_tx = self.database.begin().await?;
        let source = self.require_bucket(&db_tx, cmd.source_bucket_id).await?;
        if source.bucket_type != BucketType::Income {
            return Err(LedgerError::InvalidType(
                "source bucket must be an INCOME bucket".to_string(),
            ));
        }
        if !cmd.is_external {
            return Err(LedgerError::Unsupported(
                "internal-transfer inflow is not supported".to_string(),
            ));
        }

        let rule = self.require_split_rule(&db_tx, source.id).await?;
        rule.validate()?;
        let allocations = allocator::allocate(cmd.amount, &rule.items)?;

        // The rule's first target decides the physical destination; every
        // other target must live under the same parent.
        let first_target = self
            .require_bucket(&db_tx, rule.items[0].target_bucket_id)
            .await?;
        if first_target.bucket_type != BucketType::Virtual {
            return Err(LedgerError::InvalidRule(
                "split rule targets must be VIRTUAL buckets".to_string(),
            ));
        }
        let destination_id = first_target.parent_physical_bucket_id.ok_or_else(|| {
            LedgerError::InvalidRule("split rule target has no parent physical bucket".to_string())
        })?;

        let mut anchors: HashMap<Uuid, Option<Uuid>> = HashMap::new();
        anchors.insert(source.id, Self::physical_anchor(&source));
        for allocation in &allocations {
            let target = self
                .require_bucket(&db_tx, allocation.target_bucket_id)
                .await?;
            if target.bucket_type != BucketType::Virtual {
                return Err(LedgerError::InvalidRule(
                    "split rule targets must be VIRTUAL buckets".to_string(),
                ));
            }
            if target.parent_physical_bucket_id != Some(destination_id) {
                return Err(LedgerError::InvalidRule(
                    "split rule targets must share the same parent physical bucket".to_string(),
                ));
            }
            anchors.insert(target.id, Self::physical_anchor(&target));
        }

        let mut tx = Transaction::new(cmd.description, cmd.occurred_at, false, true);
        tx.push_entry(
            destination_id,
            cmd.amount,
            EntryDirection::Debit,
            EntryLayer::Physical,
        );
        tx.push_entry(
            source.id,
            cmd.amount,
            EntryDirection::Credit,
            EntryLayer::Physical,
        );
        // Zero allocations (a 0% item, an exhausted remainder) produce no
        // entry: entry amounts are strictly positive.
        for allocation in allocations
            .iter()
            .filter(|allocation| allocation.amount > Decimal::ZERO)
        {
            tx.push_entry(
                allocation.target_bucket_id,
                allocation.amount,
                EntryDirection::Debit,
                EntryLayer::Virtual,
            );
        }
        tx.push_entry(
            source.id,
            cmd.amount,
            EntryDirection::Credit,
            EntryLayer::Virtual,
        );
        tx.validate()?;

        let tasks = task_planner::plan_transfer_tasks(&tx, &anchors);
        self.persist_transaction(&db_tx, &tx, &tasks).await?;
        db_tx.commit().await?;

        tracing::info!(transaction_id = %tx.id, amount = %cmd.amount, "recorded inflow");
        Ok(tx)
    }

    /// Logs an expense.
    ///
    /// The physical layer credits the paying account, the virtual layer
    /// credits the planned envelope, and both layers debit the expense
    /// category. Returns the transaction and the physical bucket that
    /// actually paid.
    ///
    /// When `physical_override_id` names a different account than the
    /// envelope's parent (the "wrong card" case), the books only reconcile
    /// through a later real transfer; a pending transfer task from the
    /// override to the parent is persisted with the posting.
    pub async fn log_expense(&self, cmd: ExpenseCmd) -> ResultLedger<(Transaction, Uuid)> {
        if cmd.amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(
                "expense amount must be positive".to_string(),
            ));
        }

        let db_tx = self.database.begin().await?;
        let virtual_bucket = self.require_bucket(&db_tx, cmd.virtual_bucket_id).await?;
        if virtual_bucket.bucket_type != BucketType::Virtual {
            return Err(LedgerError::InvalidType(
                "expense must draw from a VIRTUAL bucket".to_string(),
            ));
        }
        let category = self.require_bucket(&db_tx, cmd.category_bucket_id).await?;
        if category.bucket_type != BucketType::Expense {
            return Err(LedgerError::InvalidType(
                "category must be an EXPENSE bucket".to_string(),
            ));
        }

        let parent_id = virtual_bucket.parent_physical_bucket_id.ok_or_else(|| {
            LedgerError::InvalidType("virtual bucket has no parent physical bucket".to_string())
        })?;
        let physical_source_id = match cmd.physical_override_id {
            Some(override_id) => {
                let override_bucket = self.require_bucket(&db_tx, override_id).await?;
                if override_bucket.bucket_type != BucketType::Physical {
                    return Err(LedgerError::InvalidType(
                        "physical override must be a PHYSICAL bucket".to_string(),
                    ));
                }
                override_bucket.id
            }
            None => parent_id,
        };

        let mut tx = Transaction::new(cmd.description, cmd.occurred_at, false, false);
        tx.push_entry(
            physical_source_id,
            cmd.amount,
            EntryDirection::Credit,
            EntryLayer::Physical,
        );
        tx.push_entry(
            category.id,
            cmd.amount,
            EntryDirection::Debit,
            EntryLayer::Physical,
        );
        tx.push_entry(
            virtual_bucket.id,
            cmd.amount,
            EntryDirection::Credit,
            EntryLayer::Virtual,
        );
        tx.push_entry(
            category.id,
            cmd.amount,
            EntryDirection::Debit,
            EntryLayer::Virtual,
        );
        tx.validate()?;

        let anchors = HashMap::from([
            (virtual_bucket.id, Self::physical_anchor(&virtual_bucket)),
            (category.id, Self::physical_anchor(&category)),
        ]);
        let mut tasks = task_planner::plan_transfer_tasks(&tx, &anchors);
        if physical_source_id != parent_id {
            tasks.push(TransferTask::pending(
                tx.id,
                physical_source_id,
                parent_id,
                cmd.amount,
            ));
        }

        self.persist_transaction(&db_tx, &tx, &tasks).await?;
        db_tx.commit().await?;

        tracing::info!(transaction_id = %tx.id, amount = %cmd.amount, "logged expense");
        Ok((tx, physical_source_id))
    }

    /// Appends a market-value point for a bucket.
    ///
    /// No transaction entries are created; book value stays untouched.
    pub async fn update_market_value(
        &self,
        bucket_id: Uuid,
        market_value: Decimal,
        recorded_at: DateTime<Utc>,
    ) -> ResultLedger<MarketValuePoint> {
        if market_value <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(
                "market value must be positive".to_string(),
            ));
        }

        let db_tx = self.database.begin().await?;
        self.require_bucket(&db_tx, bucket_id).await?;

        let point = MarketValuePoint::new(bucket_id, recorded_at, market_value);
        market_values::ActiveModel::from(&point).insert(&db_tx).await?;
        db_tx.commit().await?;

        Ok(point)
    }

    /// Latest market value minus book value; 0 when no point exists.
    pub async fn calculate_profit(&self, bucket_id: Uuid) -> ResultLedger<Decimal> {
        let db_tx = self.database.begin().await?;
        let bucket = self.require_bucket(&db_tx, bucket_id).await?;
        let latest = self.latest_market_value(&db_tx, bucket_id).await?;
        db_tx.commit().await?;

        Ok(match latest {
            Some(point) => point.market_value - bucket.current_balance,
            None => Decimal::ZERO,
        })
    }

    async fn latest_market_value(
        &self,
        db: &DatabaseTransaction,
        bucket_id: Uuid,
    ) -> ResultLedger<Option<MarketValuePoint>> {
        let model = market_values::Entity::find()
            .filter(market_values::Column::BucketId.eq(bucket_id))
            .order_by_desc(market_values::Column::RecordedAt)
            .one(db)
            .await?;
        Ok(model.map(Into::into))
    }

    /// Net worth decomposition: physical balances are liquidity, the latest
    /// market value of each equity bucket is equity (0 without history).
    pub async fn net_worth(&self) -> ResultLedger<NetWorth> {
        let db_tx = self.database.begin().await?;

        let physical = buckets::Entity::find()
            .filter(buckets::Column::BucketType.eq(BucketType::Physical))
            .all(&db_tx)
            .await?;
        let liquidity = physical
            .iter()
            .fold(Decimal::ZERO, |sum, bucket| sum + bucket.current_balance);

        let equity_buckets = buckets::Entity::find()
            .filter(buckets::Column::BucketType.eq(BucketType::Equity))
            .all(&db_tx)
            .await?;
        let mut equity = Decimal::ZERO;
        for bucket in &equity_buckets {
            if let Some(point) = self.latest_market_value(&db_tx, bucket.id).await? {
                equity += point.market_value;
            }
        }

        db_tx.commit().await?;
        Ok(NetWorth {
            liquidity,
            equity,
            total: liquidity + equity,
        })
    }

    /// Lists committed transactions, newest first (ties broken by id), with
    /// their entries and a name map for every referenced bucket.
    pub async fn list_transactions(
        &self,
        limit: u64,
        offset: u64,
        bucket_id: Option<Uuid>,
    ) -> ResultLedger<TransactionPage> {
        if limit == 0 {
            return Err(LedgerError::OutOfRange("limit must be positive".to_string()));
        }

        let db_tx = self.database.begin().await?;

        let mut query = transactions::Entity::find();
        if let Some(bucket_id) = bucket_id {
            query = query
                .join(JoinType::InnerJoin, transactions::Relation::Entries.def())
                .filter(entries::Column::BucketId.eq(bucket_id))
                .distinct();
        }

        let total_count = query.clone().count(&db_tx).await?;

        let tx_models = query
            .order_by_desc(transactions::Column::OccurredAt)
            .order_by_asc(transactions::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(&db_tx)
            .await?;

        let tx_ids: Vec<Uuid> = tx_models.iter().map(|model| model.id).collect();
        let mut transactions_by_id: HashMap<Uuid, Transaction> = HashMap::new();
        let mut ordered_ids = Vec::with_capacity(tx_models.len());
        for model in tx_models {
            ordered_ids.push(model.id);
            transactions_by_id.insert(model.id, model.into());
        }

        let mut referenced_buckets = Vec::new();
        if !tx_ids.is_empty() {
            let entry_models = entries::Entity::find()
                .filter(entries::Column::TransactionId.is_in(tx_ids))
                .all(&db_tx)
                .await?;
            for model in entry_models {
                referenced_buckets.push(model.bucket_id);
                if let Some(tx) = transactions_by_id.get_mut(&model.transaction_id) {
                    tx.entries.push(model.into());
                }
            }
        }

        let mut bucket_names = HashMap::new();
        if !referenced_buckets.is_empty() {
            referenced_buckets.sort();
            referenced_buckets.dedup();
            let bucket_models = buckets::Entity::find()
                .filter(buckets::Column::Id.is_in(referenced_buckets))
                .all(&db_tx)
                .await?;
            for model in bucket_models {
                bucket_names.insert(model.id, model.name);
            }
        }

        db_tx.commit().await?;

        let transactions = ordered_ids
            .into_iter()
            .filter_map(|id| transactions_by_id.remove(&id))
            .collect();
        Ok(TransactionPage {
            transactions,
            total_count,
            bucket_names,
        })
    }

    /// Lists buckets, optionally filtered to a single type.
    pub async fn list_buckets(&self, type_filter: Option<BucketType>) -> ResultLedger<Vec<Bucket>> {
        let mut query = buckets::Entity::find().order_by_asc(buckets::Column::Name);
        if let Some(bucket_type) = type_filter {
            query = query.filter(buckets::Column::BucketType.eq(bucket_type));
        }
        let models = query.all(&self.database).await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    /// Returns a bucket snapshot.
    pub async fn bucket(&self, bucket_id: Uuid) -> ResultLedger<Bucket> {
        let model = buckets::Entity::find_by_id(bucket_id)
            .one(&self.database)
            .await?
            .ok_or_else(|| LedgerError::NotFound("bucket".to_string()))?;
        Ok(model.into())
    }

    /// Creates a bucket (administrative path; postings never create buckets).
    pub async fn create_bucket(&self, cmd: NewBucket) -> ResultLedger<Bucket> {
        let name = util::trimmed_name(&cmd.name, "bucket")?;

        let db_tx = self.database.begin().await?;
        if let Some(parent_id) = cmd.parent_physical_bucket_id {
            let parent = self.require_bucket(&db_tx, parent_id).await?;
            if parent.bucket_type != BucketType::Physical {
                return Err(LedgerError::InvalidType(
                    "parent must reference a PHYSICAL bucket".to_string(),
                ));
            }
        }

        let mut bucket = Bucket::new(name, cmd.bucket_type, cmd.parent_physical_bucket_id)?;
        if let Some(id) = cmd.id {
            bucket.id = id;
        }

        buckets::ActiveModel::from(&bucket).insert(&db_tx).await?;
        db_tx.commit().await?;
        Ok(bucket)
    }

    /// Authors a split rule for an income bucket (administrative path).
    ///
    /// One rule per source bucket; targets must exist.
    pub async fn create_split_rule(&self, cmd: NewSplitRule) -> ResultLedger<SplitRule> {
        let name = util::trimmed_name(&cmd.name, "split rule")?;

        let db_tx = self.database.begin().await?;
        let source = self.require_bucket(&db_tx, cmd.source_bucket_id).await?;
        if source.bucket_type != BucketType::Income {
            return Err(LedgerError::InvalidType(
                "split rule source must be an INCOME bucket".to_string(),
            ));
        }

        let existing = split_rules::Entity::find()
            .filter(split_rules::Column::SourceBucketId.eq(source.id))
            .one(&db_tx)
            .await?;
        if existing.is_some() {
            return Err(LedgerError::InvalidRule(
                "a split rule already exists for this source bucket".to_string(),
            ));
        }

        let rule_id = Uuid::new_v4();
        let mut items: Vec<SplitRuleItem> = cmd
            .items
            .into_iter()
            .map(|item| SplitRuleItem {
                id: Uuid::new_v4(),
                split_rule_id: rule_id,
                target_bucket_id: item.target_bucket_id,
                kind: item.kind,
                value: item.value,
                priority: item.priority,
            })
            .collect();
        items.sort_by_key(|item| item.priority);

        let rule = SplitRule {
            id: rule_id,
            name,
            source_bucket_id: source.id,
            items,
        };
        rule.validate()?;
        for item in &rule.items {
            self.require_bucket(&db_tx, item.target_bucket_id).await?;
        }

        split_rules::ActiveModel::from(&rule).insert(&db_tx).await?;
        for item in &rule.items {
            split_rules::items::ActiveModel::from(item)
                .insert(&db_tx)
                .await?;
        }
        db_tx.commit().await?;
        Ok(rule)
    }

    /// Looks up the split rule attached to an income bucket.
    pub async fn split_rule_for(&self, source_bucket_id: Uuid) -> ResultLedger<SplitRule> {
        let db_tx = self.database.begin().await?;
        let rule = self.require_split_rule(&db_tx, source_bucket_id).await?;
        db_tx.commit().await?;
        Ok(rule)
    }

    /// Guarantees the well-known system buckets exist with their reserved
    /// identifiers. Idempotent; safe to run on every startup.
    pub async fn ensure_system_buckets(&self) -> ResultLedger<()> {
        let db_tx = self.database.begin().await?;
        for (id, name) in buckets::SYSTEM_BUCKETS {
            let existing = buckets::Entity::find_by_id(id).one(&db_tx).await?;
            if existing.is_some() {
                continue;
            }
            let bucket_model = buckets::ActiveModel {
                id: ActiveValue::Set(id),
                name: ActiveValue::Set(name.to_string()),
                bucket_type: ActiveValue::Set(BucketType::System),
                parent_physical_bucket_id: ActiveValue::Set(None),
                current_balance: ActiveValue::Set(Decimal::ZERO),
            };
            bucket_model.insert(&db_tx).await?;
            tracing::info!(bucket_id = %id, name, "seeded system bucket");
        }
        db_tx.commit().await?;
        Ok(())
    }

    /// Lists generated transfer tasks, optionally only the pending ones.
    pub async fn list_transfer_tasks(&self, only_pending: bool) -> ResultLedger<Vec<TransferTask>> {
        let mut query = transfer_tasks::Entity::find();
        if only_pending {
            query = query.filter(transfer_tasks::Column::IsCompleted.eq(false));
        }
        let models = query.all(&self.database).await?;
        Ok(models.into_iter().map(Into::into).collect())
    }
}

/// The builder for `Ledger`.
#[derive(Default)]
pub struct LedgerBuilder {
    database: DatabaseConnection,
}

impl LedgerBuilder {
    /// Pass the required database.
    pub fn database(mut self, db: DatabaseConnection) -> LedgerBuilder {
        self.database = db;
        self
    }

    /// Construct `Ledger`.
    pub async fn build(self) -> ResultLedger<Ledger> {
        Ok(Ledger {
            database: self.database,
        })
    }
}
