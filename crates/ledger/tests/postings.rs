#![allow(clippy::expect_used, clippy::unwrap_used)]

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::Database;
use std::collections::HashMap;
use uuid::Uuid;

use ledger::{
    BucketType, ExpenseCmd, InflowCmd, Ledger, LedgerError, NewBucket, NewSplitRule,
    NewSplitRuleItem, SplitKind,
};
use migration::MigratorTrait;

async fn ledger_with_db() -> Ledger {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Ledger::builder().database(db).build().await.unwrap()
}

async fn create_bucket(
    ledger: &Ledger,
    name: &str,
    bucket_type: BucketType,
    parent: Option<Uuid>,
) -> Uuid {
    ledger
        .create_bucket(NewBucket {
            id: None,
            name: name.to_string(),
            bucket_type,
            parent_physical_bucket_id: parent,
        })
        .await
        .unwrap()
        .id
}

fn rule_item(target: Uuid, kind: SplitKind, value: Decimal, priority: i32) -> NewSplitRuleItem {
    NewSplitRuleItem {
        target_bucket_id: target,
        kind,
        value,
        priority,
    }
}

async fn balance(ledger: &Ledger, bucket_id: Uuid) -> Decimal {
    ledger.bucket(bucket_id).await.unwrap().current_balance
}

#[tokio::test]
async fn external_inflow_splits_across_envelopes() {
    let ledger = ledger_with_db().await;

    let bank = create_bucket(&ledger, "Main Bank", BucketType::Physical, None).await;
    let coffee = create_bucket(&ledger, "Coffee", BucketType::Virtual, Some(bank)).await;
    let missions = create_bucket(&ledger, "Missions", BucketType::Virtual, Some(bank)).await;
    let catch_all = create_bucket(&ledger, "Catch-All", BucketType::Virtual, Some(bank)).await;
    let employer = create_bucket(&ledger, "Employer", BucketType::Income, None).await;

    ledger
        .create_split_rule(NewSplitRule {
            name: "Paycheck".to_string(),
            source_bucket_id: employer,
            items: vec![
                rule_item(coffee, SplitKind::Fixed, dec!(50), 1),
                rule_item(missions, SplitKind::Percent, dec!(10), 2),
                rule_item(catch_all, SplitKind::Remainder, Decimal::ZERO, 3),
            ],
        })
        .await
        .unwrap();

    let tx = ledger
        .record_inflow(InflowCmd {
            amount: dec!(1000),
            description: "October salary".to_string(),
            source_bucket_id: employer,
            is_external: true,
            occurred_at: Utc::now(),
        })
        .await
        .unwrap();

    assert!(tx.is_external_inflow);
    assert!(!tx.is_internal_transfer);
    // 2 physical + 3 virtual debits + 1 virtual credit.
    assert_eq!(tx.entries.len(), 6);

    assert_eq!(balance(&ledger, bank).await, dec!(1000));
    assert_eq!(balance(&ledger, coffee).await, dec!(50));
    assert_eq!(balance(&ledger, missions).await, dec!(95));
    assert_eq!(balance(&ledger, catch_all).await, dec!(855));

    // All envelopes share one bank: nothing to transfer for real.
    assert!(ledger.list_transfer_tasks(true).await.unwrap().is_empty());
}

#[tokio::test]
async fn inflow_requires_rule_and_income_source() {
    let ledger = ledger_with_db().await;

    let bank = create_bucket(&ledger, "Main Bank", BucketType::Physical, None).await;
    let employer = create_bucket(&ledger, "Employer", BucketType::Income, None).await;

    let err = ledger
        .record_inflow(InflowCmd {
            amount: dec!(100),
            description: String::new(),
            source_bucket_id: bank,
            is_external: true,
            occurred_at: Utc::now(),
        })
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::InvalidType("source bucket must be an INCOME bucket".to_string())
    );

    let err = ledger
        .record_inflow(InflowCmd {
            amount: dec!(100),
            description: String::new(),
            source_bucket_id: employer,
            is_external: true,
            occurred_at: Utc::now(),
        })
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::NotFound("split rule".to_string()));

    let err = ledger
        .record_inflow(InflowCmd {
            amount: dec!(100),
            description: String::new(),
            source_bucket_id: employer,
            is_external: false,
            occurred_at: Utc::now(),
        })
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::Unsupported("internal-transfer inflow is not supported".to_string())
    );
}

#[tokio::test]
async fn inflow_rejects_targets_in_different_banks() {
    let ledger = ledger_with_db().await;

    let bank_a = create_bucket(&ledger, "Bank A", BucketType::Physical, None).await;
    let bank_b = create_bucket(&ledger, "Bank B", BucketType::Physical, None).await;
    let env_a = create_bucket(&ledger, "Env A", BucketType::Virtual, Some(bank_a)).await;
    let env_b = create_bucket(&ledger, "Env B", BucketType::Virtual, Some(bank_b)).await;
    let employer = create_bucket(&ledger, "Employer", BucketType::Income, None).await;

    ledger
        .create_split_rule(NewSplitRule {
            name: "Split banks".to_string(),
            source_bucket_id: employer,
            items: vec![
                rule_item(env_a, SplitKind::Fixed, dec!(10), 1),
                rule_item(env_b, SplitKind::Remainder, Decimal::ZERO, 2),
            ],
        })
        .await
        .unwrap();

    let err = ledger
        .record_inflow(InflowCmd {
            amount: dec!(100),
            description: String::new(),
            source_bucket_id: employer,
            is_external: true,
            occurred_at: Utc::now(),
        })
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::InvalidRule(
            "split rule targets must share the same parent physical bucket".to_string()
        )
    );

    // The rejected posting left nothing behind.
    let page = ledger.list_transactions(10, 0, None).await.unwrap();
    assert_eq!(page.total_count, 0);
    assert_eq!(balance(&ledger, bank_a).await, Decimal::ZERO);
    assert_eq!(balance(&ledger, env_a).await, Decimal::ZERO);
}

#[tokio::test]
async fn expense_moves_both_layers() {
    let ledger = ledger_with_db().await;

    let bank = create_bucket(&ledger, "Main Bank", BucketType::Physical, None).await;
    let unallocated = create_bucket(&ledger, "Unallocated", BucketType::Virtual, Some(bank)).await;
    let groceries = create_bucket(&ledger, "Groceries", BucketType::Expense, None).await;
    let employer = create_bucket(&ledger, "Employer", BucketType::Income, None).await;

    ledger
        .create_split_rule(NewSplitRule {
            name: "All unallocated".to_string(),
            source_bucket_id: employer,
            items: vec![rule_item(unallocated, SplitKind::Remainder, Decimal::ZERO, 1)],
        })
        .await
        .unwrap();
    ledger
        .record_inflow(InflowCmd {
            amount: dec!(1000),
            description: "seed".to_string(),
            source_bucket_id: employer,
            is_external: true,
            occurred_at: Utc::now(),
        })
        .await
        .unwrap();

    let (tx, physical_source) = ledger
        .log_expense(ExpenseCmd {
            amount: dec!(50),
            description: "Groceries".to_string(),
            virtual_bucket_id: unallocated,
            category_bucket_id: groceries,
            physical_override_id: None,
            occurred_at: Utc::now(),
        })
        .await
        .unwrap();

    assert_eq!(physical_source, bank);
    assert_eq!(tx.entries.len(), 4);

    assert_eq!(balance(&ledger, bank).await, dec!(950));
    assert_eq!(balance(&ledger, unallocated).await, dec!(950));
    // The category is debited in both layers, so its raw balance carries 2x.
    assert_eq!(balance(&ledger, groceries).await, dec!(100));

    // Same-bank expense: no real-world transfer pending.
    assert!(ledger.list_transfer_tasks(true).await.unwrap().is_empty());
}

#[tokio::test]
async fn wrong_card_expense_emits_reconciliation_task() {
    let ledger = ledger_with_db().await;

    let checking = create_bucket(&ledger, "Checking", BucketType::Physical, None).await;
    let credit_card = create_bucket(&ledger, "CreditCard", BucketType::Physical, None).await;
    let free_cash = create_bucket(&ledger, "FreeCash", BucketType::Virtual, Some(checking)).await;
    let groceries = create_bucket(&ledger, "Groceries", BucketType::Expense, None).await;

    let (tx, physical_source) = ledger
        .log_expense(ExpenseCmd {
            amount: dec!(50),
            description: "Groceries, wrong card".to_string(),
            virtual_bucket_id: free_cash,
            category_bucket_id: groceries,
            physical_override_id: Some(credit_card),
            occurred_at: Utc::now(),
        })
        .await
        .unwrap();

    assert_eq!(physical_source, credit_card);

    // The card paid for real, the plan charged the checking envelope.
    assert_eq!(balance(&ledger, credit_card).await, dec!(-50));
    assert_eq!(balance(&ledger, checking).await, Decimal::ZERO);
    assert_eq!(balance(&ledger, free_cash).await, dec!(-50));
    assert_eq!(balance(&ledger, groceries).await, dec!(100));

    let tasks = ledger.list_transfer_tasks(true).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].related_transaction_id, tx.id);
    assert_eq!(tasks[0].from_physical_bucket_id, credit_card);
    assert_eq!(tasks[0].to_physical_bucket_id, checking);
    assert_eq!(tasks[0].amount, dec!(50));
    assert!(!tasks[0].is_completed);
    assert!(tasks[0].completed_transaction_id.is_none());
}

#[tokio::test]
async fn expense_validates_bucket_types() {
    let ledger = ledger_with_db().await;

    let bank = create_bucket(&ledger, "Main Bank", BucketType::Physical, None).await;
    let envelope = create_bucket(&ledger, "Envelope", BucketType::Virtual, Some(bank)).await;
    let groceries = create_bucket(&ledger, "Groceries", BucketType::Expense, None).await;

    let err = ledger
        .log_expense(ExpenseCmd {
            amount: dec!(50),
            description: String::new(),
            virtual_bucket_id: Uuid::new_v4(),
            category_bucket_id: groceries,
            physical_override_id: None,
            occurred_at: Utc::now(),
        })
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::NotFound("bucket".to_string()));

    let err = ledger
        .log_expense(ExpenseCmd {
            amount: dec!(50),
            description: String::new(),
            virtual_bucket_id: bank,
            category_bucket_id: groceries,
            physical_override_id: None,
            occurred_at: Utc::now(),
        })
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::InvalidType("expense must draw from a VIRTUAL bucket".to_string())
    );

    let err = ledger
        .log_expense(ExpenseCmd {
            amount: dec!(50),
            description: String::new(),
            virtual_bucket_id: envelope,
            category_bucket_id: bank,
            physical_override_id: None,
            occurred_at: Utc::now(),
        })
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::InvalidType("category must be an EXPENSE bucket".to_string())
    );

    let err = ledger
        .log_expense(ExpenseCmd {
            amount: dec!(50),
            description: String::new(),
            virtual_bucket_id: envelope,
            category_bucket_id: groceries,
            physical_override_id: Some(envelope),
            occurred_at: Utc::now(),
        })
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::InvalidType("physical override must be a PHYSICAL bucket".to_string())
    );

    let err = ledger
        .log_expense(ExpenseCmd {
            amount: dec!(-50),
            description: String::new(),
            virtual_bucket_id: envelope,
            category_bucket_id: groceries,
            physical_override_id: None,
            occurred_at: Utc::now(),
        })
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::InvalidAmount("expense amount must be positive".to_string())
    );
}

#[tokio::test]
async fn market_value_updates_net_worth_but_not_book_value() {
    let ledger = ledger_with_db().await;

    let tesla = create_bucket(&ledger, "Tesla", BucketType::Equity, None).await;

    let t0 = Utc.with_ymd_and_hms(2025, 10, 1, 12, 0, 0).unwrap();
    let t1 = Utc.with_ymd_and_hms(2025, 10, 2, 12, 0, 0).unwrap();

    ledger
        .update_market_value(tesla, dec!(650), t0)
        .await
        .unwrap();

    let net_worth = ledger.net_worth().await.unwrap();
    assert_eq!(net_worth.equity, dec!(650));
    assert_eq!(net_worth.liquidity, Decimal::ZERO);
    assert_eq!(net_worth.total, dec!(650));
    assert_eq!(balance(&ledger, tesla).await, Decimal::ZERO);

    assert_eq!(ledger.calculate_profit(tesla).await.unwrap(), dec!(650));

    // The latest point wins.
    ledger
        .update_market_value(tesla, dec!(700), t1)
        .await
        .unwrap();
    let net_worth = ledger.net_worth().await.unwrap();
    assert_eq!(net_worth.equity, dec!(700));

    let err = ledger
        .update_market_value(tesla, Decimal::ZERO, t1)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::InvalidAmount("market value must be positive".to_string())
    );
    let err = ledger
        .update_market_value(Uuid::new_v4(), dec!(100), t1)
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::NotFound("bucket".to_string()));
}

#[tokio::test]
async fn profit_defaults_to_zero_without_history() {
    let ledger = ledger_with_db().await;
    let tesla = create_bucket(&ledger, "Tesla", BucketType::Equity, None).await;

    assert_eq!(ledger.calculate_profit(tesla).await.unwrap(), Decimal::ZERO);

    let net_worth = ledger.net_worth().await.unwrap();
    assert_eq!(net_worth.equity, Decimal::ZERO);
}

#[tokio::test]
async fn net_worth_decomposes_into_liquidity_and_equity() {
    let ledger = ledger_with_db().await;

    let bank = create_bucket(&ledger, "Main Bank", BucketType::Physical, None).await;
    let envelope = create_bucket(&ledger, "Envelope", BucketType::Virtual, Some(bank)).await;
    let employer = create_bucket(&ledger, "Employer", BucketType::Income, None).await;
    let etf = create_bucket(&ledger, "World ETF", BucketType::Equity, None).await;

    ledger
        .create_split_rule(NewSplitRule {
            name: "All in".to_string(),
            source_bucket_id: employer,
            items: vec![rule_item(envelope, SplitKind::Remainder, Decimal::ZERO, 1)],
        })
        .await
        .unwrap();
    ledger
        .record_inflow(InflowCmd {
            amount: dec!(1200),
            description: "salary".to_string(),
            source_bucket_id: employer,
            is_external: true,
            occurred_at: Utc::now(),
        })
        .await
        .unwrap();
    ledger
        .update_market_value(etf, dec!(300), Utc::now())
        .await
        .unwrap();

    let net_worth = ledger.net_worth().await.unwrap();
    // Virtual, income and equity book balances stay out of liquidity.
    assert_eq!(net_worth.liquidity, dec!(1200));
    assert_eq!(net_worth.equity, dec!(300));
    assert_eq!(net_worth.total, net_worth.liquidity + net_worth.equity);
}

#[tokio::test]
async fn balances_reconstruct_from_posted_entries() {
    let ledger = ledger_with_db().await;

    let bank = create_bucket(&ledger, "Main Bank", BucketType::Physical, None).await;
    let envelope = create_bucket(&ledger, "Envelope", BucketType::Virtual, Some(bank)).await;
    let groceries = create_bucket(&ledger, "Groceries", BucketType::Expense, None).await;
    let employer = create_bucket(&ledger, "Employer", BucketType::Income, None).await;

    ledger
        .create_split_rule(NewSplitRule {
            name: "All in".to_string(),
            source_bucket_id: employer,
            items: vec![rule_item(envelope, SplitKind::Remainder, Decimal::ZERO, 1)],
        })
        .await
        .unwrap();
    ledger
        .record_inflow(InflowCmd {
            amount: dec!(800),
            description: "salary".to_string(),
            source_bucket_id: employer,
            is_external: true,
            occurred_at: Utc::now(),
        })
        .await
        .unwrap();
    for amount in [dec!(12.30), dec!(7.70), dec!(100)] {
        ledger
            .log_expense(ExpenseCmd {
                amount,
                description: "spend".to_string(),
                virtual_bucket_id: envelope,
                category_bucket_id: groceries,
                physical_override_id: None,
                occurred_at: Utc::now(),
            })
            .await
            .unwrap();
    }

    let page = ledger.list_transactions(100, 0, None).await.unwrap();
    let mut reconstructed: HashMap<Uuid, Decimal> = HashMap::new();
    for tx in &page.transactions {
        for entry in &tx.entries {
            *reconstructed.entry(entry.bucket_id).or_insert(Decimal::ZERO) +=
                entry.signed_amount();
        }
    }

    for bucket_id in [bank, envelope, groceries, employer] {
        let expected = reconstructed
            .get(&bucket_id)
            .copied()
            .unwrap_or(Decimal::ZERO);
        assert_eq!(balance(&ledger, bucket_id).await, expected);
    }

    // Spot checks on the running balances themselves.
    assert_eq!(balance(&ledger, bank).await, dec!(680));
    assert_eq!(balance(&ledger, envelope).await, dec!(680));
    assert_eq!(balance(&ledger, groceries).await, dec!(240));
}

#[tokio::test]
async fn list_transactions_orders_pages_and_filters() {
    let ledger = ledger_with_db().await;

    let bank = create_bucket(&ledger, "Main Bank", BucketType::Physical, None).await;
    let envelope = create_bucket(&ledger, "Envelope", BucketType::Virtual, Some(bank)).await;
    let other_envelope = create_bucket(&ledger, "Other", BucketType::Virtual, Some(bank)).await;
    let groceries = create_bucket(&ledger, "Groceries", BucketType::Expense, None).await;
    let employer = create_bucket(&ledger, "Employer", BucketType::Income, None).await;

    ledger
        .create_split_rule(NewSplitRule {
            name: "All in".to_string(),
            source_bucket_id: employer,
            items: vec![rule_item(envelope, SplitKind::Remainder, Decimal::ZERO, 1)],
        })
        .await
        .unwrap();

    let t0 = Utc.with_ymd_and_hms(2025, 11, 1, 9, 0, 0).unwrap();
    let t1 = Utc.with_ymd_and_hms(2025, 11, 2, 9, 0, 0).unwrap();
    let t2 = Utc.with_ymd_and_hms(2025, 11, 3, 9, 0, 0).unwrap();

    ledger
        .record_inflow(InflowCmd {
            amount: dec!(500),
            description: "salary".to_string(),
            source_bucket_id: employer,
            is_external: true,
            occurred_at: t0,
        })
        .await
        .unwrap();
    ledger
        .log_expense(ExpenseCmd {
            amount: dec!(20),
            description: "first spend".to_string(),
            virtual_bucket_id: envelope,
            category_bucket_id: groceries,
            physical_override_id: None,
            occurred_at: t1,
        })
        .await
        .unwrap();
    ledger
        .log_expense(ExpenseCmd {
            amount: dec!(30),
            description: "second spend".to_string(),
            virtual_bucket_id: other_envelope,
            category_bucket_id: groceries,
            physical_override_id: None,
            occurred_at: t2,
        })
        .await
        .unwrap();

    // Newest first, pages do not overlap.
    let first_page = ledger.list_transactions(2, 0, None).await.unwrap();
    assert_eq!(first_page.total_count, 3);
    assert_eq!(first_page.transactions.len(), 2);
    assert_eq!(first_page.transactions[0].description, "second spend");
    assert_eq!(first_page.transactions[1].description, "first spend");

    let second_page = ledger.list_transactions(2, 2, None).await.unwrap();
    assert_eq!(second_page.transactions.len(), 1);
    assert_eq!(second_page.transactions[0].description, "salary");

    // Entries come along, and every referenced bucket resolves to a name.
    for tx in first_page
        .transactions
        .iter()
        .chain(second_page.transactions.iter())
    {
        assert!(!tx.entries.is_empty());
        for entry in &tx.entries {
            assert!(first_page
                .bucket_names
                .get(&entry.bucket_id)
                .or_else(|| second_page.bucket_names.get(&entry.bucket_id))
                .is_some());
        }
    }

    // Bucket filter narrows to transactions touching the bucket.
    let filtered = ledger
        .list_transactions(10, 0, Some(other_envelope))
        .await
        .unwrap();
    assert_eq!(filtered.total_count, 1);
    assert_eq!(filtered.transactions[0].description, "second spend");

    let err = ledger.list_transactions(0, 0, None).await.unwrap_err();
    assert_eq!(
        err,
        LedgerError::OutOfRange("limit must be positive".to_string())
    );
}

#[tokio::test]
async fn seeder_is_idempotent_with_reserved_ids() {
    let ledger = ledger_with_db().await;

    ledger.ensure_system_buckets().await.unwrap();
    ledger.ensure_system_buckets().await.unwrap();
    ledger.ensure_system_buckets().await.unwrap();

    let system = ledger
        .list_buckets(Some(BucketType::System))
        .await
        .unwrap();
    assert_eq!(system.len(), 3);

    for id in [
        ledger::SYSTEM_VIRTUAL_CLEARING,
        ledger::SYSTEM_LOST_MISC,
        ledger::SYSTEM_EXTRA_INCOME,
    ] {
        let bucket = ledger.bucket(id).await.unwrap();
        assert_eq!(bucket.bucket_type, BucketType::System);
        assert_eq!(bucket.current_balance, Decimal::ZERO);
        assert!(bucket.parent_physical_bucket_id.is_none());
    }
}

#[tokio::test]
async fn split_rule_authoring_is_validated() {
    let ledger = ledger_with_db().await;

    let bank = create_bucket(&ledger, "Main Bank", BucketType::Physical, None).await;
    let envelope = create_bucket(&ledger, "Envelope", BucketType::Virtual, Some(bank)).await;
    let employer = create_bucket(&ledger, "Employer", BucketType::Income, None).await;

    // Source must be an income bucket.
    let err = ledger
        .create_split_rule(NewSplitRule {
            name: "Wrong source".to_string(),
            source_bucket_id: bank,
            items: vec![rule_item(envelope, SplitKind::Remainder, Decimal::ZERO, 1)],
        })
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::InvalidType("split rule source must be an INCOME bucket".to_string())
    );

    // No remainder.
    let err = ledger
        .create_split_rule(NewSplitRule {
            name: "No remainder".to_string(),
            source_bucket_id: employer,
            items: vec![rule_item(envelope, SplitKind::Fixed, dec!(10), 1)],
        })
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::InvalidRule("split rule must have exactly one REMAINDER item".to_string())
    );

    ledger
        .create_split_rule(NewSplitRule {
            name: "Paycheck".to_string(),
            source_bucket_id: employer,
            items: vec![rule_item(envelope, SplitKind::Remainder, Decimal::ZERO, 1)],
        })
        .await
        .unwrap();

    // Only one rule per source.
    let err = ledger
        .create_split_rule(NewSplitRule {
            name: "Second".to_string(),
            source_bucket_id: employer,
            items: vec![rule_item(envelope, SplitKind::Remainder, Decimal::ZERO, 1)],
        })
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::InvalidRule("a split rule already exists for this source bucket".to_string())
    );

    // Stored rules come back sorted by priority.
    let rule = ledger.split_rule_for(employer).await.unwrap();
    assert_eq!(rule.items.len(), 1);
    assert_eq!(rule.items[0].kind, SplitKind::Remainder);
}

#[tokio::test]
async fn bucket_creation_enforces_parent_rules() {
    let ledger = ledger_with_db().await;

    let bank = create_bucket(&ledger, "Main Bank", BucketType::Physical, None).await;
    let envelope = create_bucket(&ledger, "Envelope", BucketType::Virtual, Some(bank)).await;

    // A virtual bucket cannot hang off another virtual bucket.
    let err = ledger
        .create_bucket(NewBucket {
            id: None,
            name: "Nested".to_string(),
            bucket_type: BucketType::Virtual,
            parent_physical_bucket_id: Some(envelope),
        })
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::InvalidType("parent must reference a PHYSICAL bucket".to_string())
    );

    let err = ledger
        .create_bucket(NewBucket {
            id: None,
            name: "Orphan".to_string(),
            bucket_type: BucketType::Virtual,
            parent_physical_bucket_id: None,
        })
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::InvalidType("virtual bucket must have a parent physical bucket".to_string())
    );

    let err = ledger
        .create_bucket(NewBucket {
            id: None,
            name: "Has parent".to_string(),
            bucket_type: BucketType::Income,
            parent_physical_bucket_id: Some(bank),
        })
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::InvalidType("INCOME bucket must not have a parent".to_string())
    );
}

#[tokio::test]
async fn rejected_inflow_amount_and_overflowing_rule_leave_no_state() {
    let ledger = ledger_with_db().await;

    let bank = create_bucket(&ledger, "Main Bank", BucketType::Physical, None).await;
    let envelope = create_bucket(&ledger, "Envelope", BucketType::Virtual, Some(bank)).await;
    let employer = create_bucket(&ledger, "Employer", BucketType::Income, None).await;

    let err = ledger
        .record_inflow(InflowCmd {
            amount: dec!(-100),
            description: String::new(),
            source_bucket_id: employer,
            is_external: true,
            occurred_at: Utc::now(),
        })
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::InvalidAmount("inflow amount must be positive".to_string())
    );

    ledger
        .create_split_rule(NewSplitRule {
            name: "Too fixed".to_string(),
            source_bucket_id: employer,
            items: vec![
                rule_item(envelope, SplitKind::Fixed, dec!(500), 1),
                rule_item(
                    create_bucket(&ledger, "Rest", BucketType::Virtual, Some(bank)).await,
                    SplitKind::Remainder,
                    Decimal::ZERO,
                    2,
                ),
            ],
        })
        .await
        .unwrap();

    let err = ledger
        .record_inflow(InflowCmd {
            amount: dec!(100),
            description: String::new(),
            source_bucket_id: employer,
            is_external: true,
            occurred_at: Utc::now(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::AllocationOverflow(_)));

    let page = ledger.list_transactions(10, 0, None).await.unwrap();
    assert_eq!(page.total_count, 0);
    assert_eq!(balance(&ledger, bank).await, Decimal::ZERO);
    assert_eq!(balance(&ledger, envelope).await, Decimal::ZERO);
}
