//! Admin utilities for bilancio.
//!
//! Buckets and split rules are never created through the posting API; this
//! tool is the administrative path that bootstraps them, plus a view over
//! the generated transfer tasks.

use std::error::Error;

use clap::{Args, Parser, Subcommand, ValueEnum};
use migration::MigratorTrait;
use rust_decimal::Decimal;
use sea_orm::Database;
use uuid::Uuid;

use ledger::{BucketType, Ledger, NewBucket, NewSplitRule, NewSplitRuleItem, SplitKind};

#[derive(Parser, Debug)]
#[command(name = "bilancio_admin")]
#[command(about = "Admin utilities for bilancio (bootstrap buckets/split rules)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./bilancio.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Bucket(Bucket),
    Rule(Rule),
    Task(Task),
}

#[derive(Args, Debug)]
struct Bucket {
    #[command(subcommand)]
    command: BucketCommand,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BucketTypeArg {
    Physical,
    Virtual,
    Income,
    Expense,
    Equity,
    System,
}

impl From<BucketTypeArg> for BucketType {
    fn from(value: BucketTypeArg) -> Self {
        match value {
            BucketTypeArg::Physical => BucketType::Physical,
            BucketTypeArg::Virtual => BucketType::Virtual,
            BucketTypeArg::Income => BucketType::Income,
            BucketTypeArg::Expense => BucketType::Expense,
            BucketTypeArg::Equity => BucketType::Equity,
            BucketTypeArg::System => BucketType::System,
        }
    }
}

#[derive(Subcommand, Debug)]
enum BucketCommand {
    /// Create a bucket.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, value_enum)]
        bucket_type: BucketTypeArg,
        /// Parent physical bucket (required for virtual buckets).
        #[arg(long)]
        parent: Option<Uuid>,
        /// Explicit identifier (generated when omitted).
        #[arg(long)]
        id: Option<Uuid>,
    },
    /// List buckets.
    List {
        #[arg(long, value_enum)]
        bucket_type: Option<BucketTypeArg>,
    },
}

#[derive(Args, Debug)]
struct Rule {
    #[command(subcommand)]
    command: RuleCommand,
}

#[derive(Subcommand, Debug)]
enum RuleCommand {
    /// Create a split rule for an income bucket.
    Create {
        #[arg(long)]
        name: String,
        /// Source income bucket.
        #[arg(long)]
        source: Uuid,
        /// Item as `<target-uuid>:<FIXED|PERCENT|REMAINDER>:<value>:<priority>`.
        /// Repeat for each item.
        #[arg(long = "item", required = true)]
        items: Vec<String>,
    },
}

#[derive(Args, Debug)]
struct Task {
    #[command(subcommand)]
    command: TaskCommand,
}

#[derive(Subcommand, Debug)]
enum TaskCommand {
    /// List transfer tasks.
    List {
        /// Only tasks still waiting for the real transfer.
        #[arg(long)]
        pending: bool,
    },
}

fn parse_rule_item(raw: &str) -> Result<NewSplitRuleItem, String> {
    let parts: Vec<&str> = raw.split(':').collect();
    let [target, kind, value, priority] = parts.as_slice() else {
        return Err(format!(
            "invalid item '{raw}': expected <target>:<kind>:<value>:<priority>"
        ));
    };

    let target_bucket_id =
        Uuid::parse_str(target).map_err(|_| format!("invalid item target '{target}'"))?;
    let kind = match kind.to_ascii_uppercase().as_str() {
        "FIXED" => SplitKind::Fixed,
        "PERCENT" => SplitKind::Percent,
        "REMAINDER" => SplitKind::Remainder,
        other => return Err(format!("invalid item kind '{other}'")),
    };
    let value: Decimal = value
        .parse()
        .map_err(|_| format!("invalid item value '{value}'"))?;
    let priority: i32 = priority
        .parse()
        .map_err(|_| format!("invalid item priority '{priority}'"))?;

    Ok(NewSplitRuleItem {
        target_bucket_id,
        kind,
        value,
        priority,
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let db = Database::connect(&cli.database_url).await?;
    migration::Migrator::up(&db, None).await?;
    let ledger = Ledger::builder().database(db).build().await?;

    match cli.command {
        Command::Bucket(bucket) => match bucket.command {
            BucketCommand::Create {
                name,
                bucket_type,
                parent,
                id,
            } => {
                let bucket = ledger
                    .create_bucket(NewBucket {
                        id,
                        name,
                        bucket_type: bucket_type.into(),
                        parent_physical_bucket_id: parent,
                    })
                    .await?;
                println!("created bucket {} ({})", bucket.id, bucket.name);
            }
            BucketCommand::List { bucket_type } => {
                let buckets = ledger.list_buckets(bucket_type.map(Into::into)).await?;
                for bucket in buckets {
                    println!(
                        "{}  {:8}  {:>14}  {}",
                        bucket.id,
                        bucket.bucket_type.as_str(),
                        bucket.current_balance,
                        bucket.name
                    );
                }
            }
        },
        Command::Rule(rule) => match rule.command {
            RuleCommand::Create {
                name,
                source,
                items,
            } => {
                let items = items
                    .iter()
                    .map(|raw| parse_rule_item(raw))
                    .collect::<Result<Vec<_>, _>>()?;
                let rule = ledger
                    .create_split_rule(NewSplitRule {
                        name,
                        source_bucket_id: source,
                        items,
                    })
                    .await?;
                println!(
                    "created split rule {} ({} items)",
                    rule.id,
                    rule.items.len()
                );
            }
        },
        Command::Task(task) => match task.command {
            TaskCommand::List { pending } => {
                let tasks = ledger.list_transfer_tasks(pending).await?;
                for task in tasks {
                    println!(
                        "{}  {} -> {}  {:>14}  {}",
                        task.id,
                        task.from_physical_bucket_id,
                        task.to_physical_bucket_id,
                        task.amount,
                        if task.is_completed { "done" } else { "pending" }
                    );
                }
            }
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rule_item_accepts_all_kinds() {
        let target = Uuid::new_v4();

        let fixed = parse_rule_item(&format!("{target}:FIXED:50:1")).unwrap();
        assert_eq!(fixed.kind, SplitKind::Fixed);
        assert_eq!(fixed.value, Decimal::from(50));
        assert_eq!(fixed.priority, 1);

        let percent = parse_rule_item(&format!("{target}:percent:12.5:2")).unwrap();
        assert_eq!(percent.kind, SplitKind::Percent);

        let remainder = parse_rule_item(&format!("{target}:REMAINDER:0:3")).unwrap();
        assert_eq!(remainder.kind, SplitKind::Remainder);
    }

    #[test]
    fn parse_rule_item_rejects_malformed_input() {
        assert!(parse_rule_item("nope").is_err());
        assert!(parse_rule_item("not-a-uuid:FIXED:50:1").is_err());

        let target = Uuid::new_v4();
        assert!(parse_rule_item(&format!("{target}:BOGUS:50:1")).is_err());
        assert!(parse_rule_item(&format!("{target}:FIXED:abc:1")).is_err());
        assert!(parse_rule_item(&format!("{target}:FIXED:50:x")).is_err());
    }
}
