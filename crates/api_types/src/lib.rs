//! Request and response bodies of the bilancio HTTP API.
//!
//! Monetary values cross the boundary as canonical decimal strings and
//! identifiers as their textual UUID form, so clients never depend on the
//! server's numeric types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The type of a bucket, as exposed on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BucketType {
    Physical,
    Virtual,
    Income,
    Expense,
    Equity,
    System,
}

pub mod bucket {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BucketView {
        pub id: String,
        pub name: String,
        pub bucket_type: BucketType,
        pub parent_id: Option<String>,
        /// Canonical decimal string.
        pub current_balance: String,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct BucketList {
        pub bucket_type: Option<BucketType>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BucketListResponse {
        pub buckets: Vec<BucketView>,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct InflowNew {
        /// Canonical decimal string, strictly positive.
        pub amount: String,
        pub description: String,
        pub source_bucket_id: String,
        pub is_external: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct InflowCreated {
        pub transaction_id: String,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        /// Canonical decimal string, strictly positive.
        pub amount: String,
        pub description: String,
        pub virtual_bucket_id: String,
        pub category_bucket_id: String,
        /// "Wrong card": pay from this physical bucket instead of the
        /// envelope's parent.
        pub physical_bucket_override_id: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseCreated {
        pub transaction_id: String,
        pub created_at: DateTime<Utc>,
        /// The physical bucket that actually paid.
        pub physical_bucket_id: String,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionList {
        pub limit: u64,
        #[serde(default)]
        pub offset: u64,
        pub bucket_id: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EntryView {
        pub bucket_id: String,
        /// Canonical decimal string (absolute value).
        pub amount: String,
        pub direction: String,
        pub layer: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: String,
        pub description: String,
        /// Sum of physical-layer credits, as a decimal string.
        pub amount: String,
        pub occurred_at: DateTime<Utc>,
        pub is_external_inflow: bool,
        pub is_internal_transfer: bool,
        pub entries: Vec<EntryView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub transactions: Vec<TransactionView>,
        pub total_count: u64,
        /// Resolved display names for the buckets the entries reference.
        pub bucket_names: HashMap<String, String>,
    }
}

pub mod investment {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct InvestmentNew {
        pub bucket_id: String,
        /// Canonical decimal string, strictly positive.
        pub market_value: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct InvestmentRecorded {
        pub entry_id: String,
        pub created_at: DateTime<Utc>,
    }
}

pub mod stats {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct NetWorthView {
        /// All three are canonical decimal strings.
        pub total_net_worth: String,
        pub liquidity: String,
        pub equity: String,
    }
}
