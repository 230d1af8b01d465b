//! Read-side shapes returned by the ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Operation, Target, TransactionDetails};

/// A transaction as presented to clients.
///
/// `moneyflow` is never stored: it is recomputed from the operation deltas
/// every time the view is built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionView {
    pub id: Uuid,
    pub bar_id: i64,
    pub author_id: i64,
    /// The author's account in the bar, when they have one.
    pub author_account: Option<i64>,
    pub timestamp: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub canceled: bool,
    #[serde(flatten)]
    pub details: TransactionDetails,
    pub moneyflow: f64,
}

/// One link of a target's operation chain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub operation: Operation,
    pub timestamp: DateTime<Utc>,
    pub canceled: bool,
}

/// Outcome of replaying a target's whole chain from its opening balance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplayReport {
    pub target: Target,
    /// `prev_value` of the first operation, or the stored balance when the
    /// target has no history.
    pub opening_balance: f64,
    pub replayed_balance: f64,
    pub stored_balance: f64,
    /// Operations whose stored values differ from the replay.
    pub mismatched_operations: Vec<i64>,
}

impl ReplayReport {
    pub fn is_consistent(&self) -> bool {
        self.mismatched_operations.is_empty() && self.replayed_balance == self.stored_balance
    }
}
