//! Command structs for ledger write operations.
//!
//! These types group parameters for transaction creation, keeping call sites
//! readable and avoiding long argument lists.

use chrono::{DateTime, Utc};

use crate::TransactionRequest;

/// Create a transaction of the request's kind in a bar.
#[derive(Clone, Debug)]
pub struct CreateTransactionCmd {
    pub bar_id: i64,
    pub author_id: i64,
    pub request: TransactionRequest,
    /// Ordering key of the transaction; `None` means now.
    pub timestamp: Option<DateTime<Utc>>,
}

impl CreateTransactionCmd {
    #[must_use]
    pub fn new(bar_id: i64, author_id: i64, request: TransactionRequest) -> Self {
        Self {
            bar_id,
            author_id,
            request,
            timestamp: None,
        }
    }

    /// Record the transaction at `timestamp`, possibly in the past.
    #[must_use]
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}
