//! Authorization seam.
//!
//! Role and permission storage live outside the ledger. The ledger asks an
//! [`Authorizer`] whether an actor may perform an [`Action`] in a [`Scope`],
//! and only adds the rules that depend on ledger data (transaction age and
//! the account a `punish` penalized).

use chrono::{DateTime, Duration, Utc};

use crate::{LedgerError, ResultLedger, Transaction, TransactionKind};

/// What the actor wants to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Create a transaction of the given kind.
    Create(TransactionKind),
    /// Cancel or restore a transaction.
    ChangeTransaction,
}

/// Where the action applies.
#[derive(Clone, Copy, Debug)]
pub enum Scope<'a> {
    Bar(i64),
    Transaction(&'a Transaction),
}

/// Permission oracle implemented by the hosting application.
pub trait Authorizer: Send + Sync {
    fn can_perform(&self, actor: i64, action: Action, scope: Scope<'_>) -> bool;
}

/// Facts needed to decide whether `actor` may cancel or restore a transaction.
#[derive(Clone, Debug)]
pub(crate) struct ChangeRequest<'a> {
    pub transaction: &'a Transaction,
    pub actor: i64,
    /// The oracle granted change permission on the transaction.
    pub privileged: bool,
    /// Owner of the account a `punish` transaction penalized.
    pub penalized_owner: Option<i64>,
    pub threshold_hours: i64,
    pub now: DateTime<Utc>,
}

impl ChangeRequest<'_> {
    pub(crate) fn check(&self) -> ResultLedger<()> {
        let tx = self.transaction;
        if tx.kind == TransactionKind::Punish && self.penalized_owner == Some(self.actor) {
            return Err(LedgerError::PermissionDenied(
                "a punish transaction cannot be changed by the penalized account owner"
                    .to_string(),
            ));
        }
        if self.privileged {
            return Ok(());
        }
        if tx.author_id != self.actor {
            return Err(LedgerError::PermissionDenied(
                "only the author may change this transaction".to_string(),
            ));
        }
        if self.now - tx.timestamp > Duration::hours(self.threshold_hours) {
            return Err(LedgerError::PermissionDenied(format!(
                "transaction is older than {} hours",
                self.threshold_hours
            )));
        }
        Ok(())
    }
}
