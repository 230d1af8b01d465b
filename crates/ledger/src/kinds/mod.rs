//! Transaction kind strategies.
//!
//! Each kind translates a typed request into the operations and data rows of
//! a transaction ([`plan`]), and reads a persisted transaction back into a
//! typed view ([`project`]). Dispatch is a plain `match` over the closed set of
//! kinds.
//!
//! Strategies are pure: every referenced item and account is resolved by the
//! caller beforehand and handed over in a [`PlanContext`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    Account, Item, LedgerError, Operation, OperationDraft, ResultLedger, TargetKind, Transaction,
    TransactionData, TransactionKind,
};

mod appro;
mod buy;
mod give;
mod inventory;
mod meal;
mod punish;
mod throw;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemQty {
    pub item: i64,
    pub qty: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemQtyPrice {
    pub item: i64,
    pub qty: f64,
    /// Total price paid for the line, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccountRatio {
    pub account: i64,
    pub ratio: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InventoryLine {
    pub item: i64,
    /// Counted stock.
    pub qty: f64,
    /// Adjustment the count implied at the time it was applied.
    pub delta: f64,
}

/// Typed creation payload, one variant per transaction kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransactionRequest {
    Buy {
        item: i64,
        qty: f64,
    },
    Throw {
        item: i64,
        qty: f64,
    },
    Give {
        account: i64,
        amount: f64,
    },
    Punish {
        account: i64,
        amount: f64,
        motive: String,
    },
    Meal {
        items: Vec<ItemQty>,
        accounts: Vec<AccountRatio>,
        #[serde(default)]
        name: String,
    },
    Appro {
        items: Vec<ItemQtyPrice>,
    },
    Inventory {
        items: Vec<ItemQty>,
    },
}

/// Kind-specific fields of a persisted transaction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransactionDetails {
    Buy {
        item: i64,
        qty: f64,
    },
    Throw {
        item: i64,
        qty: f64,
    },
    Give {
        account: i64,
        amount: f64,
    },
    Punish {
        account: i64,
        /// Signed movement of the account, negative for a fine.
        amount: f64,
        motive: String,
    },
    Meal {
        items: Vec<ItemQty>,
        accounts: Vec<AccountRatio>,
        name: String,
    },
    Appro {
        items: Vec<ItemQty>,
    },
    Inventory {
        items: Vec<InventoryLine>,
    },
}

/// Items and accounts a request refers to, resolved within the request's bar.
#[derive(Clone, Debug, Default)]
pub(crate) struct PlanContext {
    pub items: HashMap<i64, Item>,
    /// The author's own account in the bar, if they have one.
    pub author_account: Option<Account>,
}

impl PlanContext {
    pub(crate) fn item(&self, field: &str, id: i64) -> ResultLedger<&Item> {
        self.items
            .get(&id)
            .ok_or_else(|| LedgerError::validation(field, format!("item {id} does not exist")))
    }

    pub(crate) fn author_account(&self) -> ResultLedger<&Account> {
        self.author_account
            .as_ref()
            .ok_or_else(|| LedgerError::validation("author", "author has no account in this bar"))
    }
}

/// Everything a strategy wants written for a new transaction.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Plan {
    /// Operations in creation order.
    pub operations: Vec<OperationDraft>,
    pub data: Vec<TransactionData>,
    /// `(item, buy_price)` updates applied before the operations.
    pub buy_prices: Vec<(i64, f64)>,
}

impl Plan {
    pub(crate) fn count(&self, kind: TargetKind) -> usize {
        self.operations
            .iter()
            .filter(|op| op.target.kind == kind)
            .count()
    }
}

/// A reference a request makes to an item or account, with the field it came
/// from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Reference {
    pub field: String,
    pub kind: TargetKind,
    pub id: i64,
}

impl TransactionRequest {
    pub fn kind(&self) -> TransactionKind {
        match self {
            Self::Buy { .. } => TransactionKind::Buy,
            Self::Throw { .. } => TransactionKind::Throw,
            Self::Give { .. } => TransactionKind::Give,
            Self::Punish { .. } => TransactionKind::Punish,
            Self::Meal { .. } => TransactionKind::Meal,
            Self::Appro { .. } => TransactionKind::Appro,
            Self::Inventory { .. } => TransactionKind::Inventory,
        }
    }

    /// Field-level checks that need no storage access.
    pub(crate) fn validate(&self) -> ResultLedger<()> {
        match self {
            Self::Buy { qty, .. } => buy::validate(*qty),
            Self::Throw { qty, .. } => throw::validate(*qty),
            Self::Give { amount, .. } => give::validate(*amount),
            Self::Punish { amount, motive, .. } => punish::validate(*amount, motive),
            Self::Meal {
                items, accounts, ..
            } => meal::validate(items, accounts),
            Self::Appro { items } => appro::validate(items),
            Self::Inventory { items } => inventory::validate(items),
        }
    }

    /// Whether the plan charges or credits the author's own account.
    pub(crate) fn uses_author_account(&self) -> bool {
        matches!(self, Self::Buy { .. } | Self::Give { .. })
    }

    pub(crate) fn references(&self) -> Vec<Reference> {
        let item = |field: String, id: i64| Reference {
            field,
            kind: TargetKind::Item,
            id,
        };
        let account = |field: String, id: i64| Reference {
            field,
            kind: TargetKind::Account,
            id,
        };
        match self {
            Self::Buy { item: id, .. } | Self::Throw { item: id, .. } => {
                vec![item("item".to_string(), *id)]
            }
            Self::Give { account: id, .. } | Self::Punish { account: id, .. } => {
                vec![account("account".to_string(), *id)]
            }
            Self::Meal {
                items, accounts, ..
            } => items
                .iter()
                .enumerate()
                .map(|(i, line)| item(crate::util::line_field("items", i, "item"), line.item))
                .chain(accounts.iter().enumerate().map(|(i, line)| {
                    account(crate::util::line_field("accounts", i, "account"), line.account)
                }))
                .collect(),
            Self::Appro { items } => items
                .iter()
                .enumerate()
                .map(|(i, line)| item(crate::util::line_field("items", i, "item"), line.item))
                .collect(),
            Self::Inventory { items } => items
                .iter()
                .enumerate()
                .map(|(i, line)| item(crate::util::line_field("items", i, "item"), line.item))
                .collect(),
        }
    }
}

/// Translate a validated request into its operations and data rows.
pub(crate) fn plan(request: &TransactionRequest, ctx: &PlanContext) -> ResultLedger<Plan> {
    match request {
        TransactionRequest::Buy { item, qty } => buy::plan(ctx, *item, *qty),
        TransactionRequest::Throw { item, qty } => throw::plan(*item, *qty),
        TransactionRequest::Give { account, amount } => give::plan(ctx, *account, *amount),
        TransactionRequest::Punish {
            account,
            amount,
            motive,
        } => punish::plan(*account, *amount, motive),
        TransactionRequest::Meal {
            items,
            accounts,
            name,
        } => meal::plan(ctx, items, accounts, name),
        TransactionRequest::Appro { items } => appro::plan(items),
        TransactionRequest::Inventory { items } => inventory::plan(items),
    }
}

/// Stored rows of one transaction, in creation order.
#[derive(Clone, Debug)]
pub(crate) struct Stored<'a> {
    pub transaction: &'a Transaction,
    pub item_ops: Vec<&'a Operation>,
    pub account_ops: Vec<&'a Operation>,
    pub data: &'a [TransactionData],
    /// Items touched by `item_ops`, for price-based moneyflows.
    pub items: &'a HashMap<i64, Item>,
}

impl<'a> Stored<'a> {
    pub(crate) fn new(
        transaction: &'a Transaction,
        operations: &'a [Operation],
        data: &'a [TransactionData],
        items: &'a HashMap<i64, Item>,
    ) -> Self {
        let (item_ops, account_ops): (Vec<&Operation>, Vec<&Operation>) = operations
            .iter()
            .partition(|op| op.target.kind == TargetKind::Item);
        Self {
            transaction,
            item_ops,
            account_ops,
            data,
            items,
        }
    }

    fn item_op(&self, index: usize) -> ResultLedger<&'a Operation> {
        self.item_ops.get(index).copied().ok_or_else(|| self.missing("item operation"))
    }

    fn account_op(&self, index: usize) -> ResultLedger<&'a Operation> {
        self.account_ops
            .get(index)
            .copied()
            .ok_or_else(|| self.missing("account operation"))
    }

    fn datum(&self, label: &str) -> ResultLedger<&'a TransactionData> {
        self.data
            .iter()
            .find(|row| row.label == label)
            .ok_or_else(|| self.missing(label))
    }

    fn item(&self, id: i64) -> ResultLedger<&'a Item> {
        self.items
            .get(&id)
            .ok_or_else(|| LedgerError::KeyNotFound(format!("item {id}")))
    }

    fn missing(&self, what: &str) -> LedgerError {
        LedgerError::Integrity(format!(
            "{} transaction {} has no {what}",
            self.transaction.kind.as_str(),
            self.transaction.id
        ))
    }
}

/// Rebuild the typed fields of a stored transaction and its moneyflow.
pub(crate) fn project(stored: &Stored<'_>) -> ResultLedger<(TransactionDetails, f64)> {
    match stored.transaction.kind {
        TransactionKind::Buy => buy::project(stored),
        TransactionKind::Throw => throw::project(stored),
        TransactionKind::Give => give::project(stored),
        TransactionKind::Punish => punish::project(stored),
        TransactionKind::Meal => meal::project(stored),
        TransactionKind::Appro => appro::project(stored),
        TransactionKind::Inventory => inventory::project(stored),
    }
}
