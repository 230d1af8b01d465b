//! Bar inventory and account ledger.
//!
//! Every transaction decomposes into [`Operation`]s, each one changing the
//! balance of a single [`Target`] (an item's stock or an account's money).
//! The operations of a target form a chain ordered by transaction timestamp;
//! canceling, restoring or backdating a transaction re-propagates the chain
//! so that stored balances always equal the replay of the history.

pub use accounts::Account;
pub use authz::{Action, Authorizer, Scope};
pub use bars::Bar;
pub use commands::CreateTransactionCmd;
pub use error::LedgerError;
pub use integrity::Shape;
pub use items::Item;
pub use kinds::{
    AccountRatio, InventoryLine, ItemQty, ItemQtyPrice, TransactionDetails, TransactionRequest,
};
pub use operations::{Operation, OperationDraft, Target, TargetKind};
pub use ops::{DEFAULT_CANCEL_THRESHOLD_HOURS, Ledger, LedgerBuilder};
pub use transaction_data::TransactionData;
pub use transactions::{Transaction, TransactionKind};
pub use views::{HistoryEntry, ReplayReport, TransactionView};

mod accounts;
mod authz;
mod bars;
mod commands;
mod error;
pub mod integrity;
mod items;
mod kinds;
mod locks;
mod operations;
mod ops;
mod transaction_data;
mod transactions;
mod util;
mod views;

pub type ResultLedger<T> = Result<T, LedgerError>;
