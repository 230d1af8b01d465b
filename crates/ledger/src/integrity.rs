//! Operation/data cardinality per transaction kind.

use serde::{Deserialize, Serialize};

use crate::TransactionKind;

/// How many item operations, account operations and data rows a transaction
/// carries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape {
    pub item_ops: usize,
    pub account_ops: usize,
    pub data: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Count {
    Exactly(usize),
    AtLeast(usize),
}

impl Count {
    fn accepts(self, n: usize) -> bool {
        match self {
            Self::Exactly(expected) => n == expected,
            Self::AtLeast(min) => n >= min,
        }
    }
}

/// `(item ops, account ops, data rows)` each kind requires.
fn expected(kind: TransactionKind) -> (Count, Count, Count) {
    use Count::{AtLeast, Exactly};
    match kind {
        TransactionKind::Buy => (Exactly(1), Exactly(1), Exactly(0)),
        TransactionKind::Throw => (Exactly(1), Exactly(0), Exactly(0)),
        TransactionKind::Give => (Exactly(0), Exactly(2), Exactly(0)),
        TransactionKind::Punish => (Exactly(0), Exactly(1), Exactly(1)),
        TransactionKind::Meal => (AtLeast(1), AtLeast(1), Exactly(1)),
        TransactionKind::Appro | TransactionKind::Inventory => {
            (AtLeast(1), Exactly(0), Exactly(0))
        }
    }
}

/// Whether `shape` satisfies the cardinality rules of `kind`.
pub fn check(kind: TransactionKind, shape: Shape) -> bool {
    let (items, accounts, data) = expected(kind);
    items.accepts(shape.item_ops) && accounts.accepts(shape.account_ops) && data.accepts(shape.data)
}
