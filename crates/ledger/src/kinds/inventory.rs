//! `inventory`: absolute stock recount.
//!
//! Operations are fixed-mode: the counted quantity is authoritative and the
//! delta is whatever the chain implies at the operation's position.

use crate::{
    OperationDraft, ResultLedger, Target,
    util::{line_field, require_non_empty, require_non_negative},
};

use super::{InventoryLine, ItemQty, Plan, Stored, TransactionDetails};

/// Counting an item at zero is allowed.
pub(super) fn validate(items: &[ItemQty]) -> ResultLedger<()> {
    require_non_empty("items", items)?;
    for (i, line) in items.iter().enumerate() {
        require_non_negative(&line_field("items", i, "qty"), line.qty)?;
    }
    Ok(())
}

pub(super) fn plan(items: &[ItemQty]) -> ResultLedger<Plan> {
    Ok(Plan {
        operations: items
            .iter()
            .map(|line| OperationDraft::fixed(Target::item(line.item), line.qty))
            .collect(),
        ..Plan::default()
    })
}

/// The moneyflow values the adjustment at current sell prices.
pub(super) fn project(stored: &Stored<'_>) -> ResultLedger<(TransactionDetails, f64)> {
    let mut items = Vec::with_capacity(stored.item_ops.len());
    let mut total_price = 0.0;
    for iop in &stored.item_ops {
        items.push(InventoryLine {
            item: iop.target.id,
            qty: iop.next_value,
            delta: iop.delta,
        });
        total_price += iop.delta * stored.item(iop.target.id)?.price;
    }
    Ok((TransactionDetails::Inventory { items }, total_price))
}
