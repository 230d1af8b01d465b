//! `appro`: stock replenishment, optionally recording what it cost.

use crate::{
    OperationDraft, ResultLedger, Target,
    util::{line_field, require_non_empty, require_non_negative, require_positive},
};

use super::{ItemQty, ItemQtyPrice, Plan, Stored, TransactionDetails};

pub(super) fn validate(items: &[ItemQtyPrice]) -> ResultLedger<()> {
    require_non_empty("items", items)?;
    for (i, line) in items.iter().enumerate() {
        require_positive(&line_field("items", i, "qty"), line.qty)?;
        if let Some(price) = line.price {
            require_non_negative(&line_field("items", i, "price"), price)?;
        }
    }
    Ok(())
}

/// A line with a `price` sets the item's unit `buy_price` to `price / qty`.
pub(super) fn plan(items: &[ItemQtyPrice]) -> ResultLedger<Plan> {
    let mut plan = Plan::default();
    for line in items {
        if let Some(price) = line.price {
            plan.buy_prices.push((line.item, price / line.qty));
        }
        plan.operations
            .push(OperationDraft::delta(Target::item(line.item), line.qty));
    }
    Ok(plan)
}

/// The moneyflow is the replenished stock valued at current buy prices.
pub(super) fn project(stored: &Stored<'_>) -> ResultLedger<(TransactionDetails, f64)> {
    let mut items = Vec::with_capacity(stored.item_ops.len());
    let mut total_price = 0.0;
    for iop in &stored.item_ops {
        items.push(ItemQty {
            item: iop.target.id,
            qty: iop.delta.abs(),
        });
        total_price += iop.delta * stored.item(iop.target.id)?.buy_price;
    }
    Ok((TransactionDetails::Appro { items }, total_price))
}
