//! `buy`: an account purchases an item from the bar.
//!
//! One item operation removes the stock, one account operation debits the
//! author's account by `qty * price`.

use crate::{OperationDraft, ResultLedger, Target, util::require_positive};

use super::{Plan, PlanContext, Stored, TransactionDetails};

pub(super) fn validate(qty: f64) -> ResultLedger<()> {
    require_positive("qty", qty)?;
    Ok(())
}

pub(super) fn plan(ctx: &PlanContext, item: i64, qty: f64) -> ResultLedger<Plan> {
    let price = ctx.item("item", item)?.price;
    let buyer = ctx.author_account()?;
    Ok(Plan {
        operations: vec![
            OperationDraft::delta(Target::item(item), -qty),
            OperationDraft::delta(Target::account(buyer.id), -qty * price),
        ],
        ..Plan::default()
    })
}

pub(super) fn project(stored: &Stored<'_>) -> ResultLedger<(TransactionDetails, f64)> {
    let iop = stored.item_op(0)?;
    let aop = stored.account_op(0)?;
    let details = TransactionDetails::Buy {
        item: iop.target.id,
        qty: iop.delta.abs(),
    };
    Ok((details, -aop.delta))
}
