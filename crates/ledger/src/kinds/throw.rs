//! `throw`: stock write-off, no money movement.

use crate::{OperationDraft, ResultLedger, Target, util::require_positive};

use super::{Plan, Stored, TransactionDetails};

pub(super) fn validate(qty: f64) -> ResultLedger<()> {
    require_positive("qty", qty)?;
    Ok(())
}

pub(super) fn plan(item: i64, qty: f64) -> ResultLedger<Plan> {
    Ok(Plan {
        operations: vec![OperationDraft::delta(Target::item(item), -qty)],
        ..Plan::default()
    })
}

/// The moneyflow is the value of the lost stock at the current sell price.
pub(super) fn project(stored: &Stored<'_>) -> ResultLedger<(TransactionDetails, f64)> {
    let iop = stored.item_op(0)?;
    let price = stored.item(iop.target.id)?.price;
    let details = TransactionDetails::Throw {
        item: iop.target.id,
        qty: iop.delta.abs(),
    };
    Ok((details, iop.delta * price))
}
