//! `meal`: items consumed together, cost split across accounts by ratio.
//!
//! Each account is debited `total_price * ratio / total_ratio`, where
//! `total_price` is the sell value of every consumed line.

use crate::{
    LedgerError, OperationDraft, ResultLedger, Target, TransactionData,
    util::{line_field, require_non_empty, require_positive},
};

use super::{AccountRatio, ItemQty, Plan, PlanContext, Stored, TransactionDetails};

pub(crate) const NAME: &str = "name";

pub(super) fn validate(items: &[ItemQty], accounts: &[AccountRatio]) -> ResultLedger<()> {
    require_non_empty("items", items)?;
    require_non_empty("accounts", accounts)?;
    for (i, line) in items.iter().enumerate() {
        require_positive(&line_field("items", i, "qty"), line.qty)?;
    }
    for (i, line) in accounts.iter().enumerate() {
        require_positive(&line_field("accounts", i, "ratio"), line.ratio)?;
    }
    Ok(())
}

pub(super) fn plan(
    ctx: &PlanContext,
    items: &[ItemQty],
    accounts: &[AccountRatio],
    name: &str,
) -> ResultLedger<Plan> {
    let mut operations = Vec::with_capacity(items.len() + accounts.len());
    let mut total_price = 0.0;
    for (i, line) in items.iter().enumerate() {
        let item = ctx.item(&line_field("items", i, "item"), line.item)?;
        operations.push(OperationDraft::delta(Target::item(line.item), -line.qty));
        total_price += line.qty * item.price;
    }

    let total_ratio: f64 = accounts.iter().map(|line| line.ratio).sum();
    if !(total_ratio > 0.0) {
        return Err(LedgerError::validation(
            "accounts",
            "ratios must sum to a positive value",
        ));
    }
    for line in accounts {
        operations.push(OperationDraft::delta(
            Target::account(line.account),
            -total_price * line.ratio / total_ratio,
        ));
    }

    Ok(Plan {
        operations,
        data: vec![TransactionData::new(NAME, name)],
        ..Plan::default()
    })
}

/// Ratios are reported normalized to the total charged.
pub(super) fn project(stored: &Stored<'_>) -> ResultLedger<(TransactionDetails, f64)> {
    let items = stored
        .item_ops
        .iter()
        .map(|iop| ItemQty {
            item: iop.target.id,
            qty: iop.delta.abs(),
        })
        .collect();

    let total_price: f64 = stored.account_ops.iter().map(|aop| aop.delta.abs()).sum();
    let accounts = stored
        .account_ops
        .iter()
        .map(|aop| AccountRatio {
            account: aop.target.id,
            ratio: if total_price > 0.0 {
                aop.delta.abs() / total_price
            } else {
                0.0
            },
        })
        .collect();

    let name = stored.datum(NAME)?.data.clone();
    let details = TransactionDetails::Meal {
        items,
        accounts,
        name,
    };
    Ok((details, total_price))
}
