//! `give`: the author transfers money from their account to another one.

use crate::{LedgerError, OperationDraft, ResultLedger, Target, util::require_positive};

use super::{Plan, PlanContext, Stored, TransactionDetails};

pub(super) fn validate(amount: f64) -> ResultLedger<()> {
    require_positive("amount", amount)?;
    Ok(())
}

pub(super) fn plan(ctx: &PlanContext, account: i64, amount: f64) -> ResultLedger<Plan> {
    let giver = ctx.author_account()?;
    if giver.id == account {
        return Err(LedgerError::validation(
            "account",
            "cannot give to your own account",
        ));
    }
    Ok(Plan {
        operations: vec![
            OperationDraft::delta(Target::account(giver.id), -amount),
            OperationDraft::delta(Target::account(account), amount),
        ],
        ..Plan::default()
    })
}

/// Operations are stored giver first, receiver second.
pub(super) fn project(stored: &Stored<'_>) -> ResultLedger<(TransactionDetails, f64)> {
    let to_op = stored.account_op(1)?;
    let details = TransactionDetails::Give {
        account: to_op.target.id,
        amount: to_op.delta,
    };
    Ok((details, to_op.delta))
}
