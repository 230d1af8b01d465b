//! `punish`: a fine debited from an account, with its motive.
//!
//! The request carries the fine as a positive amount; the stored view reports
//! the signed account movement, like its moneyflow.

use crate::{
    OperationDraft, ResultLedger, Target, TransactionData,
    util::{require_positive, require_text},
};

use super::{Plan, Stored, TransactionDetails};

pub(crate) const MOTIVE: &str = "motive";

pub(super) fn validate(amount: f64, motive: &str) -> ResultLedger<()> {
    require_positive("amount", amount)?;
    require_text(MOTIVE, motive)?;
    Ok(())
}

pub(super) fn plan(account: i64, amount: f64, motive: &str) -> ResultLedger<Plan> {
    Ok(Plan {
        operations: vec![OperationDraft::delta(Target::account(account), -amount)],
        data: vec![TransactionData::new(MOTIVE, motive.trim())],
        ..Plan::default()
    })
}

pub(super) fn project(stored: &Stored<'_>) -> ResultLedger<(TransactionDetails, f64)> {
    let aop = stored.account_op(0)?;
    let motive = stored.datum(MOTIVE)?;
    let details = TransactionDetails::Punish {
        account: aop.target.id,
        amount: aop.delta,
        motive: motive.data.clone(),
    };
    Ok((details, aop.delta))
}
