//! Per-target operation chains.
//!
//! The operations of a target, ordered by `(transaction timestamp, operation
//! id)`, form a chain: each link's `prev_value` is the outflow of the link
//! before it, and the target's stored balance is the outflow of the last one.
//! Callers hold the target's lock for the whole read-modify-write.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, prelude::*};
use tracing::{debug, warn};

use crate::{
    HistoryEntry, LedgerError, Operation, OperationDraft, ReplayReport, ResultLedger, Target,
    Transaction, operations, operations::settle, transactions,
};

use super::Ledger;

/// One stored link: the operation row and whether its transaction is canceled.
type Link = (operations::Model, bool);

impl Ledger {
    /// Insert the operation for `draft` and bring the target up to date.
    ///
    /// When the transaction is the latest on the target, the operation starts
    /// from the stored balance. A backdated one starts from the chain value at
    /// its position, and every later link is re-propagated.
    pub(super) async fn apply_operation<C: ConnectionTrait>(
        &self,
        db: &C,
        tx: &Transaction,
        draft: &OperationDraft,
    ) -> ResultLedger<operations::Model> {
        let backdated = self.has_links_after(db, draft.target, tx.timestamp).await?;
        let prev_value = if backdated {
            self.chain_value_at(db, draft.target, tx.timestamp).await?
        } else {
            self.read_balance(db, draft.target).await?
        };

        let model = operations::ActiveModel::settled(tx.id, draft, prev_value)
            .insert(db)
            .await?;
        debug!(
            chain = %draft.target,
            operation = model.id,
            prev = model.prev_value,
            next = model.next_value,
            backdated,
            "operation applied"
        );

        if backdated {
            self.propagate(db, draft.target, tx.timestamp).await?;
        } else {
            self.write_balance(db, draft.target, model.next_value).await?;
        }
        Ok(model)
    }

    /// Recompute the chain of `target` from `from` onward and write the final
    /// value through to the target's balance.
    ///
    /// The first link at or after `from` keeps its `prev_value`; every later
    /// link takes the outflow of its predecessor. Returns the number of rows
    /// rewritten. With no link at or after `from`, nothing is written.
    pub(super) async fn propagate<C: ConnectionTrait>(
        &self,
        db: &C,
        target: Target,
        from: DateTime<Utc>,
    ) -> ResultLedger<usize> {
        let links = self.links(db, target, Some(from)).await?;
        let mut carried: Option<f64> = None;
        let mut rewritten = 0;

        for (model, canceled) in links {
            let model = match carried {
                Some(prev) if prev != model.prev_value => {
                    rewritten += 1;
                    self.rewrite_link(db, target, model, prev).await?
                }
                _ => model,
            };
            carried = Some(model.outflow(canceled));
        }

        match carried {
            Some(balance) => {
                self.write_balance(db, target, balance).await?;
                debug!(chain = %target, balance, rewritten, "chain propagated");
            }
            None => warn!(chain = %target, from = %from, "propagate found no operations"),
        }
        Ok(rewritten)
    }

    async fn rewrite_link<C: ConnectionTrait>(
        &self,
        db: &C,
        target: Target,
        model: operations::Model,
        prev_value: f64,
    ) -> ResultLedger<operations::Model> {
        let (delta, next_value) = settle(model.fixed, model.delta, model.next_value, prev_value);
        debug!(
            chain = %target,
            operation = model.id,
            old_prev = model.prev_value,
            prev = prev_value,
            next = next_value,
            "operation rewritten"
        );
        let mut active: operations::ActiveModel = model.into();
        active.prev_value = ActiveValue::Set(prev_value);
        active.delta = ActiveValue::Set(delta);
        active.next_value = ActiveValue::Set(next_value);
        Ok(active.update(db).await?)
    }

    /// Links of `target` in chain order, optionally only those at or after
    /// `from`.
    async fn links<C: ConnectionTrait>(
        &self,
        db: &C,
        target: Target,
        from: Option<DateTime<Utc>>,
    ) -> ResultLedger<Vec<Link>> {
        let mut query = operations::Entity::find()
            .find_also_related(transactions::Entity)
            .filter(operations::Column::TargetKind.eq(target.kind.as_str()))
            .filter(operations::Column::TargetId.eq(target.id));
        if let Some(from) = from {
            query = query.filter(transactions::Column::Timestamp.gte(from));
        }
        let rows = query
            .order_by_asc(transactions::Column::Timestamp)
            .order_by_asc(operations::Column::Id)
            .all(db)
            .await?;
        rows.into_iter().map(link).collect()
    }

    async fn has_links_after<C: ConnectionTrait>(
        &self,
        db: &C,
        target: Target,
        timestamp: DateTime<Utc>,
    ) -> ResultLedger<bool> {
        let later = operations::Entity::find()
            .find_also_related(transactions::Entity)
            .filter(operations::Column::TargetKind.eq(target.kind.as_str()))
            .filter(operations::Column::TargetId.eq(target.id))
            .filter(transactions::Column::Timestamp.gt(timestamp))
            .one(db)
            .await?;
        Ok(later.is_some())
    }

    /// Value the chain of `target` holds right after every link with a
    /// timestamp at or before `timestamp`.
    ///
    /// Without such a link, the first later link's `prev_value` is the opening
    /// balance.
    async fn chain_value_at<C: ConnectionTrait>(
        &self,
        db: &C,
        target: Target,
        timestamp: DateTime<Utc>,
    ) -> ResultLedger<f64> {
        let before = operations::Entity::find()
            .find_also_related(transactions::Entity)
            .filter(operations::Column::TargetKind.eq(target.kind.as_str()))
            .filter(operations::Column::TargetId.eq(target.id))
            .filter(transactions::Column::Timestamp.lte(timestamp))
            .order_by_desc(transactions::Column::Timestamp)
            .order_by_desc(operations::Column::Id)
            .one(db)
            .await?;
        if let Some(row) = before {
            let (model, canceled) = link(row)?;
            return Ok(model.outflow(canceled));
        }

        let after = operations::Entity::find()
            .find_also_related(transactions::Entity)
            .filter(operations::Column::TargetKind.eq(target.kind.as_str()))
            .filter(operations::Column::TargetId.eq(target.id))
            .filter(transactions::Column::Timestamp.gt(timestamp))
            .order_by_asc(transactions::Column::Timestamp)
            .order_by_asc(operations::Column::Id)
            .one(db)
            .await?;
        match after {
            Some(row) => Ok(link(row)?.0.prev_value),
            None => self.read_balance(db, target).await,
        }
    }

    /// Operations of a target in chain order.
    pub async fn target_history(&self, target: Target) -> ResultLedger<Vec<HistoryEntry>> {
        self.read_balance(&self.database, target).await?;
        let rows = operations::Entity::find()
            .find_also_related(transactions::Entity)
            .filter(operations::Column::TargetKind.eq(target.kind.as_str()))
            .filter(operations::Column::TargetId.eq(target.id))
            .order_by_asc(transactions::Column::Timestamp)
            .order_by_asc(operations::Column::Id)
            .all(&self.database)
            .await?;

        let mut history = Vec::with_capacity(rows.len());
        for (model, tx_model) in rows {
            let tx_model = tx_model.ok_or_else(|| orphan(model.id))?;
            history.push(HistoryEntry {
                operation: Operation::try_from(model)?,
                timestamp: tx_model.timestamp,
                canceled: tx_model.canceled,
            });
        }
        Ok(history)
    }

    /// Replay the whole chain of `target` from its opening balance and
    /// compare the result with what is stored.
    pub async fn replay_target(&self, target: Target) -> ResultLedger<ReplayReport> {
        let _guard = self.locks.acquire([target]).await;
        let stored_balance = self.read_balance(&self.database, target).await?;
        let links = self.links(&self.database, target, None).await?;

        let opening_balance = links
            .first()
            .map_or(stored_balance, |(model, _)| model.prev_value);
        let mut running = opening_balance;
        let mut mismatched_operations = Vec::new();
        for (model, canceled) in &links {
            let (delta, next_value) = settle(model.fixed, model.delta, model.next_value, running);
            if model.prev_value != running || model.delta != delta || model.next_value != next_value
            {
                mismatched_operations.push(model.id);
            }
            if !canceled {
                running = next_value;
            }
        }

        let report = ReplayReport {
            target,
            opening_balance,
            replayed_balance: running,
            stored_balance,
            mismatched_operations,
        };
        if !report.is_consistent() {
            warn!(
                chain = %target,
                replayed = report.replayed_balance,
                stored = report.stored_balance,
                mismatches = report.mismatched_operations.len(),
                "replay disagrees with stored chain"
            );
        }
        Ok(report)
    }
}

fn link((model, tx_model): (operations::Model, Option<transactions::Model>)) -> ResultLedger<Link> {
    let tx_model = tx_model.ok_or_else(|| orphan(model.id))?;
    Ok((model, tx_model.canceled))
}

fn orphan(operation_id: i64) -> LedgerError {
    LedgerError::Integrity(format!("operation {operation_id} has no transaction"))
}
