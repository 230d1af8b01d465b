use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    Account, Action, CreateTransactionCmd, Item, LedgerError, Operation, ResultLedger, Scope,
    Shape, Target, TargetKind, Transaction, TransactionData, TransactionKind, TransactionRequest,
    TransactionView, accounts,
    authz::ChangeRequest,
    integrity, items,
    kinds::{self, PlanContext, Stored},
    operations, transaction_data, transactions,
};

use super::{Ledger, with_tx};

impl Ledger {
    /// Create a transaction from a typed request.
    ///
    /// The request is validated, then the author's permission is checked,
    /// then every referenced item and account is resolved within the bar.
    /// Nothing is written unless all three succeed. Operations are applied in
    /// plan order under the locks of their targets.
    pub async fn create_transaction(&self, cmd: CreateTransactionCmd) -> ResultLedger<Transaction> {
        let CreateTransactionCmd {
            bar_id,
            author_id,
            request,
            timestamp,
        } = cmd;
        let kind = request.kind();
        request.validate()?;
        if !self
            .authorizer
            .can_perform(author_id, Action::Create(kind), Scope::Bar(bar_id))
        {
            return Err(LedgerError::PermissionDenied(format!(
                "user {author_id} may not create {} transactions in bar {bar_id}",
                kind.as_str()
            )));
        }

        let plan = with_tx!(self, |db_tx| {
            self.require_bar(&db_tx, bar_id).await?;
            let ctx = self
                .plan_context(&db_tx, bar_id, author_id, &request)
                .await?;
            kinds::plan(&request, &ctx)
        })?;
        let shape = Shape {
            item_ops: plan.count(TargetKind::Item),
            account_ops: plan.count(TargetKind::Account),
            data: plan.data.len(),
        };
        if !integrity::check(kind, shape) {
            return Err(LedgerError::Integrity(format!(
                "{} transaction cannot carry {shape:?}",
                kind.as_str()
            )));
        }

        let tx = Transaction::new(bar_id, author_id, kind, timestamp.unwrap_or_else(Utc::now));
        let _guards = self
            .locks
            .acquire(plan.operations.iter().map(|draft| draft.target))
            .await;
        with_tx!(self, |db_tx| {
            transactions::ActiveModel::from(&tx).insert(&db_tx).await?;
            for (item_id, buy_price) in &plan.buy_prices {
                items::ActiveModel {
                    id: ActiveValue::Set(*item_id),
                    buy_price: ActiveValue::Set(*buy_price),
                    ..Default::default()
                }
                .update(&db_tx)
                .await?;
            }
            for row in &plan.data {
                transaction_data::ActiveModel::new(tx.id, row)
                    .insert(&db_tx)
                    .await?;
            }
            for draft in &plan.operations {
                self.apply_operation(&db_tx, &tx, draft).await?;
            }
            info!(
                transaction = %tx.id,
                bar = bar_id,
                author = author_id,
                kind = kind.as_str(),
                operations = plan.operations.len(),
                "transaction created"
            );
            Ok(tx)
        })
    }

    /// Cancel a transaction: its operations stop affecting their targets.
    ///
    /// Canceling an already canceled transaction re-derives the same chains
    /// and only bumps `last_modified`.
    ///
    /// `at` is recorded as `last_modified`. The author's cancel threshold is
    /// measured against the current time, whatever `at` says.
    pub async fn cancel_transaction(
        &self,
        transaction_id: Uuid,
        actor: i64,
        at: DateTime<Utc>,
    ) -> ResultLedger<Transaction> {
        self.set_canceled(transaction_id, actor, at, true).await
    }

    /// Restore a canceled transaction. Cancel then restore leaves every chain
    /// exactly as it was before the cancel.
    pub async fn restore_transaction(
        &self,
        transaction_id: Uuid,
        actor: i64,
        at: DateTime<Utc>,
    ) -> ResultLedger<Transaction> {
        self.set_canceled(transaction_id, actor, at, false).await
    }

    async fn set_canceled(
        &self,
        transaction_id: Uuid,
        actor: i64,
        at: DateTime<Utc>,
        canceled: bool,
    ) -> ResultLedger<Transaction> {
        let (tx, targets) = with_tx!(self, |db_tx| {
            let tx = self.require_transaction(&db_tx, transaction_id).await?;
            let ops = self.operations_of(&db_tx, transaction_id).await?;
            self.authorize_change(&db_tx, &tx, &ops, actor).await?;
            let targets: BTreeSet<Target> = ops.iter().map(|op| op.target).collect();
            Ok::<_, LedgerError>((tx, targets))
        })?;

        let _guards = self.locks.acquire(targets.iter().copied()).await;
        with_tx!(self, |db_tx| {
            let model = transactions::ActiveModel {
                id: ActiveValue::Set(transaction_id.to_string()),
                canceled: ActiveValue::Set(canceled),
                last_modified: ActiveValue::Set(at),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            for target in &targets {
                self.propagate(&db_tx, *target, tx.timestamp).await?;
            }
            info!(
                transaction = %transaction_id,
                actor,
                canceled,
                was_canceled = tx.canceled,
                targets = targets.len(),
                "transaction {}",
                if canceled { "canceled" } else { "restored" }
            );
            Transaction::try_from(model)
        })
    }

    /// Return a transaction.
    pub async fn transaction(&self, transaction_id: Uuid) -> ResultLedger<Transaction> {
        self.require_transaction(&self.database, transaction_id)
            .await
    }

    /// Typed projection of a stored transaction, with its moneyflow.
    pub async fn view_transaction(&self, transaction_id: Uuid) -> ResultLedger<TransactionView> {
        with_tx!(self, |db_tx| {
            let tx = self.require_transaction(&db_tx, transaction_id).await?;
            let ops = self.operations_of(&db_tx, transaction_id).await?;
            let data = self.data_of(&db_tx, transaction_id).await?;

            let item_ids: BTreeSet<i64> = ops
                .iter()
                .filter(|op| op.target.kind == TargetKind::Item)
                .map(|op| op.target.id)
                .collect();
            let items: HashMap<i64, Item> = items::Entity::find()
                .filter(items::Column::Id.is_in(item_ids))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|model| (model.id, Item::from(model)))
                .collect();
            let author_account = self
                .account_of(&db_tx, tx.bar_id, tx.author_id)
                .await?
                .map(|model| model.id);

            let (details, moneyflow) = kinds::project(&Stored::new(&tx, &ops, &data, &items))?;
            Ok(TransactionView {
                id: tx.id,
                bar_id: tx.bar_id,
                author_id: tx.author_id,
                author_account,
                timestamp: tx.timestamp,
                last_modified: tx.last_modified,
                canceled: tx.canceled,
                details,
                moneyflow,
            })
        })
    }

    /// Whether the stored operations and data rows of a transaction match the
    /// cardinality its kind requires.
    pub async fn check_integrity(&self, transaction_id: Uuid) -> ResultLedger<bool> {
        with_tx!(self, |db_tx| {
            let tx = self.require_transaction(&db_tx, transaction_id).await?;
            let ops = self.operations_of(&db_tx, transaction_id).await?;
            let data = self.data_of(&db_tx, transaction_id).await?;
            Ok(integrity::check(tx.kind, shape_of(&ops, data.len())))
        })
    }

    /// Ids of the transactions of a bar failing [`Ledger::check_integrity`],
    /// oldest first.
    pub async fn integrity_report(&self, bar_id: i64) -> ResultLedger<Vec<Uuid>> {
        with_tx!(self, |db_tx| {
            self.require_bar(&db_tx, bar_id).await?;
            let tx_models = transactions::Entity::find()
                .filter(transactions::Column::BarId.eq(bar_id))
                .order_by_asc(transactions::Column::Timestamp)
                .all(&db_tx)
                .await?;

            let mut ops: HashMap<String, Vec<Operation>> = HashMap::new();
            for model in operations::Entity::find()
                .inner_join(transactions::Entity)
                .filter(transactions::Column::BarId.eq(bar_id))
                .all(&db_tx)
                .await?
            {
                let key = model.transaction_id.clone();
                ops.entry(key).or_default().push(Operation::try_from(model)?);
            }
            let mut data: HashMap<String, usize> = HashMap::new();
            for model in transaction_data::Entity::find()
                .inner_join(transactions::Entity)
                .filter(transactions::Column::BarId.eq(bar_id))
                .all(&db_tx)
                .await?
            {
                *data.entry(model.transaction_id).or_default() += 1;
            }

            let mut failing = Vec::new();
            for model in tx_models {
                let tx_ops = ops.get(&model.id).map(Vec::as_slice).unwrap_or_default();
                let shape = shape_of(tx_ops, data.get(&model.id).copied().unwrap_or_default());
                let tx = Transaction::try_from(model)?;
                if !integrity::check(tx.kind, shape) {
                    debug!(transaction = %tx.id, ?shape, "transaction fails integrity check");
                    failing.push(tx.id);
                }
            }
            Ok(failing)
        })
    }

    /// Resolve the items and accounts `request` refers to within `bar_id`.
    async fn plan_context<C: ConnectionTrait>(
        &self,
        db: &C,
        bar_id: i64,
        author_id: i64,
        request: &TransactionRequest,
    ) -> ResultLedger<PlanContext> {
        let mut ctx = PlanContext::default();
        for reference in request.references() {
            match reference.kind {
                TargetKind::Item => {
                    let model = items::Entity::find_by_id(reference.id)
                        .filter(items::Column::BarId.eq(bar_id))
                        .one(db)
                        .await?
                        .ok_or_else(|| {
                            LedgerError::validation(
                                &reference.field,
                                format!("item {} does not exist", reference.id),
                            )
                        })?;
                    ctx.items.insert(model.id, Item::from(model));
                }
                TargetKind::Account => {
                    accounts::Entity::find_by_id(reference.id)
                        .filter(accounts::Column::BarId.eq(bar_id))
                        .one(db)
                        .await?
                        .ok_or_else(|| {
                            LedgerError::validation(
                                &reference.field,
                                format!("account {} does not exist", reference.id),
                            )
                        })?;
                }
            }
        }
        if request.uses_author_account() {
            ctx.author_account = self
                .account_of(db, bar_id, author_id)
                .await?
                .map(Account::from);
        }
        Ok(ctx)
    }

    async fn authorize_change<C: ConnectionTrait>(
        &self,
        db: &C,
        tx: &Transaction,
        ops: &[Operation],
        actor: i64,
    ) -> ResultLedger<()> {
        let bar = self.require_bar(db, tx.bar_id).await?;
        let penalized_owner = match tx.kind {
            TransactionKind::Punish => {
                match ops.iter().find(|op| op.target.kind == TargetKind::Account) {
                    Some(op) => accounts::Entity::find_by_id(op.target.id)
                        .one(db)
                        .await?
                        .map(|model| model.owner_id),
                    None => None,
                }
            }
            _ => None,
        };
        let privileged = self
            .authorizer
            .can_perform(actor, Action::ChangeTransaction, Scope::Transaction(tx));
        ChangeRequest {
            transaction: tx,
            actor,
            privileged,
            penalized_owner,
            threshold_hours: bar.transaction_cancel_threshold,
            now: Utc::now(),
        }
        .check()
    }

    pub(super) async fn require_transaction<C: ConnectionTrait>(
        &self,
        db: &C,
        transaction_id: Uuid,
    ) -> ResultLedger<Transaction> {
        let model = transactions::Entity::find_by_id(transaction_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| LedgerError::KeyNotFound(format!("transaction {transaction_id}")))?;
        Transaction::try_from(model)
    }

    /// Operations of a transaction in creation order.
    async fn operations_of<C: ConnectionTrait>(
        &self,
        db: &C,
        transaction_id: Uuid,
    ) -> ResultLedger<Vec<Operation>> {
        operations::Entity::find()
            .filter(operations::Column::TransactionId.eq(transaction_id.to_string()))
            .order_by_asc(operations::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .map(Operation::try_from)
            .collect()
    }

    async fn data_of<C: ConnectionTrait>(
        &self,
        db: &C,
        transaction_id: Uuid,
    ) -> ResultLedger<Vec<TransactionData>> {
        Ok(transaction_data::Entity::find()
            .filter(transaction_data::Column::TransactionId.eq(transaction_id.to_string()))
            .order_by_asc(transaction_data::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .map(TransactionData::from)
            .collect())
    }
}

fn shape_of(ops: &[Operation], data: usize) -> Shape {
    let count = |kind| ops.iter().filter(|op| op.target.kind == kind).count();
    Shape {
        item_ops: count(TargetKind::Item),
        account_ops: count(TargetKind::Account),
        data,
    }
}
