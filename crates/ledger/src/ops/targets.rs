use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use tracing::info;

use crate::{
    Account, Bar, Item, LedgerError, ResultLedger, Target, TargetKind, accounts, bars, items,
    util::{require_non_negative, require_text},
};

use super::{Ledger, with_tx};

impl Ledger {
    /// Add a new bar.
    ///
    /// `cancel_threshold_hours` defaults to the ledger-wide threshold.
    pub async fn new_bar(&self, name: &str, cancel_threshold_hours: Option<i64>) -> ResultLedger<Bar> {
        let name = require_text("name", name)?;
        let threshold = cancel_threshold_hours.unwrap_or(self.default_cancel_threshold_hours);
        if threshold < 0 {
            return Err(LedgerError::validation(
                "transaction_cancel_threshold",
                "must not be negative",
            ));
        }
        let model = bars::ActiveModel::new(name, threshold)
            .insert(&self.database)
            .await?;
        info!(bar = model.id, name = %model.name, "bar created");
        Ok(Bar::from(model))
    }

    /// Open the account of `owner_id` in a bar. One account per owner and bar.
    pub async fn new_account(&self, bar_id: i64, owner_id: i64, money: f64) -> ResultLedger<Account> {
        require_non_negative("money", money)?;
        with_tx!(self, |db_tx| {
            self.require_bar(&db_tx, bar_id).await?;
            if self.account_of(&db_tx, bar_id, owner_id).await?.is_some() {
                return Err(LedgerError::validation(
                    "owner",
                    format!("owner {owner_id} already has an account in bar {bar_id}"),
                ));
            }
            let model = accounts::ActiveModel::new(bar_id, owner_id, money)
                .insert(&db_tx)
                .await?;
            info!(bar = bar_id, account = model.id, owner = owner_id, "account opened");
            Ok(Account::from(model))
        })
    }

    /// Add a stock item to a bar.
    pub async fn new_item(
        &self,
        bar_id: i64,
        name: &str,
        qty: f64,
        price: f64,
        buy_price: f64,
    ) -> ResultLedger<Item> {
        let name = require_text("name", name)?;
        require_non_negative("qty", qty)?;
        require_non_negative("price", price)?;
        require_non_negative("buy_price", buy_price)?;
        let item = Item {
            id: 0,
            bar_id,
            name,
            qty,
            price,
            buy_price,
        };
        with_tx!(self, |db_tx| {
            self.require_bar(&db_tx, bar_id).await?;
            let model = items::ActiveModel::from(&item).insert(&db_tx).await?;
            info!(bar = bar_id, item = model.id, name = %model.name, "item added");
            Ok(Item::from(model))
        })
    }

    /// Every bar, by id.
    pub async fn bars(&self) -> ResultLedger<Vec<Bar>> {
        Ok(bars::Entity::find()
            .order_by_asc(bars::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Bar::from)
            .collect())
    }

    pub async fn bar(&self, bar_id: i64) -> ResultLedger<Bar> {
        self.require_bar(&self.database, bar_id).await.map(Bar::from)
    }

    pub async fn account(&self, account_id: i64) -> ResultLedger<Account> {
        accounts::Entity::find_by_id(account_id)
            .one(&self.database)
            .await?
            .map(Account::from)
            .ok_or_else(|| LedgerError::KeyNotFound(format!("account {account_id}")))
    }

    pub async fn item(&self, item_id: i64) -> ResultLedger<Item> {
        items::Entity::find_by_id(item_id)
            .one(&self.database)
            .await?
            .map(Item::from)
            .ok_or_else(|| LedgerError::KeyNotFound(format!("item {item_id}")))
    }

    /// Current stored balance of a target.
    pub async fn balance(&self, target: Target) -> ResultLedger<f64> {
        self.read_balance(&self.database, target).await
    }

    pub(super) async fn require_bar<C: ConnectionTrait>(
        &self,
        db: &C,
        bar_id: i64,
    ) -> ResultLedger<bars::Model> {
        bars::Entity::find_by_id(bar_id)
            .one(db)
            .await?
            .ok_or_else(|| LedgerError::KeyNotFound(format!("bar {bar_id}")))
    }

    /// The account `owner_id` holds in a bar, if any.
    pub(super) async fn account_of<C: ConnectionTrait>(
        &self,
        db: &C,
        bar_id: i64,
        owner_id: i64,
    ) -> ResultLedger<Option<accounts::Model>> {
        Ok(accounts::Entity::find()
            .filter(accounts::Column::BarId.eq(bar_id))
            .filter(accounts::Column::OwnerId.eq(owner_id))
            .one(db)
            .await?)
    }

    pub(super) async fn read_balance<C: ConnectionTrait>(
        &self,
        db: &C,
        target: Target,
    ) -> ResultLedger<f64> {
        let balance = match target.kind {
            TargetKind::Item => items::Entity::find_by_id(target.id)
                .one(db)
                .await?
                .map(|model| model.qty),
            TargetKind::Account => accounts::Entity::find_by_id(target.id)
                .one(db)
                .await?
                .map(|model| model.money),
        };
        balance.ok_or_else(|| LedgerError::KeyNotFound(target.to_string()))
    }

    pub(super) async fn write_balance<C: ConnectionTrait>(
        &self,
        db: &C,
        target: Target,
        value: f64,
    ) -> ResultLedger<()> {
        match target.kind {
            TargetKind::Item => {
                items::ActiveModel {
                    id: ActiveValue::Set(target.id),
                    qty: ActiveValue::Set(value),
                    ..Default::default()
                }
                .update(db)
                .await?;
            }
            TargetKind::Account => {
                accounts::ActiveModel {
                    id: ActiveValue::Set(target.id),
                    money: ActiveValue::Set(value),
                    ..Default::default()
                }
                .update(db)
                .await?;
            }
        }
        Ok(())
    }
}
