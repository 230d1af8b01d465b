//! The module contains `Account` struct and its storage model.

use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};

/// A user's account inside a bar.
///
/// `money` is the current balance. The ledger treats it as a write-through
/// cache of the account's operation chain: every account operation leaves it
/// equal to the chain's last effective value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub bar_id: i64,
    pub owner_id: i64,
    pub money: f64,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub bar_id: i64,
    pub owner_id: i64,
    pub money: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bars::Entity",
        from = "Column::BarId",
        to = "super::bars::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Bars,
}

impl Related<super::bars::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bars.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn new(bar_id: i64, owner_id: i64, money: f64) -> Self {
        Self {
            id: ActiveValue::NotSet,
            bar_id: ActiveValue::Set(bar_id),
            owner_id: ActiveValue::Set(owner_id),
            money: ActiveValue::Set(money),
        }
    }
}

impl From<Model> for Account {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            bar_id: model.bar_id,
            owner_id: model.owner_id,
            money: model.money,
        }
    }
}
