//! The module contains `Item` struct and its storage model.

use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};

/// A stock item sold by a bar.
///
/// `qty` is the current stock, kept in sync with the item's operation chain.
/// `price` is the sell price per unit, `buy_price` the last known purchase
/// price per unit (updated by `appro` lines carrying a price).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub bar_id: i64,
    pub name: String,
    pub qty: f64,
    pub price: f64,
    pub buy_price: f64,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub bar_id: i64,
    pub name: String,
    pub qty: f64,
    pub price: f64,
    pub buy_price: f64,
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

impl From<&Item> for ActiveModel {
    fn from(item: &Item) -> Self {
        Self {
            id: ActiveValue::NotSet,
            bar_id: ActiveValue::Set(item.bar_id),
            name: ActiveValue::Set(item.name.clone()),
            qty: ActiveValue::Set(item.qty),
            price: ActiveValue::Set(item.price),
            buy_price: ActiveValue::Set(item.buy_price),
        }
    }
}

impl From<Model> for Item {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            bar_id: model.bar_id,
            name: model.name,
            qty: model.qty,
            price: model.price,
            buy_price: model.buy_price,
        }
    }
}
