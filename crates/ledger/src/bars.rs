//! The module contains `Bar` struct and its storage model.

use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};

/// A bar.
///
/// Accounts, items and transactions all belong to exactly one bar. The bar
/// carries the cancel threshold (in hours) after which only privileged actors
/// may cancel one of its transactions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    pub id: i64,
    pub name: String,
    pub transaction_cancel_threshold: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "bars")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub transaction_cancel_threshold: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn new(name: String, transaction_cancel_threshold: i64) -> Self {
        Self {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(name),
            transaction_cancel_threshold: ActiveValue::Set(transaction_cancel_threshold),
        }
    }
}

impl From<Model> for Bar {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            transaction_cancel_threshold: model.transaction_cancel_threshold,
        }
    }
}
