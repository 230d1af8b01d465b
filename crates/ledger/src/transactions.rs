//! Transaction primitives.
//!
//! A `Transaction` is an immutable, typed ledger event that changes balances
//! via one or more `Operation`s and may carry `TransactionData` rows. It is
//! never deleted: cancel/restore only toggle `canceled`.

use chrono::{DateTime, SubsecRound, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, util::parse_uuid};

use super::{operations, transaction_data};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Buy,
    Throw,
    Give,
    Punish,
    Meal,
    Appro,
    Inventory,
}

impl TransactionKind {
    pub const ALL: [Self; 7] = [
        Self::Buy,
        Self::Throw,
        Self::Give,
        Self::Punish,
        Self::Meal,
        Self::Appro,
        Self::Inventory,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Throw => "throw",
            Self::Give => "give",
            Self::Punish => "punish",
            Self::Meal => "meal",
            Self::Appro => "appro",
            Self::Inventory => "inventory",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| {
                LedgerError::validation("type", format!("unknown transaction kind: {value}"))
            })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub bar_id: i64,
    pub author_id: i64,
    pub kind: TransactionKind,
    /// Ordering key of every operation of this transaction. Never changes.
    pub timestamp: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub canceled: bool,
}

impl Transaction {
    pub fn new(
        bar_id: i64,
        author_id: i64,
        kind: TransactionKind,
        timestamp: DateTime<Utc>,
    ) -> Self {
        // Stored timestamps keep microsecond precision; truncate up front so
        // the in-memory ordering key matches the persisted one.
        let timestamp = timestamp.trunc_subsecs(6);
        Self {
            id: Uuid::new_v4(),
            bar_id,
            author_id,
            kind,
            timestamp,
            last_modified: timestamp,
            canceled: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub bar_id: i64,
    pub author_id: i64,
    pub kind: String,
    pub timestamp: DateTimeUtc,
    pub last_modified: DateTimeUtc,
    pub canceled: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::operations::Entity")]
    Operations,
    #[sea_orm(has_many = "super::transaction_data::Entity")]
    TransactionData,
}

impl Related<operations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Operations.def()
    }
}

impl Related<transaction_data::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TransactionData.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            bar_id: ActiveValue::Set(tx.bar_id),
            author_id: ActiveValue::Set(tx.author_id),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            timestamp: ActiveValue::Set(tx.timestamp),
            last_modified: ActiveValue::Set(tx.last_modified),
            canceled: ActiveValue::Set(tx.canceled),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "transaction")?,
            bar_id: model.bar_id,
            author_id: model.author_id,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            timestamp: model.timestamp,
            last_modified: model.last_modified,
            canceled: model.canceled,
        })
    }
}
