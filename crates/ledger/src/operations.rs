//! Transaction operations.
//!
//! An [`Operation`] is a single balance change applied to a [`Target`] (an
//! item's stock or an account's money) as part of a
//! [`Transaction`](crate::Transaction).
//!
//! Every operation records the balance it found (`prev_value`), the change
//! (`delta`) and the balance it left (`next_value`). Exactly one of `delta` and
//! `next_value` is authoritative:
//! - delta-mode (`fixed == false`): `next_value = prev_value + delta`
//! - fixed-mode (`fixed == true`): `delta = next_value - prev_value`
//!
//! `prev_value` is rewritten when an earlier link of the target's chain
//! changes; the derived side follows.

use std::fmt;

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Item,
    Account,
}

impl TargetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Item => "item",
            Self::Account => "account",
        }
    }

    /// Name of the balance field the kind writes through to.
    pub fn balance_field(self) -> &'static str {
        match self {
            Self::Item => "qty",
            Self::Account => "money",
        }
    }
}

impl TryFrom<&str> for TargetKind {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "item" => Ok(Self::Item),
            "account" => Ok(Self::Account),
            other => Err(LedgerError::Integrity(format!(
                "invalid operation target kind: {other}"
            ))),
        }
    }
}

/// The balance an operation mutates.
///
/// Ordered by kind then id, which is the order per-target locks are taken in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Target {
    pub kind: TargetKind,
    pub id: i64,
}

impl Target {
    pub fn item(id: i64) -> Self {
        Self {
            kind: TargetKind::Item,
            id,
        }
    }

    pub fn account(id: i64) -> Self {
        Self {
            kind: TargetKind::Account,
            id,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}.{}", self.kind.as_str(), self.id, self.kind.balance_field())
    }
}

/// Derive the non-authoritative side of an operation from `prev_value`.
///
/// Returns `(delta, next_value)`.
pub(crate) fn settle(fixed: bool, delta: f64, next_value: f64, prev_value: f64) -> (f64, f64) {
    if fixed {
        (next_value - prev_value, next_value)
    } else {
        (delta, prev_value + delta)
    }
}

/// An operation built by a kind strategy, not yet applied to its target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OperationDraft {
    pub target: Target,
    pub fixed: bool,
    pub delta: f64,
    pub next_value: f64,
}

impl OperationDraft {
    /// Change the target balance by `delta`.
    pub fn delta(target: Target, delta: f64) -> Self {
        Self {
            target,
            fixed: false,
            delta,
            next_value: 0.0,
        }
    }

    /// Set the target balance to `next_value`.
    pub fn fixed(target: Target, next_value: f64) -> Self {
        Self {
            target,
            fixed: true,
            delta: 0.0,
            next_value,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub id: i64,
    pub transaction_id: Uuid,
    pub target: Target,
    pub fixed: bool,
    pub delta: f64,
    pub prev_value: f64,
    pub next_value: f64,
}

impl Operation {
    /// Balance handed to the next link of the chain.
    ///
    /// A canceled transaction's operation passes its input through unchanged.
    pub fn outflow(&self, canceled: bool) -> f64 {
        if canceled {
            self.prev_value
        } else {
            self.next_value
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "operations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub transaction_id: String,
    pub target_kind: String,
    pub target_id: i64,
    pub fixed: bool,
    pub delta: f64,
    pub prev_value: f64,
    pub next_value: f64,
}

impl Model {
    pub(crate) fn outflow(&self, canceled: bool) -> f64 {
        if canceled {
            self.prev_value
        } else {
            self.next_value
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transactions::Entity",
        from = "Column::TransactionId",
        to = "super::transactions::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Transactions,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    /// Row for `draft` once settled against `prev_value`.
    pub(crate) fn settled(transaction_id: Uuid, draft: &OperationDraft, prev_value: f64) -> Self {
        let (delta, next_value) = settle(draft.fixed, draft.delta, draft.next_value, prev_value);
        Self {
            id: ActiveValue::NotSet,
            transaction_id: ActiveValue::Set(transaction_id.to_string()),
            target_kind: ActiveValue::Set(draft.target.kind.as_str().to_string()),
            target_id: ActiveValue::Set(draft.target.id),
            fixed: ActiveValue::Set(draft.fixed),
            delta: ActiveValue::Set(delta),
            prev_value: ActiveValue::Set(prev_value),
            next_value: ActiveValue::Set(next_value),
        }
    }
}

impl TryFrom<Model> for Operation {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            transaction_id: parse_uuid(&model.transaction_id, "transaction")?,
            target: Target {
                kind: TargetKind::try_from(model.target_kind.as_str())?,
                id: model.target_id,
            },
            fixed: model.fixed,
            delta: model.delta,
            prev_value: model.prev_value,
            next_value: model.next_value,
        })
    }
}
