//! Journal lines.
//!
//! A [`JournalLine`] is a single debit or credit applied to one postable
//! account as part of a [`JournalEntry`](crate::JournalEntry).
//!
//! Amounts are stored as non-negative whole rupiah in separate debit and
//! credit columns; exactly one side of a line is non-zero.
//!
//! In the engine, *every* change to account balances happens via lines.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Money;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    pub id: Uuid,
    pub entry_id: Uuid,
    pub account_id: Uuid,
    pub debit: Money,
    pub credit: Money,
}

impl JournalLine {
    pub fn debit(entry_id: Uuid, account_id: Uuid, amount: Money) -> Self {
        Self {
            id: Uuid::new_v4(),
            entry_id,
            account_id,
            debit: amount,
            credit: Money::ZERO,
        }
    }

    pub fn credit(entry_id: Uuid, account_id: Uuid, amount: Money) -> Self {
        Self {
            id: Uuid::new_v4(),
            entry_id,
            account_id,
            debit: Money::ZERO,
            credit: amount,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "journal_lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub entry_id: Uuid,
    pub account_id: Uuid,
    pub debit: i64,
    pub credit: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::journal_entries::Entity",
        from = "Column::EntryId",
        to = "super::journal_entries::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Entry,
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Account,
}

impl Related<super::journal_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entry.def()
    }
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&JournalLine> for ActiveModel {
    fn from(line: &JournalLine) -> Self {
        Self {
            id: ActiveValue::Set(line.id),
            entry_id: ActiveValue::Set(line.entry_id),
            account_id: ActiveValue::Set(line.account_id),
            debit: ActiveValue::Set(line.debit.amount()),
            credit: ActiveValue::Set(line.credit.amount()),
        }
    }
}

impl From<Model> for JournalLine {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            entry_id: model.entry_id,
            account_id: model.account_id,
            debit: Money::new(model.debit),
            credit: Money::new(model.credit),
        }
    }
}
