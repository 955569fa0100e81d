//! Chart-of-accounts primitives.
//!
//! An `Account` is one node of a per-tenant account tree. Header accounts
//! group their children and never receive postings; postable accounts carry
//! journal lines. The reporting sign of an account is fixed by its
//! `NormalBalance`, which may disagree with the classification for contra
//! accounts such as a sales discount.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

impl AccountType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Revenue => "revenue",
            Self::Expense => "expense",
        }
    }

    /// Balance side that increases accounts of this classification.
    pub fn default_normal_balance(self) -> NormalBalance {
        match self {
            Self::Asset | Self::Expense => NormalBalance::Debit,
            Self::Liability | Self::Equity | Self::Revenue => NormalBalance::Credit,
        }
    }

    /// Leading digit of synthesized account codes for this classification.
    pub fn class_digit(self) -> char {
        match self {
            Self::Asset => '1',
            Self::Liability => '2',
            Self::Equity => '3',
            Self::Revenue => '4',
            Self::Expense => '5',
        }
    }
}

impl TryFrom<&str> for AccountType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "asset" => Ok(Self::Asset),
            "liability" => Ok(Self::Liability),
            "equity" => Ok(Self::Equity),
            "revenue" => Ok(Self::Revenue),
            "expense" => Ok(Self::Expense),
            other => Err(EngineError::InvalidName(format!(
                "invalid account type: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalBalance {
    Debit,
    Credit,
}

impl NormalBalance {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }

    pub fn opposite(self) -> NormalBalance {
        match self {
            Self::Debit => Self::Credit,
            Self::Credit => Self::Debit,
        }
    }
}

impl TryFrom<&str> for NormalBalance {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "debit" => Ok(Self::Debit),
            "credit" => Ok(Self::Credit),
            other => Err(EngineError::InvalidName(format!(
                "invalid normal balance: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub code: String,
    pub name: String,
    pub name_norm: String,
    pub account_type: AccountType,
    pub normal_balance: NormalBalance,
    pub is_header: bool,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        tenant_id: Uuid,
        code: String,
        name: String,
        name_norm: String,
        account_type: AccountType,
        normal_balance: NormalBalance,
        is_header: bool,
        parent_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            code,
            name,
            name_norm,
            account_type,
            normal_balance,
            is_header,
            parent_id,
            created_at: Utc::now(),
        }
    }

    /// `true` when the normal balance differs from the classification default.
    pub fn is_contra(&self) -> bool {
        self.normal_balance != self.account_type.default_normal_balance()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub code: String,
    pub name: String,
    pub name_norm: String,
    pub account_type: String,
    pub normal_balance: String,
    pub is_header: bool,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tenants::Entity",
        from = "Column::TenantId",
        to = "super::tenants::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Tenant,
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Parent,
    #[sea_orm(has_many = "super::journal_lines::Entity")]
    JournalLines,
}

impl Related<super::tenants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenant.def()
    }
}

impl Related<super::journal_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JournalLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Account> for ActiveModel {
    fn from(account: &Account) -> Self {
        Self {
            id: ActiveValue::Set(account.id),
            tenant_id: ActiveValue::Set(account.tenant_id),
            code: ActiveValue::Set(account.code.clone()),
            name: ActiveValue::Set(account.name.clone()),
            name_norm: ActiveValue::Set(account.name_norm.clone()),
            account_type: ActiveValue::Set(account.account_type.as_str().to_string()),
            normal_balance: ActiveValue::Set(account.normal_balance.as_str().to_string()),
            is_header: ActiveValue::Set(account.is_header),
            parent_id: ActiveValue::Set(account.parent_id),
            created_at: ActiveValue::Set(account.created_at),
        }
    }
}

impl TryFrom<Model> for Account {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: model.id,
            tenant_id: model.tenant_id,
            code: model.code,
            name: model.name,
            name_norm: model.name_norm,
            account_type: AccountType::try_from(model.account_type.as_str())?,
            normal_balance: NormalBalance::try_from(model.normal_balance.as_str())?,
            is_header: model.is_header,
            parent_id: model.parent_id,
            created_at: model.created_at,
        })
    }
}
