//! Journal entry primitives.
//!
//! A `JournalEntry` is an atomic double-entry event produced from exactly one
//! source record. Its debit and credit `JournalLine`s always sum to the same
//! total.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

use super::journal_lines;

/// Which capture table a journal entry was generated from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Sale,
    Income,
    Expense,
    Transfer,
    StockMovement,
    Invoice,
    Debt,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sale => "sale",
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Transfer => "transfer",
            Self::StockMovement => "stock_movement",
            Self::Invoice => "invoice",
            Self::Debt => "debt",
        }
    }

    /// Reference number prefix, e.g. `SAL-<id>` for sales.
    pub fn reference_prefix(self) -> &'static str {
        match self {
            Self::Sale => "SAL",
            Self::Income => "INC",
            Self::Expense => "EXP",
            Self::Transfer => "TRF",
            Self::StockMovement => "STK",
            Self::Invoice => "INV",
            Self::Debt => "DBT",
        }
    }
}

impl TryFrom<&str> for SourceKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "sale" => Ok(Self::Sale),
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            "transfer" => Ok(Self::Transfer),
            "stock_movement" => Ok(Self::StockMovement),
            "invoice" => Ok(Self::Invoice),
            "debt" => Ok(Self::Debt),
            other => Err(EngineError::InvalidName(format!(
                "invalid source kind: {other}"
            ))),
        }
    }
}

/// Business meaning of an entry, refined from the source record.
///
/// Stored on the entry so cash-flow classification stays a pure lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessType {
    Sale,
    Income,
    OpeningCapital,
    InvoiceSettlement,
    Expense,
    Transfer,
    StockIn,
    StockOut,
    InvoiceIssued,
    NewPayable,
    NewReceivable,
    PayableSettlement,
    ReceivableSettlement,
}

impl BusinessType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sale => "sale",
            Self::Income => "income",
            Self::OpeningCapital => "opening_capital",
            Self::InvoiceSettlement => "invoice_settlement",
            Self::Expense => "expense",
            Self::Transfer => "transfer",
            Self::StockIn => "stock_in",
            Self::StockOut => "stock_out",
            Self::InvoiceIssued => "invoice_issued",
            Self::NewPayable => "new_payable",
            Self::NewReceivable => "new_receivable",
            Self::PayableSettlement => "payable_settlement",
            Self::ReceivableSettlement => "receivable_settlement",
        }
    }
}

impl TryFrom<&str> for BusinessType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "sale" => Ok(Self::Sale),
            "income" => Ok(Self::Income),
            "opening_capital" => Ok(Self::OpeningCapital),
            "invoice_settlement" => Ok(Self::InvoiceSettlement),
            "expense" => Ok(Self::Expense),
            "transfer" => Ok(Self::Transfer),
            "stock_in" => Ok(Self::StockIn),
            "stock_out" => Ok(Self::StockOut),
            "invoice_issued" => Ok(Self::InvoiceIssued),
            "new_payable" => Ok(Self::NewPayable),
            "new_receivable" => Ok(Self::NewReceivable),
            "payable_settlement" => Ok(Self::PayableSettlement),
            "receivable_settlement" => Ok(Self::ReceivableSettlement),
            other => Err(EngineError::InvalidName(format!(
                "invalid business type: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub entry_date: NaiveDate,
    pub description: String,
    pub reference_no: String,
    pub source_kind: SourceKind,
    pub source_id: Uuid,
    pub business_type: BusinessType,
    pub category: Option<String>,
    pub posted: bool,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<journal_lines::JournalLine>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "journal_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub entry_date: Date,
    pub description: String,
    pub reference_no: String,
    pub source_kind: String,
    pub source_id: Uuid,
    pub business_type: String,
    pub category: Option<String>,
    pub posted: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tenants::Entity",
        from = "Column::TenantId",
        to = "super::tenants::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Tenant,
    #[sea_orm(has_many = "super::journal_lines::Entity")]
    Lines,
}

impl Related<super::tenants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenant.def()
    }
}

impl Related<super::journal_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&JournalEntry> for ActiveModel {
    fn from(entry: &JournalEntry) -> Self {
        Self {
            id: ActiveValue::Set(entry.id),
            tenant_id: ActiveValue::Set(entry.tenant_id),
            entry_date: ActiveValue::Set(entry.entry_date),
            description: ActiveValue::Set(entry.description.clone()),
            reference_no: ActiveValue::Set(entry.reference_no.clone()),
            source_kind: ActiveValue::Set(entry.source_kind.as_str().to_string()),
            source_id: ActiveValue::Set(entry.source_id),
            business_type: ActiveValue::Set(entry.business_type.as_str().to_string()),
            category: ActiveValue::Set(entry.category.clone()),
            posted: ActiveValue::Set(entry.posted),
            created_at: ActiveValue::Set(entry.created_at),
        }
    }
}

impl TryFrom<Model> for JournalEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: model.id,
            tenant_id: model.tenant_id,
            entry_date: model.entry_date,
            description: model.description,
            reference_no: model.reference_no,
            source_kind: SourceKind::try_from(model.source_kind.as_str())?,
            source_id: model.source_id,
            business_type: BusinessType::try_from(model.business_type.as_str())?,
            category: model.category,
            posted: model.posted,
            created_at: model.created_at,
            lines: Vec::new(),
        })
    }
}
