use chrono::NaiveDate;
use sea_orm::{QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{
    BusinessType, DebtDirection, Money, ReportRange, ResultEngine, SourceKind, StockDirection,
    debts, expenses, incomes, invoices, sales, stock_movements, transfers,
    util::normalize_key,
};

use super::Engine;

const KEY_PAY_DEBT: &str = "pay debt";
const KEY_RECEIVE_RECEIVABLE: &str = "receive receivable";
const KEY_OPENING_CAPITAL: &str = "opening capital";
const KEY_INVOICE_PAYMENT: &str = "invoice payment";

const RESERVED_KEYS: &[&str] = &[
    KEY_PAY_DEBT,
    KEY_RECEIVE_RECEIVABLE,
    KEY_OPENING_CAPITAL,
    KEY_INVOICE_PAYMENT,
];

/// Category labels with settlement semantics. They relabel the record's
/// business type and never become accounts of their own.
pub(super) fn reserved_category(label: &str) -> bool {
    match normalize_key(label) {
        Some(key) => RESERVED_KEYS.contains(&key.as_str()),
        None => false,
    }
}

fn income_business_type(category: &str) -> BusinessType {
    let Some(key) = normalize_key(category) else {
        return BusinessType::Income;
    };
    if key == KEY_RECEIVE_RECEIVABLE {
        BusinessType::ReceivableSettlement
    } else if key == KEY_OPENING_CAPITAL {
        BusinessType::OpeningCapital
    } else if key == KEY_INVOICE_PAYMENT {
        BusinessType::InvoiceSettlement
    } else {
        BusinessType::Income
    }
}

fn expense_business_type(category: &str) -> BusinessType {
    match normalize_key(category) {
        Some(key) if key == KEY_PAY_DEBT => BusinessType::PayableSettlement,
        _ => BusinessType::Expense,
    }
}

/// One unposted operational record, normalized across the source tables.
#[derive(Clone, Debug)]
pub struct SourceEvent {
    pub id: Uuid,
    pub kind: SourceKind,
    pub date: NaiveDate,
    pub description: String,
    pub amount: Money,
    pub category: Option<String>,
    pub business_type: BusinessType,
    pub aux: SourceAux,
}

/// Per-kind extras the journal mapping needs.
#[derive(Clone, Debug, Default)]
pub struct SourceAux {
    /// Channel on the money side of the entry (destination for transfers).
    pub channel: Option<String>,
    /// Channel money leaves on a transfer.
    pub counter_channel: Option<String>,
    pub tax: Money,
    pub discount: Money,
    pub opening_stock: bool,
    pub counterparty: Option<String>,
}

fn pick_description(stored: Option<String>, fallback: impl FnOnce() -> String) -> String {
    stored
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(fallback)
}

fn sale_event(row: sales::Model) -> (SourceEvent, DateTimeUtc) {
    let event = SourceEvent {
        id: row.id,
        kind: SourceKind::Sale,
        date: row.sale_date,
        description: pick_description(row.description, || "Sale".to_string()),
        amount: Money::new(row.gross),
        category: None,
        business_type: BusinessType::Sale,
        aux: SourceAux {
            channel: Some(row.channel),
            tax: Money::new(row.tax),
            discount: Money::new(row.discount),
            ..SourceAux::default()
        },
    };
    (event, row.created_at)
}

fn income_event(row: incomes::Model) -> (SourceEvent, DateTimeUtc) {
    let business_type = income_business_type(&row.category);
    let event = SourceEvent {
        id: row.id,
        kind: SourceKind::Income,
        date: row.income_date,
        description: pick_description(row.description, || row.category.clone()),
        amount: Money::new(row.amount),
        category: Some(row.category),
        business_type,
        aux: SourceAux {
            channel: Some(row.channel),
            ..SourceAux::default()
        },
    };
    (event, row.created_at)
}

fn expense_event(row: expenses::Model) -> (SourceEvent, DateTimeUtc) {
    let business_type = expense_business_type(&row.category);
    let event = SourceEvent {
        id: row.id,
        kind: SourceKind::Expense,
        date: row.expense_date,
        description: pick_description(row.description, || row.category.clone()),
        amount: Money::new(row.amount),
        category: Some(row.category),
        business_type,
        aux: SourceAux {
            channel: Some(row.channel),
            ..SourceAux::default()
        },
    };
    (event, row.created_at)
}

fn transfer_event(row: transfers::Model) -> (SourceEvent, DateTimeUtc) {
    let description = pick_description(row.description, || {
        format!("Transfer {} to {}", row.from_channel, row.to_channel)
    });
    let event = SourceEvent {
        id: row.id,
        kind: SourceKind::Transfer,
        date: row.transfer_date,
        description,
        amount: Money::new(row.amount),
        category: None,
        business_type: BusinessType::Transfer,
        aux: SourceAux {
            channel: Some(row.to_channel),
            counter_channel: Some(row.from_channel),
            ..SourceAux::default()
        },
    };
    (event, row.created_at)
}

fn stock_event(row: stock_movements::Model) -> ResultEngine<(SourceEvent, DateTimeUtc)> {
    let direction = StockDirection::try_from(row.direction.as_str())?;
    let business_type = match direction {
        StockDirection::In => BusinessType::StockIn,
        StockDirection::Out => BusinessType::StockOut,
    };
    let description = pick_description(row.description, || match direction {
        StockDirection::In => "Stock in".to_string(),
        StockDirection::Out => "Stock out".to_string(),
    });
    let event = SourceEvent {
        id: row.id,
        kind: SourceKind::StockMovement,
        date: row.movement_date,
        description,
        amount: Money::new(row.value),
        category: None,
        business_type,
        aux: SourceAux {
            channel: row.channel,
            opening_stock: row.opening_stock,
            ..SourceAux::default()
        },
    };
    Ok((event, row.created_at))
}

fn invoice_event(row: invoices::Model) -> (SourceEvent, DateTimeUtc) {
    let event = SourceEvent {
        id: row.id,
        kind: SourceKind::Invoice,
        date: row.issue_date,
        description: format!("Invoice {} - {}", row.number, row.customer),
        amount: Money::new(row.total),
        category: None,
        business_type: BusinessType::InvoiceIssued,
        aux: SourceAux {
            tax: Money::new(row.tax),
            discount: Money::new(row.discount),
            ..SourceAux::default()
        },
    };
    (event, row.created_at)
}

fn debt_event(row: debts::Model) -> ResultEngine<(SourceEvent, DateTimeUtc)> {
    let direction = DebtDirection::try_from(row.direction.as_str())?;
    let business_type = match direction {
        DebtDirection::Payable => BusinessType::NewPayable,
        DebtDirection::Receivable => BusinessType::NewReceivable,
    };
    let description = pick_description(row.description, || match direction {
        DebtDirection::Payable => format!("New payable to {}", row.counterparty),
        DebtDirection::Receivable => format!("New receivable from {}", row.counterparty),
    });
    let event = SourceEvent {
        id: row.id,
        kind: SourceKind::Debt,
        date: row.debt_date,
        description,
        amount: Money::new(row.amount),
        category: None,
        business_type,
        aux: SourceAux {
            counterparty: Some(row.counterparty),
            ..SourceAux::default()
        },
    };
    Ok((event, row.created_at))
}

impl Engine {
    /// Every unposted operational record of a tenant, oldest first.
    /// `range` bounds the source dates inclusively when given. Invoices that
    /// are already fully paid stay out; their money arrives through an
    /// "Invoice Payment" income instead.
    pub async fn fetch_unposted_sources(
        &self,
        tenant_id: Uuid,
        range: Option<ReportRange>,
    ) -> ResultEngine<Vec<SourceEvent>> {
        let mut staged: Vec<(SourceEvent, DateTimeUtc)> = Vec::new();

        let mut query = sales::Entity::find()
            .filter(sales::Column::TenantId.eq(tenant_id))
            .filter(sales::Column::Journalized.eq(false));
        if let Some(range) = &range {
            query = query
                .filter(sales::Column::SaleDate.gte(range.start))
                .filter(sales::Column::SaleDate.lte(range.end));
        }
        for row in query.all(&self.database).await? {
            staged.push(sale_event(row));
        }

        let mut query = incomes::Entity::find()
            .filter(incomes::Column::TenantId.eq(tenant_id))
            .filter(incomes::Column::Journalized.eq(false));
        if let Some(range) = &range {
            query = query
                .filter(incomes::Column::IncomeDate.gte(range.start))
                .filter(incomes::Column::IncomeDate.lte(range.end));
        }
        for row in query.all(&self.database).await? {
            staged.push(income_event(row));
        }

        let mut query = expenses::Entity::find()
            .filter(expenses::Column::TenantId.eq(tenant_id))
            .filter(expenses::Column::Journalized.eq(false));
        if let Some(range) = &range {
            query = query
                .filter(expenses::Column::ExpenseDate.gte(range.start))
                .filter(expenses::Column::ExpenseDate.lte(range.end));
        }
        for row in query.all(&self.database).await? {
            staged.push(expense_event(row));
        }

        let mut query = transfers::Entity::find()
            .filter(transfers::Column::TenantId.eq(tenant_id))
            .filter(transfers::Column::Journalized.eq(false));
        if let Some(range) = &range {
            query = query
                .filter(transfers::Column::TransferDate.gte(range.start))
                .filter(transfers::Column::TransferDate.lte(range.end));
        }
        for row in query.all(&self.database).await? {
            staged.push(transfer_event(row));
        }

        let mut query = stock_movements::Entity::find()
            .filter(stock_movements::Column::TenantId.eq(tenant_id))
            .filter(stock_movements::Column::Journalized.eq(false));
        if let Some(range) = &range {
            query = query
                .filter(stock_movements::Column::MovementDate.gte(range.start))
                .filter(stock_movements::Column::MovementDate.lte(range.end));
        }
        for row in query.all(&self.database).await? {
            staged.push(stock_event(row)?);
        }

        let mut query = invoices::Entity::find()
            .filter(invoices::Column::TenantId.eq(tenant_id))
            .filter(invoices::Column::Journalized.eq(false));
        if let Some(range) = &range {
            query = query
                .filter(invoices::Column::IssueDate.gte(range.start))
                .filter(invoices::Column::IssueDate.lte(range.end));
        }
        for row in query.all(&self.database).await? {
            if row.amount_paid >= row.total {
                continue;
            }
            staged.push(invoice_event(row));
        }

        let mut query = debts::Entity::find()
            .filter(debts::Column::TenantId.eq(tenant_id))
            .filter(debts::Column::Journalized.eq(false));
        if let Some(range) = &range {
            query = query
                .filter(debts::Column::DebtDate.gte(range.start))
                .filter(debts::Column::DebtDate.lte(range.end));
        }
        for row in query.all(&self.database).await? {
            staged.push(debt_event(row)?);
        }

        staged.sort_by(|(a, a_created), (b, b_created)| {
            (a.date, *a_created, a.id).cmp(&(b.date, *b_created, b.id))
        });
        Ok(staged.into_iter().map(|(event, _)| event).collect())
    }
}
