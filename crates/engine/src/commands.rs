//! Command structs for engine operations.
//!
//! These types group parameters for capture operations
//! (sale/income/expense/transfer/stock/invoice/debt), keeping call sites
//! readable and avoiding long argument lists.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{Money, debts::DebtDirection, stock_movements::StockDirection};

/// Record a sale. `gross` is the full amount collected, tax included;
/// revenue is recognized as `gross - tax + discount`.
#[derive(Clone, Debug)]
pub struct SaleCmd {
    pub tenant_id: Uuid,
    pub sale_date: NaiveDate,
    pub gross: Money,
    pub tax: Money,
    pub discount: Money,
    pub channel: String,
    pub description: Option<String>,
}

impl SaleCmd {
    #[must_use]
    pub fn new(
        tenant_id: Uuid,
        sale_date: NaiveDate,
        gross: Money,
        channel: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id,
            sale_date,
            gross,
            tax: Money::ZERO,
            discount: Money::ZERO,
            channel: channel.into(),
            description: None,
        }
    }

    #[must_use]
    pub fn tax(mut self, tax: Money) -> Self {
        self.tax = tax;
        self
    }

    #[must_use]
    pub fn discount(mut self, discount: Money) -> Self {
        self.discount = discount;
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Record a non-sale income.
#[derive(Clone, Debug)]
pub struct IncomeCmd {
    pub tenant_id: Uuid,
    pub income_date: NaiveDate,
    pub amount: Money,
    pub category: String,
    pub channel: String,
    pub description: Option<String>,
}

impl IncomeCmd {
    #[must_use]
    pub fn new(
        tenant_id: Uuid,
        income_date: NaiveDate,
        amount: Money,
        category: impl Into<String>,
        channel: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id,
            income_date,
            amount,
            category: category.into(),
            channel: channel.into(),
            description: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Record an expense.
#[derive(Clone, Debug)]
pub struct ExpenseCmd {
    pub tenant_id: Uuid,
    pub expense_date: NaiveDate,
    pub amount: Money,
    pub category: String,
    pub channel: String,
    pub description: Option<String>,
}

impl ExpenseCmd {
    #[must_use]
    pub fn new(
        tenant_id: Uuid,
        expense_date: NaiveDate,
        amount: Money,
        category: impl Into<String>,
        channel: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id,
            expense_date,
            amount,
            category: category.into(),
            channel: channel.into(),
            description: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Record a channel-to-channel transfer.
#[derive(Clone, Debug)]
pub struct TransferCmd {
    pub tenant_id: Uuid,
    pub transfer_date: NaiveDate,
    pub amount: Money,
    pub from_channel: String,
    pub to_channel: String,
    pub description: Option<String>,
}

impl TransferCmd {
    #[must_use]
    pub fn new(
        tenant_id: Uuid,
        transfer_date: NaiveDate,
        amount: Money,
        from_channel: impl Into<String>,
        to_channel: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id,
            transfer_date,
            amount,
            from_channel: from_channel.into(),
            to_channel: to_channel.into(),
            description: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Record an inventory movement.
#[derive(Clone, Debug)]
pub struct StockMovementCmd {
    pub tenant_id: Uuid,
    pub movement_date: NaiveDate,
    pub value: Money,
    pub direction: StockDirection,
    pub opening_stock: bool,
    pub channel: Option<String>,
    pub description: Option<String>,
}

impl StockMovementCmd {
    #[must_use]
    pub fn new(
        tenant_id: Uuid,
        movement_date: NaiveDate,
        value: Money,
        direction: StockDirection,
    ) -> Self {
        Self {
            tenant_id,
            movement_date,
            value,
            direction,
            opening_stock: false,
            channel: None,
            description: None,
        }
    }

    #[must_use]
    pub fn opening_stock(mut self) -> Self {
        self.opening_stock = true;
        self
    }

    #[must_use]
    pub fn channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Record an issued customer invoice. `total` is the receivable amount, tax
/// included and discount already taken off.
#[derive(Clone, Debug)]
pub struct InvoiceCmd {
    pub tenant_id: Uuid,
    pub issue_date: NaiveDate,
    pub number: String,
    pub customer: String,
    pub total: Money,
    pub tax: Money,
    pub discount: Money,
    pub amount_paid: Money,
}

impl InvoiceCmd {
    #[must_use]
    pub fn new(
        tenant_id: Uuid,
        issue_date: NaiveDate,
        number: impl Into<String>,
        customer: impl Into<String>,
        total: Money,
    ) -> Self {
        Self {
            tenant_id,
            issue_date,
            number: number.into(),
            customer: customer.into(),
            total,
            tax: Money::ZERO,
            discount: Money::ZERO,
            amount_paid: Money::ZERO,
        }
    }

    #[must_use]
    pub fn tax(mut self, tax: Money) -> Self {
        self.tax = tax;
        self
    }

    #[must_use]
    pub fn discount(mut self, discount: Money) -> Self {
        self.discount = discount;
        self
    }

    #[must_use]
    pub fn amount_paid(mut self, amount_paid: Money) -> Self {
        self.amount_paid = amount_paid;
        self
    }
}

/// Record a new debt.
#[derive(Clone, Debug)]
pub struct DebtCmd {
    pub tenant_id: Uuid,
    pub debt_date: NaiveDate,
    pub amount: Money,
    pub direction: DebtDirection,
    pub counterparty: String,
    pub description: Option<String>,
}

impl DebtCmd {
    #[must_use]
    pub fn new(
        tenant_id: Uuid,
        debt_date: NaiveDate,
        amount: Money,
        direction: DebtDirection,
        counterparty: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id,
            debt_date,
            amount,
            direction,
            counterparty: counterparty.into(),
            description: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
