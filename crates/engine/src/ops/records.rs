use chrono::Utc;
use sea_orm::{ActiveValue, ConnectionTrait, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    DebtCmd, EngineError, ExpenseCmd, IncomeCmd, InvoiceCmd, Money, ResultEngine, SaleCmd,
    StockDirection, StockMovementCmd, TransferCmd, debts, expenses, incomes, invoices, sales,
    stock_movements, transfers,
    util::normalize_key,
};

use super::{Engine, normalize_optional_text, normalize_required_name, with_tx};

fn require_positive(amount: Money, label: &str) -> ResultEngine<()> {
    if amount.is_positive() {
        Ok(())
    } else {
        Err(EngineError::InvalidAmount(format!(
            "{label} must be positive, got {amount}"
        )))
    }
}

/// Tax and discount components must stay within `[0, cap]`.
fn require_component(amount: Money, cap: Money, label: &str) -> ResultEngine<()> {
    if amount.is_negative() {
        return Err(EngineError::InvalidAmount(format!(
            "{label} must not be negative, got {amount}"
        )));
    }
    if amount > cap {
        return Err(EngineError::InvalidAmount(format!(
            "{label} {amount} exceeds {cap}"
        )));
    }
    Ok(())
}

/// Channels on capture records must have been registered first. Returns the
/// canonical registered name.
async fn require_channel<C: ConnectionTrait>(
    conn: &C,
    tenant_id: Uuid,
    name: &str,
) -> ResultEngine<String> {
    let display = normalize_required_name(name, "channel")?;
    let key = normalize_key(&display)
        .ok_or_else(|| EngineError::InvalidName(format!("unusable channel name: {display}")))?;
    match Engine::channel_by_key(conn, tenant_id, &key).await? {
        Some(model) => Ok(model.name),
        None => Err(EngineError::KeyNotFound(display)),
    }
}

impl Engine {
    /// Capture a sale. Money lands on `channel`, which must be registered.
    pub async fn record_sale(&self, cmd: SaleCmd) -> ResultEngine<Uuid> {
        require_positive(cmd.gross, "gross")?;
        require_component(cmd.tax, cmd.gross, "tax")?;
        require_component(cmd.discount, cmd.gross, "discount")?;
        with_tx!(self, |db_tx| {
            self.require_tenant(&db_tx, cmd.tenant_id).await?;
            let channel = require_channel(&db_tx, cmd.tenant_id, &cmd.channel).await?;
            let row = sales::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                tenant_id: ActiveValue::Set(cmd.tenant_id),
                sale_date: ActiveValue::Set(cmd.sale_date),
                gross: ActiveValue::Set(cmd.gross.amount()),
                tax: ActiveValue::Set(cmd.tax.amount()),
                discount: ActiveValue::Set(cmd.discount.amount()),
                channel: ActiveValue::Set(channel),
                description: ActiveValue::Set(normalize_optional_text(cmd.description.as_deref())),
                journalized: ActiveValue::Set(false),
                created_at: ActiveValue::Set(Utc::now()),
            };
            let model = row.insert(&db_tx).await?;
            Ok(model.id)
        })
    }

    /// Capture a non-sale income. Category labels with settlement semantics
    /// ("Pay Debt" and friends) are picked apart later, at posting time.
    pub async fn record_income(&self, cmd: IncomeCmd) -> ResultEngine<Uuid> {
        require_positive(cmd.amount, "amount")?;
        let category = normalize_required_name(&cmd.category, "category")?;
        with_tx!(self, |db_tx| {
            self.require_tenant(&db_tx, cmd.tenant_id).await?;
            let channel = require_channel(&db_tx, cmd.tenant_id, &cmd.channel).await?;
            let row = incomes::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                tenant_id: ActiveValue::Set(cmd.tenant_id),
                income_date: ActiveValue::Set(cmd.income_date),
                amount: ActiveValue::Set(cmd.amount.amount()),
                category: ActiveValue::Set(category),
                channel: ActiveValue::Set(channel),
                description: ActiveValue::Set(normalize_optional_text(cmd.description.as_deref())),
                journalized: ActiveValue::Set(false),
                created_at: ActiveValue::Set(Utc::now()),
            };
            let model = row.insert(&db_tx).await?;
            Ok(model.id)
        })
    }

    /// Capture an expense.
    pub async fn record_expense(&self, cmd: ExpenseCmd) -> ResultEngine<Uuid> {
        require_positive(cmd.amount, "amount")?;
        let category = normalize_required_name(&cmd.category, "category")?;
        with_tx!(self, |db_tx| {
            self.require_tenant(&db_tx, cmd.tenant_id).await?;
            let channel = require_channel(&db_tx, cmd.tenant_id, &cmd.channel).await?;
            let row = expenses::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                tenant_id: ActiveValue::Set(cmd.tenant_id),
                expense_date: ActiveValue::Set(cmd.expense_date),
                amount: ActiveValue::Set(cmd.amount.amount()),
                category: ActiveValue::Set(category),
                channel: ActiveValue::Set(channel),
                description: ActiveValue::Set(normalize_optional_text(cmd.description.as_deref())),
                journalized: ActiveValue::Set(false),
                created_at: ActiveValue::Set(Utc::now()),
            };
            let model = row.insert(&db_tx).await?;
            Ok(model.id)
        })
    }

    /// Capture a channel-to-channel transfer.
    pub async fn record_transfer(&self, cmd: TransferCmd) -> ResultEngine<Uuid> {
        require_positive(cmd.amount, "amount")?;
        let from_key = normalize_key(&cmd.from_channel);
        let to_key = normalize_key(&cmd.to_channel);
        if from_key.is_some() && from_key == to_key {
            return Err(EngineError::InvalidName(
                "transfer endpoints must differ".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            self.require_tenant(&db_tx, cmd.tenant_id).await?;
            let from_channel = require_channel(&db_tx, cmd.tenant_id, &cmd.from_channel).await?;
            let to_channel = require_channel(&db_tx, cmd.tenant_id, &cmd.to_channel).await?;
            let row = transfers::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                tenant_id: ActiveValue::Set(cmd.tenant_id),
                transfer_date: ActiveValue::Set(cmd.transfer_date),
                amount: ActiveValue::Set(cmd.amount.amount()),
                from_channel: ActiveValue::Set(from_channel),
                to_channel: ActiveValue::Set(to_channel),
                description: ActiveValue::Set(normalize_optional_text(cmd.description.as_deref())),
                journalized: ActiveValue::Set(false),
                created_at: ActiveValue::Set(Utc::now()),
            };
            let model = row.insert(&db_tx).await?;
            Ok(model.id)
        })
    }

    /// Capture an inventory movement at cost value. Inbound movements that
    /// are not opening stock pay from a channel, so one is required there.
    pub async fn record_stock_movement(&self, cmd: StockMovementCmd) -> ResultEngine<Uuid> {
        require_positive(cmd.value, "value")?;
        if cmd.direction == StockDirection::In && !cmd.opening_stock && cmd.channel.is_none() {
            return Err(EngineError::InvalidName(
                "stock purchase needs a payment channel".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            self.require_tenant(&db_tx, cmd.tenant_id).await?;
            let channel = match cmd.channel.as_deref() {
                Some(name) => Some(require_channel(&db_tx, cmd.tenant_id, name).await?),
                None => None,
            };
            let row = stock_movements::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                tenant_id: ActiveValue::Set(cmd.tenant_id),
                movement_date: ActiveValue::Set(cmd.movement_date),
                value: ActiveValue::Set(cmd.value.amount()),
                direction: ActiveValue::Set(cmd.direction.as_str().to_string()),
                opening_stock: ActiveValue::Set(cmd.opening_stock),
                channel: ActiveValue::Set(channel),
                description: ActiveValue::Set(normalize_optional_text(cmd.description.as_deref())),
                journalized: ActiveValue::Set(false),
                created_at: ActiveValue::Set(Utc::now()),
            };
            let model = row.insert(&db_tx).await?;
            Ok(model.id)
        })
    }

    /// Capture an issued customer invoice.
    pub async fn record_invoice(&self, cmd: InvoiceCmd) -> ResultEngine<Uuid> {
        require_positive(cmd.total, "total")?;
        require_component(cmd.tax, cmd.total, "tax")?;
        require_component(cmd.discount, cmd.total, "discount")?;
        if cmd.amount_paid.is_negative() {
            return Err(EngineError::InvalidAmount(format!(
                "amount paid must not be negative, got {}",
                cmd.amount_paid
            )));
        }
        let number = normalize_required_name(&cmd.number, "invoice number")?;
        let customer = normalize_required_name(&cmd.customer, "customer")?;
        with_tx!(self, |db_tx| {
            self.require_tenant(&db_tx, cmd.tenant_id).await?;
            let row = invoices::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                tenant_id: ActiveValue::Set(cmd.tenant_id),
                issue_date: ActiveValue::Set(cmd.issue_date),
                number: ActiveValue::Set(number),
                customer: ActiveValue::Set(customer),
                total: ActiveValue::Set(cmd.total.amount()),
                tax: ActiveValue::Set(cmd.tax.amount()),
                discount: ActiveValue::Set(cmd.discount.amount()),
                amount_paid: ActiveValue::Set(cmd.amount_paid.amount()),
                journalized: ActiveValue::Set(false),
                created_at: ActiveValue::Set(Utc::now()),
            };
            let model = row.insert(&db_tx).await?;
            Ok(model.id)
        })
    }

    /// Capture a new payable or receivable.
    pub async fn record_debt(&self, cmd: DebtCmd) -> ResultEngine<Uuid> {
        require_positive(cmd.amount, "amount")?;
        let counterparty = normalize_required_name(&cmd.counterparty, "counterparty")?;
        with_tx!(self, |db_tx| {
            self.require_tenant(&db_tx, cmd.tenant_id).await?;
            let row = debts::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                tenant_id: ActiveValue::Set(cmd.tenant_id),
                debt_date: ActiveValue::Set(cmd.debt_date),
                amount: ActiveValue::Set(cmd.amount.amount()),
                direction: ActiveValue::Set(cmd.direction.as_str().to_string()),
                counterparty: ActiveValue::Set(counterparty),
                description: ActiveValue::Set(normalize_optional_text(cmd.description.as_deref())),
                journalized: ActiveValue::Set(false),
                created_at: ActiveValue::Set(Utc::now()),
            };
            let model = row.insert(&db_tx).await?;
            Ok(model.id)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{require_component, require_positive};
    use crate::Money;

    #[test]
    fn amounts_must_be_strictly_positive() {
        assert!(require_positive(Money::new(1), "gross").is_ok());
        assert!(require_positive(Money::ZERO, "gross").is_err());
        assert!(require_positive(Money::new(-5), "gross").is_err());
    }

    #[test]
    fn components_stay_within_the_gross() {
        let gross = Money::new(100_000);
        assert!(require_component(Money::ZERO, gross, "tax").is_ok());
        assert!(require_component(Money::new(100_000), gross, "tax").is_ok());
        assert!(require_component(Money::new(100_001), gross, "tax").is_err());
        assert!(require_component(Money::new(-1), gross, "tax").is_err());
    }
}
