//! Source-record to journal-entry mapping and the posting loop.
//!
//! `line_specs` is the pure rulebook: one business type in, a balanced set of
//! debit and credit line specifications out. `post_record` resolves those
//! specs against the chart inside one transaction and flips the source
//! record's `journalized` flag, so a crash between the two leaves nothing
//! half-posted.

use chrono::Utc;
use sea_orm::{ActiveValue, DatabaseTransaction, TransactionTrait, prelude::*};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    AccountType, BusinessType, EngineError, JournalEntry, JournalLine, Money, ReportRange,
    ResultEngine, SourceKind, debts, expenses, incomes, invoices, journal_entries, journal_lines,
    sales, stock_movements, transfers,
};

use super::coa::{AccountSpec, codes, names};
use super::{Engine, SourceEvent, with_tx};

/// Result of posting one source record. Batches carry one per record so a
/// single failure never hides the rest.
#[derive(Debug)]
pub struct PostingOutcome {
    pub source_id: Uuid,
    pub kind: SourceKind,
    pub outcome: Result<Uuid, EngineError>,
}

#[derive(Debug)]
pub(super) struct LineSpec {
    pub(super) account: AccountSpec,
    pub(super) debit: Money,
    pub(super) credit: Money,
}

impl LineSpec {
    fn debit(account: AccountSpec, amount: Money) -> Self {
        Self {
            account,
            debit: amount,
            credit: Money::ZERO,
        }
    }

    fn credit(account: AccountSpec, amount: Money) -> Self {
        Self {
            account,
            debit: Money::ZERO,
            credit: amount,
        }
    }
}

fn sales_revenue() -> AccountSpec {
    AccountSpec::fixed(names::SALES_REVENUE, AccountType::Revenue, codes::REVENUE)
}

fn sales_discount() -> AccountSpec {
    AccountSpec::fixed(names::SALES_DISCOUNT, AccountType::Revenue, codes::REVENUE).contra()
}

fn tax_payable() -> AccountSpec {
    AccountSpec::fixed(
        names::TAX_PAYABLE,
        AccountType::Liability,
        codes::CURRENT_LIABILITIES,
    )
}

fn accounts_receivable() -> AccountSpec {
    AccountSpec::fixed(
        names::ACCOUNTS_RECEIVABLE,
        AccountType::Asset,
        codes::CURRENT_ASSETS,
    )
}

fn accounts_payable() -> AccountSpec {
    AccountSpec::fixed(
        names::ACCOUNTS_PAYABLE,
        AccountType::Liability,
        codes::CURRENT_LIABILITIES,
    )
}

fn inventory() -> AccountSpec {
    AccountSpec::fixed(names::INVENTORY, AccountType::Asset, codes::CURRENT_ASSETS)
}

fn cost_of_goods_sold() -> AccountSpec {
    AccountSpec::fixed(
        names::COST_OF_GOODS_SOLD,
        AccountType::Expense,
        codes::EXPENSES,
    )
}

fn paid_in_capital() -> AccountSpec {
    AccountSpec::fixed(names::PAID_IN_CAPITAL, AccountType::Equity, codes::EQUITY)
}

fn misc_expense() -> AccountSpec {
    AccountSpec::fixed(
        names::MISC_EXPENSE,
        AccountType::Expense,
        codes::OTHER_OPERATING_EXPENSE,
    )
}

fn channel_spec(event: &SourceEvent) -> ResultEngine<AccountSpec> {
    match &event.aux.channel {
        Some(name) => Ok(AccountSpec::channel(name.clone())),
        None => Err(EngineError::UnmappedRecord(format!(
            "{} {} has no payment channel",
            event.kind.as_str(),
            event.id
        ))),
    }
}

fn counter_channel_spec(event: &SourceEvent) -> ResultEngine<AccountSpec> {
    match &event.aux.counter_channel {
        Some(name) => Ok(AccountSpec::channel(name.clone())),
        None => Err(EngineError::UnmappedRecord(format!(
            "{} {} has no source channel",
            event.kind.as_str(),
            event.id
        ))),
    }
}

/// The double-entry rulebook. Zero-amount lines are dropped; a record that
/// cannot yield a valid entry fails as [`EngineError::UnmappedRecord`].
pub(super) fn line_specs(event: &SourceEvent) -> ResultEngine<Vec<LineSpec>> {
    let amount = event.amount;
    if !amount.is_positive() {
        return Err(EngineError::UnmappedRecord(format!(
            "{} {} has non-positive amount {amount}",
            event.kind.as_str(),
            event.id
        )));
    }

    let specs = match event.business_type {
        // Money (or a receivable) in, split into tax, discount and revenue.
        BusinessType::Sale | BusinessType::InvoiceIssued => {
            let tax = event.aux.tax;
            let discount = event.aux.discount;
            if tax.is_negative() || discount.is_negative() {
                return Err(EngineError::UnmappedRecord(format!(
                    "{} {} has a negative tax or discount",
                    event.kind.as_str(),
                    event.id
                )));
            }
            let revenue = amount - tax + discount;
            if revenue.is_negative() {
                return Err(EngineError::UnmappedRecord(format!(
                    "{} {} tax exceeds the gross total",
                    event.kind.as_str(),
                    event.id
                )));
            }
            let debit_side = match event.business_type {
                BusinessType::Sale => channel_spec(event)?,
                _ => accounts_receivable(),
            };
            vec![
                LineSpec::debit(debit_side, amount),
                LineSpec::debit(sales_discount(), discount),
                LineSpec::credit(tax_payable(), tax),
                LineSpec::credit(sales_revenue(), revenue),
            ]
        }
        BusinessType::Income => vec![
            LineSpec::debit(channel_spec(event)?, amount),
            LineSpec::credit(sales_revenue(), amount),
        ],
        BusinessType::OpeningCapital => vec![
            LineSpec::debit(channel_spec(event)?, amount),
            LineSpec::credit(paid_in_capital(), amount),
        ],
        BusinessType::InvoiceSettlement | BusinessType::ReceivableSettlement => vec![
            LineSpec::debit(channel_spec(event)?, amount),
            LineSpec::credit(accounts_receivable(), amount),
        ],
        BusinessType::Expense => {
            let category = event.category.as_deref().ok_or_else(|| {
                EngineError::UnmappedRecord(format!("expense {} has no category", event.id))
            })?;
            vec![
                LineSpec::debit(AccountSpec::expense_category(category), amount),
                LineSpec::credit(channel_spec(event)?, amount),
            ]
        }
        BusinessType::Transfer => vec![
            LineSpec::debit(channel_spec(event)?, amount),
            LineSpec::credit(counter_channel_spec(event)?, amount),
        ],
        BusinessType::StockIn => {
            let funding = if event.aux.opening_stock {
                LineSpec::credit(paid_in_capital(), amount)
            } else {
                LineSpec::credit(channel_spec(event)?, amount)
            };
            vec![LineSpec::debit(inventory(), amount), funding]
        }
        BusinessType::StockOut => vec![
            LineSpec::debit(cost_of_goods_sold(), amount),
            LineSpec::credit(inventory(), amount),
        ],
        BusinessType::PayableSettlement => vec![
            LineSpec::debit(accounts_payable(), amount),
            LineSpec::credit(channel_spec(event)?, amount),
        ],
        BusinessType::NewPayable => vec![
            LineSpec::debit(misc_expense(), amount),
            LineSpec::credit(accounts_payable(), amount),
        ],
        BusinessType::NewReceivable => vec![
            LineSpec::debit(accounts_receivable(), amount),
            LineSpec::credit(sales_revenue(), amount),
        ],
    };

    let specs: Vec<LineSpec> = specs
        .into_iter()
        .filter(|line| !(line.debit.is_zero() && line.credit.is_zero()))
        .collect();
    if specs.is_empty() {
        return Err(EngineError::UnmappedRecord(format!(
            "{} {} produces no journal lines",
            event.kind.as_str(),
            event.id
        )));
    }
    Ok(specs)
}

/// Total debits must equal total credits before anything is written.
pub(super) fn ensure_balanced(specs: &[LineSpec]) -> ResultEngine<()> {
    let mut debit = Money::ZERO;
    let mut credit = Money::ZERO;
    for line in specs {
        debit += line.debit;
        credit += line.credit;
    }
    if debit != credit {
        return Err(EngineError::UnbalancedEntry(format!(
            "debits {debit} != credits {credit}"
        )));
    }
    Ok(())
}

impl Engine {
    /// Post one source record as a balanced journal entry and flip its
    /// `journalized` flag, all inside one transaction. Re-posting the same
    /// record is additionally blocked by the unique source index on
    /// journal entries.
    pub async fn post_record(&self, tenant_id: Uuid, event: &SourceEvent) -> ResultEngine<Uuid> {
        let specs = line_specs(event)?;
        ensure_balanced(&specs)?;
        with_tx!(self, |db_tx| {
            self.require_tenant(&db_tx, tenant_id).await?;
            self.ensure_skeleton_tx(&db_tx, tenant_id).await?;

            let entry_id = Uuid::new_v4();
            let mut lines = Vec::with_capacity(specs.len());
            for spec in &specs {
                let (account, _) = self
                    .get_or_create_account(&db_tx, tenant_id, &spec.account)
                    .await?;
                if account.is_header {
                    return Err(EngineError::AccountCreation(format!(
                        "'{}' is a header account and cannot take postings",
                        account.name
                    )));
                }
                let line = if spec.credit.is_zero() {
                    JournalLine::debit(entry_id, account.id, spec.debit)
                } else {
                    JournalLine::credit(entry_id, account.id, spec.credit)
                };
                lines.push(line);
            }

            let entry = JournalEntry {
                id: entry_id,
                tenant_id,
                entry_date: event.date,
                description: event.description.clone(),
                reference_no: format!("{}-{}", event.kind.reference_prefix(), event.id),
                source_kind: event.kind,
                source_id: event.id,
                business_type: event.business_type,
                category: event.category.clone(),
                posted: true,
                created_at: Utc::now(),
                lines: Vec::new(),
            };
            journal_entries::ActiveModel::from(&entry).insert(&db_tx).await?;
            for line in &lines {
                journal_lines::ActiveModel::from(line).insert(&db_tx).await?;
            }
            self.mark_journalized(&db_tx, event.kind, event.id).await?;
            Ok(entry_id)
        })
    }

    /// Post every unposted record in the window, oldest first. Failures come
    /// back as per-record outcomes; one bad record never stops the batch.
    pub async fn post_pending(
        &self,
        tenant_id: Uuid,
        range: Option<ReportRange>,
    ) -> ResultEngine<Vec<PostingOutcome>> {
        let events = self.fetch_unposted_sources(tenant_id, range).await?;
        let total = events.len();
        let mut outcomes = Vec::with_capacity(total);
        let mut posted = 0usize;
        for event in events {
            let outcome = self.post_record(tenant_id, &event).await;
            match &outcome {
                Ok(_) => posted += 1,
                Err(err) => {
                    warn!(
                        source_id = %event.id,
                        kind = event.kind.as_str(),
                        error = %err,
                        "posting failed"
                    );
                }
            }
            outcomes.push(PostingOutcome {
                source_id: event.id,
                kind: event.kind,
                outcome,
            });
        }
        info!(%tenant_id, total, posted, "posting batch finished");
        Ok(outcomes)
    }

    async fn mark_journalized(
        &self,
        db_tx: &DatabaseTransaction,
        kind: SourceKind,
        source_id: Uuid,
    ) -> ResultEngine<()> {
        match kind {
            SourceKind::Sale => {
                sales::ActiveModel {
                    id: ActiveValue::Set(source_id),
                    journalized: ActiveValue::Set(true),
                    ..Default::default()
                }
                .update(db_tx)
                .await?;
            }
            SourceKind::Income => {
                incomes::ActiveModel {
                    id: ActiveValue::Set(source_id),
                    journalized: ActiveValue::Set(true),
                    ..Default::default()
                }
                .update(db_tx)
                .await?;
            }
            SourceKind::Expense => {
                expenses::ActiveModel {
                    id: ActiveValue::Set(source_id),
                    journalized: ActiveValue::Set(true),
                    ..Default::default()
                }
                .update(db_tx)
                .await?;
            }
            SourceKind::Transfer => {
                transfers::ActiveModel {
                    id: ActiveValue::Set(source_id),
                    journalized: ActiveValue::Set(true),
                    ..Default::default()
                }
                .update(db_tx)
                .await?;
            }
            SourceKind::StockMovement => {
                stock_movements::ActiveModel {
                    id: ActiveValue::Set(source_id),
                    journalized: ActiveValue::Set(true),
                    ..Default::default()
                }
                .update(db_tx)
                .await?;
            }
            SourceKind::Invoice => {
                invoices::ActiveModel {
                    id: ActiveValue::Set(source_id),
                    journalized: ActiveValue::Set(true),
                    ..Default::default()
                }
                .update(db_tx)
                .await?;
            }
            SourceKind::Debt => {
                debts::ActiveModel {
                    id: ActiveValue::Set(source_id),
                    journalized: ActiveValue::Set(true),
                    ..Default::default()
                }
                .update(db_tx)
                .await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::SourceAux;
    use super::*;
    use chrono::NaiveDate;

    fn event(kind: SourceKind, business_type: BusinessType, amount: i64) -> SourceEvent {
        SourceEvent {
            id: Uuid::new_v4(),
            kind,
            date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            description: "test".to_string(),
            amount: Money::new(amount),
            category: None,
            business_type,
            aux: SourceAux::default(),
        }
    }

    fn totals(specs: &[LineSpec]) -> (Money, Money) {
        let mut debit = Money::ZERO;
        let mut credit = Money::ZERO;
        for line in specs {
            debit += line.debit;
            credit += line.credit;
        }
        (debit, credit)
    }

    fn named(specs: &[LineSpec], name: &str) -> (Money, Money) {
        specs
            .iter()
            .find(|line| line.account.name == name)
            .map(|line| (line.debit, line.credit))
            .unwrap_or((Money::ZERO, Money::ZERO))
    }

    #[test]
    fn taxed_cash_sale_splits_into_three_lines() {
        let mut sale = event(SourceKind::Sale, BusinessType::Sale, 110_000);
        sale.aux.channel = Some("Cash".to_string());
        sale.aux.tax = Money::new(10_000);

        let specs = line_specs(&sale).unwrap();
        assert_eq!(specs.len(), 3);
        assert_eq!(named(&specs, "Cash"), (Money::new(110_000), Money::ZERO));
        assert_eq!(
            named(&specs, "Tax Payable"),
            (Money::ZERO, Money::new(10_000))
        );
        assert_eq!(
            named(&specs, "Sales Revenue"),
            (Money::ZERO, Money::new(100_000))
        );
        ensure_balanced(&specs).unwrap();
    }

    #[test]
    fn discounted_sale_carries_a_contra_debit() {
        let mut sale = event(SourceKind::Sale, BusinessType::Sale, 90_000);
        sale.aux.channel = Some("Cash".to_string());
        sale.aux.discount = Money::new(10_000);

        let specs = line_specs(&sale).unwrap();
        assert_eq!(named(&specs, "Cash"), (Money::new(90_000), Money::ZERO));
        assert_eq!(
            named(&specs, "Sales Discount"),
            (Money::new(10_000), Money::ZERO)
        );
        assert_eq!(
            named(&specs, "Sales Revenue"),
            (Money::ZERO, Money::new(100_000))
        );
        ensure_balanced(&specs).unwrap();
    }

    #[test]
    fn expense_debits_a_beban_account() {
        let mut expense = event(SourceKind::Expense, BusinessType::Expense, 50_000);
        expense.aux.channel = Some("Main Wallet".to_string());
        expense.category = Some("Rent".to_string());

        let specs = line_specs(&expense).unwrap();
        assert_eq!(
            named(&specs, "Beban Rent"),
            (Money::new(50_000), Money::ZERO)
        );
        assert_eq!(
            named(&specs, "Main Wallet"),
            (Money::ZERO, Money::new(50_000))
        );
    }

    #[test]
    fn opening_stock_is_funded_from_capital() {
        let mut stock = event(SourceKind::StockMovement, BusinessType::StockIn, 75_000);
        stock.aux.opening_stock = true;

        let specs = line_specs(&stock).unwrap();
        assert_eq!(
            named(&specs, "Inventory"),
            (Money::new(75_000), Money::ZERO)
        );
        assert_eq!(
            named(&specs, "Paid-in Capital"),
            (Money::ZERO, Money::new(75_000))
        );
    }

    #[test]
    fn purchased_stock_needs_a_channel() {
        let stock = event(SourceKind::StockMovement, BusinessType::StockIn, 75_000);
        let err = line_specs(&stock).unwrap_err();
        assert!(matches!(err, EngineError::UnmappedRecord(_)));
    }

    #[test]
    fn new_payable_books_a_misc_expense() {
        let debt = event(SourceKind::Debt, BusinessType::NewPayable, 200_000);
        let specs = line_specs(&debt).unwrap();
        assert_eq!(
            named(&specs, "Beban Lain-lain"),
            (Money::new(200_000), Money::ZERO)
        );
        assert_eq!(
            named(&specs, "Accounts Payable"),
            (Money::ZERO, Money::new(200_000))
        );
    }

    #[test]
    fn excessive_tax_is_rejected_not_booked() {
        let mut sale = event(SourceKind::Sale, BusinessType::Sale, 100_000);
        sale.aux.channel = Some("Cash".to_string());
        sale.aux.tax = Money::new(120_000);
        let err = line_specs(&sale).unwrap_err();
        assert!(matches!(err, EngineError::UnmappedRecord(_)));
    }

    #[test]
    fn every_mapped_record_balances() {
        let mut sale = event(SourceKind::Sale, BusinessType::Sale, 123_450);
        sale.aux.channel = Some("Cash".to_string());
        sale.aux.tax = Money::new(11_223);
        sale.aux.discount = Money::new(4_000);

        let mut transfer = event(SourceKind::Transfer, BusinessType::Transfer, 99_999);
        transfer.aux.channel = Some("Bank BCA".to_string());
        transfer.aux.counter_channel = Some("Cash".to_string());

        let mut settlement = event(SourceKind::Expense, BusinessType::PayableSettlement, 10_000);
        settlement.aux.channel = Some("Cash".to_string());

        for case in [sale, transfer, settlement] {
            let specs = line_specs(&case).unwrap();
            ensure_balanced(&specs).unwrap();
            let (debit, credit) = totals(&specs);
            assert_eq!(debit, credit);
            assert!(debit.is_positive());
        }
    }
}
