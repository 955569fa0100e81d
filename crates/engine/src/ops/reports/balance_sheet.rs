use std::collections::HashMap;

use chrono::NaiveDate;
use uuid::Uuid;

use sea_orm::TransactionTrait;

use crate::{
    AccountLine, AccountType, BalanceSheetComparative, BalanceSheetMonth, BalanceSheetReport,
    BalanceSheetTrend, EngineError, ResultEngine, reports::growth_pct, util::month_bounds,
};

use super::super::{Engine, with_tx};
use super::{AccountIndex, PostedLine, load_posted_lines, net_by_account, net_income, section_lines};

/// Synthetic equity line for net income not yet closed to retained earnings.
/// The code sorts after the real equity accounts.
const CURRENT_EARNINGS_CODE: &str = "3900";
const CURRENT_EARNINGS_NAME: &str = "Current Earnings";

impl Engine {
    /// Balance sheet as of a date. Every balance is cumulative from tenant
    /// inception, and equity carries a current-earnings line so that assets
    /// equal liabilities plus equity at any date.
    pub async fn balance_sheet(
        &self,
        tenant_id: Uuid,
        as_of: NaiveDate,
    ) -> ResultEngine<BalanceSheetReport> {
        with_tx!(self, |db_tx| {
            self.require_tenant(&db_tx, tenant_id).await?;
            let index = AccountIndex::load(&db_tx, tenant_id).await?;
            let lines = load_posted_lines(&db_tx, tenant_id, None, None, Some(as_of)).await?;
            let net = net_by_account(&lines);
            Ok(build_balance_sheet(&index, &net, as_of))
        })
    }

    /// Two point-in-time snapshots side by side, with growth on the section
    /// totals. Growth is `None` when the previous total is zero.
    pub async fn balance_sheet_comparative(
        &self,
        tenant_id: Uuid,
        as_of: NaiveDate,
        prior_as_of: NaiveDate,
    ) -> ResultEngine<BalanceSheetComparative> {
        let current = self.balance_sheet(tenant_id, as_of).await?;
        let previous = self.balance_sheet(tenant_id, prior_as_of).await?;
        Ok(BalanceSheetComparative {
            asset_growth: growth_pct(current.total_assets, previous.total_assets),
            liability_growth: growth_pct(current.total_liabilities, previous.total_liabilities),
            equity_growth: growth_pct(current.total_equity, previous.total_equity),
            current,
            previous,
        })
    }

    /// Twelve end-of-month snapshots for a calendar year, each cumulative
    /// from inception through that month's last day.
    pub async fn balance_sheet_trend(
        &self,
        tenant_id: Uuid,
        year: i32,
    ) -> ResultEngine<BalanceSheetTrend> {
        let (_, year_end) = month_bounds(year, 12)
            .ok_or_else(|| EngineError::InvalidRange(format!("invalid trend year {year}")))?;

        with_tx!(self, |db_tx| {
            self.require_tenant(&db_tx, tenant_id).await?;
            let index = AccountIndex::load(&db_tx, tenant_id).await?;
            let lines = load_posted_lines(&db_tx, tenant_id, None, None, Some(year_end)).await?;

            let mut remaining: &[PostedLine] = &lines;
            let mut net: HashMap<Uuid, i64> = HashMap::new();
            let mut months = Vec::with_capacity(12);
            for month in 1..=12u32 {
                let (_, month_end) = month_bounds(year, month).ok_or_else(|| {
                    EngineError::InvalidRange(format!("invalid trend year {year}"))
                })?;
                let split = remaining
                    .iter()
                    .position(|line| line.entry_date > month_end)
                    .unwrap_or(remaining.len());
                for line in &remaining[..split] {
                    *net.entry(line.account_id).or_insert(0) += line.debit - line.credit;
                }
                remaining = &remaining[split..];

                let (_, total_assets) = section_lines(&index, &net, AccountType::Asset);
                let (_, total_liabilities) = section_lines(&index, &net, AccountType::Liability);
                let (_, equity) = section_lines(&index, &net, AccountType::Equity);
                months.push(BalanceSheetMonth {
                    month,
                    total_assets,
                    total_liabilities,
                    total_equity: equity + net_income(&index, &net),
                });
            }

            Ok(BalanceSheetTrend { year, months })
        })
    }
}

fn build_balance_sheet(
    index: &AccountIndex,
    net: &HashMap<Uuid, i64>,
    as_of: NaiveDate,
) -> BalanceSheetReport {
    let (assets, total_assets) = section_lines(index, net, AccountType::Asset);
    let (liabilities, total_liabilities) = section_lines(index, net, AccountType::Liability);
    let (mut equity, mut total_equity) = section_lines(index, net, AccountType::Equity);

    let earnings = net_income(index, net);
    if !earnings.is_zero() {
        equity.push(AccountLine {
            code: CURRENT_EARNINGS_CODE.to_string(),
            name: CURRENT_EARNINGS_NAME.to_string(),
            balance: earnings,
        });
        total_equity += earnings;
    }

    BalanceSheetReport {
        as_of,
        assets,
        total_assets,
        liabilities,
        total_liabilities,
        equity,
        total_equity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Account, Money};

    fn account(code: &str, account_type: AccountType) -> Account {
        Account::new(
            Uuid::new_v4(),
            code.to_string(),
            format!("Account {code}"),
            format!("account {code}"),
            account_type,
            account_type.default_normal_balance(),
            false,
            None,
        )
    }

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 30).unwrap()
    }

    #[test]
    fn current_earnings_closes_the_accounting_equation() {
        let cash = account("1110", AccountType::Asset);
        let revenue = account("4100", AccountType::Revenue);
        let mut net = HashMap::new();
        net.insert(cash.id, 150_000);
        net.insert(revenue.id, -150_000);
        let index = AccountIndex::from_accounts(vec![cash, revenue]);

        let sheet = build_balance_sheet(&index, &net, as_of());
        assert_eq!(sheet.total_assets, Money::new(150_000));
        assert_eq!(sheet.total_liabilities, Money::ZERO);
        assert_eq!(sheet.total_equity, Money::new(150_000));
        assert_eq!(sheet.equity.len(), 1);
        assert_eq!(sheet.equity[0].code, CURRENT_EARNINGS_CODE);
    }

    #[test]
    fn a_net_loss_shows_as_negative_current_earnings() {
        let cash = account("1110", AccountType::Asset);
        let expense = account("5210", AccountType::Expense);
        let mut net = HashMap::new();
        net.insert(cash.id, -40_000);
        net.insert(expense.id, 40_000);
        let index = AccountIndex::from_accounts(vec![cash, expense]);

        let sheet = build_balance_sheet(&index, &net, as_of());
        assert_eq!(sheet.total_assets, Money::new(-40_000));
        assert_eq!(sheet.total_equity, Money::new(-40_000));
        assert_eq!(sheet.equity[0].balance, Money::new(-40_000));
    }

    #[test]
    fn settled_books_omit_the_earnings_line() {
        let cash = account("1110", AccountType::Asset);
        let capital = account("3100", AccountType::Equity);
        let mut net = HashMap::new();
        net.insert(cash.id, 1_000_000);
        net.insert(capital.id, -1_000_000);
        let index = AccountIndex::from_accounts(vec![cash, capital]);

        let sheet = build_balance_sheet(&index, &net, as_of());
        assert_eq!(sheet.equity.len(), 1);
        assert_eq!(sheet.equity[0].code, "3100");
        assert_eq!(sheet.total_equity, Money::new(1_000_000));
    }
}
