use std::collections::HashMap;

use chrono::Datelike;
use uuid::Uuid;

use sea_orm::TransactionTrait;

use crate::{
    AccountType, EngineError, Money, ProfitLossComparative, ProfitLossMonth, ProfitLossReport,
    ProfitLossTrend, ReportRange, ResultEngine, TrendAccountRow, reports::growth_pct,
    util::month_bounds,
};

use super::super::{Engine, with_tx};
use super::{
    AccountIndex, compare_codes, load_posted_lines, net_by_account, section_lines, signed_balance,
};

impl Engine {
    /// Profit and loss over an inclusive date range.
    pub async fn profit_loss(
        &self,
        tenant_id: Uuid,
        range: ReportRange,
    ) -> ResultEngine<ProfitLossReport> {
        with_tx!(self, |db_tx| {
            self.require_tenant(&db_tx, tenant_id).await?;
            let index = AccountIndex::load(&db_tx, tenant_id).await?;
            let lines =
                load_posted_lines(&db_tx, tenant_id, None, Some(range.start), Some(range.end))
                    .await?;
            let net = net_by_account(&lines);
            let (revenue, total_revenue) = section_lines(&index, &net, AccountType::Revenue);
            let (expenses, total_expenses) = section_lines(&index, &net, AccountType::Expense);
            Ok(ProfitLossReport {
                start: range.start,
                end: range.end,
                revenue,
                total_revenue,
                expenses,
                total_expenses,
                net_income: total_revenue - total_expenses,
            })
        })
    }

    /// Profit and loss for two windows side by side, with growth on the
    /// class totals. Growth is `None` when the previous total is zero.
    pub async fn profit_loss_comparative(
        &self,
        tenant_id: Uuid,
        range: ReportRange,
        comparison: ReportRange,
    ) -> ResultEngine<ProfitLossComparative> {
        let current = self.profit_loss(tenant_id, range).await?;
        let previous = self.profit_loss(tenant_id, comparison).await?;
        Ok(ProfitLossComparative {
            revenue_growth: growth_pct(current.total_revenue, previous.total_revenue),
            expense_growth: growth_pct(current.total_expenses, previous.total_expenses),
            net_income_growth: growth_pct(current.net_income, previous.net_income),
            current,
            previous,
        })
    }

    /// Twelve-month profit and loss for a calendar year: one twelve-slot row
    /// per account plus monthly class totals.
    pub async fn profit_loss_trend(
        &self,
        tenant_id: Uuid,
        year: i32,
    ) -> ResultEngine<ProfitLossTrend> {
        let (start, _) = month_bounds(year, 1)
            .ok_or_else(|| EngineError::InvalidRange(format!("invalid trend year {year}")))?;
        let (_, end) = month_bounds(year, 12)
            .ok_or_else(|| EngineError::InvalidRange(format!("invalid trend year {year}")))?;

        with_tx!(self, |db_tx| {
            self.require_tenant(&db_tx, tenant_id).await?;
            let index = AccountIndex::load(&db_tx, tenant_id).await?;
            let lines =
                load_posted_lines(&db_tx, tenant_id, None, Some(start), Some(end)).await?;

            let mut monthly_net: HashMap<Uuid, [i64; 12]> = HashMap::new();
            for line in &lines {
                let slot = line.entry_date.month0() as usize;
                monthly_net.entry(line.account_id).or_insert([0; 12])[slot] +=
                    line.debit - line.credit;
            }

            let (revenue, revenue_totals) = trend_rows(&index, &monthly_net, AccountType::Revenue);
            let (expenses, expense_totals) =
                trend_rows(&index, &monthly_net, AccountType::Expense);
            let months = (0..12usize)
                .map(|slot| ProfitLossMonth {
                    month: slot as u32 + 1,
                    total_revenue: revenue_totals[slot],
                    total_expenses: expense_totals[slot],
                    net_income: revenue_totals[slot] - expense_totals[slot],
                })
                .collect();

            Ok(ProfitLossTrend {
                year,
                revenue,
                expenses,
                months,
            })
        })
    }
}

/// Per-account twelve-slot rows for one class, plus the per-month class
/// total with contra rows subtracted.
fn trend_rows(
    index: &AccountIndex,
    monthly_net: &HashMap<Uuid, [i64; 12]>,
    account_type: AccountType,
) -> (Vec<TrendAccountRow>, [Money; 12]) {
    let mut rows: Vec<(TrendAccountRow, bool)> = Vec::new();
    for (account_id, slots) in monthly_net {
        let Some(account) = index.get(*account_id) else {
            continue;
        };
        if account.account_type != account_type || account.is_header {
            continue;
        }
        if slots.iter().all(|net| *net == 0) {
            continue;
        }
        let mut monthly = [Money::ZERO; 12];
        for (slot, net) in slots.iter().enumerate() {
            monthly[slot] = signed_balance(account, *net);
        }
        let row = TrendAccountRow {
            code: account.code.clone(),
            name: account.name.clone(),
            monthly,
        };
        rows.push((row, account.is_contra()));
    }
    rows.sort_by(|(a, _), (b, _)| compare_codes(&a.code, &b.code));

    let mut totals = [Money::ZERO; 12];
    for (row, is_contra) in &rows {
        for (slot, amount) in row.monthly.iter().enumerate() {
            if *is_contra {
                totals[slot] -= *amount;
            } else {
                totals[slot] += *amount;
            }
        }
    }
    let rows = rows.into_iter().map(|(row, _)| row).collect();
    (rows, totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Account, NormalBalance};

    fn revenue_account(code: &str, contra: bool) -> Account {
        let normal = if contra {
            NormalBalance::Debit
        } else {
            NormalBalance::Credit
        };
        Account::new(
            Uuid::new_v4(),
            code.to_string(),
            format!("Account {code}"),
            format!("account {code}"),
            AccountType::Revenue,
            normal,
            false,
            None,
        )
    }

    #[test]
    fn trend_totals_subtract_contra_slots() {
        let sales = revenue_account("4100", false);
        let discount = revenue_account("4900", true);
        let mut monthly_net: HashMap<Uuid, [i64; 12]> = HashMap::new();
        let mut sales_slots = [0i64; 12];
        sales_slots[0] = -200_000;
        sales_slots[2] = -50_000;
        monthly_net.insert(sales.id, sales_slots);
        let mut discount_slots = [0i64; 12];
        discount_slots[0] = 20_000;
        monthly_net.insert(discount.id, discount_slots);
        let index = AccountIndex::from_accounts(vec![sales, discount]);

        let (rows, totals) = trend_rows(&index, &monthly_net, AccountType::Revenue);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].code, "4100");
        assert_eq!(rows[0].monthly[0], Money::new(200_000));
        assert_eq!(rows[1].monthly[0], Money::new(20_000));
        assert_eq!(totals[0], Money::new(180_000));
        assert_eq!(totals[2], Money::new(50_000));
        assert_eq!(totals[1], Money::ZERO);
    }

    #[test]
    fn accounts_with_no_activity_are_dropped_from_the_trend() {
        let idle = revenue_account("4200", false);
        let mut monthly_net: HashMap<Uuid, [i64; 12]> = HashMap::new();
        monthly_net.insert(idle.id, [0; 12]);
        let index = AccountIndex::from_accounts(vec![idle]);

        let (rows, totals) = trend_rows(&index, &monthly_net, AccountType::Revenue);
        assert!(rows.is_empty());
        assert_eq!(totals[0], Money::ZERO);
    }
}
