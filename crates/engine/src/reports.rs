//! Report result types.
//!
//! Plain serializable shapes returned by the reporting operations. An
//! account row's balance is positive in the account's own normal direction;
//! section totals subtract contra rows (a sales discount shows positive
//! under revenue but reduces the revenue total).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{EngineError, Money, ResultEngine};

/// Inclusive date range for range-sum reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReportRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> ResultEngine<Self> {
        if end < start {
            return Err(EngineError::InvalidRange(format!(
                "range end {end} precedes start {start}"
            )));
        }
        Ok(Self { start, end })
    }
}

/// Percentage growth from `previous` to `current`.
///
/// `None` when the previous value is zero; the caller renders a dash instead
/// of a division-by-zero artifact.
pub(crate) fn growth_pct(current: Money, previous: Money) -> Option<f64> {
    if previous.is_zero() {
        return None;
    }
    let current = current.amount() as f64;
    let previous = previous.amount() as f64;
    Some((current - previous) / previous.abs() * 100.0)
}

/// One account row of a report section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountLine {
    pub code: String,
    pub name: String,
    pub balance: Money,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProfitLossReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub revenue: Vec<AccountLine>,
    pub total_revenue: Money,
    pub expenses: Vec<AccountLine>,
    pub total_expenses: Money,
    pub net_income: Money,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProfitLossComparative {
    pub current: ProfitLossReport,
    pub previous: ProfitLossReport,
    pub revenue_growth: Option<f64>,
    pub expense_growth: Option<f64>,
    pub net_income_growth: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitLossMonth {
    pub month: u32,
    pub total_revenue: Money,
    pub total_expenses: Money,
    pub net_income: Money,
}

/// One account's activity across a calendar year, one slot per month.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendAccountRow {
    pub code: String,
    pub name: String,
    pub monthly: [Money; 12],
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitLossTrend {
    pub year: i32,
    pub revenue: Vec<TrendAccountRow>,
    pub expenses: Vec<TrendAccountRow>,
    pub months: Vec<ProfitLossMonth>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSheetReport {
    pub as_of: NaiveDate,
    pub assets: Vec<AccountLine>,
    pub total_assets: Money,
    pub liabilities: Vec<AccountLine>,
    pub total_liabilities: Money,
    pub equity: Vec<AccountLine>,
    pub total_equity: Money,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheetComparative {
    pub current: BalanceSheetReport,
    pub previous: BalanceSheetReport,
    pub asset_growth: Option<f64>,
    pub liability_growth: Option<f64>,
    pub equity_growth: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSheetMonth {
    pub month: u32,
    pub total_assets: Money,
    pub total_liabilities: Money,
    pub total_equity: Money,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSheetTrend {
    pub year: i32,
    pub months: Vec<BalanceSheetMonth>,
}

/// Activity classification for the cash flow statement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashFlowBucket {
    Operating,
    Investing,
    Financing,
}

impl CashFlowBucket {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Operating => "operating",
            Self::Investing => "investing",
            Self::Financing => "financing",
        }
    }
}

/// One cash-affecting entry inside a cash-flow bucket. `amount` is the signed
/// net effect on cash-like accounts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowItem {
    pub date: NaiveDate,
    pub description: String,
    pub amount: Money,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub operating: Vec<CashFlowItem>,
    pub total_operating: Money,
    pub investing: Vec<CashFlowItem>,
    pub total_investing: Money,
    pub financing: Vec<CashFlowItem>,
    pub total_financing: Money,
    pub net_change: Money,
    pub beginning_cash: Money,
    pub ending_cash: Money,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowMonth {
    pub month: u32,
    pub operating: Money,
    pub investing: Money,
    pub financing: Money,
    pub net_change: Money,
    pub ending_cash: Money,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowTrend {
    pub year: i32,
    pub months: Vec<CashFlowMonth>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub date: NaiveDate,
    pub description: String,
    pub reference_no: String,
    pub debit: Money,
    pub credit: Money,
    pub running_balance: Money,
}

/// One account's ledger over a range. Totals cover every posting in the
/// range even when a text filter hides some rows, and the running balance
/// walks the full sequence for the same reason.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub account_code: String,
    pub account_name: String,
    pub beginning_balance: Money,
    pub rows: Vec<LedgerRow>,
    pub total_debit: Money,
    pub total_credit: Money,
    pub ending_balance: Money,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceRow {
    pub code: String,
    pub name: String,
    pub debit: Money,
    pub credit: Money,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceReport {
    pub as_of: NaiveDate,
    pub rows: Vec<TrialBalanceRow>,
    pub total_debit: Money,
    pub total_credit: Money,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_is_none_when_previous_is_zero() {
        assert_eq!(growth_pct(Money::new(500), Money::ZERO), None);
        assert_eq!(growth_pct(Money::ZERO, Money::ZERO), None);
    }

    #[test]
    fn growth_is_signed_percentage() {
        assert_eq!(
            growth_pct(Money::new(150), Money::new(100)),
            Some(50.0)
        );
        assert_eq!(
            growth_pct(Money::new(50), Money::new(100)),
            Some(-50.0)
        );
    }

    #[test]
    fn range_rejects_reversed_bounds() {
        let start = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        assert!(ReportRange::new(start, end).is_err());
        assert!(ReportRange::new(start, start).is_ok());
    }
}
