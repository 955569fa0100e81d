use std::collections::HashMap;

use chrono::NaiveDate;
use uuid::Uuid;

use sea_orm::TransactionTrait;

use crate::{
    BusinessType, CashFlowBucket, CashFlowItem, CashFlowMonth, CashFlowReport, CashFlowTrend,
    EngineError, Money, ReportRange, ResultEngine,
    util::{month_bounds, normalize_key},
};

use super::super::{Engine, with_tx};
use super::{AccountIndex, PostedLine, load_posted_lines};

/// Category keys that route a cash movement to the investing bucket.
/// Matched as substrings of the normalized category.
const INVESTING_KEYWORDS: &[&str] = &[
    "peralatan",
    "mesin",
    "kendaraan",
    "tanah",
    "bangunan",
    "aset",
    "asset",
    "equipment",
    "investasi",
    "investment",
];

/// One entry's net effect on cash-like accounts.
struct EntryFlow {
    date: NaiveDate,
    description: String,
    business_type: BusinessType,
    category: Option<String>,
    delta: i64,
}

impl Engine {
    /// Cash flow statement over an inclusive date range, bucketed into
    /// operating, investing and financing activity.
    pub async fn cash_flow(
        &self,
        tenant_id: Uuid,
        range: ReportRange,
    ) -> ResultEngine<CashFlowReport> {
        with_tx!(self, |db_tx| {
            self.require_tenant(&db_tx, tenant_id).await?;
            let index = AccountIndex::load(&db_tx, tenant_id).await?;
            let lines = load_posted_lines(&db_tx, tenant_id, None, None, Some(range.end)).await?;

            let split = lines
                .iter()
                .position(|line| line.entry_date >= range.start)
                .unwrap_or(lines.len());
            let beginning_cash = cash_balance(&index, &lines[..split]);

            let mut operating = Vec::new();
            let mut investing = Vec::new();
            let mut financing = Vec::new();
            let mut total_operating = Money::ZERO;
            let mut total_investing = Money::ZERO;
            let mut total_financing = Money::ZERO;
            for flow in entry_flows(&index, &lines[split..]) {
                if flow.delta == 0 {
                    continue;
                }
                let Some(bucket) = bucket_for(flow.business_type, flow.category.as_deref())
                else {
                    continue;
                };
                let item = CashFlowItem {
                    date: flow.date,
                    description: flow.description,
                    amount: Money::new(flow.delta),
                };
                match bucket {
                    CashFlowBucket::Operating => {
                        total_operating += item.amount;
                        operating.push(item);
                    }
                    CashFlowBucket::Investing => {
                        total_investing += item.amount;
                        investing.push(item);
                    }
                    CashFlowBucket::Financing => {
                        total_financing += item.amount;
                        financing.push(item);
                    }
                }
            }

            let net_change = total_operating + total_investing + total_financing;
            Ok(CashFlowReport {
                start: range.start,
                end: range.end,
                operating,
                total_operating,
                investing,
                total_investing,
                financing,
                total_financing,
                net_change,
                beginning_cash,
                ending_cash: beginning_cash + net_change,
            })
        })
    }

    /// Monthly cash flow across a calendar year, with the cash position
    /// carried month to month.
    pub async fn cash_flow_trend(
        &self,
        tenant_id: Uuid,
        year: i32,
    ) -> ResultEngine<CashFlowTrend> {
        let (year_start, _) = month_bounds(year, 1)
            .ok_or_else(|| EngineError::InvalidRange(format!("invalid trend year {year}")))?;
        let (_, year_end) = month_bounds(year, 12)
            .ok_or_else(|| EngineError::InvalidRange(format!("invalid trend year {year}")))?;

        with_tx!(self, |db_tx| {
            self.require_tenant(&db_tx, tenant_id).await?;
            let index = AccountIndex::load(&db_tx, tenant_id).await?;
            let lines = load_posted_lines(&db_tx, tenant_id, None, None, Some(year_end)).await?;

            let mut remaining: &[PostedLine] = &lines;
            let split = remaining
                .iter()
                .position(|line| line.entry_date >= year_start)
                .unwrap_or(remaining.len());
            let mut running_cash = cash_balance(&index, &remaining[..split]);
            remaining = &remaining[split..];

            let mut months = Vec::with_capacity(12);
            for month in 1..=12u32 {
                let (_, month_end) = month_bounds(year, month).ok_or_else(|| {
                    EngineError::InvalidRange(format!("invalid trend year {year}"))
                })?;
                let split = remaining
                    .iter()
                    .position(|line| line.entry_date > month_end)
                    .unwrap_or(remaining.len());
                let month_lines = &remaining[..split];
                remaining = &remaining[split..];

                let mut operating = Money::ZERO;
                let mut investing = Money::ZERO;
                let mut financing = Money::ZERO;
                for flow in entry_flows(&index, month_lines) {
                    if flow.delta == 0 {
                        continue;
                    }
                    let Some(bucket) = bucket_for(flow.business_type, flow.category.as_deref())
                    else {
                        continue;
                    };
                    let amount = Money::new(flow.delta);
                    match bucket {
                        CashFlowBucket::Operating => operating += amount,
                        CashFlowBucket::Investing => investing += amount,
                        CashFlowBucket::Financing => financing += amount,
                    }
                }

                let net_change = operating + investing + financing;
                running_cash += net_change;
                months.push(CashFlowMonth {
                    month,
                    operating,
                    investing,
                    financing,
                    net_change,
                    ending_cash: running_cash,
                });
            }

            Ok(CashFlowTrend { year, months })
        })
    }
}

/// Cumulative balance over cash-like accounts.
fn cash_balance(index: &AccountIndex, lines: &[PostedLine]) -> Money {
    let mut total = 0i64;
    for line in lines {
        if index.is_cash_like(line.account_id) {
            total += line.debit - line.credit;
        }
    }
    Money::new(total)
}

/// Folds lines into one flow per entry, keeping chronological order.
fn entry_flows(index: &AccountIndex, lines: &[PostedLine]) -> Vec<EntryFlow> {
    let mut flows: Vec<EntryFlow> = Vec::new();
    let mut by_entry: HashMap<Uuid, usize> = HashMap::new();
    for line in lines {
        if !index.is_cash_like(line.account_id) {
            continue;
        }
        let delta = line.debit - line.credit;
        match by_entry.get(&line.entry_id) {
            Some(&slot) => flows[slot].delta += delta,
            None => {
                by_entry.insert(line.entry_id, flows.len());
                flows.push(EntryFlow {
                    date: line.entry_date,
                    description: line.description.clone(),
                    business_type: line.business_type,
                    category: line.category.clone(),
                    delta,
                });
            }
        }
    }
    flows
}

/// Fixed bucket mapping. Internal transfers are cash-neutral and excluded.
fn bucket_for(business_type: BusinessType, category: Option<&str>) -> Option<CashFlowBucket> {
    match business_type {
        BusinessType::Transfer => None,
        BusinessType::OpeningCapital | BusinessType::PayableSettlement => {
            Some(CashFlowBucket::Financing)
        }
        _ => {
            if let Some(category) = category
                && let Some(key) = normalize_key(category)
                && INVESTING_KEYWORDS.iter().any(|keyword| key.contains(keyword))
            {
                return Some(CashFlowBucket::Investing);
            }
            Some(CashFlowBucket::Operating)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfers_are_cash_neutral() {
        assert_eq!(bucket_for(BusinessType::Transfer, None), None);
    }

    #[test]
    fn capital_and_debt_payments_are_financing() {
        assert_eq!(
            bucket_for(BusinessType::OpeningCapital, None),
            Some(CashFlowBucket::Financing)
        );
        assert_eq!(
            bucket_for(BusinessType::PayableSettlement, Some("pay debt")),
            Some(CashFlowBucket::Financing)
        );
    }

    #[test]
    fn asset_purchases_are_investing() {
        assert_eq!(
            bucket_for(BusinessType::Expense, Some("Beban Peralatan Kasir")),
            Some(CashFlowBucket::Investing)
        );
        assert_eq!(
            bucket_for(BusinessType::Expense, Some("Kendaraan Operasional")),
            Some(CashFlowBucket::Investing)
        );
    }

    #[test]
    fn everyday_activity_defaults_to_operating() {
        assert_eq!(
            bucket_for(BusinessType::Sale, None),
            Some(CashFlowBucket::Operating)
        );
        assert_eq!(
            bucket_for(BusinessType::Expense, Some("Sewa")),
            Some(CashFlowBucket::Operating)
        );
        assert_eq!(
            bucket_for(BusinessType::ReceivableSettlement, None),
            Some(CashFlowBucket::Operating)
        );
    }
}
