use uuid::Uuid;

use sea_orm::{QueryFilter, TransactionTrait, prelude::*};

use crate::{
    Account, EngineError, LedgerReport, LedgerRow, Money, ReportRange, ResultEngine, accounts,
    util::normalize_key,
};

use super::super::{Engine, with_tx};
use super::{load_posted_lines, signed_balance};

impl Engine {
    /// Single-account drill-down over an inclusive date range.
    ///
    /// `beginning_balance` covers everything before the range. The optional
    /// free-text `filter` matches entry description and reference number and
    /// hides rows only; the running balance and the range totals always walk
    /// the complete sequence, so a filtered view stays chronologically true.
    pub async fn general_ledger(
        &self,
        tenant_id: Uuid,
        account_id: Uuid,
        range: ReportRange,
        filter: Option<&str>,
    ) -> ResultEngine<LedgerReport> {
        with_tx!(self, |db_tx| {
            self.require_tenant(&db_tx, tenant_id).await?;
            let account = accounts::Entity::find()
                .filter(accounts::Column::TenantId.eq(tenant_id))
                .filter(accounts::Column::Id.eq(account_id))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))?;
            let account = Account::try_from(account)?;

            let lines =
                load_posted_lines(&db_tx, tenant_id, Some(account_id), None, Some(range.end))
                    .await?;
            let split = lines
                .iter()
                .position(|line| line.entry_date >= range.start)
                .unwrap_or(lines.len());

            let mut running = 0i64;
            for line in &lines[..split] {
                running += line.debit - line.credit;
            }
            let beginning_balance = signed_balance(&account, running);

            let needle = filter.and_then(normalize_key);
            let mut rows = Vec::new();
            let mut total_debit = Money::ZERO;
            let mut total_credit = Money::ZERO;
            for line in &lines[split..] {
                running += line.debit - line.credit;
                total_debit += Money::new(line.debit);
                total_credit += Money::new(line.credit);
                let visible = match &needle {
                    None => true,
                    Some(needle) => {
                        entry_text_matches(needle, &line.description, &line.reference_no)
                    }
                };
                if visible {
                    rows.push(LedgerRow {
                        date: line.entry_date,
                        description: line.description.clone(),
                        reference_no: line.reference_no.clone(),
                        debit: Money::new(line.debit),
                        credit: Money::new(line.credit),
                        running_balance: signed_balance(&account, running),
                    });
                }
            }

            let ending_balance = signed_balance(&account, running);
            Ok(LedgerReport {
                start: range.start,
                end: range.end,
                account_code: account.code,
                account_name: account.name,
                beginning_balance,
                rows,
                total_debit,
                total_credit,
                ending_balance,
            })
        })
    }
}

fn entry_text_matches(needle: &str, description: &str, reference_no: &str) -> bool {
    normalize_key(description).is_some_and(|key| key.contains(needle))
        || normalize_key(reference_no).is_some_and(|key| key.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_filter_is_case_and_punctuation_insensitive() {
        assert!(entry_text_matches("sewa", "Bayar SEWA toko", "EXP-1"));
        assert!(entry_text_matches("exp 1", "Rent", "EXP-1"));
        assert!(!entry_text_matches("listrik", "Bayar sewa toko", "EXP-1"));
    }
}
