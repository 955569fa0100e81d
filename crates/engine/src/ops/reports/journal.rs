use std::collections::HashMap;

use base64::Engine as _;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sea_orm::{Condition, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*};

use crate::{
    EngineError, JournalEntry, JournalLine, Money, ResultEngine, SourceKind, TrialBalanceReport,
    TrialBalanceRow, journal_entries, journal_lines,
};

use super::super::{Engine, with_tx};
use super::{AccountIndex, compare_codes, load_posted_lines};

/// Filters for the journal listing.
///
/// `from` and `to` are inclusive civil dates.
#[derive(Clone, Debug, Default)]
pub struct JournalFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// If present, acts as an allow-list of source kinds to return.
    pub source_kinds: Option<Vec<SourceKind>>,
}

fn validate_journal_filter(filter: &JournalFilter) -> ResultEngine<()> {
    if let (Some(from), Some(to)) = (filter.from, filter.to)
        && from > to
    {
        return Err(EngineError::InvalidRange(
            "invalid range: from must be on or before to".to_string(),
        ));
    }
    if filter.source_kinds.as_ref().is_some_and(|kinds| kinds.is_empty()) {
        return Err(EngineError::InvalidRange(
            "source kinds must not be empty".to_string(),
        ));
    }
    Ok(())
}

trait ApplyJournalFilters: QueryFilter + Sized {
    fn apply_journal_filters(self, filter: &JournalFilter) -> Self;
}

impl<T> ApplyJournalFilters for T
where
    T: QueryFilter + Sized,
{
    fn apply_journal_filters(mut self, filter: &JournalFilter) -> Self {
        if let Some(from) = filter.from {
            self = self.filter(journal_entries::Column::EntryDate.gte(from));
        }
        if let Some(to) = filter.to {
            self = self.filter(journal_entries::Column::EntryDate.lte(to));
        }
        if let Some(kinds) = &filter.source_kinds {
            let kinds: Vec<String> = kinds.iter().map(|k| k.as_str().to_string()).collect();
            self = self.filter(journal_entries::Column::SourceKind.is_in(kinds));
        }
        self
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct JournalCursor {
    entry_date: NaiveDate,
    entry_id: Uuid,
}

impl JournalCursor {
    fn encode(&self) -> ResultEngine<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|_| EngineError::InvalidCursor("invalid journal cursor".to_string()))?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    fn decode(input: &str) -> ResultEngine<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(input.as_bytes())
            .map_err(|_| EngineError::InvalidCursor("invalid journal cursor".to_string()))?;
        serde_json::from_slice::<Self>(&bytes)
            .map_err(|_| EngineError::InvalidCursor("invalid journal cursor".to_string()))
    }
}

/// One listed entry with its lines and a per-entry balance check.
#[derive(Clone, Debug, Serialize)]
pub struct JournalEntryView {
    pub entry: JournalEntry,
    pub total_debit: Money,
    pub total_credit: Money,
    pub balanced: bool,
}

/// One page of the journal listing, newest first.
#[derive(Clone, Debug, Serialize)]
pub struct JournalPage {
    pub entries: Vec<JournalEntryView>,
    pub next_cursor: Option<String>,
}

impl Engine {
    /// Lists posted entries newest first by `(entry_date, id)`, with
    /// cursor-based pagination. Primarily a diagnostic and audit view.
    pub async fn list_journal(
        &self,
        tenant_id: Uuid,
        filter: &JournalFilter,
        limit: u64,
        cursor: Option<&str>,
    ) -> ResultEngine<JournalPage> {
        with_tx!(self, |db_tx| {
            self.require_tenant(&db_tx, tenant_id).await?;
            validate_journal_filter(filter)?;

            let limit_plus_one = limit.saturating_add(1);
            let mut query = journal_entries::Entity::find()
                .filter(journal_entries::Column::TenantId.eq(tenant_id))
                .filter(journal_entries::Column::Posted.eq(true))
                .order_by_desc(journal_entries::Column::EntryDate)
                .order_by_desc(journal_entries::Column::Id)
                .limit(limit_plus_one);

            if let Some(cursor) = cursor {
                let cursor = JournalCursor::decode(cursor)?;
                query = query.filter(
                    Condition::any()
                        .add(journal_entries::Column::EntryDate.lt(cursor.entry_date))
                        .add(
                            Condition::all()
                                .add(journal_entries::Column::EntryDate.eq(cursor.entry_date))
                                .add(journal_entries::Column::Id.lt(cursor.entry_id)),
                        ),
                );
            }
            query = query.apply_journal_filters(filter);

            let models: Vec<journal_entries::Model> = query.all(&db_tx).await?;
            let has_more = models.len() > limit as usize;

            let mut entries: Vec<JournalEntry> =
                Vec::with_capacity(models.len().min(limit as usize));
            for model in models.into_iter().take(limit as usize) {
                entries.push(JournalEntry::try_from(model)?);
            }

            let entry_ids: Vec<Uuid> = entries.iter().map(|entry| entry.id).collect();
            let mut lines_by_entry: HashMap<Uuid, Vec<JournalLine>> = HashMap::new();
            if !entry_ids.is_empty() {
                let line_models = journal_lines::Entity::find()
                    .filter(journal_lines::Column::EntryId.is_in(entry_ids))
                    .order_by_asc(journal_lines::Column::Id)
                    .all(&db_tx)
                    .await?;
                for model in line_models {
                    let line = JournalLine::from(model);
                    lines_by_entry.entry(line.entry_id).or_default().push(line);
                }
            }

            let next_cursor = entries.last().map(|entry| JournalCursor {
                entry_date: entry.entry_date,
                entry_id: entry.id,
            });
            let next_cursor = if has_more {
                next_cursor.map(|c| c.encode()).transpose()?
            } else {
                None
            };

            let views = entries
                .into_iter()
                .map(|mut entry| {
                    entry.lines = lines_by_entry.remove(&entry.id).unwrap_or_default();
                    let mut total_debit = Money::ZERO;
                    let mut total_credit = Money::ZERO;
                    for line in &entry.lines {
                        total_debit += line.debit;
                        total_credit += line.credit;
                    }
                    JournalEntryView {
                        balanced: total_debit == total_credit,
                        entry,
                        total_debit,
                        total_credit,
                    }
                })
                .collect();

            Ok(JournalPage {
                entries: views,
                next_cursor,
            })
        })
    }

    /// Per-account cumulative debit and credit totals through `as_of`, with
    /// grand totals. The grand totals agree when every entry balances.
    pub async fn trial_balance(
        &self,
        tenant_id: Uuid,
        as_of: NaiveDate,
    ) -> ResultEngine<TrialBalanceReport> {
        with_tx!(self, |db_tx| {
            self.require_tenant(&db_tx, tenant_id).await?;
            let index = AccountIndex::load(&db_tx, tenant_id).await?;
            let lines = load_posted_lines(&db_tx, tenant_id, None, None, Some(as_of)).await?;

            let mut totals: HashMap<Uuid, (i64, i64)> = HashMap::new();
            for line in &lines {
                let slot = totals.entry(line.account_id).or_insert((0, 0));
                slot.0 += line.debit;
                slot.1 += line.credit;
            }

            let mut rows: Vec<TrialBalanceRow> = Vec::new();
            let mut total_debit = Money::ZERO;
            let mut total_credit = Money::ZERO;
            for (account_id, (debit, credit)) in &totals {
                let Some(account) = index.get(*account_id) else {
                    continue;
                };
                if *debit == 0 && *credit == 0 {
                    continue;
                }
                total_debit += Money::new(*debit);
                total_credit += Money::new(*credit);
                rows.push(TrialBalanceRow {
                    code: account.code.clone(),
                    name: account.name.clone(),
                    debit: Money::new(*debit),
                    credit: Money::new(*credit),
                });
            }
            rows.sort_by(|a, b| compare_codes(&a.code, &b.code));

            Ok(TrialBalanceReport {
                as_of,
                rows,
                total_debit,
                total_credit,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_round_trips_through_base64() {
        let cursor = JournalCursor {
            entry_date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            entry_id: Uuid::new_v4(),
        };
        let encoded = cursor.encode().unwrap();
        let decoded = JournalCursor::decode(&encoded).unwrap();
        assert_eq!(decoded.entry_date, cursor.entry_date);
        assert_eq!(decoded.entry_id, cursor.entry_id);
    }

    #[test]
    fn garbage_cursors_are_rejected() {
        assert!(matches!(
            JournalCursor::decode("not a cursor"),
            Err(EngineError::InvalidCursor(_))
        ));
    }

    #[test]
    fn inverted_filter_ranges_are_rejected() {
        let filter = JournalFilter {
            from: NaiveDate::from_ymd_opt(2026, 2, 1),
            to: NaiveDate::from_ymd_opt(2026, 1, 1),
            source_kinds: None,
        };
        assert!(matches!(
            validate_journal_filter(&filter),
            Err(EngineError::InvalidRange(_))
        ));
    }

    #[test]
    fn empty_kind_lists_are_rejected() {
        let filter = JournalFilter {
            source_kinds: Some(Vec::new()),
            ..JournalFilter::default()
        };
        assert!(matches!(
            validate_journal_filter(&filter),
            Err(EngineError::InvalidRange(_))
        ));
    }
}
