//! Reporting operations.
//!
//! Every statement is produced from one primitive: load the tenant's posted
//! journal lines for a date window, then fold account balances in memory.
//! Reports are whole-or-nothing; a tenant with no posted activity yields a
//! well-formed zeroed report, never an error.

use std::collections::HashMap;

use chrono::NaiveDate;
use uuid::Uuid;

use sea_orm::{ConnectionTrait, QueryFilter, QueryOrder, prelude::*};

use crate::{
    Account, AccountType, BusinessType, Money, NormalBalance, ResultEngine, accounts,
    journal_entries, journal_lines, reports::AccountLine,
};

use super::coa::{codes, compare_codes};

mod balance_sheet;
mod cash_flow;
mod journal;
mod ledger;
mod profit_loss;

pub use journal::{JournalEntryView, JournalFilter, JournalPage};

/// One posted journal line joined with its entry's header fields, in
/// `(entry_date, entry creation, line id)` order.
pub(super) struct PostedLine {
    pub(super) account_id: Uuid,
    pub(super) debit: i64,
    pub(super) credit: i64,
    pub(super) entry_id: Uuid,
    pub(super) entry_date: NaiveDate,
    pub(super) business_type: BusinessType,
    pub(super) category: Option<String>,
    pub(super) description: String,
    pub(super) reference_no: String,
}

/// Loads posted lines for a tenant, optionally restricted to one account
/// and/or an inclusive date window.
pub(super) async fn load_posted_lines<C: ConnectionTrait>(
    conn: &C,
    tenant_id: Uuid,
    account_id: Option<Uuid>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> ResultEngine<Vec<PostedLine>> {
    let mut query = journal_lines::Entity::find()
        .find_also_related(journal_entries::Entity)
        .filter(journal_entries::Column::TenantId.eq(tenant_id))
        .filter(journal_entries::Column::Posted.eq(true))
        .order_by_asc(journal_entries::Column::EntryDate)
        .order_by_asc(journal_entries::Column::CreatedAt)
        .order_by_asc(journal_lines::Column::Id);
    if let Some(account_id) = account_id {
        query = query.filter(journal_lines::Column::AccountId.eq(account_id));
    }
    if let Some(from) = from {
        query = query.filter(journal_entries::Column::EntryDate.gte(from));
    }
    if let Some(to) = to {
        query = query.filter(journal_entries::Column::EntryDate.lte(to));
    }

    let rows: Vec<(journal_lines::Model, Option<journal_entries::Model>)> =
        query.all(conn).await?;
    let mut lines = Vec::with_capacity(rows.len());
    for (line, entry) in rows {
        let Some(entry) = entry else {
            continue;
        };
        lines.push(PostedLine {
            account_id: line.account_id,
            debit: line.debit,
            credit: line.credit,
            entry_id: entry.id,
            entry_date: entry.entry_date,
            business_type: BusinessType::try_from(entry.business_type.as_str())?,
            category: entry.category,
            description: entry.description,
            reference_no: entry.reference_no,
        });
    }
    Ok(lines)
}

/// Immutable snapshot of a tenant's chart, keyed for the report folds.
pub(super) struct AccountIndex {
    by_id: HashMap<Uuid, Account>,
}

impl AccountIndex {
    pub(super) async fn load<C: ConnectionTrait>(conn: &C, tenant_id: Uuid) -> ResultEngine<Self> {
        let models = accounts::Entity::find()
            .filter(accounts::Column::TenantId.eq(tenant_id))
            .all(conn)
            .await?;
        let mut by_id = HashMap::with_capacity(models.len());
        for model in models {
            let account = Account::try_from(model)?;
            by_id.insert(account.id, account);
        }
        Ok(Self { by_id })
    }

    pub(super) fn get(&self, id: Uuid) -> Option<&Account> {
        self.by_id.get(&id)
    }

    /// `true` when the account sits in the Cash, Bank or E-wallet subtree.
    pub(super) fn is_cash_like(&self, id: Uuid) -> bool {
        let mut current = self.by_id.get(&id);
        // Charts are shallow; the hop cap only guards a corrupted tree.
        for _ in 0..16 {
            let Some(account) = current else {
                return false;
            };
            let code = account.code.as_str();
            if code == codes::CASH || code == codes::BANK || code == codes::EWALLET {
                return true;
            }
            current = match account.parent_id {
                Some(parent_id) => self.by_id.get(&parent_id),
                None => None,
            };
        }
        false
    }

    #[cfg(test)]
    pub(super) fn from_accounts(accounts: Vec<Account>) -> Self {
        Self {
            by_id: accounts
                .into_iter()
                .map(|account| (account.id, account))
                .collect(),
        }
    }
}

/// Raw per-account net `Σdebit − Σcredit` over a set of lines.
pub(super) fn net_by_account(lines: &[PostedLine]) -> HashMap<Uuid, i64> {
    let mut totals: HashMap<Uuid, i64> = HashMap::new();
    for line in lines {
        *totals.entry(line.account_id).or_insert(0) += line.debit - line.credit;
    }
    totals
}

/// Balance as reported: positive in the account's own normal direction.
pub(super) fn signed_balance(account: &Account, net: i64) -> Money {
    match account.normal_balance {
        NormalBalance::Debit => Money::new(net),
        NormalBalance::Credit => Money::new(-net),
    }
}

/// Rows and total for one statement section.
///
/// Rows are non-header accounts of the class with a nonzero balance, in code
/// order. The total subtracts contra rows, so a sales discount is listed
/// positive under revenue while still reducing the revenue total.
pub(super) fn section_lines(
    index: &AccountIndex,
    net: &HashMap<Uuid, i64>,
    account_type: AccountType,
) -> (Vec<AccountLine>, Money) {
    let mut rows: Vec<(AccountLine, bool)> = Vec::new();
    for (account_id, amount) in net {
        let Some(account) = index.get(*account_id) else {
            continue;
        };
        if account.account_type != account_type || account.is_header {
            continue;
        }
        let balance = signed_balance(account, *amount);
        if balance.is_zero() {
            continue;
        }
        let line = AccountLine {
            code: account.code.clone(),
            name: account.name.clone(),
            balance,
        };
        rows.push((line, account.is_contra()));
    }
    rows.sort_by(|(a, _), (b, _)| compare_codes(&a.code, &b.code));

    let mut total = Money::ZERO;
    for (row, is_contra) in &rows {
        if *is_contra {
            total -= row.balance;
        } else {
            total += row.balance;
        }
    }
    (rows.into_iter().map(|(row, _)| row).collect(), total)
}

/// Net income over the folded window: revenue total minus expense total,
/// both contra-adjusted.
pub(super) fn net_income(index: &AccountIndex, net: &HashMap<Uuid, i64>) -> Money {
    let (_, revenue) = section_lines(index, net, AccountType::Revenue);
    let (_, expenses) = section_lines(index, net, AccountType::Expense);
    revenue - expenses
}
