use std::cmp::Ordering;
use std::collections::HashMap;

use sea_orm::{
    ConnectionTrait, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait, prelude::*,
};
use tracing::debug;
use uuid::Uuid;

use crate::{
    Account, AccountType, ChannelKind, EngineError, ResultEngine, accounts, expenses, incomes,
    payment_channels,
    util::{normalize_display, normalize_key},
};

use super::{Engine, normalize_required_name, sources, with_tx};

/// Codes of the standard skeleton that other engine modules anchor on.
pub(crate) mod codes {
    pub const ASSETS: &str = "1000";
    pub const CURRENT_ASSETS: &str = "1100";
    pub const CASH: &str = "1110";
    pub const BANK: &str = "1120";
    pub const EWALLET: &str = "1130";
    pub const ACCOUNTS_RECEIVABLE: &str = "1140";
    pub const INVENTORY: &str = "1150";
    pub const FIXED_ASSETS: &str = "1200";
    pub const LIABILITIES: &str = "2000";
    pub const CURRENT_LIABILITIES: &str = "2100";
    pub const ACCOUNTS_PAYABLE: &str = "2110";
    pub const TAX_PAYABLE: &str = "2120";
    pub const EQUITY: &str = "3000";
    pub const PAID_IN_CAPITAL: &str = "3100";
    pub const RETAINED_EARNINGS: &str = "3200";
    pub const REVENUE: &str = "4000";
    pub const SALES_REVENUE: &str = "4100";
    pub const OTHER_REVENUE: &str = "4200";
    pub const SALES_DISCOUNT: &str = "4900";
    pub const EXPENSES: &str = "5000";
    pub const COST_OF_GOODS_SOLD: &str = "5100";
    pub const OPERATING_EXPENSES: &str = "5200";
    pub const OTHER_OPERATING_EXPENSE: &str = "5210";
}

/// Skeleton account names that posting rules refer to.
pub(crate) mod names {
    pub const ACCOUNTS_RECEIVABLE: &str = "Accounts Receivable";
    pub const INVENTORY: &str = "Inventory";
    pub const ACCOUNTS_PAYABLE: &str = "Accounts Payable";
    pub const TAX_PAYABLE: &str = "Tax Payable";
    pub const PAID_IN_CAPITAL: &str = "Paid-in Capital";
    pub const SALES_REVENUE: &str = "Sales Revenue";
    pub const SALES_DISCOUNT: &str = "Sales Discount";
    pub const COST_OF_GOODS_SOLD: &str = "Cost of Goods Sold";
    pub const MISC_EXPENSE: &str = "Beban Lain-lain";
}

struct SkeletonAccount {
    code: &'static str,
    name: &'static str,
    account_type: AccountType,
    contra: bool,
    is_header: bool,
    parent: Option<&'static str>,
}

const fn header(
    code: &'static str,
    name: &'static str,
    account_type: AccountType,
    parent: Option<&'static str>,
) -> SkeletonAccount {
    SkeletonAccount {
        code,
        name,
        account_type,
        contra: false,
        is_header: true,
        parent,
    }
}

const fn leaf(
    code: &'static str,
    name: &'static str,
    account_type: AccountType,
    parent: &'static str,
) -> SkeletonAccount {
    SkeletonAccount {
        code,
        name,
        account_type,
        contra: false,
        is_header: false,
        parent: Some(parent),
    }
}

/// The fixed chart every tenant starts from. Parents are listed before their
/// children. Cash, Bank, E-wallet, Other Revenue and Other Operating Expense
/// are postable themselves and also collect dynamic children.
const STANDARD_SKELETON: &[SkeletonAccount] = &[
    header(codes::ASSETS, "Assets", AccountType::Asset, None),
    header(
        codes::CURRENT_ASSETS,
        "Current Assets",
        AccountType::Asset,
        Some(codes::ASSETS),
    ),
    leaf(codes::CASH, "Cash", AccountType::Asset, codes::CURRENT_ASSETS),
    leaf(codes::BANK, "Bank", AccountType::Asset, codes::CURRENT_ASSETS),
    leaf(
        codes::EWALLET,
        "E-wallet",
        AccountType::Asset,
        codes::CURRENT_ASSETS,
    ),
    leaf(
        codes::ACCOUNTS_RECEIVABLE,
        names::ACCOUNTS_RECEIVABLE,
        AccountType::Asset,
        codes::CURRENT_ASSETS,
    ),
    leaf(
        codes::INVENTORY,
        names::INVENTORY,
        AccountType::Asset,
        codes::CURRENT_ASSETS,
    ),
    header(
        codes::FIXED_ASSETS,
        "Fixed Assets",
        AccountType::Asset,
        Some(codes::ASSETS),
    ),
    header(codes::LIABILITIES, "Liabilities", AccountType::Liability, None),
    header(
        codes::CURRENT_LIABILITIES,
        "Current Liabilities",
        AccountType::Liability,
        Some(codes::LIABILITIES),
    ),
    leaf(
        codes::ACCOUNTS_PAYABLE,
        names::ACCOUNTS_PAYABLE,
        AccountType::Liability,
        codes::CURRENT_LIABILITIES,
    ),
    leaf(
        codes::TAX_PAYABLE,
        names::TAX_PAYABLE,
        AccountType::Liability,
        codes::CURRENT_LIABILITIES,
    ),
    header(codes::EQUITY, "Equity", AccountType::Equity, None),
    leaf(
        codes::PAID_IN_CAPITAL,
        names::PAID_IN_CAPITAL,
        AccountType::Equity,
        codes::EQUITY,
    ),
    leaf(
        codes::RETAINED_EARNINGS,
        "Retained Earnings",
        AccountType::Equity,
        codes::EQUITY,
    ),
    header(codes::REVENUE, "Revenue", AccountType::Revenue, None),
    leaf(
        codes::SALES_REVENUE,
        names::SALES_REVENUE,
        AccountType::Revenue,
        codes::REVENUE,
    ),
    leaf(
        codes::OTHER_REVENUE,
        "Other Revenue",
        AccountType::Revenue,
        codes::REVENUE,
    ),
    SkeletonAccount {
        code: codes::SALES_DISCOUNT,
        name: names::SALES_DISCOUNT,
        account_type: AccountType::Revenue,
        contra: true,
        is_header: false,
        parent: Some(codes::REVENUE),
    },
    header(codes::EXPENSES, "Expenses", AccountType::Expense, None),
    leaf(
        codes::COST_OF_GOODS_SOLD,
        names::COST_OF_GOODS_SOLD,
        AccountType::Expense,
        codes::EXPENSES,
    ),
    header(
        codes::OPERATING_EXPENSES,
        "Operating Expenses",
        AccountType::Expense,
        Some(codes::EXPENSES),
    ),
    leaf(
        codes::OTHER_OPERATING_EXPENSE,
        "Other Operating Expense",
        AccountType::Expense,
        codes::OPERATING_EXPENSES,
    ),
];

/// Target of an account lookup. Resolution is by normalized name; the rest of
/// the spec only matters when the account has to be created.
#[derive(Clone, Debug)]
pub(super) struct AccountSpec {
    pub(super) name: String,
    pub(super) account_type: AccountType,
    pub(super) contra: bool,
    pub(super) parent: ParentHint,
}

#[derive(Clone, Debug)]
pub(super) enum ParentHint {
    /// Under Cash, Bank or E-wallet, picked by the channel registry kind.
    Channel,
    /// Under the skeleton account with this code.
    Group(&'static str),
}

impl AccountSpec {
    pub(super) fn channel(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            account_type: AccountType::Asset,
            contra: false,
            parent: ParentHint::Channel,
        }
    }

    pub(super) fn fixed(
        name: &'static str,
        account_type: AccountType,
        group: &'static str,
    ) -> Self {
        Self {
            name: name.to_string(),
            account_type,
            contra: false,
            parent: ParentHint::Group(group),
        }
    }

    /// `Beban {label}` cost account; labels that already start with "beban"
    /// keep their own name.
    pub(super) fn expense_category(label: &str) -> Self {
        let name = match normalize_key(label) {
            Some(key) if key == "beban" || key.starts_with("beban ") => label.to_string(),
            _ => format!("Beban {label}"),
        };
        Self {
            name,
            account_type: AccountType::Expense,
            contra: false,
            parent: ParentHint::Group(codes::OTHER_OPERATING_EXPENSE),
        }
    }

    pub(super) fn income_category(label: &str) -> Self {
        Self {
            name: label.to_string(),
            account_type: AccountType::Revenue,
            contra: false,
            parent: ParentHint::Group(codes::OTHER_REVENUE),
        }
    }

    #[must_use]
    pub(super) fn contra(mut self) -> Self {
        self.contra = true;
        self
    }
}

impl Engine {
    /// Create the standard chart for a tenant. Idempotent; existing accounts
    /// with a matching normalized name are left alone. Returns the number of
    /// accounts inserted.
    pub async fn ensure_standard_skeleton(&self, tenant_id: Uuid) -> ResultEngine<usize> {
        with_tx!(self, |db_tx| {
            self.require_tenant(&db_tx, tenant_id).await?;
            self.ensure_skeleton_tx(&db_tx, tenant_id).await
        })
    }

    pub(super) async fn ensure_skeleton_tx(
        &self,
        db_tx: &DatabaseTransaction,
        tenant_id: Uuid,
    ) -> ResultEngine<usize> {
        let mut ids_by_code: HashMap<&'static str, Uuid> = HashMap::new();
        let mut created = 0usize;
        for row in STANDARD_SKELETON {
            let key = normalize_key(row.name).ok_or_else(|| {
                EngineError::AccountCreation(format!("unusable account name: {}", row.name))
            })?;
            if let Some(model) = Self::account_by_key(db_tx, tenant_id, &key).await? {
                ids_by_code.insert(row.code, model.id);
                continue;
            }

            let parent_id = row.parent.and_then(|code| ids_by_code.get(code).copied());
            let normal_balance = if row.contra {
                row.account_type.default_normal_balance().opposite()
            } else {
                row.account_type.default_normal_balance()
            };
            let account = Account::new(
                tenant_id,
                row.code.to_string(),
                row.name.to_string(),
                key.clone(),
                row.account_type,
                normal_balance,
                row.is_header,
                parent_id,
            );
            let active: accounts::ActiveModel = (&account).into();
            if let Err(err) = active.insert(db_tx).await {
                // Unique index hit: another writer seeded this name first.
                if let Some(model) = Self::account_by_key(db_tx, tenant_id, &key).await? {
                    ids_by_code.insert(row.code, model.id);
                    continue;
                }
                return Err(EngineError::AccountCreation(format!("{}: {err}", row.name)));
            }
            debug!(%tenant_id, code = %account.code, name = %account.name, "skeleton account created");
            ids_by_code.insert(row.code, account.id);
            created += 1;
        }
        Ok(created)
    }

    /// Materialize accounts for registered payment channels and for category
    /// labels seen on income and expense records. Settlement pseudo-categories
    /// never become accounts. Returns the number of accounts created.
    pub async fn discover_dynamic_accounts(&self, tenant_id: Uuid) -> ResultEngine<usize> {
        with_tx!(self, |db_tx| {
            self.require_tenant(&db_tx, tenant_id).await?;
            self.ensure_skeleton_tx(&db_tx, tenant_id).await?;
            let mut created = 0usize;

            let channels = payment_channels::Entity::find()
                .filter(payment_channels::Column::TenantId.eq(tenant_id))
                .order_by_asc(payment_channels::Column::CreatedAt)
                .all(&db_tx)
                .await?;
            for channel in channels {
                let spec = AccountSpec::channel(channel.name);
                let (_, was_created) = self.get_or_create_account(&db_tx, tenant_id, &spec).await?;
                if was_created {
                    created += 1;
                }
            }

            let expense_labels: Vec<String> = expenses::Entity::find()
                .select_only()
                .column(expenses::Column::Category)
                .filter(expenses::Column::TenantId.eq(tenant_id))
                .distinct()
                .into_tuple()
                .all(&db_tx)
                .await?;
            for label in expense_labels {
                if sources::reserved_category(&label) || normalize_key(&label).is_none() {
                    continue;
                }
                let spec = AccountSpec::expense_category(&label);
                let (_, was_created) = self.get_or_create_account(&db_tx, tenant_id, &spec).await?;
                if was_created {
                    created += 1;
                }
            }

            let income_labels: Vec<String> = incomes::Entity::find()
                .select_only()
                .column(incomes::Column::Category)
                .filter(incomes::Column::TenantId.eq(tenant_id))
                .distinct()
                .into_tuple()
                .all(&db_tx)
                .await?;
            for label in income_labels {
                if sources::reserved_category(&label) || normalize_key(&label).is_none() {
                    continue;
                }
                let spec = AccountSpec::income_category(&label);
                let (_, was_created) = self.get_or_create_account(&db_tx, tenant_id, &spec).await?;
                if was_created {
                    created += 1;
                }
            }

            Ok(created)
        })
    }

    /// Skeleton pass plus discovery pass; returns both insert counts.
    pub async fn sync_chart(&self, tenant_id: Uuid) -> ResultEngine<(usize, usize)> {
        let skeleton = self.ensure_standard_skeleton(tenant_id).await?;
        let discovered = self.discover_dynamic_accounts(tenant_id).await?;
        Ok((skeleton, discovered))
    }

    /// Find an account by normalized name, creating it when absent. The new
    /// account is a non-header leaf under `parent_hint` when that resolves.
    pub async fn resolve_account(
        &self,
        tenant_id: Uuid,
        name: &str,
        account_type: AccountType,
        parent_hint: Option<&str>,
    ) -> ResultEngine<Account> {
        let display = normalize_required_name(name, "account")?;
        let key = normalize_key(&display)
            .ok_or_else(|| EngineError::InvalidName(format!("unusable account name: {display}")))?;
        with_tx!(self, |db_tx| {
            self.require_tenant(&db_tx, tenant_id).await?;
            if let Some(model) = Self::account_by_key(&db_tx, tenant_id, &key).await? {
                return Ok(Account::try_from(model)?);
            }
            let parent = match parent_hint {
                Some(query) => Self::account_by_query(&db_tx, tenant_id, query).await?,
                None => None,
            };
            let (account, _) = self
                .create_account_row(&db_tx, tenant_id, display, key, account_type, false, parent)
                .await?;
            Ok(account)
        })
    }

    /// All accounts of a tenant in code order.
    pub async fn list_accounts(&self, tenant_id: Uuid) -> ResultEngine<Vec<Account>> {
        let models = accounts::Entity::find()
            .filter(accounts::Column::TenantId.eq(tenant_id))
            .all(&self.database)
            .await?;
        let mut listed = models
            .into_iter()
            .map(Account::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;
        listed.sort_by(|a, b| compare_codes(&a.code, &b.code));
        Ok(listed)
    }

    /// Look an account up by code, then by normalized name.
    pub async fn find_account(&self, tenant_id: Uuid, query: &str) -> ResultEngine<Account> {
        match Self::account_by_query(&self.database, tenant_id, query).await? {
            Some(model) => Ok(Account::try_from(model)?),
            None => Err(EngineError::KeyNotFound(query.trim().to_string())),
        }
    }

    pub(super) async fn get_or_create_account(
        &self,
        db_tx: &DatabaseTransaction,
        tenant_id: Uuid,
        spec: &AccountSpec,
    ) -> ResultEngine<(Account, bool)> {
        let display = normalize_display(&spec.name)
            .ok_or_else(|| EngineError::InvalidName("account name must not be empty".to_string()))?;
        let key = normalize_key(&display)
            .ok_or_else(|| EngineError::InvalidName(format!("unusable account name: {display}")))?;

        if let Some(model) = Self::account_by_key(db_tx, tenant_id, &key).await? {
            return Ok((Account::try_from(model)?, false));
        }

        let parent = match &spec.parent {
            ParentHint::Group(code) => Self::account_by_code(db_tx, tenant_id, code).await?,
            ParentHint::Channel => {
                let kind = Self::channel_kind_for(db_tx, tenant_id, &display)
                    .await?
                    .unwrap_or_else(|| ChannelKind::classify(&display));
                let code = match kind {
                    ChannelKind::Cash => codes::CASH,
                    ChannelKind::Bank => codes::BANK,
                    ChannelKind::Ewallet => codes::EWALLET,
                };
                Self::account_by_code(db_tx, tenant_id, code).await?
            }
        };

        self.create_account_row(
            db_tx,
            tenant_id,
            display,
            key,
            spec.account_type,
            spec.contra,
            parent,
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn create_account_row(
        &self,
        db_tx: &DatabaseTransaction,
        tenant_id: Uuid,
        display: String,
        key: String,
        account_type: AccountType,
        contra: bool,
        parent: Option<accounts::Model>,
    ) -> ResultEngine<(Account, bool)> {
        let code = Self::synthesize_code(db_tx, tenant_id, parent.as_ref(), account_type).await?;
        let normal_balance = if contra {
            account_type.default_normal_balance().opposite()
        } else {
            account_type.default_normal_balance()
        };
        let account = Account::new(
            tenant_id,
            code,
            display,
            key.clone(),
            account_type,
            normal_balance,
            false,
            parent.map(|p| p.id),
        );
        let active: accounts::ActiveModel = (&account).into();
        if let Err(err) = active.insert(db_tx).await {
            // Unique index hit: re-read before giving up on the name.
            if let Some(model) = Self::account_by_key(db_tx, tenant_id, &key).await? {
                return Ok((Account::try_from(model)?, false));
            }
            return Err(EngineError::AccountCreation(format!(
                "{}: {err}",
                account.name
            )));
        }
        debug!(%tenant_id, code = %account.code, name = %account.name, "account created");
        Ok((account, true))
    }

    /// Child accounts get `{parent_code}.{n}` codes; accounts without a
    /// resolvable parent get `{class_digit}-{random}`.
    async fn synthesize_code(
        db_tx: &DatabaseTransaction,
        tenant_id: Uuid,
        parent: Option<&accounts::Model>,
        account_type: AccountType,
    ) -> ResultEngine<String> {
        if let Some(parent) = parent {
            let children = accounts::Entity::find()
                .filter(accounts::Column::TenantId.eq(tenant_id))
                .filter(accounts::Column::ParentId.eq(parent.id))
                .count(db_tx)
                .await?;
            let mut next = children + 1;
            loop {
                let candidate = format!("{}.{next}", parent.code);
                if Self::account_by_code(db_tx, tenant_id, &candidate)
                    .await?
                    .is_none()
                {
                    return Ok(candidate);
                }
                next += 1;
            }
        }
        loop {
            let suffix = Uuid::new_v4().simple().to_string();
            let candidate = format!("{}-{}", account_type.class_digit(), &suffix[..6]);
            if Self::account_by_code(db_tx, tenant_id, &candidate)
                .await?
                .is_none()
            {
                return Ok(candidate);
            }
        }
    }

    pub(super) async fn account_by_key<C: ConnectionTrait>(
        conn: &C,
        tenant_id: Uuid,
        key: &str,
    ) -> ResultEngine<Option<accounts::Model>> {
        Ok(accounts::Entity::find()
            .filter(accounts::Column::TenantId.eq(tenant_id))
            .filter(accounts::Column::NameNorm.eq(key.to_string()))
            .one(conn)
            .await?)
    }

    pub(super) async fn account_by_code<C: ConnectionTrait>(
        conn: &C,
        tenant_id: Uuid,
        code: &str,
    ) -> ResultEngine<Option<accounts::Model>> {
        Ok(accounts::Entity::find()
            .filter(accounts::Column::TenantId.eq(tenant_id))
            .filter(accounts::Column::Code.eq(code.to_string()))
            .one(conn)
            .await?)
    }

    pub(super) async fn account_by_query<C: ConnectionTrait>(
        conn: &C,
        tenant_id: Uuid,
        query: &str,
    ) -> ResultEngine<Option<accounts::Model>> {
        let trimmed = query.trim();
        if let Some(model) = Self::account_by_code(conn, tenant_id, trimmed).await? {
            return Ok(Some(model));
        }
        match normalize_key(trimmed) {
            Some(key) => Self::account_by_key(conn, tenant_id, &key).await,
            None => Ok(None),
        }
    }
}

/// Order codes like `1110.2` before `1110.10`; non-numeric segments fall back
/// to plain string order.
pub(super) fn compare_codes(left: &str, right: &str) -> Ordering {
    let mut lhs = left.split('.');
    let mut rhs = right.split('.');
    loop {
        match (lhs.next(), rhs.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(a), Some(b)) => {
                let ord = match (a.parse::<u64>(), b.parse::<u64>()) {
                    (Ok(a), Ok(b)) => a.cmp(&b),
                    _ => a.cmp(b),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AccountSpec, STANDARD_SKELETON, compare_codes};
    use std::collections::HashSet;

    #[test]
    fn skeleton_parents_precede_children() {
        let mut seen = HashSet::new();
        for row in STANDARD_SKELETON {
            if let Some(parent) = row.parent {
                assert!(
                    seen.contains(parent),
                    "{} listed before its parent {parent}",
                    row.code
                );
            }
            assert!(seen.insert(row.code), "duplicate code {}", row.code);
        }
        assert_eq!(STANDARD_SKELETON.len(), 23);
    }

    #[test]
    fn code_order_is_numeric_per_segment() {
        let mut codes = vec!["1110.10", "1110.2", "1000", "1110", "2-ab12cd"];
        codes.sort_by(|a, b| compare_codes(a, b));
        assert_eq!(codes, vec!["1000", "1110", "1110.2", "1110.10", "2-ab12cd"]);
    }

    #[test]
    fn expense_specs_get_the_beban_prefix_once() {
        assert_eq!(AccountSpec::expense_category("Rent").name, "Beban Rent");
        assert_eq!(AccountSpec::expense_category("Beban Sewa").name, "Beban Sewa");
        assert_eq!(
            AccountSpec::expense_category("beban listrik").name,
            "beban listrik"
        );
    }
}
