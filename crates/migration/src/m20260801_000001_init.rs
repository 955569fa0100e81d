//! Initial schema migration - creates all tables from scratch.
//!
//! It creates the complete schema for Kasbuku:
//!
//! - `tenants`: bookkeeping tenants (one business each)
//! - `accounts`: chart-of-accounts tree per tenant
//! - `payment_channels`: cash/bank/e-wallet money locations
//! - `journal_entries`: posted double-entry headers
//! - `journal_lines`: debit/credit lines per entry
//! - `sales`, `incomes`, `expenses`, `transfers`, `stock_movements`,
//!   `invoices`, `debts`: business source records awaiting posting,
//!   each with a `journalized` idempotency flag

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Tenants {
    Table,
    Id,
    Name,
    CreatedAt,
}

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    TenantId,
    Code,
    Name,
    NameNorm,
    AccountType,
    NormalBalance,
    IsHeader,
    ParentId,
    CreatedAt,
}

#[derive(Iden)]
enum PaymentChannels {
    Table,
    Id,
    TenantId,
    Name,
    NameNorm,
    Kind,
    CreatedAt,
}

#[derive(Iden)]
enum JournalEntries {
    Table,
    Id,
    TenantId,
    EntryDate,
    Description,
    ReferenceNo,
    SourceKind,
    SourceId,
    BusinessType,
    Category,
    Posted,
    CreatedAt,
}

#[derive(Iden)]
enum JournalLines {
    Table,
    Id,
    EntryId,
    AccountId,
    Debit,
    Credit,
}

#[derive(Iden)]
enum Sales {
    Table,
    Id,
    TenantId,
    SaleDate,
    Gross,
    Tax,
    Discount,
    Channel,
    Description,
    Journalized,
    CreatedAt,
}

#[derive(Iden)]
enum Incomes {
    Table,
    Id,
    TenantId,
    IncomeDate,
    Amount,
    Category,
    Channel,
    Description,
    Journalized,
    CreatedAt,
}

#[derive(Iden)]
enum Expenses {
    Table,
    Id,
    TenantId,
    ExpenseDate,
    Amount,
    Category,
    Channel,
    Description,
    Journalized,
    CreatedAt,
}

#[derive(Iden)]
enum Transfers {
    Table,
    Id,
    TenantId,
    TransferDate,
    Amount,
    FromChannel,
    ToChannel,
    Description,
    Journalized,
    CreatedAt,
}

#[derive(Iden)]
enum StockMovements {
    Table,
    Id,
    TenantId,
    MovementDate,
    Value,
    Direction,
    OpeningStock,
    Channel,
    Description,
    Journalized,
    CreatedAt,
}

#[derive(Iden)]
enum Invoices {
    Table,
    Id,
    TenantId,
    IssueDate,
    Number,
    Customer,
    Total,
    Tax,
    Discount,
    AmountPaid,
    Journalized,
    CreatedAt,
}

#[derive(Iden)]
enum Debts {
    Table,
    Id,
    TenantId,
    DebtDate,
    Amount,
    Direction,
    Counterparty,
    Description,
    Journalized,
    CreatedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Tenants
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Tenants::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tenants::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Tenants::Name).string().not_null())
                    .col(ColumnDef::new(Tenants::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Accounts (chart-of-accounts forest)
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Accounts::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Accounts::TenantId).blob().not_null())
                    .col(ColumnDef::new(Accounts::Code).string().not_null())
                    .col(ColumnDef::new(Accounts::Name).string().not_null())
                    .col(ColumnDef::new(Accounts::NameNorm).string().not_null())
                    .col(ColumnDef::new(Accounts::AccountType).string().not_null())
                    .col(ColumnDef::new(Accounts::NormalBalance).string().not_null())
                    .col(
                        ColumnDef::new(Accounts::IsHeader)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Accounts::ParentId).blob())
                    .col(ColumnDef::new(Accounts::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-accounts-tenant_id")
                            .from(Accounts::Table, Accounts::TenantId)
                            .to(Tenants::Table, Tenants::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-accounts-parent_id")
                            .from(Accounts::Table, Accounts::ParentId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Serializes concurrent account creation per (tenant, normalized name).
        manager
            .create_index(
                Index::create()
                    .name("idx-accounts-tenant_id-name_norm-unique")
                    .table(Accounts::Table)
                    .col(Accounts::TenantId)
                    .col(Accounts::NameNorm)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-accounts-tenant_id-code-unique")
                    .table(Accounts::Table)
                    .col(Accounts::TenantId)
                    .col(Accounts::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-accounts-parent_id")
                    .table(Accounts::Table)
                    .col(Accounts::ParentId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Payment channels
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(PaymentChannels::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PaymentChannels::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PaymentChannels::TenantId).blob().not_null())
                    .col(ColumnDef::new(PaymentChannels::Name).string().not_null())
                    .col(
                        ColumnDef::new(PaymentChannels::NameNorm)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PaymentChannels::Kind).string().not_null())
                    .col(
                        ColumnDef::new(PaymentChannels::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-payment_channels-tenant_id")
                            .from(PaymentChannels::Table, PaymentChannels::TenantId)
                            .to(Tenants::Table, Tenants::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-payment_channels-tenant_id-name_norm-unique")
                    .table(PaymentChannels::Table)
                    .col(PaymentChannels::TenantId)
                    .col(PaymentChannels::NameNorm)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Journal entries
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(JournalEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(JournalEntries::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(JournalEntries::TenantId).blob().not_null())
                    .col(ColumnDef::new(JournalEntries::EntryDate).date().not_null())
                    .col(
                        ColumnDef::new(JournalEntries::Description)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(JournalEntries::ReferenceNo)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(JournalEntries::SourceKind)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(JournalEntries::SourceId).blob().not_null())
                    .col(
                        ColumnDef::new(JournalEntries::BusinessType)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(JournalEntries::Category).string())
                    .col(
                        ColumnDef::new(JournalEntries::Posted)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(JournalEntries::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-journal_entries-tenant_id")
                            .from(JournalEntries::Table, JournalEntries::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-journal_entries-tenant_id-entry_date")
                    .table(JournalEntries::Table)
                    .col(JournalEntries::TenantId)
                    .col(JournalEntries::EntryDate)
                    .to_owned(),
            )
            .await?;

        // Backstop for the journalized-flag idempotency contract.
        manager
            .create_index(
                Index::create()
                    .name("idx-journal_entries-source-unique")
                    .table(JournalEntries::Table)
                    .col(JournalEntries::TenantId)
                    .col(JournalEntries::SourceKind)
                    .col(JournalEntries::SourceId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Journal lines
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(JournalLines::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(JournalLines::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(JournalLines::EntryId).blob().not_null())
                    .col(ColumnDef::new(JournalLines::AccountId).blob().not_null())
                    .col(ColumnDef::new(JournalLines::Debit).big_integer().not_null())
                    .col(
                        ColumnDef::new(JournalLines::Credit)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-journal_lines-entry_id")
                            .from(JournalLines::Table, JournalLines::EntryId)
                            .to(JournalEntries::Table, JournalEntries::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-journal_lines-account_id")
                            .from(JournalLines::Table, JournalLines::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-journal_lines-entry_id")
                    .table(JournalLines::Table)
                    .col(JournalLines::EntryId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-journal_lines-account_id")
                    .table(JournalLines::Table)
                    .col(JournalLines::AccountId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Sales
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Sales::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Sales::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Sales::TenantId).blob().not_null())
                    .col(ColumnDef::new(Sales::SaleDate).date().not_null())
                    .col(ColumnDef::new(Sales::Gross).big_integer().not_null())
                    .col(ColumnDef::new(Sales::Tax).big_integer().not_null())
                    .col(ColumnDef::new(Sales::Discount).big_integer().not_null())
                    .col(ColumnDef::new(Sales::Channel).string().not_null())
                    .col(ColumnDef::new(Sales::Description).string())
                    .col(
                        ColumnDef::new(Sales::Journalized)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Sales::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-sales-tenant_id")
                            .from(Sales::Table, Sales::TenantId)
                            .to(Tenants::Table, Tenants::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-sales-tenant_id-journalized")
                    .table(Sales::Table)
                    .col(Sales::TenantId)
                    .col(Sales::Journalized)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Incomes
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Incomes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Incomes::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Incomes::TenantId).blob().not_null())
                    .col(ColumnDef::new(Incomes::IncomeDate).date().not_null())
                    .col(ColumnDef::new(Incomes::Amount).big_integer().not_null())
                    .col(ColumnDef::new(Incomes::Category).string().not_null())
                    .col(ColumnDef::new(Incomes::Channel).string().not_null())
                    .col(ColumnDef::new(Incomes::Description).string())
                    .col(
                        ColumnDef::new(Incomes::Journalized)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Incomes::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-incomes-tenant_id")
                            .from(Incomes::Table, Incomes::TenantId)
                            .to(Tenants::Table, Tenants::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-incomes-tenant_id-journalized")
                    .table(Incomes::Table)
                    .col(Incomes::TenantId)
                    .col(Incomes::Journalized)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 8. Expenses
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Expenses::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Expenses::TenantId).blob().not_null())
                    .col(ColumnDef::new(Expenses::ExpenseDate).date().not_null())
                    .col(ColumnDef::new(Expenses::Amount).big_integer().not_null())
                    .col(ColumnDef::new(Expenses::Category).string().not_null())
                    .col(ColumnDef::new(Expenses::Channel).string().not_null())
                    .col(ColumnDef::new(Expenses::Description).string())
                    .col(
                        ColumnDef::new(Expenses::Journalized)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Expenses::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expenses-tenant_id")
                            .from(Expenses::Table, Expenses::TenantId)
                            .to(Tenants::Table, Tenants::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expenses-tenant_id-journalized")
                    .table(Expenses::Table)
                    .col(Expenses::TenantId)
                    .col(Expenses::Journalized)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 9. Transfers
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Transfers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transfers::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transfers::TenantId).blob().not_null())
                    .col(ColumnDef::new(Transfers::TransferDate).date().not_null())
                    .col(ColumnDef::new(Transfers::Amount).big_integer().not_null())
                    .col(ColumnDef::new(Transfers::FromChannel).string().not_null())
                    .col(ColumnDef::new(Transfers::ToChannel).string().not_null())
                    .col(ColumnDef::new(Transfers::Description).string())
                    .col(
                        ColumnDef::new(Transfers::Journalized)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Transfers::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transfers-tenant_id")
                            .from(Transfers::Table, Transfers::TenantId)
                            .to(Tenants::Table, Tenants::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transfers-tenant_id-journalized")
                    .table(Transfers::Table)
                    .col(Transfers::TenantId)
                    .col(Transfers::Journalized)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 10. Stock movements
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(StockMovements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StockMovements::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(StockMovements::TenantId).blob().not_null())
                    .col(
                        ColumnDef::new(StockMovements::MovementDate)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockMovements::Value)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(StockMovements::Direction).string().not_null())
                    .col(
                        ColumnDef::new(StockMovements::OpeningStock)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(StockMovements::Channel).string())
                    .col(ColumnDef::new(StockMovements::Description).string())
                    .col(
                        ColumnDef::new(StockMovements::Journalized)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(StockMovements::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-stock_movements-tenant_id")
                            .from(StockMovements::Table, StockMovements::TenantId)
                            .to(Tenants::Table, Tenants::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-stock_movements-tenant_id-journalized")
                    .table(StockMovements::Table)
                    .col(StockMovements::TenantId)
                    .col(StockMovements::Journalized)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 11. Invoices
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Invoices::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Invoices::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Invoices::TenantId).blob().not_null())
                    .col(ColumnDef::new(Invoices::IssueDate).date().not_null())
                    .col(ColumnDef::new(Invoices::Number).string().not_null())
                    .col(ColumnDef::new(Invoices::Customer).string().not_null())
                    .col(ColumnDef::new(Invoices::Total).big_integer().not_null())
                    .col(ColumnDef::new(Invoices::Tax).big_integer().not_null())
                    .col(ColumnDef::new(Invoices::Discount).big_integer().not_null())
                    .col(
                        ColumnDef::new(Invoices::AmountPaid)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Invoices::Journalized)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Invoices::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-invoices-tenant_id")
                            .from(Invoices::Table, Invoices::TenantId)
                            .to(Tenants::Table, Tenants::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-invoices-tenant_id-journalized")
                    .table(Invoices::Table)
                    .col(Invoices::TenantId)
                    .col(Invoices::Journalized)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 12. Debts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Debts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Debts::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Debts::TenantId).blob().not_null())
                    .col(ColumnDef::new(Debts::DebtDate).date().not_null())
                    .col(ColumnDef::new(Debts::Amount).big_integer().not_null())
                    .col(ColumnDef::new(Debts::Direction).string().not_null())
                    .col(ColumnDef::new(Debts::Counterparty).string().not_null())
                    .col(ColumnDef::new(Debts::Description).string())
                    .col(
                        ColumnDef::new(Debts::Journalized)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Debts::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-debts-tenant_id")
                            .from(Debts::Table, Debts::TenantId)
                            .to(Tenants::Table, Tenants::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-debts-tenant_id-journalized")
                    .table(Debts::Table)
                    .col(Debts::TenantId)
                    .col(Debts::Journalized)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(Debts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Invoices::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(StockMovements::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transfers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Incomes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Sales::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(JournalLines::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(JournalEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PaymentChannels::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tenants::Table).to_owned())
            .await?;
        Ok(())
    }
}
