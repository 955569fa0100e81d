pub use accounts::{Account, AccountType, NormalBalance};
pub use commands::{
    DebtCmd, ExpenseCmd, IncomeCmd, InvoiceCmd, SaleCmd, StockMovementCmd, TransferCmd,
};
pub use debts::DebtDirection;
pub use error::EngineError;
pub use journal_entries::{BusinessType, JournalEntry, SourceKind};
pub use journal_lines::JournalLine;
pub use money::Money;
pub use ops::{
    Engine, EngineBuilder, JournalEntryView, JournalFilter, JournalPage, PostingOutcome, SourceAux,
    SourceEvent,
};
pub use payment_channels::{ChannelKind, PaymentChannel};
pub use reports::{
    AccountLine, BalanceSheetComparative, BalanceSheetMonth, BalanceSheetReport, BalanceSheetTrend,
    CashFlowBucket, CashFlowItem, CashFlowMonth, CashFlowReport, CashFlowTrend, LedgerReport,
    LedgerRow, ProfitLossComparative, ProfitLossMonth, ProfitLossReport, ProfitLossTrend,
    ReportRange, TrendAccountRow, TrialBalanceReport, TrialBalanceRow,
};
pub use stock_movements::StockDirection;
pub use tenants::Tenant;

mod accounts;
mod commands;
mod debts;
mod error;
mod expenses;
mod incomes;
mod invoices;
mod journal_entries;
mod journal_lines;
mod money;
mod ops;
mod payment_channels;
mod reports;
mod sales;
mod stock_movements;
mod tenants;
mod transfers;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
