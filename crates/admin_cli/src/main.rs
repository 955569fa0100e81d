use std::error::Error;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use engine::{
    ChannelKind, DebtCmd, DebtDirection, Engine, ExpenseCmd, IncomeCmd, InvoiceCmd, JournalFilter,
    Money, ReportRange, SaleCmd, SourceKind, StockDirection, StockMovementCmd, TransferCmd,
};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use serde::Serialize;

mod settings;

#[derive(Parser, Debug)]
#[command(name = "kasbuku_admin")]
#[command(about = "Admin utilities for Kasbuku (tenants, daily records, statements)")]
struct Cli {
    /// Database connection string; overrides the settings file (also read
    /// from `KASBUKU_DATABASE_URL`).
    #[arg(long, env = "KASBUKU_DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Tenant(Tenant),
    Channel(Channel),
    Coa(Coa),
    Record(Record),
    /// Post every unposted record into the journal.
    Post(PostArgs),
    Report(Report),
}

#[derive(Args, Debug)]
struct Tenant {
    #[command(subcommand)]
    command: TenantCommand,
}

#[derive(Subcommand, Debug)]
enum TenantCommand {
    Create(TenantCreateArgs),
    List,
}

#[derive(Args, Debug)]
struct TenantCreateArgs {
    #[arg(long)]
    name: String,
}

#[derive(Args, Debug)]
struct TenantArg {
    #[arg(long)]
    tenant: String,
}

#[derive(Args, Debug)]
struct Channel {
    #[command(subcommand)]
    command: ChannelCommand,
}

#[derive(Subcommand, Debug)]
enum ChannelCommand {
    Add(ChannelAddArgs),
    List(TenantArg),
}

#[derive(Args, Debug)]
struct ChannelAddArgs {
    #[arg(long)]
    tenant: String,
    #[arg(long)]
    name: String,
    /// cash, bank, or ewallet; guessed from the name when omitted.
    #[arg(long, value_parser = parse_channel_kind)]
    kind: Option<ChannelKind>,
}

#[derive(Args, Debug)]
struct Coa {
    #[command(subcommand)]
    command: CoaCommand,
}

#[derive(Subcommand, Debug)]
enum CoaCommand {
    Sync(TenantArg),
    List(TenantArg),
}

#[derive(Args, Debug)]
struct Record {
    #[command(subcommand)]
    command: RecordCommand,
}

#[derive(Subcommand, Debug)]
enum RecordCommand {
    Sale(SaleArgs),
    Income(IncomeArgs),
    Expense(ExpenseArgs),
    Transfer(TransferArgs),
    Stock(StockArgs),
    Invoice(InvoiceArgs),
    Debt(DebtArgs),
}

#[derive(Args, Debug)]
struct SaleArgs {
    #[arg(long)]
    tenant: String,
    #[arg(long)]
    date: NaiveDate,
    /// Full amount collected, tax included.
    #[arg(long)]
    gross: Money,
    #[arg(long)]
    channel: String,
    #[arg(long)]
    tax: Option<Money>,
    #[arg(long)]
    discount: Option<Money>,
    #[arg(long)]
    description: Option<String>,
}

#[derive(Args, Debug)]
struct IncomeArgs {
    #[arg(long)]
    tenant: String,
    #[arg(long)]
    date: NaiveDate,
    #[arg(long)]
    amount: Money,
    #[arg(long)]
    category: String,
    #[arg(long)]
    channel: String,
    #[arg(long)]
    description: Option<String>,
}

#[derive(Args, Debug)]
struct ExpenseArgs {
    #[arg(long)]
    tenant: String,
    #[arg(long)]
    date: NaiveDate,
    #[arg(long)]
    amount: Money,
    #[arg(long)]
    category: String,
    #[arg(long)]
    channel: String,
    #[arg(long)]
    description: Option<String>,
}

#[derive(Args, Debug)]
struct TransferArgs {
    #[arg(long)]
    tenant: String,
    #[arg(long)]
    date: NaiveDate,
    #[arg(long)]
    amount: Money,
    /// Source channel.
    #[arg(long)]
    from: String,
    /// Destination channel.
    #[arg(long)]
    to: String,
    #[arg(long)]
    description: Option<String>,
}

#[derive(Args, Debug)]
struct StockArgs {
    #[arg(long)]
    tenant: String,
    #[arg(long)]
    date: NaiveDate,
    /// Inventory value moved, at cost.
    #[arg(long)]
    value: Money,
    /// in or out.
    #[arg(long, value_parser = parse_stock_direction)]
    direction: StockDirection,
    /// Book the movement against opening capital instead of a channel.
    #[arg(long)]
    opening_stock: bool,
    #[arg(long)]
    channel: Option<String>,
    #[arg(long)]
    description: Option<String>,
}

#[derive(Args, Debug)]
struct InvoiceArgs {
    #[arg(long)]
    tenant: String,
    #[arg(long)]
    date: NaiveDate,
    #[arg(long)]
    number: String,
    #[arg(long)]
    customer: String,
    #[arg(long)]
    total: Money,
    #[arg(long)]
    tax: Option<Money>,
    #[arg(long)]
    discount: Option<Money>,
    /// Portion already collected at issue time.
    #[arg(long)]
    paid: Option<Money>,
}

#[derive(Args, Debug)]
struct DebtArgs {
    #[arg(long)]
    tenant: String,
    #[arg(long)]
    date: NaiveDate,
    #[arg(long)]
    amount: Money,
    /// payable or receivable.
    #[arg(long, value_parser = parse_debt_direction)]
    direction: DebtDirection,
    #[arg(long)]
    counterparty: String,
    #[arg(long)]
    description: Option<String>,
}

#[derive(Args, Debug)]
struct PostArgs {
    #[arg(long)]
    tenant: String,
    #[arg(long)]
    from: Option<NaiveDate>,
    #[arg(long)]
    to: Option<NaiveDate>,
}

#[derive(Args, Debug)]
struct Report {
    #[command(subcommand)]
    command: ReportCommand,
}

#[derive(Subcommand, Debug)]
enum ReportCommand {
    Pnl(PnlArgs),
    BalanceSheet(BalanceSheetArgs),
    CashFlow(CashFlowArgs),
    Ledger(LedgerArgs),
    Journal(JournalArgs),
    TrialBalance(TrialBalanceArgs),
}

#[derive(Args, Debug)]
struct PnlArgs {
    #[arg(long)]
    tenant: String,
    #[arg(long)]
    from: Option<NaiveDate>,
    #[arg(long)]
    to: Option<NaiveDate>,
    #[arg(long)]
    compare_from: Option<NaiveDate>,
    #[arg(long)]
    compare_to: Option<NaiveDate>,
    /// Month-by-month trend for a calendar year instead of a single window.
    #[arg(long)]
    year: Option<i32>,
}

#[derive(Args, Debug)]
struct BalanceSheetArgs {
    #[arg(long)]
    tenant: String,
    #[arg(long)]
    as_of: Option<NaiveDate>,
    /// Earlier date to compare against.
    #[arg(long)]
    prior: Option<NaiveDate>,
    /// Month-end trend for a calendar year instead of a single date.
    #[arg(long)]
    year: Option<i32>,
}

#[derive(Args, Debug)]
struct CashFlowArgs {
    #[arg(long)]
    tenant: String,
    #[arg(long)]
    from: Option<NaiveDate>,
    #[arg(long)]
    to: Option<NaiveDate>,
    /// Month-by-month trend for a calendar year instead of a single window.
    #[arg(long)]
    year: Option<i32>,
}

#[derive(Args, Debug)]
struct LedgerArgs {
    #[arg(long)]
    tenant: String,
    /// Account code or name.
    #[arg(long)]
    account: String,
    #[arg(long)]
    from: NaiveDate,
    #[arg(long)]
    to: NaiveDate,
    /// Free-text match on description and reference number.
    #[arg(long)]
    filter: Option<String>,
}

#[derive(Args, Debug)]
struct JournalArgs {
    #[arg(long)]
    tenant: String,
    #[arg(long)]
    from: Option<NaiveDate>,
    #[arg(long)]
    to: Option<NaiveDate>,
    /// Restrict to these source kinds; repeatable.
    #[arg(long = "kind", value_parser = parse_source_kind)]
    kinds: Vec<SourceKind>,
    #[arg(long, default_value_t = 50)]
    limit: u64,
    /// Opaque cursor from a previous page.
    #[arg(long)]
    cursor: Option<String>,
}

#[derive(Args, Debug)]
struct TrialBalanceArgs {
    #[arg(long)]
    tenant: String,
    #[arg(long)]
    as_of: NaiveDate,
}

fn parse_channel_kind(raw: &str) -> Result<ChannelKind, String> {
    match raw {
        "cash" => Ok(ChannelKind::Cash),
        "bank" => Ok(ChannelKind::Bank),
        "ewallet" => Ok(ChannelKind::Ewallet),
        other => Err(format!("unknown channel kind: {other}")),
    }
}

fn parse_stock_direction(raw: &str) -> Result<StockDirection, String> {
    match raw {
        "in" => Ok(StockDirection::In),
        "out" => Ok(StockDirection::Out),
        other => Err(format!("unknown stock direction: {other}")),
    }
}

fn parse_debt_direction(raw: &str) -> Result<DebtDirection, String> {
    match raw {
        "payable" => Ok(DebtDirection::Payable),
        "receivable" => Ok(DebtDirection::Receivable),
        other => Err(format!("unknown debt direction: {other}")),
    }
}

fn parse_source_kind(raw: &str) -> Result<SourceKind, String> {
    match raw {
        "sale" => Ok(SourceKind::Sale),
        "income" => Ok(SourceKind::Income),
        "expense" => Ok(SourceKind::Expense),
        "transfer" => Ok(SourceKind::Transfer),
        "stock" => Ok(SourceKind::StockMovement),
        "invoice" => Ok(SourceKind::Invoice),
        "debt" => Ok(SourceKind::Debt),
        other => Err(format!("unknown source kind: {other}")),
    }
}

fn closed_range(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<ReportRange, Box<dyn Error + Send + Sync>> {
    match (from, to) {
        (Some(from), Some(to)) => Ok(ReportRange::new(from, to)?),
        _ => Err("pass both --from and --to".into()),
    }
}

fn optional_range(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<Option<ReportRange>, Box<dyn Error + Send + Sync>> {
    match (from, to) {
        (None, None) => Ok(None),
        (from, to) => Ok(Some(closed_range(from, to)?)),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error + Send + Sync>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

async fn run(engine: &Engine, command: Command) -> Result<(), Box<dyn Error + Send + Sync>> {
    match command {
        Command::Tenant(Tenant { command }) => match command {
            TenantCommand::Create(args) => {
                let tenant = engine.create_tenant(&args.name).await?;
                println!("created tenant: {} ({})", tenant.name, tenant.id);
            }
            TenantCommand::List => {
                for tenant in engine.list_tenants().await? {
                    println!("{}  {}", tenant.id, tenant.name);
                }
            }
        },
        Command::Channel(Channel { command }) => match command {
            ChannelCommand::Add(args) => {
                let tenant = engine.find_tenant(&args.tenant).await?;
                let channel = engine
                    .register_channel(tenant.id, &args.name, args.kind)
                    .await?;
                println!(
                    "registered channel: {} ({})",
                    channel.name,
                    channel.kind.as_str()
                );
            }
            ChannelCommand::List(args) => {
                let tenant = engine.find_tenant(&args.tenant).await?;
                for channel in engine.list_channels(tenant.id).await? {
                    println!("{:<8} {}", channel.kind.as_str(), channel.name);
                }
            }
        },
        Command::Coa(Coa { command }) => match command {
            CoaCommand::Sync(args) => {
                let tenant = engine.find_tenant(&args.tenant).await?;
                let (skeleton, discovered) = engine.sync_chart(tenant.id).await?;
                println!("chart synced: {skeleton} skeleton accounts, {discovered} discovered");
            }
            CoaCommand::List(args) => {
                let tenant = engine.find_tenant(&args.tenant).await?;
                for account in engine.list_accounts(tenant.id).await? {
                    let marker = if account.is_header { "*" } else { " " };
                    println!(
                        "{marker} {:<6} {:<9} {}",
                        account.code,
                        account.account_type.as_str(),
                        account.name
                    );
                }
            }
        },
        Command::Record(Record { command }) => match command {
            RecordCommand::Sale(args) => {
                let tenant = engine.find_tenant(&args.tenant).await?;
                let mut cmd = SaleCmd::new(tenant.id, args.date, args.gross, args.channel);
                if let Some(tax) = args.tax {
                    cmd = cmd.tax(tax);
                }
                if let Some(discount) = args.discount {
                    cmd = cmd.discount(discount);
                }
                if let Some(description) = args.description {
                    cmd = cmd.description(description);
                }
                let id = engine.record_sale(cmd).await?;
                println!("recorded sale: {id}");
            }
            RecordCommand::Income(args) => {
                let tenant = engine.find_tenant(&args.tenant).await?;
                let mut cmd =
                    IncomeCmd::new(tenant.id, args.date, args.amount, args.category, args.channel);
                if let Some(description) = args.description {
                    cmd = cmd.description(description);
                }
                let id = engine.record_income(cmd).await?;
                println!("recorded income: {id}");
            }
            RecordCommand::Expense(args) => {
                let tenant = engine.find_tenant(&args.tenant).await?;
                let mut cmd =
                    ExpenseCmd::new(tenant.id, args.date, args.amount, args.category, args.channel);
                if let Some(description) = args.description {
                    cmd = cmd.description(description);
                }
                let id = engine.record_expense(cmd).await?;
                println!("recorded expense: {id}");
            }
            RecordCommand::Transfer(args) => {
                let tenant = engine.find_tenant(&args.tenant).await?;
                let mut cmd =
                    TransferCmd::new(tenant.id, args.date, args.amount, args.from, args.to);
                if let Some(description) = args.description {
                    cmd = cmd.description(description);
                }
                let id = engine.record_transfer(cmd).await?;
                println!("recorded transfer: {id}");
            }
            RecordCommand::Stock(args) => {
                let tenant = engine.find_tenant(&args.tenant).await?;
                let mut cmd =
                    StockMovementCmd::new(tenant.id, args.date, args.value, args.direction);
                if args.opening_stock {
                    cmd = cmd.opening_stock();
                }
                if let Some(channel) = args.channel {
                    cmd = cmd.channel(channel);
                }
                if let Some(description) = args.description {
                    cmd = cmd.description(description);
                }
                let id = engine.record_stock_movement(cmd).await?;
                println!("recorded stock movement: {id}");
            }
            RecordCommand::Invoice(args) => {
                let tenant = engine.find_tenant(&args.tenant).await?;
                let mut cmd =
                    InvoiceCmd::new(tenant.id, args.date, args.number, args.customer, args.total);
                if let Some(tax) = args.tax {
                    cmd = cmd.tax(tax);
                }
                if let Some(discount) = args.discount {
                    cmd = cmd.discount(discount);
                }
                if let Some(paid) = args.paid {
                    cmd = cmd.amount_paid(paid);
                }
                let id = engine.record_invoice(cmd).await?;
                println!("recorded invoice: {id}");
            }
            RecordCommand::Debt(args) => {
                let tenant = engine.find_tenant(&args.tenant).await?;
                let mut cmd = DebtCmd::new(
                    tenant.id,
                    args.date,
                    args.amount,
                    args.direction,
                    args.counterparty,
                );
                if let Some(description) = args.description {
                    cmd = cmd.description(description);
                }
                let id = engine.record_debt(cmd).await?;
                println!("recorded debt: {id}");
            }
        },
        Command::Post(args) => {
            let tenant = engine.find_tenant(&args.tenant).await?;
            let range = optional_range(args.from, args.to)?;
            let outcomes = engine.post_pending(tenant.id, range).await?;
            let total = outcomes.len();
            let mut failed = 0usize;
            for outcome in &outcomes {
                match &outcome.outcome {
                    Ok(entry_id) => {
                        println!(
                            "posted {} {}: entry {entry_id}",
                            outcome.kind.as_str(),
                            outcome.source_id
                        );
                    }
                    Err(err) => {
                        failed += 1;
                        eprintln!("failed {} {}: {err}", outcome.kind.as_str(), outcome.source_id);
                    }
                }
            }
            println!("posted {}/{total} records", total - failed);
            if failed > 0 {
                std::process::exit(1);
            }
        }
        Command::Report(Report { command }) => match command {
            ReportCommand::Pnl(args) => {
                let tenant = engine.find_tenant(&args.tenant).await?;
                if let Some(year) = args.year {
                    let report = engine.profit_loss_trend(tenant.id, year).await?;
                    print_json(&report)?;
                } else {
                    let range = closed_range(args.from, args.to)?;
                    match (args.compare_from, args.compare_to) {
                        (None, None) => {
                            let report = engine.profit_loss(tenant.id, range).await?;
                            print_json(&report)?;
                        }
                        (Some(from), Some(to)) => {
                            let comparison = ReportRange::new(from, to)?;
                            let report = engine
                                .profit_loss_comparative(tenant.id, range, comparison)
                                .await?;
                            print_json(&report)?;
                        }
                        _ => return Err("pass both --compare-from and --compare-to".into()),
                    }
                }
            }
            ReportCommand::BalanceSheet(args) => {
                let tenant = engine.find_tenant(&args.tenant).await?;
                if let Some(year) = args.year {
                    let report = engine.balance_sheet_trend(tenant.id, year).await?;
                    print_json(&report)?;
                } else {
                    let Some(as_of) = args.as_of else {
                        return Err("pass --as-of (or --year for the monthly trend)".into());
                    };
                    if let Some(prior) = args.prior {
                        let report = engine
                            .balance_sheet_comparative(tenant.id, as_of, prior)
                            .await?;
                        print_json(&report)?;
                    } else {
                        let report = engine.balance_sheet(tenant.id, as_of).await?;
                        print_json(&report)?;
                    }
                }
            }
            ReportCommand::CashFlow(args) => {
                let tenant = engine.find_tenant(&args.tenant).await?;
                if let Some(year) = args.year {
                    let report = engine.cash_flow_trend(tenant.id, year).await?;
                    print_json(&report)?;
                } else {
                    let range = closed_range(args.from, args.to)?;
                    let report = engine.cash_flow(tenant.id, range).await?;
                    print_json(&report)?;
                }
            }
            ReportCommand::Ledger(args) => {
                let tenant = engine.find_tenant(&args.tenant).await?;
                let account = engine.find_account(tenant.id, &args.account).await?;
                let range = ReportRange::new(args.from, args.to)?;
                let report = engine
                    .general_ledger(tenant.id, account.id, range, args.filter.as_deref())
                    .await?;
                print_json(&report)?;
            }
            ReportCommand::Journal(args) => {
                let tenant = engine.find_tenant(&args.tenant).await?;
                let filter = JournalFilter {
                    from: args.from,
                    to: args.to,
                    source_kinds: if args.kinds.is_empty() {
                        None
                    } else {
                        Some(args.kinds)
                    },
                };
                let page = engine
                    .list_journal(tenant.id, &filter, args.limit, args.cursor.as_deref())
                    .await?;
                print_json(&page)?;
            }
            ReportCommand::TrialBalance(args) => {
                let tenant = engine.find_tenant(&args.tenant).await?;
                let report = engine.trial_balance(tenant.id, args.as_of).await?;
                print_json(&report)?;
            }
        },
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "kasbuku_admin={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let database_url = cli.database_url.unwrap_or_else(|| settings.sqlite.url());
    let db = connect_db(&database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    if let Err(err) = run(&engine, cli.command).await {
        eprintln!("{err}");
        std::process::exit(1);
    }

    Ok(())
}
