use chrono::{NaiveDate, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    Account, AccountType, ChannelKind, DebtCmd, DebtDirection, Engine, EngineError, ExpenseCmd,
    IncomeCmd, InvoiceCmd, JournalFilter, Money, ReportRange, SaleCmd, SourceKind, StockDirection,
    StockMovementCmd, TransferCmd, TrialBalanceReport,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn engine_with_file_db() -> (Engine, DatabaseConnection, String, std::path::PathBuf) {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();

    let path = root.join(format!("engine_{}.db", Uuid::new_v4()));
    let url = format!("sqlite:{}?mode=rwc", path.display());

    let db = Database::connect(&url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();

    (engine, db, url, path)
}

/// Fresh tenant with the one channel almost every capture below pays
/// through. Tests that count discovered accounts create their own tenant.
async fn tenant(engine: &Engine) -> Uuid {
    let tenant_id = engine.create_tenant("Warung Bu Sari").await.unwrap().id;
    engine.register_channel(tenant_id, "Kas", None).await.unwrap();
    tenant_id
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn range(start: NaiveDate, end: NaiveDate) -> ReportRange {
    ReportRange::new(start, end).unwrap()
}

/// Posts everything pending and unwraps every per-record outcome.
async fn post_all(engine: &Engine, tenant_id: Uuid) -> usize {
    let outcomes = engine.post_pending(tenant_id, None).await.unwrap();
    let total = outcomes.len();
    for outcome in outcomes {
        outcome.outcome.unwrap();
    }
    total
}

/// Dynamic accounts get generated codes, so trial balance rows are looked
/// up by name.
fn tb_row(report: &TrialBalanceReport, name: &str) -> (Money, Money) {
    report
        .rows
        .iter()
        .find_map(|row| (row.name == name).then_some((row.debit, row.credit)))
        .unwrap_or_else(|| panic!("trial balance row {name} missing"))
}

fn balance_line(lines: &[engine::AccountLine], name: &str) -> Money {
    lines
        .iter()
        .find_map(|line| (line.name == name).then_some(line.balance))
        .unwrap_or_else(|| panic!("report line {name} missing"))
}

async fn parent_code(engine: &Engine, tenant_id: Uuid, account: &Account) -> String {
    let parent_id = account.parent_id.expect("account has no parent");
    let accounts = engine.list_accounts(tenant_id).await.unwrap();
    accounts
        .into_iter()
        .find_map(|candidate| (candidate.id == parent_id).then_some(candidate.code))
        .expect("parent account missing")
}

#[tokio::test]
async fn taxed_sale_posts_cash_tax_and_revenue() {
    let (engine, _db) = engine_with_db().await;
    let tenant_id = tenant(&engine).await;

    let cmd = SaleCmd::new(tenant_id, date(2026, 6, 10), Money::new(110_000), "Kas")
        .tax(Money::new(10_000));
    engine.record_sale(cmd).await.unwrap();
    assert_eq!(post_all(&engine, tenant_id).await, 1);

    let report = engine
        .trial_balance(tenant_id, date(2026, 6, 30))
        .await
        .unwrap();
    assert_eq!(report.rows.len(), 3);
    assert_eq!(tb_row(&report, "Kas"), (Money::new(110_000), Money::ZERO));
    assert_eq!(
        tb_row(&report, "Tax Payable"),
        (Money::ZERO, Money::new(10_000))
    );
    assert_eq!(
        tb_row(&report, "Sales Revenue"),
        (Money::ZERO, Money::new(100_000))
    );
    assert_eq!(report.total_debit, Money::new(110_000));
    assert_eq!(report.total_credit, Money::new(110_000));

    let page = engine
        .list_journal(tenant_id, &JournalFilter::default(), 10, None)
        .await
        .unwrap();
    assert_eq!(page.entries.len(), 1);
    let view = &page.entries[0];
    assert!(view.balanced);
    assert_eq!(view.total_debit, Money::new(110_000));
    assert_eq!(view.entry.source_kind, SourceKind::Sale);
    assert!(view.entry.reference_no.starts_with("SAL-"));
    assert_eq!(view.entry.lines.len(), 3);
}

#[tokio::test]
async fn each_record_becomes_exactly_one_entry() {
    let (engine, _db) = engine_with_db().await;
    let tenant_id = tenant(&engine).await;
    engine
        .register_channel(tenant_id, "Bank BCA", None)
        .await
        .unwrap();

    engine
        .record_sale(SaleCmd::new(
            tenant_id,
            date(2026, 6, 1),
            Money::new(50_000),
            "Kas",
        ))
        .await
        .unwrap();
    engine
        .record_income(IncomeCmd::new(
            tenant_id,
            date(2026, 6, 2),
            Money::new(25_000),
            "Komisi",
            "Kas",
        ))
        .await
        .unwrap();
    engine
        .record_expense(ExpenseCmd::new(
            tenant_id,
            date(2026, 6, 3),
            Money::new(10_000),
            "Listrik",
            "Kas",
        ))
        .await
        .unwrap();
    engine
        .record_transfer(TransferCmd::new(
            tenant_id,
            date(2026, 6, 4),
            Money::new(5_000),
            "Kas",
            "Bank BCA",
        ))
        .await
        .unwrap();
    engine
        .record_stock_movement(
            StockMovementCmd::new(
                tenant_id,
                date(2026, 6, 5),
                Money::new(75_000),
                StockDirection::In,
            )
            .opening_stock(),
        )
        .await
        .unwrap();
    engine
        .record_invoice(
            InvoiceCmd::new(
                tenant_id,
                date(2026, 6, 6),
                "INV-001",
                "Ibu Rina",
                Money::new(250_000),
            )
            .amount_paid(Money::new(50_000)),
        )
        .await
        .unwrap();
    engine
        .record_debt(DebtCmd::new(
            tenant_id,
            date(2026, 6, 7),
            Money::new(200_000),
            DebtDirection::Payable,
            "Toko Maju",
        ))
        .await
        .unwrap();

    assert_eq!(post_all(&engine, tenant_id).await, 7);

    let page = engine
        .list_journal(tenant_id, &JournalFilter::default(), 50, None)
        .await
        .unwrap();
    assert_eq!(page.entries.len(), 7);
    assert!(page.entries.iter().all(|view| view.balanced));

    let kinds: Vec<SourceKind> = page
        .entries
        .iter()
        .map(|view| view.entry.source_kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            SourceKind::Debt,
            SourceKind::Invoice,
            SourceKind::StockMovement,
            SourceKind::Transfer,
            SourceKind::Expense,
            SourceKind::Income,
            SourceKind::Sale,
        ]
    );

    let report = engine
        .trial_balance(tenant_id, date(2026, 6, 30))
        .await
        .unwrap();
    assert_eq!(report.total_debit, Money::new(615_000));
    assert_eq!(report.total_credit, Money::new(615_000));

    // Nothing left to post; a second run is a no-op.
    assert_eq!(post_all(&engine, tenant_id).await, 0);
}

#[tokio::test]
async fn failed_record_stays_pending_and_does_not_block_the_batch() {
    let (engine, db) = engine_with_db().await;
    let tenant_id = tenant(&engine).await;

    // A sale whose tax exceeds its gross cannot be mapped to a balanced
    // entry. Inserted raw because the capture API refuses it upfront.
    let bad_id = Uuid::new_v4();
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO sales (id, tenant_id, sale_date, gross, tax, discount, channel, \
         description, journalized, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        vec![
            bad_id.as_bytes().to_vec().into(),
            tenant_id.as_bytes().to_vec().into(),
            date(2026, 6, 2).into(),
            100_000i64.into(),
            120_000i64.into(),
            0i64.into(),
            "Kas".into(),
            "overtaxed".into(),
            false.into(),
            Utc::now().into(),
        ],
    ))
    .await
    .unwrap();

    engine
        .record_expense(ExpenseCmd::new(
            tenant_id,
            date(2026, 6, 3),
            Money::new(40_000),
            "Listrik",
            "Kas",
        ))
        .await
        .unwrap();

    let outcomes = engine.post_pending(tenant_id, None).await.unwrap();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].source_id, bad_id);
    assert_eq!(outcomes[0].kind, SourceKind::Sale);
    assert!(matches!(
        outcomes[0].outcome,
        Err(EngineError::UnmappedRecord(_))
    ));
    assert!(outcomes[1].outcome.is_ok());

    // Only the expense made it into the books.
    let report = engine
        .trial_balance(tenant_id, date(2026, 6, 30))
        .await
        .unwrap();
    assert_eq!(report.rows.len(), 2);
    assert_eq!(tb_row(&report, "Kas"), (Money::ZERO, Money::new(40_000)));
    assert_eq!(
        tb_row(&report, "Beban Listrik"),
        (Money::new(40_000), Money::ZERO)
    );

    // The bad sale stays pending and fails again on the next run.
    let outcomes = engine.post_pending(tenant_id, None).await.unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].source_id, bad_id);
    assert!(outcomes[0].outcome.is_err());
}

#[tokio::test]
async fn partially_paid_invoice_books_the_full_receivable() {
    let (engine, _db) = engine_with_db().await;
    let tenant_id = tenant(&engine).await;

    engine
        .record_invoice(
            InvoiceCmd::new(
                tenant_id,
                date(2026, 6, 1),
                "INV-001",
                "Ibu Rina",
                Money::new(250_000),
            )
            .amount_paid(Money::new(50_000)),
        )
        .await
        .unwrap();
    let paid_id = engine
        .record_invoice(
            InvoiceCmd::new(
                tenant_id,
                date(2026, 6, 2),
                "INV-002",
                "Pak Budi",
                Money::new(100_000),
            )
            .amount_paid(Money::new(100_000)),
        )
        .await
        .unwrap();
    // The cash received on INV-001 arrives as settlement income.
    engine
        .record_income(IncomeCmd::new(
            tenant_id,
            date(2026, 6, 3),
            Money::new(50_000),
            "Invoice Payment",
            "Kas",
        ))
        .await
        .unwrap();

    // The fully paid invoice never reaches the journal.
    assert_eq!(post_all(&engine, tenant_id).await, 2);

    let page = engine
        .list_journal(tenant_id, &JournalFilter::default(), 10, None)
        .await
        .unwrap();
    assert_eq!(page.entries.len(), 2);
    assert!(page
        .entries
        .iter()
        .all(|view| view.entry.source_id != paid_id));
    assert_eq!(
        page.entries[1].entry.description,
        "Invoice INV-001 - Ibu Rina"
    );
    assert!(page.entries[1].entry.reference_no.starts_with("INV-"));

    let report = engine
        .trial_balance(tenant_id, date(2026, 6, 30))
        .await
        .unwrap();
    assert_eq!(
        tb_row(&report, "Accounts Receivable"),
        (Money::new(250_000), Money::new(50_000))
    );
    assert_eq!(tb_row(&report, "Kas"), (Money::new(50_000), Money::ZERO));
    assert_eq!(
        tb_row(&report, "Sales Revenue"),
        (Money::ZERO, Money::new(250_000))
    );
    assert_eq!(report.total_debit, Money::new(300_000));
    assert_eq!(report.total_credit, Money::new(300_000));
}

#[tokio::test]
async fn debt_and_its_settlement_move_through_the_payable() {
    let (engine, _db) = engine_with_db().await;
    let tenant_id = tenant(&engine).await;

    engine
        .record_debt(DebtCmd::new(
            tenant_id,
            date(2026, 6, 1),
            Money::new(200_000),
            DebtDirection::Payable,
            "Toko Maju",
        ))
        .await
        .unwrap();
    engine
        .record_expense(ExpenseCmd::new(
            tenant_id,
            date(2026, 6, 10),
            Money::new(80_000),
            "Pay Debt",
            "Kas",
        ))
        .await
        .unwrap();
    assert_eq!(post_all(&engine, tenant_id).await, 2);

    let report = engine
        .trial_balance(tenant_id, date(2026, 6, 30))
        .await
        .unwrap();
    assert_eq!(
        tb_row(&report, "Accounts Payable"),
        (Money::new(80_000), Money::new(200_000))
    );
    assert_eq!(
        tb_row(&report, "Beban Lain-lain"),
        (Money::new(200_000), Money::ZERO)
    );
    assert_eq!(tb_row(&report, "Kas"), (Money::ZERO, Money::new(80_000)));

    let sheet = engine
        .balance_sheet(tenant_id, date(2026, 6, 30))
        .await
        .unwrap();
    assert_eq!(
        balance_line(&sheet.liabilities, "Accounts Payable"),
        Money::new(120_000)
    );

    let page = engine
        .list_journal(tenant_id, &JournalFilter::default(), 10, None)
        .await
        .unwrap();
    assert_eq!(page.entries[1].entry.description, "New payable to Toko Maju");
    assert!(page.entries[1].entry.reference_no.starts_with("DBT-"));
}

#[tokio::test]
async fn opening_stock_is_capital_not_spend() {
    let (engine, _db) = engine_with_db().await;
    let tenant_id = tenant(&engine).await;

    engine
        .record_stock_movement(
            StockMovementCmd::new(
                tenant_id,
                date(2026, 6, 1),
                Money::new(75_000),
                StockDirection::In,
            )
            .opening_stock(),
        )
        .await
        .unwrap();
    engine
        .record_stock_movement(StockMovementCmd::new(
            tenant_id,
            date(2026, 6, 5),
            Money::new(20_000),
            StockDirection::Out,
        ))
        .await
        .unwrap();
    assert_eq!(post_all(&engine, tenant_id).await, 2);

    let report = engine
        .trial_balance(tenant_id, date(2026, 6, 30))
        .await
        .unwrap();
    assert_eq!(
        tb_row(&report, "Inventory"),
        (Money::new(75_000), Money::new(20_000))
    );
    assert_eq!(
        tb_row(&report, "Paid-in Capital"),
        (Money::ZERO, Money::new(75_000))
    );
    assert_eq!(
        tb_row(&report, "Cost of Goods Sold"),
        (Money::new(20_000), Money::ZERO)
    );

    // No cash moved, so the cash flow statement stays empty.
    let flow = engine
        .cash_flow(tenant_id, range(date(2026, 6, 1), date(2026, 6, 30)))
        .await
        .unwrap();
    assert_eq!(flow.net_change, Money::ZERO);
    assert_eq!(flow.ending_cash, Money::ZERO);
    assert!(flow.operating.is_empty());
    assert!(flow.financing.is_empty());
}

#[tokio::test]
async fn expense_lands_under_its_category_account() {
    let (engine, _db) = engine_with_db().await;
    let tenant_id = tenant(&engine).await;

    engine
        .record_expense(ExpenseCmd::new(
            tenant_id,
            date(2026, 6, 8),
            Money::new(50_000),
            "Rent",
            "Kas",
        ))
        .await
        .unwrap();
    engine
        .record_expense(ExpenseCmd::new(
            tenant_id,
            date(2026, 6, 9),
            Money::new(20_000),
            "Beban Sewa",
            "Kas",
        ))
        .await
        .unwrap();
    assert_eq!(post_all(&engine, tenant_id).await, 2);

    // Category labels gain a Beban prefix unless they already carry one.
    let rent = engine.find_account(tenant_id, "Beban Rent").await.unwrap();
    assert_eq!(rent.account_type, AccountType::Expense);
    assert!(!rent.is_header);
    assert_eq!(parent_code(&engine, tenant_id, &rent).await, "5210");

    let sewa = engine.find_account(tenant_id, "Beban Sewa").await.unwrap();
    assert_eq!(parent_code(&engine, tenant_id, &sewa).await, "5210");
    assert!(engine.find_account(tenant_id, "Beban Beban Sewa").await.is_err());

    let report = engine
        .trial_balance(tenant_id, date(2026, 6, 30))
        .await
        .unwrap();
    assert_eq!(
        tb_row(&report, "Beban Rent"),
        (Money::new(50_000), Money::ZERO)
    );
    assert_eq!(
        tb_row(&report, "Beban Sewa"),
        (Money::new(20_000), Money::ZERO)
    );
    assert_eq!(tb_row(&report, "Kas"), (Money::ZERO, Money::new(70_000)));
}

#[tokio::test]
async fn chart_sync_is_idempotent() {
    let (engine, _db) = engine_with_db().await;
    let tenant_id = engine.create_tenant("Toko Pak Amir").await.unwrap().id;

    let (skeleton, discovered) = engine.sync_chart(tenant_id).await.unwrap();
    assert!(skeleton > 0);
    assert_eq!(discovered, 0);

    let accounts = engine.list_accounts(tenant_id).await.unwrap();
    assert_eq!(accounts.len(), skeleton);

    let assets = engine.find_account(tenant_id, "1000").await.unwrap();
    assert_eq!(assets.name, "Assets");
    assert!(assets.is_header);

    // Channel groups are postable so dynamic channels can hang off them.
    let cash = engine.find_account(tenant_id, "1110").await.unwrap();
    assert_eq!(cash.name, "Cash");
    assert!(!cash.is_header);

    let (skeleton, discovered) = engine.sync_chart(tenant_id).await.unwrap();
    assert_eq!((skeleton, discovered), (0, 0));
}

#[tokio::test]
async fn discovery_adopts_channels_and_categories() {
    let (engine, _db) = engine_with_db().await;
    let tenant_id = engine.create_tenant("Toko Pak Amir").await.unwrap().id;

    engine
        .register_channel(tenant_id, "Bank BCA", None)
        .await
        .unwrap();
    engine
        .record_expense(ExpenseCmd::new(
            tenant_id,
            date(2026, 5, 2),
            Money::new(10_000),
            "Rent",
            "Bank BCA",
        ))
        .await
        .unwrap();
    engine
        .record_income(IncomeCmd::new(
            tenant_id,
            date(2026, 5, 3),
            Money::new(15_000),
            "Komisi",
            "Bank BCA",
        ))
        .await
        .unwrap();
    // Reserved categories route to built-in accounts, never their own.
    engine
        .record_expense(ExpenseCmd::new(
            tenant_id,
            date(2026, 5, 4),
            Money::new(5_000),
            "Pay Debt",
            "Bank BCA",
        ))
        .await
        .unwrap();

    let (_, discovered) = engine.sync_chart(tenant_id).await.unwrap();
    assert_eq!(discovered, 3);

    let bank = engine.find_account(tenant_id, "Bank BCA").await.unwrap();
    assert_eq!(bank.account_type, AccountType::Asset);
    assert_eq!(parent_code(&engine, tenant_id, &bank).await, "1120");

    let rent = engine.find_account(tenant_id, "Beban Rent").await.unwrap();
    assert_eq!(parent_code(&engine, tenant_id, &rent).await, "5210");

    let komisi = engine.find_account(tenant_id, "Komisi").await.unwrap();
    assert_eq!(komisi.account_type, AccountType::Revenue);
    assert_eq!(parent_code(&engine, tenant_id, &komisi).await, "4200");

    assert!(engine.find_account(tenant_id, "Pay Debt").await.is_err());

    let (skeleton, discovered) = engine.sync_chart(tenant_id).await.unwrap();
    assert_eq!((skeleton, discovered), (0, 0));
}

#[tokio::test]
async fn explicit_channel_kind_overrides_the_name_guess() {
    let (engine, _db) = engine_with_db().await;
    let tenant_id = engine.create_tenant("Toko Pak Amir").await.unwrap().id;

    let channel = engine
        .register_channel(tenant_id, "Laci Toko", Some(ChannelKind::Ewallet))
        .await
        .unwrap();
    assert_eq!(channel.kind, ChannelKind::Ewallet);

    // Same normalized name returns the existing channel.
    let again = engine
        .register_channel(tenant_id, "  laci   toko ", None)
        .await
        .unwrap();
    assert_eq!(again.id, channel.id);
    assert_eq!(engine.list_channels(tenant_id).await.unwrap().len(), 1);

    engine.sync_chart(tenant_id).await.unwrap();
    let account = engine.find_account(tenant_id, "Laci Toko").await.unwrap();
    assert_eq!(parent_code(&engine, tenant_id, &account).await, "1130");
}

#[tokio::test]
async fn balance_sheet_balances_with_current_earnings() {
    let (engine, _db) = engine_with_db().await;
    let tenant_id = tenant(&engine).await;

    engine
        .record_income(IncomeCmd::new(
            tenant_id,
            date(2026, 3, 15),
            Money::new(1_000_000),
            "Opening Capital",
            "Kas",
        ))
        .await
        .unwrap();
    engine
        .record_sale(
            SaleCmd::new(tenant_id, date(2026, 6, 10), Money::new(110_000), "Kas")
                .tax(Money::new(10_000)),
        )
        .await
        .unwrap();
    engine
        .record_expense(ExpenseCmd::new(
            tenant_id,
            date(2026, 6, 12),
            Money::new(30_000),
            "Sewa",
            "Kas",
        ))
        .await
        .unwrap();
    assert_eq!(post_all(&engine, tenant_id).await, 3);

    let sheet = engine
        .balance_sheet(tenant_id, date(2026, 6, 30))
        .await
        .unwrap();
    assert_eq!(sheet.total_assets, Money::new(1_080_000));
    assert_eq!(sheet.total_liabilities, Money::new(10_000));
    assert_eq!(sheet.total_equity, Money::new(1_070_000));
    assert_eq!(
        sheet.total_assets.amount(),
        sheet.total_liabilities.amount() + sheet.total_equity.amount()
    );

    assert_eq!(balance_line(&sheet.assets, "Kas"), Money::new(1_080_000));
    assert_eq!(
        balance_line(&sheet.equity, "Paid-in Capital"),
        Money::new(1_000_000)
    );
    let earnings = sheet
        .equity
        .iter()
        .find(|line| line.code == "3900")
        .expect("current earnings line missing");
    assert_eq!(earnings.name, "Current Earnings");
    assert_eq!(earnings.balance, Money::new(70_000));

    // Before any trading the sheet still balances.
    let sheet = engine
        .balance_sheet(tenant_id, date(2026, 3, 31))
        .await
        .unwrap();
    assert_eq!(sheet.total_assets, Money::new(1_000_000));
    assert_eq!(sheet.total_equity, Money::new(1_000_000));
    assert_eq!(sheet.total_liabilities, Money::ZERO);
}

#[tokio::test]
async fn capital_deposited_in_march_shows_from_march_on() {
    let (engine, _db) = engine_with_db().await;
    let tenant_id = tenant(&engine).await;

    engine
        .record_income(IncomeCmd::new(
            tenant_id,
            date(2026, 3, 15),
            Money::new(1_000_000),
            "Opening Capital",
            "Kas",
        ))
        .await
        .unwrap();
    assert_eq!(post_all(&engine, tenant_id).await, 1);

    let trend = engine.balance_sheet_trend(tenant_id, 2026).await.unwrap();
    assert_eq!(trend.year, 2026);
    assert_eq!(trend.months.len(), 12);

    for month in &trend.months[..2] {
        assert_eq!(month.total_assets, Money::ZERO);
    }
    for month in &trend.months[2..] {
        assert_eq!(month.total_assets, Money::new(1_000_000));
        assert_eq!(month.total_equity, Money::new(1_000_000));
        assert_eq!(
            month.total_assets.amount(),
            month.total_liabilities.amount() + month.total_equity.amount()
        );
    }
}

#[tokio::test]
async fn monthly_trend_buckets_revenue_by_month() {
    let (engine, _db) = engine_with_db().await;
    let tenant_id = tenant(&engine).await;

    engine
        .record_sale(SaleCmd::new(
            tenant_id,
            date(2026, 3, 10),
            Money::new(100_000),
            "Kas",
        ))
        .await
        .unwrap();
    engine
        .record_sale(SaleCmd::new(
            tenant_id,
            date(2026, 6, 15),
            Money::new(50_000),
            "Kas",
        ))
        .await
        .unwrap();
    engine
        .record_expense(ExpenseCmd::new(
            tenant_id,
            date(2026, 6, 20),
            Money::new(20_000),
            "Sewa",
            "Kas",
        ))
        .await
        .unwrap();
    assert_eq!(post_all(&engine, tenant_id).await, 3);

    let trend = engine.profit_loss_trend(tenant_id, 2026).await.unwrap();
    assert_eq!(trend.months.len(), 12);
    assert_eq!(trend.months[0].total_revenue, Money::ZERO);
    assert_eq!(trend.months[2].total_revenue, Money::new(100_000));
    assert_eq!(trend.months[2].net_income, Money::new(100_000));
    assert_eq!(trend.months[5].total_revenue, Money::new(50_000));
    assert_eq!(trend.months[5].total_expenses, Money::new(20_000));
    assert_eq!(trend.months[5].net_income, Money::new(30_000));

    assert_eq!(trend.revenue.len(), 1);
    let sales = &trend.revenue[0];
    assert_eq!(sales.name, "Sales Revenue");
    assert_eq!(sales.monthly[0], Money::ZERO);
    assert_eq!(sales.monthly[2], Money::new(100_000));
    assert_eq!(sales.monthly[5], Money::new(50_000));

    assert_eq!(trend.expenses.len(), 1);
    assert_eq!(trend.expenses[0].name, "Beban Sewa");
    assert_eq!(trend.expenses[0].monthly[5], Money::new(20_000));
}

#[tokio::test]
async fn quiet_prior_period_reports_no_growth() {
    let (engine, _db) = engine_with_db().await;
    let tenant_id = tenant(&engine).await;

    engine
        .record_sale(SaleCmd::new(
            tenant_id,
            date(2026, 6, 5),
            Money::new(100_000),
            "Kas",
        ))
        .await
        .unwrap();
    assert_eq!(post_all(&engine, tenant_id).await, 1);

    let report = engine
        .profit_loss(tenant_id, range(date(2026, 6, 1), date(2026, 6, 30)))
        .await
        .unwrap();
    assert_eq!(report.total_revenue, Money::new(100_000));
    assert_eq!(report.net_income, Money::new(100_000));

    let comparative = engine
        .profit_loss_comparative(
            tenant_id,
            range(date(2026, 6, 1), date(2026, 6, 30)),
            range(date(2026, 5, 1), date(2026, 5, 31)),
        )
        .await
        .unwrap();
    assert_eq!(comparative.current.total_revenue, Money::new(100_000));
    assert_eq!(comparative.previous.total_revenue, Money::ZERO);
    assert_eq!(comparative.revenue_growth, None);
    assert_eq!(comparative.expense_growth, None);
    assert_eq!(comparative.net_income_growth, None);
}

#[tokio::test]
async fn cash_flow_buckets_activity() {
    let (engine, _db) = engine_with_db().await;
    let tenant_id = tenant(&engine).await;
    engine
        .register_channel(tenant_id, "Bank BCA", None)
        .await
        .unwrap();

    engine
        .record_income(IncomeCmd::new(
            tenant_id,
            date(2026, 6, 1),
            Money::new(1_000_000),
            "Opening Capital",
            "Kas",
        ))
        .await
        .unwrap();
    engine
        .record_sale(SaleCmd::new(
            tenant_id,
            date(2026, 6, 5),
            Money::new(200_000),
            "Kas",
        ))
        .await
        .unwrap();
    engine
        .record_expense(ExpenseCmd::new(
            tenant_id,
            date(2026, 6, 7),
            Money::new(150_000),
            "Peralatan Kasir",
            "Kas",
        ))
        .await
        .unwrap();
    engine
        .record_expense(ExpenseCmd::new(
            tenant_id,
            date(2026, 6, 12),
            Money::new(30_000),
            "Listrik",
            "Kas",
        ))
        .await
        .unwrap();
    // The payable itself touches no cash; paying it off later does.
    engine
        .record_debt(DebtCmd::new(
            tenant_id,
            date(2026, 6, 15),
            Money::new(300_000),
            DebtDirection::Payable,
            "Toko Maju",
        ))
        .await
        .unwrap();
    engine
        .record_expense(ExpenseCmd::new(
            tenant_id,
            date(2026, 6, 20),
            Money::new(80_000),
            "Pay Debt",
            "Kas",
        ))
        .await
        .unwrap();
    // Money moving between channels is not a flow.
    engine
        .record_transfer(TransferCmd::new(
            tenant_id,
            date(2026, 6, 25),
            Money::new(50_000),
            "Kas",
            "Bank BCA",
        ))
        .await
        .unwrap();
    assert_eq!(post_all(&engine, tenant_id).await, 7);

    let flow = engine
        .cash_flow(tenant_id, range(date(2026, 6, 1), date(2026, 6, 30)))
        .await
        .unwrap();

    assert_eq!(flow.operating.len(), 2);
    assert_eq!(flow.total_operating, Money::new(170_000));
    assert_eq!(flow.investing.len(), 1);
    assert_eq!(flow.investing[0].description, "Peralatan Kasir");
    assert_eq!(flow.investing[0].amount, Money::new(-150_000));
    assert_eq!(flow.total_investing, Money::new(-150_000));
    assert_eq!(flow.financing.len(), 2);
    assert_eq!(flow.total_financing, Money::new(920_000));
    assert_eq!(flow.net_change, Money::new(940_000));
    assert_eq!(flow.beginning_cash, Money::ZERO);
    assert_eq!(flow.ending_cash, Money::new(940_000));
}

#[tokio::test]
async fn cash_flow_trend_carries_the_cash_position() {
    let (engine, _db) = engine_with_db().await;
    let tenant_id = tenant(&engine).await;

    engine
        .record_income(IncomeCmd::new(
            tenant_id,
            date(2026, 3, 15),
            Money::new(1_000_000),
            "Opening Capital",
            "Kas",
        ))
        .await
        .unwrap();
    engine
        .record_expense(ExpenseCmd::new(
            tenant_id,
            date(2026, 4, 10),
            Money::new(100_000),
            "Listrik",
            "Kas",
        ))
        .await
        .unwrap();
    assert_eq!(post_all(&engine, tenant_id).await, 2);

    let trend = engine.cash_flow_trend(tenant_id, 2026).await.unwrap();
    assert_eq!(trend.months.len(), 12);
    assert_eq!(trend.months[0].ending_cash, Money::ZERO);
    assert_eq!(trend.months[2].financing, Money::new(1_000_000));
    assert_eq!(trend.months[2].net_change, Money::new(1_000_000));
    assert_eq!(trend.months[2].ending_cash, Money::new(1_000_000));
    assert_eq!(trend.months[3].operating, Money::new(-100_000));
    assert_eq!(trend.months[3].ending_cash, Money::new(900_000));
    assert_eq!(trend.months[11].ending_cash, Money::new(900_000));
}

#[tokio::test]
async fn ledger_walks_the_balance_even_when_filtered() {
    let (engine, _db) = engine_with_db().await;
    let tenant_id = tenant(&engine).await;

    engine
        .record_sale(SaleCmd::new(
            tenant_id,
            date(2026, 5, 10),
            Money::new(200_000),
            "Kas",
        ))
        .await
        .unwrap();
    engine
        .record_expense(
            ExpenseCmd::new(
                tenant_id,
                date(2026, 6, 5),
                Money::new(50_000),
                "Sewa",
                "Kas",
            )
            .description("Bayar SEWA toko"),
        )
        .await
        .unwrap();
    engine
        .record_expense(ExpenseCmd::new(
            tenant_id,
            date(2026, 6, 20),
            Money::new(30_000),
            "Listrik",
            "Kas",
        ))
        .await
        .unwrap();
    assert_eq!(post_all(&engine, tenant_id).await, 3);

    let kas = engine.find_account(tenant_id, "Kas").await.unwrap();
    let june = range(date(2026, 6, 1), date(2026, 6, 30));

    let ledger = engine
        .general_ledger(tenant_id, kas.id, june, None)
        .await
        .unwrap();
    assert_eq!(ledger.account_name, "Kas");
    assert_eq!(ledger.beginning_balance, Money::new(200_000));
    assert_eq!(ledger.rows.len(), 2);
    assert_eq!(ledger.rows[0].date, date(2026, 6, 5));
    assert_eq!(ledger.rows[0].description, "Bayar SEWA toko");
    assert_eq!(ledger.rows[0].credit, Money::new(50_000));
    assert_eq!(ledger.rows[0].running_balance, Money::new(150_000));
    assert!(ledger.rows[0].reference_no.starts_with("EXP-"));
    assert_eq!(ledger.rows[1].running_balance, Money::new(120_000));
    assert_eq!(ledger.total_debit, Money::ZERO);
    assert_eq!(ledger.total_credit, Money::new(80_000));
    assert_eq!(ledger.ending_balance, Money::new(120_000));

    // A text filter hides rows without rewriting history.
    let ledger = engine
        .general_ledger(tenant_id, kas.id, june, Some("sewa"))
        .await
        .unwrap();
    assert_eq!(ledger.rows.len(), 1);
    assert_eq!(ledger.rows[0].description, "Bayar SEWA toko");
    assert_eq!(ledger.rows[0].running_balance, Money::new(150_000));
    assert_eq!(ledger.total_credit, Money::new(80_000));
    assert_eq!(ledger.ending_balance, Money::new(120_000));
}

#[tokio::test]
async fn journal_pages_walk_backwards_without_overlap() {
    let (engine, _db) = engine_with_db().await;
    let tenant_id = tenant(&engine).await;

    for (day, gross) in [(1, 10_000), (2, 20_000), (3, 30_000)] {
        engine
            .record_sale(SaleCmd::new(
                tenant_id,
                date(2026, 6, day),
                Money::new(gross),
                "Kas",
            ))
            .await
            .unwrap();
    }
    engine
        .record_expense(ExpenseCmd::new(
            tenant_id,
            date(2026, 6, 4),
            Money::new(5_000),
            "Listrik",
            "Kas",
        ))
        .await
        .unwrap();
    assert_eq!(post_all(&engine, tenant_id).await, 4);

    let filter = JournalFilter::default();
    let first = engine
        .list_journal(tenant_id, &filter, 2, None)
        .await
        .unwrap();
    assert_eq!(first.entries.len(), 2);
    assert_eq!(first.entries[0].entry.entry_date, date(2026, 6, 4));
    assert!(first.next_cursor.is_some());

    let second = engine
        .list_journal(tenant_id, &filter, 2, first.next_cursor.as_deref())
        .await
        .unwrap();
    assert_eq!(second.entries.len(), 2);
    assert_eq!(second.entries[0].entry.entry_date, date(2026, 6, 2));
    assert!(second.next_cursor.is_none());

    let mut seen: Vec<Uuid> = first
        .entries
        .iter()
        .chain(second.entries.iter())
        .map(|view| view.entry.id)
        .collect();
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), 4);

    let sales_only = JournalFilter {
        source_kinds: Some(vec![SourceKind::Sale]),
        ..JournalFilter::default()
    };
    let page = engine
        .list_journal(tenant_id, &sales_only, 50, None)
        .await
        .unwrap();
    assert_eq!(page.entries.len(), 3);
    assert!(page
        .entries
        .iter()
        .all(|view| view.entry.source_kind == SourceKind::Sale));

    let windowed = JournalFilter {
        from: Some(date(2026, 6, 2)),
        to: Some(date(2026, 6, 3)),
        source_kinds: None,
    };
    let page = engine
        .list_journal(tenant_id, &windowed, 50, None)
        .await
        .unwrap();
    assert_eq!(page.entries.len(), 2);

    let inverted = JournalFilter {
        from: Some(date(2026, 6, 5)),
        to: Some(date(2026, 6, 1)),
        source_kinds: None,
    };
    let err = engine
        .list_journal(tenant_id, &inverted, 50, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidRange(_)));

    let err = engine
        .list_journal(tenant_id, &filter, 2, Some("not a cursor"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidCursor(_)));
}

#[tokio::test]
async fn restart_preserves_the_books() {
    let (engine, db, url, path) = engine_with_file_db().await;
    let tenant_id = tenant(&engine).await;

    engine
        .record_sale(
            SaleCmd::new(tenant_id, date(2026, 6, 10), Money::new(110_000), "Kas")
                .tax(Money::new(10_000)),
        )
        .await
        .unwrap();
    assert_eq!(post_all(&engine, tenant_id).await, 1);

    drop(engine);
    drop(db);

    let db2 = Database::connect(&url).await.unwrap();
    let engine2 = Engine::builder()
        .database(db2.clone())
        .build()
        .await
        .unwrap();

    let report = engine2
        .trial_balance(tenant_id, date(2026, 6, 30))
        .await
        .unwrap();
    assert_eq!(tb_row(&report, "Kas"), (Money::new(110_000), Money::ZERO));
    assert_eq!(report.total_debit, Money::new(110_000));
    assert_eq!(report.total_credit, Money::new(110_000));

    let page = engine2
        .list_journal(tenant_id, &JournalFilter::default(), 10, None)
        .await
        .unwrap();
    assert_eq!(page.entries.len(), 1);
    assert!(page.entries[0].balanced);

    drop(db2);
    let _ = std::fs::remove_file(path);
}
