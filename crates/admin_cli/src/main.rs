use std::error::Error;

use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use engine::{Engine, MoneyCents};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "caisse_admin")]
#[command(about = "Admin utilities for Caisse (ledgers, balance checks, alerts)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./caisse.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Ledger(Ledger),
    /// Obligations due soon or overdue, and overdue receivables
    Alerts(AlertsArgs),
}

#[derive(Args, Debug)]
struct Ledger {
    #[command(subcommand)]
    command: LedgerCommand,
}

#[derive(Subcommand, Debug)]
enum LedgerCommand {
    Create(LedgerCreateArgs),
    List,
    Balance(LedgerIdArgs),
    /// Recompute the balance from the movements and repair drift
    Recompute(LedgerIdArgs),
}

#[derive(Args, Debug)]
struct LedgerCreateArgs {
    #[arg(long)]
    name: String,
}

#[derive(Args, Debug)]
struct LedgerIdArgs {
    #[arg(long)]
    ledger: Uuid,
}

#[derive(Args, Debug)]
struct AlertsArgs {
    #[arg(long)]
    ledger: Uuid,
    /// Reference day (defaults to today, UTC)
    #[arg(long)]
    today: Option<NaiveDate>,
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::Ledger(Ledger { command }) => match command {
            LedgerCommand::Create(args) => {
                let ledger = engine.new_ledger(&args.name).await?;
                println!("created ledger: {} ({})", ledger.name, ledger.id);
            }
            LedgerCommand::List => {
                for ledger in engine.ledgers().await? {
                    println!(
                        "{}\t{}\t{}",
                        ledger.id,
                        ledger.name,
                        MoneyCents::new(ledger.balance_minor)
                    );
                }
            }
            LedgerCommand::Balance(args) => {
                let balance = engine.current_balance(args.ledger).await?;
                println!("{}", MoneyCents::new(balance));
            }
            LedgerCommand::Recompute(args) => {
                let check = engine.recompute_balance(args.ledger).await?;
                if check.drifted() {
                    println!(
                        "repaired: stored {} -> recomputed {}",
                        MoneyCents::new(check.stored_minor),
                        MoneyCents::new(check.recomputed_minor)
                    );
                } else {
                    println!("balance ok: {}", MoneyCents::new(check.stored_minor));
                }
            }
        },
        Command::Alerts(args) => {
            let today = args.today.unwrap_or_else(|| Utc::now().date_naive());
            for alert in engine.obligation_alerts(args.ledger, today).await? {
                let due = alert
                    .obligation
                    .next_due_date
                    .map(|date| date.to_string())
                    .unwrap_or_default();
                println!(
                    "obligation\t{:?}\t{}\t{}\t{}",
                    alert.status,
                    alert.obligation.name,
                    due,
                    MoneyCents::new(alert.obligation.amount_minor)
                );
            }
            for receivable in engine.overdue_receivables(args.ledger, today).await? {
                println!(
                    "receivable\t{}\t{}\t{}",
                    receivable.partner_id,
                    receivable.reason,
                    MoneyCents::new(receivable.outstanding_minor())
                );
            }
        }
    }

    Ok(())
}
