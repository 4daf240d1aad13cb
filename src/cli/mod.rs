use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::stdout;
use std::sync::Arc;
use tracing::Level;

use crate::application::{LedgerConfig, LedgerError, LedgerService, LockRegistry};
use crate::domain::{parse_points, AccountBalance, AccountId, Points, DEFAULT_MAX_BALANCE};
use crate::io::{read_operations, replay, Exporter};
use crate::storage::SqliteStore;

/// Pointledger - per-account point balances
#[derive(Parser)]
#[command(name = "pointledger")]
#[command(about = "Charge and use points with per-account serialized updates")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "points.db")]
    pub database: String,

    /// Highest balance a charge may produce
    #[arg(
        long,
        default_value_t = DEFAULT_MAX_BALANCE,
        value_parser = clap::value_parser!(i64).range(1..)
    )]
    pub max_balance: Points,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Add points to an account
    Charge {
        /// Account id
        account: AccountId,

        /// Points to add (e.g., "500" or "10_000")
        #[arg(allow_negative_numbers = true)]
        amount: String,
    },

    /// Spend points from an account
    Use {
        /// Account id
        account: AccountId,

        /// Points to spend
        #[arg(allow_negative_numbers = true)]
        amount: String,
    },

    /// Show the balance of an account
    Balance {
        /// Account id
        account: AccountId,
    },

    /// List the charge/use history of an account
    History {
        /// Account id
        account: AccountId,

        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: HistoryFormat,
    },

    /// Verify that an account's balance matches its history
    Check {
        /// Account id
        account: AccountId,
    },

    /// Apply a CSV of operations (kind,account,amount) concurrently
    Replay {
        /// Path to the CSV file
        file: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum HistoryFormat {
    Table,
    Json,
    Csv,
}

impl Cli {
    /// Log level for the stderr subscriber: warnings only unless verbose.
    pub fn log_level(&self) -> Level {
        if self.verbose {
            Level::DEBUG
        } else {
            Level::WARN
        }
    }

    fn config(&self) -> LedgerConfig {
        LedgerConfig {
            max_balance: self.max_balance,
        }
    }

    async fn open_service(&self) -> Result<LedgerService<SqliteStore>> {
        let store = SqliteStore::connect(&self.database).await?;
        Ok(LedgerService::new(store, LockRegistry::new()).with_config(self.config()))
    }

    pub async fn run(self) -> Result<()> {
        match &self.command {
            Commands::Init => {
                SqliteStore::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Charge { account, amount } => {
                let service = self.open_service().await?;
                let amount =
                    parse_points(amount).context("Invalid amount. Use '500' or '10_000'")?;
                let balance = service
                    .charge(*account, amount)
                    .await
                    .map_err(ledger_failure)?;
                println!("Charged {} points", amount);
                print_balance(&balance);
            }

            Commands::Use { account, amount } => {
                let service = self.open_service().await?;
                let amount =
                    parse_points(amount).context("Invalid amount. Use '500' or '10_000'")?;
                let balance = service
                    .use_points(*account, amount)
                    .await
                    .map_err(ledger_failure)?;
                println!("Used {} points", amount);
                print_balance(&balance);
            }

            Commands::Balance { account } => {
                let service = self.open_service().await?;
                let balance = service
                    .get_balance(*account)
                    .await
                    .map_err(ledger_failure)?;
                print_balance(&balance);
            }

            Commands::History { account, format } => {
                let service = self.open_service().await?;
                run_history_command(&service, *account, *format).await?;
            }

            Commands::Check { account } => {
                let service = self.open_service().await?;
                let check = service
                    .check_account(*account)
                    .await
                    .map_err(ledger_failure)?;

                println!("Account:  {}", account);
                println!("Balance:  {}", check.balance.points);
                println!("Replayed: {} ({} records)", check.replayed, check.history_len);
                if check.consistent {
                    println!("Status:   OK");
                } else {
                    println!("Status:   MISMATCH");
                    anyhow::bail!("balance of account {} does not match its history", account);
                }
            }

            Commands::Replay { file } => {
                let service = Arc::new(self.open_service().await?);
                let reader =
                    File::open(file).with_context(|| format!("Failed to open {}", file))?;
                let operations = read_operations(reader)?;
                let total = operations.len();

                let summary = replay(service, operations).await?;

                println!("Applied {} of {} operation(s)", summary.applied, total);
                for rejected in &summary.rejected {
                    println!(
                        "  line {}: account {} amount {} -> [{}] {}",
                        rejected.line,
                        rejected.account,
                        rejected.amount,
                        rejected.code,
                        rejected.error
                    );
                }
            }
        }

        Ok(())
    }
}

/// Attach the stable error code to a ledger failure for display.
fn ledger_failure(err: LedgerError) -> anyhow::Error {
    anyhow::anyhow!("[{}] {}", err.code(), err)
}

fn print_balance(balance: &AccountBalance) {
    match balance.updated_at {
        Some(updated_at) => println!(
            "Account {}: {} points (updated {})",
            balance.account_id,
            balance.points,
            updated_at.format("%Y-%m-%d %H:%M:%S")
        ),
        None => println!("Account {}: {} points", balance.account_id, balance.points),
    }
}

async fn run_history_command(
    service: &LedgerService<SqliteStore>,
    account: AccountId,
    format: HistoryFormat,
) -> Result<()> {
    match format {
        HistoryFormat::Json => {
            Exporter::new(service)
                .export_history_json(account, stdout())
                .await?;
        }
        HistoryFormat::Csv => {
            Exporter::new(service)
                .export_history_csv(account, stdout())
                .await?;
        }
        HistoryFormat::Table => {
            let records = service.get_history(account).await.map_err(ledger_failure)?;
            if records.is_empty() {
                println!("No history for account {}.", account);
                return Ok(());
            }

            println!("{:>6}  {:<19}  {:<6}  {:>10}", "SEQ", "RECORDED", "KIND", "AMOUNT");
            println!("{}", "-".repeat(47));
            for record in records {
                println!(
                    "{:>6}  {:<19}  {:<6}  {:>10}",
                    record.id,
                    record.recorded_at.format("%Y-%m-%d %H:%M:%S"),
                    record.kind,
                    record.signed_amount()
                );
            }
        }
    }
    Ok(())
}
