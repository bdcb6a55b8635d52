//! Lendbook CLI - loan book and platform billing from the command line
//!
//! Usage:
//! ```bash
//! lendbook init --master-user root --master-password secret
//! lendbook user create ana --account-password pw --org "Ana Credito" -u root -p secret
//! lendbook client add "Maria Souza" 123.456.789-00 -u ana -p pw
//! lendbook loan create 1 --principal 1000 --rate 10 --type installment --installments 4 -u ana -p pw
//! lendbook payment add 1 275 --method pix -u ana -p pw
//! lendbook billing mark-all --month 2026-03 -u root -p secret
//! lendbook report profit --format csv -u ana -p pw
//! ```

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use lendbook_core::{LoanType, MonthKey};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod db;

use config::AppConfig;

/// Lendbook - multi-tenant loan ledger with platform billing
#[derive(Parser)]
#[command(name = "lendbook")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (defaults to ./lendbook.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Database URL, overrides the config file
    #[arg(long, global = true)]
    pub db: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize database with schema and master organization
    Init {
        /// Seed a master account with this username
        #[arg(long)]
        master_user: Option<String>,
        /// Password for the seeded master account
        #[arg(long)]
        master_password: Option<String>,
    },

    /// Show database status
    Status,

    /// Account administration (master only)
    User {
        #[command(subcommand)]
        action: UserAction,
        #[command(flatten)]
        login: Login,
    },

    /// Clients of your organization
    Client {
        #[command(subcommand)]
        action: ClientAction,
        #[command(flatten)]
        login: Login,
    },

    /// Loans of your organization
    Loan {
        #[command(subcommand)]
        action: LoanAction,
        #[command(flatten)]
        login: Login,
    },

    /// Payments against loans
    Payment {
        #[command(subcommand)]
        action: PaymentAction,
        #[command(flatten)]
        login: Login,
    },

    /// Platform billing (master only)
    Billing {
        #[command(subcommand)]
        action: BillingAction,
        #[command(flatten)]
        login: Login,
    },

    /// Generate reports
    Report {
        #[command(subcommand)]
        kind: ReportKind,
        /// Report format
        #[arg(long, default_value = "markdown", global = true)]
        format: FormatArg,
        /// Output file path
        #[arg(long, short, global = true)]
        output: Option<PathBuf>,
        #[command(flatten)]
        login: Login,
    },
}

/// Credentials of the caller
#[derive(Args, Clone)]
pub struct Login {
    /// Username to act as
    #[arg(long, short = 'u', global = true)]
    pub user: Option<String>,
    /// Password of that user
    #[arg(long, short = 'p', global = true)]
    pub password: Option<String>,
}

#[derive(Subcommand)]
pub enum UserAction {
    /// Create a user, creating the organization if needed
    Create {
        username: String,
        /// Password for the new account
        #[arg(long)]
        account_password: String,
        /// Organization name
        #[arg(long)]
        org: String,
        /// Monthly fee (defaults to the configured standard fee)
        #[arg(long)]
        fee: Option<Decimal>,
        /// First day billing applies (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,
    },
    /// Change a user's monthly fee
    Fee { user_id: i64, fee: Decimal },
    /// Delete a user and their organization's data
    Delete { user_id: i64 },
    /// Move users on the legacy default fee to the standard fee
    MigrateFees {
        /// Target fee (defaults to the configured standard fee)
        #[arg(long)]
        fee: Option<Decimal>,
    },
}

#[derive(Subcommand)]
pub enum ClientAction {
    /// Register a client
    Add {
        name: String,
        /// Tax document, unique within your organization
        document: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },
    /// List clients with loan count and active debt
    List,
}

#[derive(Subcommand)]
pub enum LoanAction {
    /// Create a loan
    Create {
        client_id: i64,
        #[arg(long)]
        principal: Decimal,
        /// Interest rate in percent
        #[arg(long, default_value = "0")]
        rate: Decimal,
        #[arg(long = "type", default_value = "single")]
        loan_type: LoanTypeArg,
        /// Number of installments (installment loans)
        #[arg(long)]
        installments: Option<u32>,
        /// Loan date (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Due date (single loans)
        #[arg(long)]
        due: Option<NaiveDate>,
    },
    /// List loans, newest first
    List,
    /// Show one loan with payments and schedule
    Show { loan_id: i64 },
}

#[derive(Subcommand)]
pub enum PaymentAction {
    /// Record a payment
    Add {
        loan_id: i64,
        amount: Decimal,
        /// Payment method (cash, pix, transfer, ...)
        #[arg(long, default_value = "cash")]
        method: String,
        /// Payment date (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        notes: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum BillingAction {
    /// Mark one user's month as paid
    MarkPaid {
        user_id: i64,
        /// Month (YYYY-MM), defaults to the current month
        #[arg(long)]
        month: Option<MonthKey>,
    },
    /// Mark every chargeable user as paid for a month
    MarkAll {
        #[arg(long)]
        month: Option<MonthKey>,
    },
    /// Organizations, users and payment status for a month
    Overview {
        #[arg(long)]
        month: Option<MonthKey>,
    },
}

#[derive(Subcommand)]
pub enum ReportKind {
    /// Monthly lent vs received
    Profit,
    /// Totals, overdue and upcoming loans
    Dashboard,
    /// Per-month activity for the trailing window
    Activity {
        /// Number of months (defaults to config)
        #[arg(long)]
        months: Option<u32>,
    },
    /// Every loan with repayment position
    Loans,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LoanTypeArg {
    Single,
    Installment,
}

impl LoanTypeArg {
    pub fn to_core_type(self) -> LoanType {
        match self {
            LoanTypeArg::Single => LoanType::Single,
            LoanTypeArg::Installment => LoanType::Installment,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Csv,
    Json,
    Markdown,
}

impl FormatArg {
    pub fn to_report_format(self) -> lendbook_reports::ReportFormat {
        match self {
            FormatArg::Csv => lendbook_reports::ReportFormat::Csv,
            FormatArg::Json => lendbook_reports::ReportFormat::Json,
            FormatArg::Markdown => lendbook_reports::ReportFormat::Markdown,
        }
    }
}

fn init_tracing(level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(url) = cli.db {
        config.database.url = url;
    }
    init_tracing(&config.logging.level);
    tracing::debug!(db = %config.database.url, "configuration loaded");

    match cli.command {
        Commands::Init {
            master_user,
            master_password,
        } => {
            db::init_database(
                &config.database,
                master_user.as_deref(),
                master_password.as_deref(),
            )
            .await?;
            println!("✅ Database initialized at {}", config.database.url);
        }

        Commands::Status => {
            db::show_status(&config.database).await?;
        }

        Commands::User { action, login } => {
            let app = commands::App::open(&config).await?;
            commands::user::handle(&app, &login, action).await?;
        }

        Commands::Client { action, login } => {
            let app = commands::App::open(&config).await?;
            commands::client::handle(&app, &login, action).await?;
        }

        Commands::Loan { action, login } => {
            let app = commands::App::open(&config).await?;
            commands::loan::handle(&app, &login, action).await?;
        }

        Commands::Payment { action, login } => {
            let app = commands::App::open(&config).await?;
            commands::loan::handle_payment(&app, &login, action).await?;
        }

        Commands::Billing { action, login } => {
            let app = commands::App::open(&config).await?;
            commands::billing::handle(&app, &login, action).await?;
        }

        Commands::Report {
            kind,
            format,
            output,
            login,
        } => {
            let app = commands::App::open(&config).await?;
            commands::report::handle(&app, &login, kind, format, output).await?;
        }
    }

    Ok(())
}
