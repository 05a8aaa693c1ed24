use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use monthwise::cli::{
    handle_category_command, handle_export_command, handle_history_command,
    handle_month_command, handle_summary_command, handle_transaction_command,
};
use monthwise::config::paths::DATA_DIR_ENV;
use monthwise::config::{MonthwisePaths, Settings};
use monthwise::services::MonthService;
use monthwise::storage::Storage;
use monthwise::BudgetError;

#[derive(Parser)]
#[command(
    name = "monthwise",
    version,
    about = "Monthly budgeting from the terminal",
    long_about = "Monthwise plans each month as a set of categories with target \
                  amounts, tracks what was actually earned and spent, and carries \
                  categories forward into new months."
)]
struct Cli {
    /// Directory holding settings, data and the audit log
    #[arg(long, global = true, env = DATA_DIR_ENV)]
    data_dir: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new budget
    Init,

    /// Show current configuration and paths
    Config,

    /// Month navigation and management
    #[command(subcommand)]
    Month(monthwise::cli::MonthCommands),

    /// Category and project management
    #[command(subcommand)]
    Category(monthwise::cli::CategoryCommands),

    /// Transaction management
    #[command(subcommand, alias = "transaction")]
    Txn(monthwise::cli::TransactionCommands),

    /// Planned versus actual figures for a month
    Summary {
        /// Month (YYYY-MM); defaults to the current month
        month: Option<String>,
    },

    /// Export a month
    #[command(subcommand)]
    Export(monthwise::cli::ExportCommands),

    /// Show recent changes from the audit log
    History {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "monthwise=debug" } else { "monthwise=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %format!("{:#}", err), "command failed");
            let message = match err.downcast_ref::<BudgetError>() {
                Some(budget_err) => budget_err.user_message(),
                None => format!("{:#}", err),
            };
            eprintln!("Error: {}", message);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let paths = match cli.data_dir {
        Some(dir) => MonthwisePaths::with_base_dir(dir),
        None => MonthwisePaths::new()?,
    };
    let settings = Settings::load_or_create(&paths)?;

    let storage = Storage::new(paths.clone())?;
    storage.load_all().context("Failed to load budget data")?;

    match cli.command {
        Some(Commands::Init) => {
            println!("Initializing Monthwise at: {}", paths.base_dir().display());
            settings.save(&paths)?;
            let month = MonthService::new(&storage, &settings).current()?;
            println!("Initialization complete!");
            println!();
            println!("Current month: {}", month.name);
            println!("Run 'monthwise category add <name> --target <amount>' to plan it.");
        }
        Some(Commands::Config) => {
            println!("Monthwise Configuration");
            println!("=======================");
            println!("Base directory: {}", paths.base_dir().display());
            println!("Data directory: {}", paths.data_dir().display());
            println!("Audit log:      {}", paths.audit_log().display());
            println!();
            println!("Settings:");
            println!("  Currency symbol:         {}", settings.currency_symbol);
            println!(
                "  Max transaction amount:  {}",
                settings
                    .max_transaction_amount
                    .format_with_symbol(&settings.currency_symbol)
            );
            println!("  Spending window (days):  {}", settings.spending_window_days);
            println!("  Spending percentage cap: {}", settings.spending_percentage_cap);
            println!("  Near-limit threshold:    {}", settings.near_limit_threshold);
            println!("  Auto rollover:           {}", settings.auto_rollover);
        }
        Some(Commands::Month(cmd)) => handle_month_command(&storage, &settings, cmd)?,
        Some(Commands::Category(cmd)) => handle_category_command(&storage, &settings, cmd)?,
        Some(Commands::Txn(cmd)) => handle_transaction_command(&storage, &settings, cmd)?,
        Some(Commands::Summary { month }) => {
            handle_summary_command(&storage, &settings, month.as_deref())?
        }
        Some(Commands::Export(cmd)) => handle_export_command(&storage, &settings, cmd)?,
        Some(Commands::History { limit }) => handle_history_command(&storage, limit)?,
        None => {
            println!("Monthwise - monthly budgeting from the terminal");
            println!();
            println!("Run 'monthwise --help' for usage information.");
            if !storage.is_initialized() {
                println!("Run 'monthwise init' to get started.");
            }
        }
    }

    Ok(())
}
