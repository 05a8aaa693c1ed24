//! Month CLI commands

use clap::Subcommand;

use crate::config::Settings;
use crate::display::{format_month_header, format_month_list, format_month_summary};
use crate::error::{BudgetError, BudgetResult};
use crate::services::{BudgetAggregator, MonthService, RolloverReport};
use crate::storage::Storage;

use super::{parse_period, resolve_month};

/// Month subcommands
#[derive(Subcommand)]
pub enum MonthCommands {
    /// Show a month's planned totals
    Show {
        /// Month (YYYY-MM); defaults to the current month
        month: Option<String>,
    },

    /// List all months
    List,

    /// Show or change the current month
    Current {
        /// Month to switch to (YYYY-MM)
        month: Option<String>,
    },

    /// Move to the next month, creating it if needed
    Next,

    /// Move to the previous month, creating it if needed
    #[command(alias = "previous")]
    Prev,

    /// Delete a month with all of its categories and transactions
    Delete {
        /// Month (YYYY-MM)
        month: String,
        /// Required; the deletion cannot be undone
        #[arg(long)]
        force: bool,
    },
}

/// Handle a month command
pub fn handle_month_command(
    storage: &Storage,
    settings: &Settings,
    cmd: MonthCommands,
) -> BudgetResult<()> {
    let service = MonthService::new(storage, settings);
    let symbol = settings.currency_symbol.as_str();

    match cmd {
        MonthCommands::Show { month } => {
            let month = resolve_month(storage, settings, month.as_deref())?;
            print!("{}", format_month_header(&month, symbol));
        }

        MonthCommands::List => {
            let months = service.list()?;
            let current = storage.months.current()?;
            println!("{}", format_month_list(&months, current, symbol));
        }

        MonthCommands::Current { month } => {
            let month = match month {
                Some(text) => {
                    let period = parse_period(&text)?;
                    let existed = service.find_by_period(period)?.is_some();
                    if !existed {
                        let created = service.create(period)?;
                        print_rollover(created.rollover.as_ref());
                    }
                    service.set_current(period)?
                }
                None => service.current()?,
            };
            print!("{}", format_month_header(&month, symbol));
        }

        MonthCommands::Next => {
            let month = service.next()?;
            println!("Now on {}", month.name);
        }

        MonthCommands::Prev => {
            let month = service.previous()?;
            println!("Now on {}", month.name);
        }

        MonthCommands::Delete { month, force } => {
            let period = parse_period(&month)?;
            let target = service
                .find_by_period(period)?
                .ok_or_else(|| BudgetError::month_not_found(period.to_string()))?;

            if !force {
                return Err(BudgetError::Validation(format!(
                    "Deleting {} removes all of its categories and transactions. Re-run with --force to confirm.",
                    target.name
                )));
            }

            let deleted = service.delete_month(target.id)?;
            println!("Deleted {}", deleted.month.name);
            println!("  Categories removed:   {}", deleted.categories_removed);
            println!("  Transactions removed: {}", deleted.transactions_removed);
        }
    }

    Ok(())
}

/// Handle `monthwise summary`
pub fn handle_summary_command(
    storage: &Storage,
    settings: &Settings,
    month: Option<&str>,
) -> BudgetResult<()> {
    let month = resolve_month(storage, settings, month)?;
    let summary = BudgetAggregator::new(storage, settings).month_summary(month.id)?;
    print!(
        "{}",
        format_month_summary(&month, &summary, &settings.currency_symbol)
    );
    Ok(())
}

fn print_rollover(report: Option<&RolloverReport>) {
    let Some(report) = report else { return };
    if report.is_empty() {
        return;
    }

    println!("Copied {} categories from the previous month", report.copied.len());
    if report.failed > 0 {
        println!("  {} categories could not be copied", report.failed);
    }
}
