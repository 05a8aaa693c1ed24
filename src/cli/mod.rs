//! CLI command handlers
//!
//! Bridges the clap argument parsing in `main.rs` with the service layer.
//! Most commands act on the current month unless `--month YYYY-MM` is given.

pub mod category;
pub mod export;
pub mod month;
pub mod transaction;

pub use category::{handle_category_command, CategoryCommands};
pub use export::{handle_export_command, ExportCommands};
pub use month::{handle_month_command, handle_summary_command, MonthCommands};
pub use transaction::{handle_transaction_command, TransactionCommands};

use chrono::{NaiveDate, TimeZone, Utc};

use crate::config::Settings;
use crate::error::{BudgetError, BudgetResult};
use crate::models::{Category, Money, Month, YearMonth};
use crate::services::{CategoryService, MonthService};
use crate::storage::Storage;

/// The month named by `--month`, or the current one
pub(crate) fn resolve_month(
    storage: &Storage,
    settings: &Settings,
    month: Option<&str>,
) -> BudgetResult<Month> {
    let service = MonthService::new(storage, settings);
    match month {
        Some(text) => service.get_or_create(parse_period(text)?),
        None => service.current(),
    }
}

pub(crate) fn parse_period(text: &str) -> BudgetResult<YearMonth> {
    YearMonth::parse(text).map_err(|e| BudgetError::Validation(e.to_string()))
}

pub(crate) fn parse_amount(text: &str) -> BudgetResult<Money> {
    Money::parse(text).map_err(|e| BudgetError::Validation(format!("Invalid amount: {}", e)))
}

/// Parse `YYYY-MM-DD` as noon UTC on that day
pub(crate) fn parse_date(text: &str) -> BudgetResult<chrono::DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").map_err(|_| {
        BudgetError::Validation(format!("Invalid date (expected YYYY-MM-DD): {}", text))
    })?;
    let noon = date
        .and_hms_opt(12, 0, 0)
        .ok_or_else(|| BudgetError::Validation(format!("Invalid date: {}", text)))?;
    Ok(Utc.from_utc_datetime(&noon))
}

/// Look up an active category of `month` by name or id
pub(crate) fn require_category(
    storage: &Storage,
    month: &Month,
    identifier: &str,
) -> BudgetResult<Category> {
    CategoryService::new(storage)
        .find_in_month(month.id, identifier)?
        .ok_or_else(|| BudgetError::category_not_found(identifier))
}

/// Print the most recent audit log entries
pub fn handle_history_command(storage: &Storage, limit: usize) -> BudgetResult<()> {
    let entries = storage.audit().read_recent(limit)?;
    if entries.is_empty() {
        println!("No changes recorded yet.");
        return Ok(());
    }

    for entry in entries {
        println!("{}", entry.format_human_readable());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_date() {
        let at = parse_date("2025-03-09").unwrap();
        assert_eq!((at.year(), at.month(), at.day(), at.hour()), (2025, 3, 9, 12));
        assert!(parse_date("09/03/2025").unwrap_err().is_validation());
    }

    #[test]
    fn test_parse_amount_and_period() {
        assert_eq!(parse_amount("$1,250.50").unwrap().cents(), 125_050);
        assert!(parse_amount("12.345").unwrap_err().is_validation());
        assert_eq!(parse_period("2025-11").unwrap(), YearMonth::new(2025, 11).unwrap());
        assert!(parse_period("2025-13").unwrap_err().is_validation());
    }
}
