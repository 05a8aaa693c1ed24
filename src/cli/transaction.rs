//! Transaction CLI commands

use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};
use clap::Subcommand;

use crate::config::Settings;
use crate::display::{format_transaction_details, format_transaction_register};
use crate::error::{BudgetError, BudgetResult};
use crate::models::{Month, Transaction, YearMonth};
use crate::services::{CategoryService, NewTransaction, TransactionService, TransactionUpdate};
use crate::storage::Storage;

use super::{parse_amount, parse_date, require_category, resolve_month};

/// Transaction subcommands
#[derive(Subcommand)]
pub enum TransactionCommands {
    /// Record money earned or spent
    Add {
        /// Category name or ID
        category: String,
        /// Amount (e.g. "12.50"); always positive
        amount: String,
        #[arg(short, long)]
        description: Option<String>,
        /// Date (YYYY-MM-DD); defaults to now, or the first of the month
        /// when recording into another month
        #[arg(long)]
        date: Option<String>,
        /// Month (YYYY-MM); defaults to the current month
        #[arg(short, long)]
        month: Option<String>,
    },

    /// List a month's transactions
    List {
        /// Only one category (name or ID)
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        month: Option<String>,
        /// Number of transactions to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show one transaction
    Show {
        /// Transaction ID
        id: String,
        #[arg(short, long)]
        month: Option<String>,
    },

    /// Edit a transaction
    Edit {
        /// Transaction ID
        id: String,
        #[arg(short, long)]
        month: Option<String>,
        #[arg(short, long)]
        amount: Option<String>,
        /// Move to another category (name or ID)
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long)]
        date: Option<String>,
    },

    /// Delete a transaction
    Delete {
        /// Transaction ID
        id: String,
        #[arg(short, long)]
        month: Option<String>,
    },
}

fn require_transaction(
    service: &TransactionService<'_>,
    month: &Month,
    identifier: &str,
) -> BudgetResult<Transaction> {
    service
        .find_in_month(month.id, identifier)?
        .ok_or_else(|| BudgetError::transaction_not_found(identifier))
}

/// Noon on the first day of `month` unless it is the running month
fn default_date(month: &Month) -> Option<DateTime<Utc>> {
    if month.period == YearMonth::current() {
        return None;
    }
    month
        .period
        .start_date()
        .and_hms_opt(12, 0, 0)
        .map(|noon| Utc.from_utc_datetime(&noon))
}

fn category_name(storage: &Storage, txn: &Transaction) -> BudgetResult<String> {
    Ok(CategoryService::new(storage)
        .get(txn.category_id)?
        .map(|c| c.name)
        .unwrap_or_else(|| "(deleted)".to_string()))
}

/// Handle a transaction command
pub fn handle_transaction_command(
    storage: &Storage,
    settings: &Settings,
    cmd: TransactionCommands,
) -> BudgetResult<()> {
    let service = TransactionService::new(storage, settings);
    let symbol = settings.currency_symbol.as_str();

    match cmd {
        TransactionCommands::Add {
            category,
            amount,
            description,
            date,
            month,
        } => {
            let month = resolve_month(storage, settings, month.as_deref())?;
            let category = require_category(storage, &month, &category)?;

            let txn = service.create(NewTransaction {
                category_id: category.id,
                amount: parse_amount(&amount)?,
                description,
                occurred_at: match date {
                    Some(text) => Some(parse_date(&text)?),
                    None => default_date(&month),
                },
            })?;

            println!(
                "Recorded {} in {}",
                txn.amount.format_with_symbol(symbol),
                category.name
            );
            println!("  ID: {}", txn.id);
        }

        TransactionCommands::List {
            category,
            month,
            limit,
        } => {
            let month = resolve_month(storage, settings, month.as_deref())?;
            let mut categories = storage.categories.all_for_month(month.id)?;
            categories.extend(storage.categories_in_month(month.id)?);
            let names: HashMap<_, _> = categories.into_iter().map(|c| (c.id, c.name)).collect();

            let mut transactions = match category {
                Some(identifier) => {
                    let category = require_category(storage, &month, &identifier)?;
                    service.list_for_category(category.id)?
                }
                None => service.list_for_month(month.id)?,
            };
            transactions.truncate(limit);

            println!("{}", month.name);
            print!("{}", format_transaction_register(&transactions, &names, symbol));
        }

        TransactionCommands::Show { id, month } => {
            let month = resolve_month(storage, settings, month.as_deref())?;
            let txn = require_transaction(&service, &month, &id)?;
            let name = category_name(storage, &txn)?;
            print!("{}", format_transaction_details(&txn, &name, symbol));
        }

        TransactionCommands::Edit {
            id,
            month,
            amount,
            category,
            description,
            date,
        } => {
            let month = resolve_month(storage, settings, month.as_deref())?;
            let txn = require_transaction(&service, &month, &id)?;

            let category_id = match category {
                Some(identifier) => Some(require_category(storage, &month, &identifier)?.id),
                None => None,
            };

            let updated = service.update(
                txn.id,
                TransactionUpdate {
                    category_id,
                    amount: amount.as_deref().map(parse_amount).transpose()?,
                    description,
                    occurred_at: date.as_deref().map(parse_date).transpose()?,
                },
            )?;
            println!("Updated transaction {}", updated.id);
        }

        TransactionCommands::Delete { id, month } => {
            let month = resolve_month(storage, settings, month.as_deref())?;
            let txn = require_transaction(&service, &month, &id)?;
            let deleted = service.delete(txn.id)?;
            println!(
                "Deleted transaction {} ({})",
                deleted.id,
                deleted.amount.format_with_symbol(symbol)
            );
        }
    }

    Ok(())
}
