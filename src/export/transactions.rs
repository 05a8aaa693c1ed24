//! CSV export of a month's transactions

use std::collections::HashMap;
use std::io::Write;

use serde::Serialize;

use crate::error::{BudgetError, BudgetResult};
use crate::models::MonthId;
use crate::storage::Storage;

#[derive(Debug, Serialize)]
struct TransactionRow<'a> {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Category")]
    category: &'a str,
    #[serde(rename = "Type")]
    category_type: &'a str,
    #[serde(rename = "Description")]
    description: &'a str,
    #[serde(rename = "Amount")]
    amount: String,
}

/// Write every active transaction counted in a month, newest first
pub fn export_month_csv<W: Write>(
    storage: &Storage,
    month_id: MonthId,
    writer: W,
) -> BudgetResult<usize> {
    let month = storage
        .months
        .get(month_id)?
        .ok_or_else(|| BudgetError::month_not_found(month_id.to_string()))?;

    let categories = storage.categories_in_month(month_id)?;
    let lookup: HashMap<_, _> = categories.iter().map(|c| (c.id, c)).collect();
    let transactions = storage.transactions_in_month(&month, &categories)?;

    let mut csv_writer = csv::Writer::from_writer(writer);
    let export_err = |e: csv::Error| BudgetError::Export(e.to_string());

    for txn in &transactions {
        let (category, category_type) = lookup
            .get(&txn.category_id)
            .map(|c| (c.name.as_str(), c.category_type.label()))
            .unwrap_or(("Unknown", ""));

        csv_writer
            .serialize(TransactionRow {
                id: txn.id.to_string(),
                date: txn.occurred_at.format("%Y-%m-%d").to_string(),
                category,
                category_type,
                description: &txn.description,
                amount: txn.amount.to_decimal_string(),
            })
            .map_err(export_err)?;
    }

    // An empty month still gets a header row
    if transactions.is_empty() {
        csv_writer
            .write_record(["ID", "Date", "Category", "Type", "Description", "Amount"])
            .map_err(export_err)?;
    }

    csv_writer
        .flush()
        .map_err(|e| BudgetError::Export(e.to_string()))?;

    Ok(transactions.len())
}
