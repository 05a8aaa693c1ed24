//! Transaction display formatting

use std::collections::HashMap;

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::models::{CategoryId, Transaction};

#[derive(Tabled)]
struct TransactionRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "ID")]
    id: String,
}

/// Format a list of transactions as a register, newest first as given
pub fn format_transaction_register(
    transactions: &[Transaction],
    category_names: &HashMap<CategoryId, String>,
    symbol: &str,
) -> String {
    if transactions.is_empty() {
        return "No transactions found.\n".to_string();
    }

    let rows = transactions.iter().map(|t| TransactionRow {
        date: t.occurred_at.format("%Y-%m-%d").to_string(),
        category: category_names
            .get(&t.category_id)
            .cloned()
            .unwrap_or_else(|| "(deleted)".to_string()),
        description: truncate(&t.description, 40),
        amount: t.amount.format_with_symbol(symbol),
        id: t.id.to_string(),
    });

    let mut output = Table::new(rows).with(Style::psql()).to_string();
    output.push('\n');
    output
}

/// Format transaction details for display
pub fn format_transaction_details(txn: &Transaction, category_name: &str, symbol: &str) -> String {
    let mut output = String::new();

    output.push_str(&format!("Transaction: {}\n", txn.id));
    output.push_str(&format!("Date:        {}\n", txn.occurred_at.format("%Y-%m-%d %H:%M")));
    output.push_str(&format!("Amount:      {}\n", txn.amount.format_with_symbol(symbol)));
    output.push_str(&format!("Category:    {}\n", category_name));

    if !txn.description.is_empty() {
        output.push_str(&format!("Description: {}\n", txn.description));
    }

    output
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_register() {
        let food = CategoryId::new();
        let at = Utc.with_ymd_and_hms(2025, 2, 14, 9, 30, 0).unwrap();
        let txn = Transaction::with_description(food, Money::from_cents(4_599), at, "Dinner");
        let names = HashMap::from([(food, "Food".to_string())]);

        let output = format_transaction_register(&[txn], &names, "$");
        assert!(output.contains("2025-02-14"));
        assert!(output.contains("Food"));
        assert!(output.contains("$45.99"));
    }

    #[test]
    fn test_unknown_category() {
        let txn = Transaction::new(CategoryId::new(), Money::from_cents(1), Utc::now());
        let output = format_transaction_register(&[txn], &HashMap::new(), "$");
        assert!(output.contains("(deleted)"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long description", 10), "a very ...");
    }
}
