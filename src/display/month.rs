//! Month display formatting
//!
//! Month lists and the month summary shown by `monthwise summary`.

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::models::{Month, MonthId};
use crate::services::MonthSummary;

use super::category::format_category_table;

#[derive(Tabled)]
struct MonthRow {
    #[tabled(rename = "")]
    marker: &'static str,
    #[tabled(rename = "Month")]
    name: String,
    #[tabled(rename = "Income")]
    income: String,
    #[tabled(rename = "Expenses")]
    expenses: String,
    #[tabled(rename = "Remaining")]
    remaining: String,
    #[tabled(rename = "ID")]
    id: String,
}

/// Format months as a table; the current month is marked with `*`
pub fn format_month_list(months: &[Month], current: Option<MonthId>, symbol: &str) -> String {
    if months.is_empty() {
        return "No months yet.\n\nRun 'monthwise month current' to start this month.".to_string();
    }

    let rows = months.iter().map(|m| MonthRow {
        marker: if Some(m.id) == current { "*" } else { "" },
        name: m.name.clone(),
        income: m.total_income.format_with_symbol(symbol),
        expenses: m.total_expenses.format_with_symbol(symbol),
        remaining: m.remaining_budget().format_with_symbol(symbol),
        id: m.id.to_string(),
    });

    Table::new(rows).with(Style::psql()).to_string()
}

/// Short header for the selected month
pub fn format_month_header(month: &Month, symbol: &str) -> String {
    format!(
        "{} ({})\nPlanned income:   {}\nPlanned expenses: {}\nLeft to assign:   {}\n",
        month.name,
        month.id,
        month.total_income.format_with_symbol(symbol),
        month.total_expenses.format_with_symbol(symbol),
        month.remaining_budget().format_with_symbol(symbol),
    )
}

/// Full month summary: plan vs actual, health score and category table
pub fn format_month_summary(month: &Month, summary: &MonthSummary, symbol: &str) -> String {
    let mut output = String::new();

    output.push_str(&format!("{}\n", month.name));
    output.push_str(&"=".repeat(month.name.chars().count()));
    output.push_str("\n\n");

    output.push_str(&format!(
        "{:<12} {:>14} {:>14}\n",
        "", "Planned", "Actual"
    ));
    output.push_str(&format!(
        "{:<12} {:>14} {:>14}\n",
        "Income",
        summary.total_income.format_with_symbol(symbol),
        summary.actual_income_earned.format_with_symbol(symbol),
    ));
    output.push_str(&format!(
        "{:<12} {:>14} {:>14}\n",
        "Expenses",
        summary.total_expenses.format_with_symbol(symbol),
        summary.actual_expenses_spent.format_with_symbol(symbol),
    ));
    output.push_str(&format!(
        "{:<12} {:>14} {:>14}\n\n",
        "Remaining",
        summary.remaining_budget.format_with_symbol(symbol),
        summary.actual_remaining_budget.format_with_symbol(symbol),
    ));

    let variance = if summary.budget_variance.is_negative() {
        "behind plan"
    } else {
        "ahead of plan"
    };
    output.push_str(&format!(
        "Variance:  {} ({})\n",
        summary.budget_variance.format_with_symbol(symbol),
        variance
    ));
    output.push_str(&format!(
        "Health:    {}/100\n\n",
        summary.financial_health_score
    ));

    output.push_str(&format_category_table(&summary.categories, symbol));
    output
}
