//! Category display formatting

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::models::Category;
use crate::services::{CategoryStatus, SpendingStatus};

#[derive(Tabled)]
struct CategoryRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: &'static str,
    #[tabled(rename = "Budgeted")]
    budgeted: String,
    #[tabled(rename = "Actual")]
    actual: String,
    #[tabled(rename = "Left")]
    remaining: String,
    #[tabled(rename = "Used")]
    used: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Runs out")]
    runs_out: String,
    #[tabled(rename = "ID")]
    id: String,
}

fn status_text(status: &CategoryStatus) -> String {
    match (status.status, status.project_progress) {
        (SpendingStatus::OverBudget, _) => "! Over budget".to_string(),
        (_, Some(progress)) => format!("{} ({:.0}% of project)", status.status, progress * 100.0),
        (s, None) => s.to_string(),
    }
}

/// Format category figures as a table
pub fn format_category_table(statuses: &[CategoryStatus], symbol: &str) -> String {
    if statuses.is_empty() {
        return "No categories in this month.\n\nAdd one with 'monthwise category add'.\n"
            .to_string();
    }

    let rows = statuses.iter().map(|s| CategoryRow {
        name: s.name.clone(),
        kind: s.category_type.label(),
        budgeted: s.total_budgeted.format_with_symbol(symbol),
        actual: s.actual.format_with_symbol(symbol),
        remaining: s.remaining.format_with_symbol(symbol),
        used: format!("{:.0}%", s.spending_percentage * 100.0),
        status: status_text(s),
        runs_out: s
            .remaining_days
            .map(|days| format!("{} days", days))
            .unwrap_or_else(|| "-".to_string()),
        id: s.category_id.to_string(),
    });

    let mut output = Table::new(rows).with(Style::psql()).to_string();
    output.push('\n');
    output
}

/// Format a single category for `monthwise category show`
pub fn format_category_details(category: &Category, status: &CategoryStatus, symbol: &str) -> String {
    let mut output = String::new();

    output.push_str(&format!("Category: {}\n", category.name));
    output.push_str(&format!("ID:       {}\n", category.id));
    output.push_str(&format!("Type:     {}\n", category.category_type.label()));

    if category.is_project {
        output.push_str(&format!(
            "Budget:   {} (project)\n",
            category.project_total_budget.format_with_symbol(symbol)
        ));
        output.push_str(&format!(
            "Progress: {:.0}%\n",
            category.project_progress() * 100.0
        ));
        if let Some(done) = category.project_completed_at {
            output.push_str(&format!("Completed: {}\n", done.format("%Y-%m-%d")));
        }
    } else {
        output.push_str(&format!(
            "Target:   {}\n",
            category.target_amount.format_with_symbol(symbol)
        ));
        if !category.rollover_balance.is_zero() {
            output.push_str(&format!(
                "Carried:  {}\n",
                category.rollover_balance.format_with_symbol(symbol)
            ));
        }
    }

    output.push_str(&format!(
        "Actual:   {}\n",
        category.actual_amount.format_with_symbol(symbol)
    ));
    output.push_str(&format!(
        "Left:     {}\n",
        status.remaining.format_with_symbol(symbol)
    ));
    output.push_str(&format!("Status:   {}\n", status_text(status)));

    if let Some(days) = status.remaining_days {
        output.push_str(&format!("Runs out: in about {} days\n", days));
    }

    if category.rollover_enabled {
        output.push_str("Rollover: unspent money carries into next month\n");
    }

    if !category.description.is_empty() {
        output.push_str(&format!("Note:     {}\n", category.description));
    }

    output
}
