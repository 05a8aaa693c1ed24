//! Category CLI commands

use clap::Subcommand;

use crate::config::Settings;
use crate::display::{format_category_details, format_category_table};
use crate::error::{BudgetError, BudgetResult};
use crate::models::CategoryType;
use crate::services::{
    BudgetAggregator, CategoryService, CategoryUpdate, NewCategory, NewProject,
};
use crate::storage::Storage;

use super::{parse_amount, require_category, resolve_month};

/// Category subcommands
#[derive(Subcommand)]
pub enum CategoryCommands {
    /// Add a category to a month
    Add {
        /// Category name
        name: String,
        /// Planned amount (e.g. "450" or "450.00")
        #[arg(short, long)]
        target: String,
        /// income, fixed, variable or discretionary
        #[arg(short = 'k', long = "type", default_value = "variable")]
        kind: String,
        /// Month (YYYY-MM); defaults to the current month
        #[arg(short, long)]
        month: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        /// Carry unspent money into the next month
        #[arg(long)]
        rollover: bool,
        /// Project this line belongs to (name or ID)
        #[arg(long)]
        project: Option<String>,
    },

    /// Add a project with a budget spanning several months
    Project {
        /// Project name
        name: String,
        /// Total project budget
        #[arg(short, long)]
        budget: String,
        #[arg(short, long)]
        month: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
    },

    /// List a month's categories with their figures
    List {
        #[arg(short, long)]
        month: Option<String>,
        /// Only show one type
        #[arg(short = 'k', long = "type")]
        kind: Option<String>,
    },

    /// Show category details
    Show {
        /// Category name or ID
        category: String,
        #[arg(short, long)]
        month: Option<String>,
    },

    /// Edit a category
    Edit {
        /// Category name or ID
        category: String,
        #[arg(short, long)]
        month: Option<String>,
        /// New name
        #[arg(short, long)]
        name: Option<String>,
        /// New planned amount
        #[arg(short, long)]
        target: Option<String>,
        /// New type
        #[arg(short = 'k', long = "type")]
        kind: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        /// Turn rollover on or off
        #[arg(long)]
        rollover: Option<bool>,
        /// New total budget (projects only)
        #[arg(long)]
        budget: Option<String>,
    },

    /// Delete a category
    Delete {
        /// Category name or ID
        category: String,
        #[arg(short, long)]
        month: Option<String>,
        /// Also delete the category's transactions
        #[arg(long)]
        cascade: bool,
    },

    /// Mark a project complete
    Complete {
        /// Project name or ID
        category: String,
        #[arg(short, long)]
        month: Option<String>,
    },

    /// Reopen a completed project
    Reopen {
        /// Project name or ID
        category: String,
        #[arg(short, long)]
        month: Option<String>,
    },
}

fn parse_type(text: &str) -> BudgetResult<CategoryType> {
    text.parse::<CategoryType>()
        .map_err(|e| BudgetError::Validation(e.to_string()))
}

/// Handle a category command
pub fn handle_category_command(
    storage: &Storage,
    settings: &Settings,
    cmd: CategoryCommands,
) -> BudgetResult<()> {
    let service = CategoryService::new(storage);
    let symbol = settings.currency_symbol.as_str();

    match cmd {
        CategoryCommands::Add {
            name,
            target,
            kind,
            month,
            description,
            rollover,
            project,
        } => {
            let month = resolve_month(storage, settings, month.as_deref())?;
            let parent_project_id = match project {
                Some(identifier) => Some(require_category(storage, &month, &identifier)?.id),
                None => None,
            };

            let mut input = NewCategory::new(month.id, name, parse_type(&kind)?, parse_amount(&target)?);
            input.description = description;
            input.rollover_enabled = rollover;
            input.parent_project_id = parent_project_id;

            let category = service.create_category(input)?;
            println!("Created category: {}", category.name);
            println!("  Month:  {}", month.name);
            println!("  Type:   {}", category.category_type.label());
            println!("  Target: {}", category.target_amount.format_with_symbol(symbol));
            println!("  ID:     {}", category.id);
        }

        CategoryCommands::Project {
            name,
            budget,
            month,
            description,
        } => {
            let month = resolve_month(storage, settings, month.as_deref())?;
            let project = service.create_project(NewProject {
                month_id: month.id,
                name,
                total_budget: parse_amount(&budget)?,
                description,
            })?;
            println!("Created project: {}", project.name);
            println!(
                "  Budget: {}",
                project.project_total_budget.format_with_symbol(symbol)
            );
            println!("  ID:     {}", project.id);
        }

        CategoryCommands::List { month, kind } => {
            let month = resolve_month(storage, settings, month.as_deref())?;
            let summary = BudgetAggregator::new(storage, settings).month_summary(month.id)?;

            let statuses = match kind {
                Some(kind) => {
                    let kind = parse_type(&kind)?;
                    summary
                        .categories
                        .into_iter()
                        .filter(|s| s.category_type == kind)
                        .collect()
                }
                None => summary.categories,
            };

            println!("{}", month.name);
            print!("{}", format_category_table(&statuses, symbol));
        }

        CategoryCommands::Show { category, month } => {
            let month = resolve_month(storage, settings, month.as_deref())?;
            let category = require_category(storage, &month, &category)?;
            let status = BudgetAggregator::new(storage, settings).category_status(category.id)?;
            print!("{}", format_category_details(&category, &status, symbol));
        }

        CategoryCommands::Edit {
            category,
            month,
            name,
            target,
            kind,
            description,
            rollover,
            budget,
        } => {
            let month = resolve_month(storage, settings, month.as_deref())?;
            let category = require_category(storage, &month, &category)?;

            let update = CategoryUpdate {
                name,
                category_type: kind.as_deref().map(parse_type).transpose()?,
                target_amount: target.as_deref().map(parse_amount).transpose()?,
                description,
                rollover_enabled: rollover,
                project_total_budget: budget.as_deref().map(parse_amount).transpose()?,
            };

            let updated = service.update_category(category.id, update)?;
            println!("Updated category: {}", updated.name);
        }

        CategoryCommands::Delete {
            category,
            month,
            cascade,
        } => {
            let month = resolve_month(storage, settings, month.as_deref())?;
            let category = require_category(storage, &month, &category)?;

            if cascade {
                let (deleted, removed) = service.delete_category_cascade(category.id)?;
                println!(
                    "Deleted category: {} ({} transactions removed)",
                    deleted.name, removed
                );
            } else {
                let deleted = service.delete_category(category.id)?;
                println!("Deleted category: {}", deleted.name);
            }
        }

        CategoryCommands::Complete { category, month } => {
            let month = resolve_month(storage, settings, month.as_deref())?;
            let category = require_category(storage, &month, &category)?;
            let project = service.complete_project(category.id)?;
            println!("Completed project: {}", project.name);
        }

        CategoryCommands::Reopen { category, month } => {
            let month = resolve_month(storage, settings, month.as_deref())?;
            let category = require_category(storage, &month, &category)?;
            let project = service.reopen_project(category.id)?;
            println!("Reopened project: {}", project.name);
        }
    }

    Ok(())
}
