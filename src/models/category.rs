//! Budget categories
//!
//! A category is one budget line inside a month: a planned (target) amount
//! and an observed (actual) amount. Project categories track a budget that
//! spans many months instead of resetting each month.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::{CategoryId, MonthId};
use super::money::Money;

/// Maximum length of a category name
pub const MAX_NAME_LEN: usize = 50;

/// Kind of budget line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryType {
    Income,
    FixedExpense,
    VariableExpense,
    DiscretionaryExpense,
    ProjectExpense,
}

impl CategoryType {
    pub fn all() -> &'static [Self] {
        &[
            Self::Income,
            Self::FixedExpense,
            Self::VariableExpense,
            Self::DiscretionaryExpense,
            Self::ProjectExpense,
        ]
    }

    pub fn is_income(&self) -> bool {
        matches!(self, Self::Income)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Income => "Income",
            Self::FixedExpense => "Fixed",
            Self::VariableExpense => "Variable",
            Self::DiscretionaryExpense => "Discretionary",
            Self::ProjectExpense => "Project",
        }
    }
}

impl fmt::Display for CategoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for CategoryType {
    type Err = CategoryValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "income" => Ok(Self::Income),
            "fixed" | "fixed_expense" => Ok(Self::FixedExpense),
            "variable" | "variable_expense" => Ok(Self::VariableExpense),
            "discretionary" | "discretionary_expense" => Ok(Self::DiscretionaryExpense),
            "project" | "project_expense" => Ok(Self::ProjectExpense),
            _ => Err(CategoryValidationError::UnknownType(s.to_string())),
        }
    }
}

/// A budget line for a month
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,

    pub name: String,

    pub category_type: CategoryType,

    /// Planned amount for the period
    pub target_amount: Money,

    /// Sum of the category's active transactions
    #[serde(default)]
    pub actual_amount: Money,

    /// The month this record belongs to
    pub month_id: MonthId,

    #[serde(default)]
    pub description: String,

    #[serde(default = "default_true")]
    pub is_active: bool,

    /// Whether the unspent remainder moves into next month's copy
    #[serde(default)]
    pub rollover_enabled: bool,

    /// Amount carried in from the previous month (may be negative)
    #[serde(default)]
    pub rollover_balance: Money,

    #[serde(default)]
    pub display_order: i32,

    #[serde(default)]
    pub is_project: bool,

    #[serde(default)]
    pub project_total_budget: Money,

    #[serde(default)]
    pub project_total_spent: Money,

    /// Set when the project was marked complete
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_completed_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_project_id: Option<CategoryId>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl Category {
    /// Create a new monthly category
    pub fn new(
        name: impl Into<String>,
        category_type: CategoryType,
        target_amount: Money,
        month_id: MonthId,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: CategoryId::new(),
            name: name.into(),
            category_type,
            target_amount,
            actual_amount: Money::zero(),
            month_id,
            description: String::new(),
            is_active: true,
            rollover_enabled: false,
            rollover_balance: Money::zero(),
            display_order: 0,
            is_project: false,
            project_total_budget: Money::zero(),
            project_total_spent: Money::zero(),
            project_completed_at: None,
            parent_project_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a project category with a budget spanning several months
    pub fn new_project(name: impl Into<String>, total_budget: Money, month_id: MonthId) -> Self {
        let mut category = Self::new(name, CategoryType::ProjectExpense, Money::zero(), month_id);
        category.is_project = true;
        category.project_total_budget = total_budget;
        category
    }

    /// Projects are standing records and never copied into a new month
    pub fn is_project_like(&self) -> bool {
        self.is_project || self.category_type == CategoryType::ProjectExpense
    }

    /// Rows that stay visible in later months instead of being copied:
    /// projects and the lines filed under them
    pub fn spans_months(&self) -> bool {
        self.is_project_like() || self.parent_project_id.is_some()
    }

    pub fn is_project_complete(&self) -> bool {
        self.project_completed_at.is_some()
    }

    /// Planned money available to this line
    pub fn total_budgeted(&self) -> Money {
        if self.is_project {
            self.project_total_budget
        } else {
            self.target_amount + self.rollover_balance
        }
    }

    /// What is left of the planned amount (negative when overspent)
    pub fn remaining(&self) -> Money {
        self.total_budgeted() - self.actual_amount
    }

    /// Share of a project's budget spent, clamped to [0, 1]
    pub fn project_progress(&self) -> f64 {
        self.project_total_spent
            .ratio_of(self.project_total_budget)
            .map(|ratio| ratio.clamp(0.0, 1.0))
            .unwrap_or(0.0)
    }

    /// Store a freshly recomputed transaction sum
    pub fn set_actual(&mut self, actual: Money) {
        self.actual_amount = actual;
        if self.is_project {
            self.project_total_spent = actual;
        }
        self.updated_at = Utc::now();
    }

    pub fn mark_complete(&mut self, at: DateTime<Utc>) {
        self.project_completed_at = Some(at);
        self.updated_at = at;
    }

    pub fn reopen(&mut self) {
        self.project_completed_at = None;
        self.updated_at = Utc::now();
    }

    /// Soft delete
    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.updated_at = Utc::now();
    }

    pub fn validate(&self) -> Result<(), CategoryValidationError> {
        if self.name.trim().is_empty() {
            return Err(CategoryValidationError::EmptyName);
        }

        if self.name.chars().count() > MAX_NAME_LEN {
            return Err(CategoryValidationError::NameTooLong(self.name.chars().count()));
        }

        if self.target_amount.is_negative() {
            return Err(CategoryValidationError::NegativeTarget);
        }

        if self.is_project && self.project_total_budget.is_negative() {
            return Err(CategoryValidationError::NegativeProjectBudget);
        }

        if self.parent_project_id == Some(self.id) {
            return Err(CategoryValidationError::SelfParent);
        }

        Ok(())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Validation errors for categories
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryValidationError {
    EmptyName,
    NameTooLong(usize),
    NegativeTarget,
    NegativeProjectBudget,
    SelfParent,
    UnknownType(String),
}

impl fmt::Display for CategoryValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Category name cannot be empty"),
            Self::NameTooLong(len) => {
                write!(f, "Category name too long ({} chars, max {})", len, MAX_NAME_LEN)
            }
            Self::NegativeTarget => write!(f, "Target amount cannot be negative"),
            Self::NegativeProjectBudget => write!(f, "Project budget cannot be negative"),
            Self::SelfParent => write!(f, "A project cannot be its own parent"),
            Self::UnknownType(s) => write!(
                f,
                "Unknown category type '{}' (use income, fixed, variable, discretionary, project)",
                s
            ),
        }
    }
}

impl std::error::Error for CategoryValidationError {}
