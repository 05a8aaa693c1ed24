//! Budget aggregation
//!
//! Derived figures for a month, computed from category and transaction rows
//! on every call. Nothing here is cached: callers that need a fresh view
//! simply ask again.
//!
//! Planned figures come from the targets of the month's own categories;
//! projects carried in from an earlier month are planned there, not again.
//! Actual month-level figures come from active transaction rows. The
//! per-category spending percentage is the recorded actual over the target
//! alone. Status compares the actual against everything budgeted for the
//! line, carried rollover balance included.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::debug;

use crate::config::Settings;
use crate::error::{BudgetError, BudgetResult};
use crate::models::{Category, CategoryId, CategoryType, Money, MonthId, Transaction};
use crate::storage::Storage;

/// Tunable constants used by the aggregator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregationRules {
    /// Trailing window used for the daily spend rate
    pub window_days: i64,
    /// Upper bound for the spending percentage (2.0 = 200%)
    pub percentage_cap: f64,
    /// Fraction of target at which an expense is near its limit
    pub near_limit_threshold: f64,
}

impl Default for AggregationRules {
    fn default() -> Self {
        Self {
            window_days: 7,
            percentage_cap: 2.0,
            near_limit_threshold: 0.8,
        }
    }
}

impl From<&Settings> for AggregationRules {
    fn from(settings: &Settings) -> Self {
        Self {
            window_days: settings.spending_window_days,
            percentage_cap: settings.spending_percentage_cap,
            near_limit_threshold: settings.near_limit_threshold,
        }
    }
}

/// Where a category stands against its plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpendingStatus {
    OnTrack,
    NearLimit,
    OverBudget,
    /// Income not yet fully received
    Pending,
    Received,
}

impl SpendingStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::OnTrack => "On track",
            Self::NearLimit => "Near limit",
            Self::OverBudget => "Over budget",
            Self::Pending => "Pending",
            Self::Received => "Received",
        }
    }
}

impl std::fmt::Display for SpendingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Per-category figures
#[derive(Debug, Clone, Serialize)]
pub struct CategoryStatus {
    pub category_id: CategoryId,
    pub name: String,
    pub category_type: CategoryType,
    pub target: Money,
    pub actual: Money,
    /// Target plus rollover, or the project budget
    pub total_budgeted: Money,
    pub remaining: Money,
    pub spending_percentage: f64,
    pub status: SpendingStatus,
    /// Days until the remaining budget runs out at the recent spend rate
    pub remaining_days: Option<i64>,
    /// Share of a project's budget spent; `None` for ordinary categories
    pub project_progress: Option<f64>,
}

/// Month-level figures
#[derive(Debug, Clone, Serialize)]
pub struct MonthSummary {
    pub total_income: Money,
    pub total_expenses: Money,
    pub remaining_budget: Money,
    pub actual_income_earned: Money,
    pub actual_expenses_spent: Money,
    pub actual_remaining_budget: Money,
    /// Positive when the month is ahead of plan
    pub budget_variance: Money,
    pub financial_health_score: u8,
    pub categories: Vec<CategoryStatus>,
}

/// Planned income and expenses from category targets
pub fn planned_totals<'c>(categories: impl IntoIterator<Item = &'c Category>) -> (Money, Money) {
    categories
        .into_iter()
        .filter(|c| c.is_active)
        .fold((Money::zero(), Money::zero()), |(income, expenses), c| {
            if c.category_type.is_income() {
                (income + c.target_amount, expenses)
            } else {
                (income, expenses + c.target_amount)
            }
        })
}

/// `actual / target` clamped to `[0, cap]`; zero when there is no target
pub fn spending_percentage(actual: Money, target: Money, cap: f64) -> f64 {
    actual
        .ratio_of(target)
        .map(|ratio| ratio.clamp(0.0, cap))
        .unwrap_or(0.0)
}

/// Whole days until `category` runs out of money at its recent spend rate.
///
/// The rate is the sum of active transactions in the window ending at `now`
/// divided by the window length. Returns `None` for income, when nothing is
/// left, or when there was no spending in the window.
pub fn remaining_days(
    category: &Category,
    transactions: &[Transaction],
    now: DateTime<Utc>,
    window_days: i64,
) -> Option<i64> {
    if category.category_type.is_income() || window_days <= 0 {
        return None;
    }

    let remaining = category.remaining();
    if !remaining.is_positive() {
        return None;
    }

    let window_start = now - Duration::days(window_days);
    let spent: Money = transactions
        .iter()
        .filter(|t| {
            t.is_active
                && t.category_id == category.id
                && t.occurred_at > window_start
                && t.occurred_at <= now
        })
        .map(|t| t.amount)
        .sum();

    let daily_rate = spent.cents() as f64 / window_days as f64;
    if daily_rate <= 0.0 {
        return None;
    }

    Some((remaining.cents() as f64 / daily_rate).floor() as i64)
}

/// Savings rate mapped onto 0..=100.
///
/// -100% (or worse) scores 0, break-even scores 50 and saving everything
/// scores 100. No income at all scores 0.
pub fn financial_health_score(actual_income: Money, actual_remaining: Money) -> u8 {
    match actual_remaining.ratio_of(actual_income) {
        Some(ratio) => ((ratio.clamp(-1.0, 1.0) + 1.0) * 50.0).round() as u8,
        None => 0,
    }
}

/// Status against the full budget of the line (target plus rollover
/// balance, or the project budget)
pub fn spending_status(category: &Category, near_limit: f64) -> SpendingStatus {
    if category.category_type.is_income() {
        let received = category.actual_amount.is_positive()
            && category.actual_amount >= category.target_amount;
        return if received {
            SpendingStatus::Received
        } else {
            SpendingStatus::Pending
        };
    }

    let used = match category.actual_amount.ratio_of(category.total_budgeted()) {
        Some(used) => used,
        None if category.actual_amount.is_positive() => return SpendingStatus::OverBudget,
        None => return SpendingStatus::OnTrack,
    };

    if used > 1.0 {
        SpendingStatus::OverBudget
    } else if used >= near_limit {
        SpendingStatus::NearLimit
    } else {
        SpendingStatus::OnTrack
    }
}

/// Figures for one category
pub fn category_status(
    category: &Category,
    transactions: &[Transaction],
    now: DateTime<Utc>,
    rules: &AggregationRules,
) -> CategoryStatus {
    CategoryStatus {
        category_id: category.id,
        name: category.name.clone(),
        category_type: category.category_type,
        target: category.target_amount,
        actual: category.actual_amount,
        total_budgeted: category.total_budgeted(),
        remaining: category.remaining(),
        spending_percentage: spending_percentage(
            category.actual_amount,
            category.target_amount,
            rules.percentage_cap,
        ),
        status: spending_status(category, rules.near_limit_threshold),
        remaining_days: remaining_days(category, transactions, now, rules.window_days),
        project_progress: category.is_project.then(|| category.project_progress()),
    }
}

/// Summarize a month from the categories visible in it and the
/// transactions that count toward it
pub fn summarize(
    month_id: MonthId,
    categories: &[Category],
    transactions: &[Transaction],
    now: DateTime<Utc>,
    rules: &AggregationRules,
) -> MonthSummary {
    let mut by_category: HashMap<CategoryId, Vec<Transaction>> = HashMap::new();
    for txn in transactions.iter().filter(|t| t.is_active) {
        by_category.entry(txn.category_id).or_default().push(txn.clone());
    }

    let (total_income, total_expenses) =
        planned_totals(categories.iter().filter(|c| c.month_id == month_id));

    let mut actual_income_earned = Money::zero();
    let mut actual_expenses_spent = Money::zero();
    let mut statuses = Vec::with_capacity(categories.len());

    for category in categories.iter().filter(|c| c.is_active) {
        let rows = by_category
            .get(&category.id)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let spent: Money = rows.iter().map(|t| t.amount).sum();

        if category.category_type.is_income() {
            actual_income_earned += spent;
        } else {
            actual_expenses_spent += spent;
        }

        statuses.push(category_status(category, rows, now, rules));
    }

    let remaining_budget = total_income - total_expenses;
    let actual_remaining_budget = actual_income_earned - actual_expenses_spent;

    MonthSummary {
        total_income,
        total_expenses,
        remaining_budget,
        actual_income_earned,
        actual_expenses_spent,
        actual_remaining_budget,
        budget_variance: actual_remaining_budget - remaining_budget,
        financial_health_score: financial_health_score(
            actual_income_earned,
            actual_remaining_budget,
        ),
        categories: statuses,
    }
}

/// Loads a month's rows from storage and summarizes them
pub struct BudgetAggregator<'a> {
    storage: &'a Storage,
    rules: AggregationRules,
}

impl<'a> BudgetAggregator<'a> {
    pub fn new(storage: &'a Storage, settings: &Settings) -> Self {
        Self {
            storage,
            rules: AggregationRules::from(settings),
        }
    }

    pub fn with_rules(storage: &'a Storage, rules: AggregationRules) -> Self {
        Self { storage, rules }
    }

    pub fn month_summary(&self, month_id: MonthId) -> BudgetResult<MonthSummary> {
        self.month_summary_at(month_id, Utc::now())
    }

    /// Summary as of `now`; the spend-rate window ends there
    pub fn month_summary_at(
        &self,
        month_id: MonthId,
        now: DateTime<Utc>,
    ) -> BudgetResult<MonthSummary> {
        let month = self
            .storage
            .months
            .get(month_id)?
            .ok_or_else(|| BudgetError::month_not_found(month_id.to_string()))?;

        let categories = self.storage.categories_in_month(month_id)?;
        let transactions = self.storage.transactions_in_month(&month, &categories)?;

        debug!(
            month = %month_id,
            categories = categories.len(),
            transactions = transactions.len(),
            "Summarizing month"
        );

        Ok(summarize(month_id, &categories, &transactions, now, &self.rules))
    }

    pub fn category_status(&self, category_id: CategoryId) -> BudgetResult<CategoryStatus> {
        let category = self
            .storage
            .categories
            .get(category_id)?
            .filter(|c| c.is_active)
            .ok_or_else(|| BudgetError::category_not_found(category_id.to_string()))?;
        let transactions = self.storage.transactions.active_for_category(category_id)?;

        Ok(category_status(&category, &transactions, Utc::now(), &self.rules))
    }
}
