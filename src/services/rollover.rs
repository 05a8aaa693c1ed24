//! Month rollover
//!
//! When a new month is created, the categories of the most recent month
//! that still has active categories are copied into it. Fixed expenses keep
//! their recorded spend; every other type starts the month at zero.
//! Projects and the lines filed under them span several months and are
//! never copied.
//!
//! Rollover is best effort. A copy that fails to persist is logged and
//! counted, the remaining copies still go through, and the caller never
//! sees an error.
//!
//! Running it twice for the same month duplicates every category, so
//! `MonthService` only calls it right after creating a month.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::audit::EntityType;
use crate::error::BudgetResult;
use crate::models::{Category, CategoryId, CategoryType, Money, MonthId};
use crate::storage::Storage;

/// What the rollover engine needs from storage
pub trait RolloverStore {
    /// The most recent month, by calendar order, that has at least one
    /// active category, excluding `exclude`
    fn latest_month_with_categories(&self, exclude: MonthId) -> BudgetResult<Option<MonthId>>;

    /// Active categories of a month
    fn categories_for_month(&self, month_id: MonthId) -> BudgetResult<Vec<Category>>;

    /// Persist a single new category
    fn insert_category(&self, category: Category) -> BudgetResult<()>;
}

impl RolloverStore for Storage {
    fn latest_month_with_categories(&self, exclude: MonthId) -> BudgetResult<Option<MonthId>> {
        let populated = self.categories.months_with_active_categories()?;
        Ok(self
            .months
            .get_all_active()?
            .into_iter()
            .filter(|m| m.id != exclude && populated.contains(&m.id))
            .max_by_key(|m| m.period)
            .map(|m| m.id))
    }

    fn categories_for_month(&self, month_id: MonthId) -> BudgetResult<Vec<Category>> {
        self.categories.active_for_month(month_id)
    }

    fn insert_category(&self, category: Category) -> BudgetResult<()> {
        let id = category.id;
        let name = category.name.clone();
        self.categories.upsert(category.clone())?;
        if let Err(e) = self.categories.save() {
            // Keep memory in step with disk
            self.categories.remove(id)?;
            return Err(e);
        }
        // The copy is on disk; a missing audit line does not undo it
        if let Err(e) = self.log_create(EntityType::Category, id.to_string(), Some(name.clone()), &category) {
            warn!(category = %name, error = %e, "Failed to audit rolled-over category");
        }
        Ok(())
    }
}

/// Outcome of one rollover run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RolloverReport {
    /// Month the categories were copied from, if any
    pub source_month: Option<MonthId>,
    /// Ids of the newly created categories
    pub copied: Vec<CategoryId>,
    pub skipped_projects: usize,
    pub failed: usize,
}

impl RolloverReport {
    pub fn is_empty(&self) -> bool {
        self.copied.is_empty() && self.failed == 0
    }
}

/// Copies category definitions forward into a freshly created month
pub struct MonthRolloverEngine<'a, S: RolloverStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: RolloverStore + ?Sized> MonthRolloverEngine<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Populate `target` from the latest populated month
    pub fn rollover_into(&self, target: MonthId) -> RolloverReport {
        let mut report = RolloverReport::default();

        let source = match self.store.latest_month_with_categories(target) {
            Ok(Some(source)) => source,
            Ok(None) => {
                debug!(month = %target, "No earlier month with categories; nothing to roll over");
                return report;
            }
            Err(e) => {
                warn!(month = %target, error = %e, "Could not look up the previous month");
                return report;
            }
        };
        report.source_month = Some(source);

        let prior = match self.store.categories_for_month(source) {
            Ok(categories) => categories,
            Err(e) => {
                warn!(source = %source, error = %e, "Could not read categories to roll over");
                return report;
            }
        };

        let now = Utc::now();
        for category in &prior {
            if category.is_project_like() || category.parent_project_id.is_some() {
                report.skipped_projects += 1;
                continue;
            }

            let copy = carry_forward(category, target, now);
            let copy_id = copy.id;
            match self.store.insert_category(copy) {
                Ok(()) => report.copied.push(copy_id),
                Err(e) => {
                    warn!(
                        category = %category.name,
                        source = %source,
                        target = %target,
                        error = %e,
                        "Failed to roll over category"
                    );
                    report.failed += 1;
                }
            }
        }

        info!(
            source = %source,
            target = %target,
            copied = report.copied.len(),
            skipped_projects = report.skipped_projects,
            failed = report.failed,
            "Rolled over categories"
        );

        report
    }
}

/// Build the next month's copy of a category
pub fn carry_forward(prior: &Category, target: MonthId, now: DateTime<Utc>) -> Category {
    let actual_amount = match prior.category_type {
        CategoryType::FixedExpense => prior.actual_amount,
        _ => Money::zero(),
    };

    let rollover_balance = if prior.rollover_enabled && !prior.category_type.is_income() {
        prior.remaining()
    } else {
        Money::zero()
    };

    Category {
        id: CategoryId::new(),
        name: prior.name.clone(),
        category_type: prior.category_type,
        target_amount: prior.target_amount,
        actual_amount,
        month_id: target,
        description: prior.description.clone(),
        is_active: true,
        rollover_enabled: prior.rollover_enabled,
        rollover_balance,
        display_order: prior.display_order,
        is_project: false,
        project_total_budget: Money::zero(),
        project_total_spent: Money::zero(),
        project_completed_at: None,
        parent_project_id: None,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::MonthwisePaths;
    use crate::error::BudgetError;
    use crate::models::{Month, YearMonth};
    use std::cell::RefCell;
    use tempfile::TempDir;

    /// In-memory store; names listed in `reject` fail to insert
    #[derive(Default)]
    struct MemoryStore {
        source: Option<MonthId>,
        prior: Vec<Category>,
        inserted: RefCell<Vec<Category>>,
        reject: Vec<&'static str>,
    }

    impl RolloverStore for MemoryStore {
        fn latest_month_with_categories(&self, _exclude: MonthId) -> BudgetResult<Option<MonthId>> {
            Ok(self.source)
        }

        fn categories_for_month(&self, _month_id: MonthId) -> BudgetResult<Vec<Category>> {
            Ok(self.prior.clone())
        }

        fn insert_category(&self, category: Category) -> BudgetResult<()> {
            if self.reject.contains(&category.name.as_str()) {
                return Err(BudgetError::Storage("disk full".into()));
            }
            self.inserted.borrow_mut().push(category);
            Ok(())
        }
    }

    struct BrokenStore;

    impl RolloverStore for BrokenStore {
        fn latest_month_with_categories(&self, _exclude: MonthId) -> BudgetResult<Option<MonthId>> {
            Err(BudgetError::Storage("unreadable".into()))
        }

        fn categories_for_month(&self, _month_id: MonthId) -> BudgetResult<Vec<Category>> {
            unreachable!()
        }

        fn insert_category(&self, _category: Category) -> BudgetResult<()> {
            unreachable!()
        }
    }

    fn with_actual(mut category: Category, cents: i64) -> Category {
        category.actual_amount = Money::from_cents(cents);
        category
    }

    #[test]
    fn test_fixed_carries_actual_variable_resets() {
        let source = MonthId::new();
        let target = MonthId::new();
        let store = MemoryStore {
            source: Some(source),
            prior: vec![
                with_actual(
                    Category::new("Rent", CategoryType::FixedExpense, Money::from_cents(500), source),
                    500,
                ),
                with_actual(
                    Category::new("Food", CategoryType::VariableExpense, Money::from_cents(400), source),
                    200,
                ),
            ],
            ..Default::default()
        };

        let report = MonthRolloverEngine::new(&store).rollover_into(target);
        assert_eq!(report.copied.len(), 2);
        assert_eq!(report.source_month, Some(source));

        let inserted = store.inserted.borrow();
        let rent = inserted.iter().find(|c| c.name == "Rent").unwrap();
        let food = inserted.iter().find(|c| c.name == "Food").unwrap();
        assert_eq!(rent.actual_amount.cents(), 500);
        assert_eq!(food.actual_amount.cents(), 0);
        assert_eq!(food.target_amount.cents(), 400);
        assert_eq!(rent.month_id, target);
    }

    #[test]
    fn test_income_and_discretionary_reset() {
        let source = MonthId::new();
        let store = MemoryStore {
            source: Some(source),
            prior: vec![
                with_actual(
                    Category::new("Salary", CategoryType::Income, Money::from_cents(300_000), source),
                    300_000,
                ),
                with_actual(
                    Category::new("Fun", CategoryType::DiscretionaryExpense, Money::from_cents(5_000), source),
                    4_000,
                ),
            ],
            ..Default::default()
        };

        MonthRolloverEngine::new(&store).rollover_into(MonthId::new());
        assert!(store
            .inserted
            .borrow()
            .iter()
            .all(|c| c.actual_amount.is_zero()));
    }

    #[test]
    fn test_no_prior_month_is_noop() {
        let store = MemoryStore::default();
        let report = MonthRolloverEngine::new(&store).rollover_into(MonthId::new());
        assert!(report.is_empty());
        assert_eq!(report.source_month, None);
        assert!(store.inserted.borrow().is_empty());
    }

    #[test]
    fn test_projects_are_skipped() {
        let source = MonthId::new();
        let mut tagged = Category::new("Kitchen", CategoryType::VariableExpense, Money::zero(), source);
        tagged.is_project = true;
        let roof = Category::new_project("Roof", Money::from_cents(1_000_000), source);
        let mut shingles = Category::new("Shingles", CategoryType::VariableExpense, Money::from_cents(40_000), source);
        shingles.parent_project_id = Some(roof.id);
        let store = MemoryStore {
            source: Some(source),
            prior: vec![
                roof,
                shingles,
                tagged,
                Category::new("Gas", CategoryType::VariableExpense, Money::from_cents(8_000), source),
            ],
            ..Default::default()
        };

        let report = MonthRolloverEngine::new(&store).rollover_into(MonthId::new());
        assert_eq!(report.skipped_projects, 3);
        assert_eq!(report.copied.len(), 1);
        assert_eq!(store.inserted.borrow()[0].name, "Gas");
    }

    #[test]
    fn test_failed_copy_does_not_stop_others() {
        let source = MonthId::new();
        let store = MemoryStore {
            source: Some(source),
            prior: vec![
                Category::new("Rent", CategoryType::FixedExpense, Money::from_cents(100), source),
                Category::new("Food", CategoryType::VariableExpense, Money::from_cents(100), source),
                Category::new("Gym", CategoryType::FixedExpense, Money::from_cents(100), source),
            ],
            reject: vec!["Food"],
            ..Default::default()
        };

        let report = MonthRolloverEngine::new(&store).rollover_into(MonthId::new());
        assert_eq!(report.failed, 1);
        assert_eq!(report.copied.len(), 2);
    }

    #[test]
    fn test_lookup_failure_is_swallowed() {
        let report = MonthRolloverEngine::new(&BrokenStore).rollover_into(MonthId::new());
        assert!(report.is_empty());
    }

    #[test]
    fn test_carry_forward_preserves_definition() {
        let source = MonthId::new();
        let target = MonthId::new();
        let mut prior = Category::new("Food", CategoryType::VariableExpense, Money::from_cents(40_000), source);
        prior.description = "Groceries".into();
        prior.display_order = 3;
        prior.rollover_enabled = true;
        prior.actual_amount = Money::from_cents(35_000);

        let now = Utc::now();
        let copy = carry_forward(&prior, target, now);

        assert_ne!(copy.id, prior.id);
        assert_eq!(copy.description, "Groceries");
        assert_eq!(copy.display_order, 3);
        assert!(copy.rollover_enabled);
        assert_eq!(copy.rollover_balance.cents(), 5_000);
        assert_eq!(copy.created_at, now);
        assert_eq!(copy.total_budgeted().cents(), 45_000);
    }

    #[test]
    fn test_overspent_rollover_is_negative() {
        let mut prior = Category::new("Fuel", CategoryType::VariableExpense, Money::from_cents(10_000), MonthId::new());
        prior.rollover_enabled = true;
        prior.actual_amount = Money::from_cents(12_500);

        let copy = carry_forward(&prior, MonthId::new(), Utc::now());
        assert_eq!(copy.rollover_balance.cents(), -2_500);
    }

    #[test]
    fn test_income_never_gets_rollover_balance() {
        let mut prior = Category::new("Salary", CategoryType::Income, Money::from_cents(10_000), MonthId::new());
        prior.rollover_enabled = true;

        let copy = carry_forward(&prior, MonthId::new(), Utc::now());
        assert!(copy.rollover_balance.is_zero());
    }

    #[test]
    fn test_storage_picks_latest_populated_month() {
        let temp_dir = TempDir::new().unwrap();
        let storage = Storage::new(MonthwisePaths::with_base_dir(temp_dir.path().to_path_buf())).unwrap();
        storage.load_all().unwrap();

        let jan = Month::new(YearMonth::new(2025, 1).unwrap());
        let feb = Month::new(YearMonth::new(2025, 2).unwrap());
        let mar = Month::new(YearMonth::new(2025, 3).unwrap());
        for m in [&jan, &feb, &mar] {
            storage.months.upsert(m.clone()).unwrap();
        }
        storage
            .categories
            .upsert(Category::new("Rent", CategoryType::FixedExpense, Money::from_cents(1), jan.id))
            .unwrap();

        assert_eq!(storage.latest_month_with_categories(mar.id).unwrap(), Some(jan.id));
        assert_eq!(storage.latest_month_with_categories(jan.id).unwrap(), None);

        let report = MonthRolloverEngine::new(&storage).rollover_into(mar.id);
        assert_eq!(report.copied.len(), 1);
        assert_eq!(storage.categories.active_for_month(mar.id).unwrap().len(), 1);
    }

    #[test]
    fn test_audit_failure_still_counts_copy() {
        let temp_dir = TempDir::new().unwrap();
        let storage = Storage::new(MonthwisePaths::with_base_dir(temp_dir.path().to_path_buf())).unwrap();
        storage.load_all().unwrap();

        let jan = Month::new(YearMonth::new(2025, 1).unwrap());
        let mar = Month::new(YearMonth::new(2025, 3).unwrap());
        for m in [&jan, &mar] {
            storage.months.upsert(m.clone()).unwrap();
        }
        storage
            .categories
            .upsert(Category::new("Rent", CategoryType::FixedExpense, Money::from_cents(1), jan.id))
            .unwrap();

        // A directory where the log file should be makes every append fail
        std::fs::create_dir_all(temp_dir.path().join("audit.log")).unwrap();

        let report = MonthRolloverEngine::new(&storage).rollover_into(mar.id);
        assert_eq!(report.copied.len(), 1);
        assert_eq!(report.failed, 0);

        let copied = storage.categories.active_for_month(mar.id).unwrap();
        assert_eq!(copied.len(), 1);
        assert_eq!(copied[0].name, "Rent");
        assert!(storage.audit().read_all().is_err());
    }
}
