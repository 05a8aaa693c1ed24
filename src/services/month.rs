//! Month service
//!
//! Creates months on demand, runs the one-time rollover for new months,
//! tracks the month selected for navigation and keeps each month's planned
//! totals in step with its categories.

use tracing::info;

use crate::audit::EntityType;
use crate::config::Settings;
use crate::error::{BudgetError, BudgetResult};
use crate::models::{Month, MonthId, YearMonth};
use crate::storage::Storage;

use super::aggregator::planned_totals;
use super::rollover::{MonthRolloverEngine, RolloverReport};

/// A month that was just created, with what rollover did to it
#[derive(Debug, Clone)]
pub struct CreatedMonth {
    pub month: Month,
    /// `None` when automatic rollover is turned off
    pub rollover: Option<RolloverReport>,
}

/// What a month deletion removed
#[derive(Debug, Clone)]
pub struct DeletedMonth {
    pub month: Month,
    pub categories_removed: usize,
    pub transactions_removed: usize,
}

/// Service for month management
pub struct MonthService<'a> {
    storage: &'a Storage,
    settings: &'a Settings,
}

impl<'a> MonthService<'a> {
    pub fn new(storage: &'a Storage, settings: &'a Settings) -> Self {
        Self { storage, settings }
    }

    pub fn get(&self, id: MonthId) -> BudgetResult<Option<Month>> {
        self.storage.months.get(id)
    }

    pub fn find_by_period(&self, period: YearMonth) -> BudgetResult<Option<Month>> {
        self.storage.months.find_by_period(period)
    }

    /// All active months, oldest first
    pub fn list(&self) -> BudgetResult<Vec<Month>> {
        self.storage.months.get_all_active()
    }

    /// Create a month that does not exist yet
    ///
    /// Rolls the latest populated month's categories into it when automatic
    /// rollover is enabled.
    pub fn create(&self, period: YearMonth) -> BudgetResult<CreatedMonth> {
        if self.storage.months.find_by_period(period)?.is_some() {
            return Err(BudgetError::Duplicate {
                entity_type: "Month",
                identifier: period.to_string(),
            });
        }

        let month = Month::new(period);
        self.storage.months.upsert(month.clone())?;
        self.storage.months.save()?;

        self.storage.log_create(
            EntityType::Month,
            month.id.to_string(),
            Some(month.name.clone()),
            &month,
        )?;

        info!(month = %month.name, "Created month");

        let rollover = if self.settings.auto_rollover {
            Some(MonthRolloverEngine::new(self.storage).rollover_into(month.id))
        } else {
            None
        };

        let month = refresh_month_totals(self.storage, month.id)?;
        Ok(CreatedMonth { month, rollover })
    }

    /// Fetch the month for a period, creating it if needed
    pub fn get_or_create(&self, period: YearMonth) -> BudgetResult<Month> {
        match self.storage.months.find_by_period(period)? {
            Some(month) => Ok(month),
            None => Ok(self.create(period)?.month),
        }
    }

    /// The month selected for navigation, defaulting to this calendar month
    pub fn current(&self) -> BudgetResult<Month> {
        if let Some(id) = self.storage.months.current()? {
            if let Some(month) = self.storage.months.get(id)?.filter(|m| m.is_active) {
                return Ok(month);
            }
        }

        self.set_current(YearMonth::current())
    }

    /// Make `period` the current month, creating it if needed
    pub fn set_current(&self, period: YearMonth) -> BudgetResult<Month> {
        let month = self.get_or_create(period)?;
        self.storage.months.set_current(month.id)?;
        self.storage.months.save()?;
        Ok(month)
    }

    /// Move the selection one month forward
    pub fn next(&self) -> BudgetResult<Month> {
        let current = self.current()?;
        self.set_current(current.period.next())
    }

    /// Move the selection one month back
    pub fn previous(&self) -> BudgetResult<Month> {
        let current = self.current()?;
        self.set_current(current.period.prev())
    }

    /// Recompute planned income and expenses from active categories
    pub fn refresh_totals(&self, month_id: MonthId) -> BudgetResult<Month> {
        refresh_month_totals(self.storage, month_id)
    }

    /// Remove a month together with its categories and their transactions
    pub fn delete_month(&self, month_id: MonthId) -> BudgetResult<DeletedMonth> {
        let month = self
            .storage
            .months
            .get(month_id)?
            .ok_or_else(|| BudgetError::month_not_found(month_id.to_string()))?;

        let category_ids = self.storage.categories.hard_delete_for_month(month_id)?;
        let transactions_removed = self
            .storage
            .transactions
            .hard_delete_for_categories(&category_ids)?;
        self.storage.months.hard_delete(month_id)?;

        self.storage.transactions.save()?;
        self.storage.categories.save()?;
        self.storage.months.save()?;

        self.storage.log_delete(
            EntityType::Month,
            month.id.to_string(),
            Some(month.name.clone()),
            &month,
        )?;

        info!(
            month = %month.name,
            categories = category_ids.len(),
            transactions = transactions_removed,
            "Deleted month"
        );

        Ok(DeletedMonth {
            month,
            categories_removed: category_ids.len(),
            transactions_removed,
        })
    }
}

/// Refresh a month's cached planned totals; saves only when they changed
pub(crate) fn refresh_month_totals(storage: &Storage, month_id: MonthId) -> BudgetResult<Month> {
    let mut month = storage
        .months
        .get(month_id)?
        .ok_or_else(|| BudgetError::month_not_found(month_id.to_string()))?;

    let categories = storage.categories.active_for_month(month_id)?;
    let (income, expenses) = planned_totals(&categories);

    if month.total_income != income || month.total_expenses != expenses {
        month.set_totals(income, expenses);
        storage.months.upsert(month.clone())?;
        storage.months.save()?;
    }

    Ok(month)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::MonthwisePaths;
    use crate::models::{Category, CategoryType, Money, Transaction};
    use chrono::Utc;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = MonthwisePaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    fn ym(year: i32, month: u32) -> YearMonth {
        YearMonth::new(year, month).unwrap()
    }

    fn add_category(storage: &Storage, month: MonthId, name: &str, t: CategoryType, target: i64) -> Category {
        let category = Category::new(name, t, Money::from_cents(target), month);
        storage.categories.upsert(category.clone()).unwrap();
        category
    }

    #[test]
    fn test_create_rejects_duplicate_period() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let service = MonthService::new(&storage, &settings);

        service.create(ym(2025, 1)).unwrap();
        let err = service.create(ym(2025, 1)).unwrap_err();
        assert!(matches!(err, BudgetError::Duplicate { .. }));
        assert_eq!(service.list().unwrap().len(), 1);
    }

    #[test]
    fn test_first_month_has_nothing_to_roll_over() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let service = MonthService::new(&storage, &settings);

        let created = service.create(ym(2025, 1)).unwrap();
        let report = created.rollover.unwrap();
        assert!(report.is_empty());
        assert!(storage
            .categories
            .active_for_month(created.month.id)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_create_rolls_over_and_totals() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let service = MonthService::new(&storage, &settings);

        let jan = service.create(ym(2025, 1)).unwrap().month;
        add_category(&storage, jan.id, "Salary", CategoryType::Income, 300_000);
        add_category(&storage, jan.id, "Rent", CategoryType::FixedExpense, 120_000);

        let feb = service.create(ym(2025, 2)).unwrap();
        assert_eq!(feb.rollover.unwrap().copied.len(), 2);
        assert_eq!(feb.month.total_income.cents(), 300_000);
        assert_eq!(feb.month.total_expenses.cents(), 120_000);
        assert_eq!(feb.month.remaining_budget().cents(), 180_000);
    }

    #[test]
    fn test_auto_rollover_disabled() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings {
            auto_rollover: false,
            ..Settings::default()
        };
        let service = MonthService::new(&storage, &settings);

        let jan = service.create(ym(2025, 1)).unwrap().month;
        add_category(&storage, jan.id, "Rent", CategoryType::FixedExpense, 1);

        let feb = service.create(ym(2025, 2)).unwrap();
        assert!(feb.rollover.is_none());
        assert!(storage.categories.active_for_month(feb.month.id).unwrap().is_empty());
    }

    #[test]
    fn test_get_or_create_does_not_roll_over_twice() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let service = MonthService::new(&storage, &settings);

        let jan = service.create(ym(2025, 1)).unwrap().month;
        add_category(&storage, jan.id, "Rent", CategoryType::FixedExpense, 1);

        let feb = service.get_or_create(ym(2025, 2)).unwrap();
        let again = service.get_or_create(ym(2025, 2)).unwrap();
        assert_eq!(feb.id, again.id);
        assert_eq!(storage.categories.active_for_month(feb.id).unwrap().len(), 1);
    }

    #[test]
    fn test_navigation() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let service = MonthService::new(&storage, &settings);

        let start = service.set_current(ym(2024, 12)).unwrap();
        assert_eq!(service.current().unwrap().id, start.id);

        let next = service.next().unwrap();
        assert_eq!(next.period, ym(2025, 1));
        assert_eq!(service.current().unwrap().id, next.id);

        let back = service.previous().unwrap();
        assert_eq!(back.id, start.id);
    }

    #[test]
    fn test_refresh_totals_ignores_inactive() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let service = MonthService::new(&storage, &settings);

        let month = service.create(ym(2025, 3)).unwrap().month;
        add_category(&storage, month.id, "Salary", CategoryType::Income, 50_000);
        let food = add_category(&storage, month.id, "Food", CategoryType::VariableExpense, 20_000);
        storage.categories.soft_delete(food.id).unwrap();

        let refreshed = service.refresh_totals(month.id).unwrap();
        assert_eq!(refreshed.total_income.cents(), 50_000);
        assert!(refreshed.total_expenses.is_zero());
    }

    #[test]
    fn test_delete_month_cascades() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let service = MonthService::new(&storage, &settings);

        let month = service.set_current(ym(2025, 5)).unwrap();
        let food = add_category(&storage, month.id, "Food", CategoryType::VariableExpense, 20_000);
        storage
            .transactions
            .upsert(Transaction::new(food.id, Money::from_cents(500), Utc::now()))
            .unwrap();

        let deleted = service.delete_month(month.id).unwrap();
        assert_eq!(deleted.categories_removed, 1);
        assert_eq!(deleted.transactions_removed, 1);
        assert!(service.get(month.id).unwrap().is_none());
        assert_eq!(storage.categories.count().unwrap(), 0);
        assert_eq!(storage.transactions.count().unwrap(), 0);
        assert_eq!(storage.months.current().unwrap(), None);

        assert!(service.delete_month(month.id).unwrap_err().is_not_found());
    }
}
