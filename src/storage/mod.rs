//! Storage layer for Monthwise
//!
//! JSON files with atomic writes, one repository per record type, and an
//! append-only audit log. `Storage` owns every repository and is passed by
//! reference to the services.
//!
//! Most categories belong to exactly one month. Projects and the lines filed
//! under them are standing rows: they keep the month they were opened in and
//! show up in every later month until the project is completed.
//! [`Storage::categories_in_month`] and [`Storage::transactions_in_month`]
//! build that per-month view.

pub mod categories;
pub mod file_io;
pub mod months;
pub mod transactions;

pub use categories::CategoryRepository;
pub use file_io::{read_json, write_json_atomic};
pub use months::MonthRepository;
pub use transactions::TransactionRepository;

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::audit::{AuditEntry, AuditLogger, EntityType};
use crate::config::paths::MonthwisePaths;
use crate::error::BudgetError;
use crate::models::{Category, CategoryId, Month, MonthId, Transaction, YearMonth};

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: MonthwisePaths,
    pub months: MonthRepository,
    pub categories: CategoryRepository,
    pub transactions: TransactionRepository,
    audit: AuditLogger,
}

impl Storage {
    /// Create a new Storage instance, creating the data directory if needed
    pub fn new(paths: MonthwisePaths) -> Result<Self, BudgetError> {
        paths.ensure_directories()?;

        Ok(Self {
            months: MonthRepository::new(paths.months_file()),
            categories: CategoryRepository::new(paths.categories_file()),
            transactions: TransactionRepository::new(paths.transactions_file()),
            audit: AuditLogger::new(paths.audit_log()),
            paths,
        })
    }

    pub fn paths(&self) -> &MonthwisePaths {
        &self.paths
    }

    /// Load all data from disk
    pub fn load_all(&self) -> Result<(), BudgetError> {
        self.months.load()?;
        self.categories.load()?;
        self.transactions.load()?;
        Ok(())
    }

    /// Save all data to disk
    pub fn save_all(&self) -> Result<(), BudgetError> {
        self.months.save()?;
        self.categories.save()?;
        self.transactions.save()?;
        Ok(())
    }

    /// Check if storage has been initialized (settings file written)
    pub fn is_initialized(&self) -> bool {
        self.paths.is_initialized()
    }

    /// Active categories visible in a month: its own rows, then projects
    /// and project lines opened in an earlier month whose project was still
    /// open when this month started
    pub fn categories_in_month(&self, month_id: MonthId) -> Result<Vec<Category>, BudgetError> {
        let month = self
            .months
            .get(month_id)?
            .ok_or_else(|| BudgetError::month_not_found(month_id.to_string()))?;

        let mut visible = self.categories.active_for_month(month_id)?;

        let opened: HashMap<MonthId, YearMonth> = self
            .months
            .get_all_active()?
            .into_iter()
            .map(|m| (m.id, m.period))
            .collect();
        let month_start = month.period.start_date();

        let standing = self.categories.active_spanning()?;
        let closed: HashSet<CategoryId> = standing
            .iter()
            .filter(|c| {
                c.project_completed_at
                    .is_some_and(|at| at.date_naive() < month_start)
            })
            .map(|c| c.id)
            .collect();

        visible.extend(standing.into_iter().filter(|c| {
            let opened_earlier = opened
                .get(&c.month_id)
                .is_some_and(|period| *period < month.period);
            let project_closed = closed.contains(&c.id)
                || c.parent_project_id.is_some_and(|p| closed.contains(&p));
            c.month_id != month_id && opened_earlier && !project_closed
        }));

        Ok(visible)
    }

    /// Active transactions of `categories` that count toward `month`.
    ///
    /// Monthly categories contribute every transaction. Standing rows span
    /// months, so only transactions dated inside `month` are kept.
    pub fn transactions_in_month(
        &self,
        month: &Month,
        categories: &[Category],
    ) -> Result<Vec<Transaction>, BudgetError> {
        let ids: Vec<_> = categories.iter().map(|c| c.id).collect();
        let spanning: HashSet<CategoryId> = categories
            .iter()
            .filter(|c| c.spans_months())
            .map(|c| c.id)
            .collect();

        Ok(self
            .transactions
            .active_for_categories(&ids)?
            .into_iter()
            .filter(|t| {
                !spanning.contains(&t.category_id)
                    || month.period.contains(t.occurred_at.date_naive())
            })
            .collect())
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    pub fn log_create<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> Result<(), BudgetError> {
        self.audit
            .log(&AuditEntry::create(entity_type, entity_id, entity_name, entity))
    }

    pub fn log_update<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        before: &T,
        after: &T,
    ) -> Result<(), BudgetError> {
        self.audit.log(&AuditEntry::update(
            entity_type,
            entity_id,
            entity_name,
            before,
            after,
        ))
    }

    pub fn log_delete<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> Result<(), BudgetError> {
        self.audit
            .log(&AuditEntry::delete(entity_type, entity_id, entity_name, entity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::Operation;
    use crate::models::{CategoryType, Money};
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = MonthwisePaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_storage_creation() {
        let (temp_dir, storage) = create_test_storage();
        assert!(temp_dir.path().join("data").exists());
        assert!(!storage.is_initialized());
    }

    #[test]
    fn test_save_all_round_trip() {
        let (temp_dir, storage) = create_test_storage();
        let month = Month::new(YearMonth::new(2025, 3).unwrap());
        storage.months.upsert(month.clone()).unwrap();
        storage.save_all().unwrap();

        let paths = MonthwisePaths::with_base_dir(temp_dir.path().to_path_buf());
        let reloaded = Storage::new(paths).unwrap();
        reloaded.load_all().unwrap();
        assert!(reloaded.months.get(month.id).unwrap().is_some());
    }

    #[test]
    fn test_audit_hooks_append() {
        let (_temp_dir, storage) = create_test_storage();
        let month = Month::new(YearMonth::new(2025, 3).unwrap());

        storage
            .log_create(EntityType::Month, month.id.to_string(), Some(month.name.clone()), &month)
            .unwrap();
        storage
            .log_delete(EntityType::Month, month.id.to_string(), None, &month)
            .unwrap();

        let entries = storage.audit().read_all().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].operation, Operation::Create);
        assert_eq!(entries[1].operation, Operation::Delete);
    }

    fn month(storage: &Storage, year: i32, month: u32) -> Month {
        let month = Month::new(YearMonth::new(year, month).unwrap());
        storage.months.upsert(month.clone()).unwrap();
        month
    }

    #[test]
    fn test_projects_stay_visible_in_later_months() {
        let (_temp_dir, storage) = create_test_storage();
        let dec = month(&storage, 2024, 12);
        let jan = month(&storage, 2025, 1);
        let feb = month(&storage, 2025, 2);

        let roof = Category::new_project("Roof", Money::from_cents(800_000), jan.id);
        let mut gutters = Category::new("Gutters", CategoryType::VariableExpense, Money::from_cents(60_000), jan.id);
        gutters.parent_project_id = Some(roof.id);
        storage.categories.upsert(roof).unwrap();
        storage.categories.upsert(gutters).unwrap();
        storage
            .categories
            .upsert(Category::new("Rent", CategoryType::FixedExpense, Money::from_cents(1), jan.id))
            .unwrap();

        let names = |m: &Month| -> Vec<String> {
            storage
                .categories_in_month(m.id)
                .unwrap()
                .into_iter()
                .map(|c| c.name)
                .collect()
        };
        assert!(names(&dec).is_empty());
        assert_eq!(names(&jan).len(), 3);
        assert_eq!(names(&feb), vec!["Gutters", "Roof"]);

        assert!(storage.categories_in_month(MonthId::new()).unwrap_err().is_not_found());
    }

    #[test]
    fn test_completed_project_drops_out_of_later_months() {
        let (_temp_dir, storage) = create_test_storage();
        let jan = month(&storage, 2025, 1);
        let feb = month(&storage, 2025, 2);
        let mar = month(&storage, 2025, 3);

        let mut roof = Category::new_project("Roof", Money::from_cents(800_000), jan.id);
        roof.project_completed_at = Some(Utc.with_ymd_and_hms(2025, 2, 14, 12, 0, 0).unwrap());
        let mut gutters = Category::new("Gutters", CategoryType::VariableExpense, Money::zero(), jan.id);
        gutters.parent_project_id = Some(roof.id);
        storage.categories.upsert(roof).unwrap();
        storage.categories.upsert(gutters).unwrap();

        assert_eq!(storage.categories_in_month(feb.id).unwrap().len(), 2);
        assert!(storage.categories_in_month(mar.id).unwrap().is_empty());
    }

    #[test]
    fn test_project_transactions_counted_in_their_own_month() {
        let (_temp_dir, storage) = create_test_storage();
        let jan = month(&storage, 2025, 1);
        let feb = month(&storage, 2025, 2);

        let roof = Category::new_project("Roof", Money::from_cents(800_000), jan.id);
        let rent = Category::new("Rent", CategoryType::FixedExpense, Money::from_cents(1), jan.id);
        storage.categories.upsert(roof.clone()).unwrap();
        storage.categories.upsert(rent.clone()).unwrap();

        let in_jan = Utc.with_ymd_and_hms(2025, 1, 20, 12, 0, 0).unwrap();
        let in_feb = Utc.with_ymd_and_hms(2025, 2, 3, 12, 0, 0).unwrap();
        for txn in [
            Transaction::new(roof.id, Money::from_cents(100_000), in_jan),
            Transaction::new(roof.id, Money::from_cents(40_000), in_feb),
            Transaction::new(rent.id, Money::from_cents(120_000), in_feb),
        ] {
            storage.transactions.upsert(txn).unwrap();
        }

        let jan_view = storage.categories_in_month(jan.id).unwrap();
        let jan_txns = storage.transactions_in_month(&jan, &jan_view).unwrap();
        let jan_total: i64 = jan_txns.iter().map(|t| t.amount.cents()).sum();
        assert_eq!(jan_total, 220_000);

        let feb_view = storage.categories_in_month(feb.id).unwrap();
        let feb_txns = storage.transactions_in_month(&feb, &feb_view).unwrap();
        assert_eq!(feb_txns.len(), 1);
        assert_eq!(feb_txns[0].amount.cents(), 40_000);
    }
}
