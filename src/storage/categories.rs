//! Category repository for JSON storage
//!
//! Manages loading and saving categories to categories.json. Normal queries
//! only see active rows; soft-deleted categories stay on disk for history.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::BudgetError;
use crate::models::{Category, CategoryId, CategoryType, MonthId};

use super::file_io::{lock_error, read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct CategoryData {
    #[serde(default)]
    categories: Vec<Category>,
}

/// Repository for category persistence
pub struct CategoryRepository {
    path: PathBuf,
    categories: RwLock<HashMap<CategoryId, Category>>,
}

fn display_sort(list: &mut [Category]) {
    list.sort_by(|a, b| {
        a.display_order
            .cmp(&b.display_order)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
}

impl CategoryRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            categories: RwLock::new(HashMap::new()),
        }
    }

    pub fn load(&self) -> Result<(), BudgetError> {
        let file_data: CategoryData = read_json(&self.path)?;

        let mut categories = self.categories.write().map_err(lock_error)?;
        categories.clear();
        for category in file_data.categories {
            categories.insert(category.id, category);
        }

        Ok(())
    }

    pub fn save(&self) -> Result<(), BudgetError> {
        let categories = self.categories.read().map_err(lock_error)?;

        let mut list: Vec<_> = categories.values().cloned().collect();
        list.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        write_json_atomic(&self.path, &CategoryData { categories: list })
    }

    /// Get a category by ID, active or not
    pub fn get(&self, id: CategoryId) -> Result<Option<Category>, BudgetError> {
        let categories = self.categories.read().map_err(lock_error)?;
        Ok(categories.get(&id).cloned())
    }

    /// Active categories of a month in display order
    pub fn active_for_month(&self, month_id: MonthId) -> Result<Vec<Category>, BudgetError> {
        let categories = self.categories.read().map_err(lock_error)?;
        let mut list: Vec<_> = categories
            .values()
            .filter(|c| c.is_active && c.month_id == month_id)
            .cloned()
            .collect();
        display_sort(&mut list);
        Ok(list)
    }

    pub fn active_for_month_and_type(
        &self,
        month_id: MonthId,
        category_type: CategoryType,
    ) -> Result<Vec<Category>, BudgetError> {
        Ok(self
            .active_for_month(month_id)?
            .into_iter()
            .filter(|c| c.category_type == category_type)
            .collect())
    }

    /// Every category of a month, including soft-deleted ones
    pub fn all_for_month(&self, month_id: MonthId) -> Result<Vec<Category>, BudgetError> {
        let categories = self.categories.read().map_err(lock_error)?;
        let mut list: Vec<_> = categories
            .values()
            .filter(|c| c.month_id == month_id)
            .cloned()
            .collect();
        display_sort(&mut list);
        Ok(list)
    }

    /// Active projects and project lines from every month, in display order
    pub fn active_spanning(&self) -> Result<Vec<Category>, BudgetError> {
        let categories = self.categories.read().map_err(lock_error)?;
        let mut list: Vec<_> = categories
            .values()
            .filter(|c| c.is_active && c.spans_months())
            .cloned()
            .collect();
        display_sort(&mut list);
        Ok(list)
    }

    /// Ids of months that still have at least one active monthly category.
    /// Projects and their lines do not count.
    pub fn months_with_active_categories(&self) -> Result<HashSet<MonthId>, BudgetError> {
        let categories = self.categories.read().map_err(lock_error)?;
        Ok(categories
            .values()
            .filter(|c| c.is_active && !c.spans_months())
            .map(|c| c.month_id)
            .collect())
    }

    /// Insert or update a category
    pub fn upsert(&self, category: Category) -> Result<(), BudgetError> {
        let mut categories = self.categories.write().map_err(lock_error)?;
        categories.insert(category.id, category);
        Ok(())
    }

    /// Clear the active flag; returns false if the category was unknown or
    /// already inactive
    pub fn soft_delete(&self, id: CategoryId) -> Result<bool, BudgetError> {
        let mut categories = self.categories.write().map_err(lock_error)?;
        match categories.get_mut(&id) {
            Some(category) if category.is_active => {
                category.deactivate();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Soft delete every active category of a month
    pub fn soft_delete_for_month(&self, month_id: MonthId) -> Result<usize, BudgetError> {
        let mut categories = self.categories.write().map_err(lock_error)?;
        let mut count = 0;
        for category in categories
            .values_mut()
            .filter(|c| c.is_active && c.month_id == month_id)
        {
            category.deactivate();
            count += 1;
        }
        Ok(count)
    }

    /// Drop a single row; used to back out an insert that failed to save
    pub fn remove(&self, id: CategoryId) -> Result<bool, BudgetError> {
        let mut categories = self.categories.write().map_err(lock_error)?;
        Ok(categories.remove(&id).is_some())
    }

    /// Remove every category row of a month; returns the removed ids
    pub fn hard_delete_for_month(&self, month_id: MonthId) -> Result<Vec<CategoryId>, BudgetError> {
        let mut categories = self.categories.write().map_err(lock_error)?;
        let ids: Vec<_> = categories
            .values()
            .filter(|c| c.month_id == month_id)
            .map(|c| c.id)
            .collect();
        for id in &ids {
            categories.remove(id);
        }
        Ok(ids)
    }

    pub fn count(&self) -> Result<usize, BudgetError> {
        let categories = self.categories.read().map_err(lock_error)?;
        Ok(categories.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, CategoryRepository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = CategoryRepository::new(temp_dir.path().join("categories.json"));
        repo.load().unwrap();
        (temp_dir, repo)
    }

    fn category(name: &str, category_type: CategoryType, month_id: MonthId) -> Category {
        Category::new(name, category_type, Money::from_cents(10_000), month_id)
    }

    #[test]
    fn test_empty_load() {
        let (_temp_dir, repo) = create_test_repo();
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn test_active_for_month_scopes_and_orders() {
        let (_temp_dir, repo) = create_test_repo();
        let jan = MonthId::new();
        let feb = MonthId::new();

        let mut rent = category("Rent", CategoryType::FixedExpense, jan);
        rent.display_order = 1;
        let mut salary = category("Salary", CategoryType::Income, jan);
        salary.display_order = 0;
        repo.upsert(rent).unwrap();
        repo.upsert(salary).unwrap();
        repo.upsert(category("Fuel", CategoryType::VariableExpense, feb))
            .unwrap();

        let names: Vec<_> = repo
            .active_for_month(jan)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Salary", "Rent"]);

        let income = repo
            .active_for_month_and_type(jan, CategoryType::Income)
            .unwrap();
        assert_eq!(income.len(), 1);
    }

    #[test]
    fn test_soft_delete_hides_but_keeps_row() {
        let (_temp_dir, repo) = create_test_repo();
        let month = MonthId::new();
        let rent = category("Rent", CategoryType::FixedExpense, month);
        let id = rent.id;
        repo.upsert(rent).unwrap();

        assert!(repo.soft_delete(id).unwrap());
        assert!(!repo.soft_delete(id).unwrap());

        assert!(repo.active_for_month(month).unwrap().is_empty());
        assert_eq!(repo.all_for_month(month).unwrap().len(), 1);
        assert!(!repo.get(id).unwrap().unwrap().is_active);
        assert!(repo.months_with_active_categories().unwrap().is_empty());
    }

    #[test]
    fn test_spanning_rows_do_not_mark_month_populated() {
        let (_temp_dir, repo) = create_test_repo();
        let jan = MonthId::new();
        let feb = MonthId::new();
        let roof = Category::new_project("Roof", Money::from_cents(500_000), jan);
        let mut gutters = category("Gutters", CategoryType::VariableExpense, jan);
        gutters.parent_project_id = Some(roof.id);
        repo.upsert(roof).unwrap();
        repo.upsert(gutters).unwrap();
        repo.upsert(category("Rent", CategoryType::FixedExpense, feb))
            .unwrap();

        let spanning: Vec<_> = repo
            .active_spanning()
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(spanning, vec!["Gutters", "Roof"]);

        let populated = repo.months_with_active_categories().unwrap();
        assert!(populated.contains(&feb));
        assert!(!populated.contains(&jan));
    }

    #[test]
    fn test_month_level_deletes() {
        let (_temp_dir, repo) = create_test_repo();
        let jan = MonthId::new();
        let feb = MonthId::new();
        repo.upsert(category("Rent", CategoryType::FixedExpense, jan))
            .unwrap();
        repo.upsert(category("Food", CategoryType::VariableExpense, jan))
            .unwrap();
        repo.upsert(category("Rent", CategoryType::FixedExpense, feb))
            .unwrap();

        assert_eq!(repo.soft_delete_for_month(feb).unwrap(), 1);
        let removed = repo.hard_delete_for_month(jan).unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_save_and_reload() {
        let (temp_dir, repo) = create_test_repo();
        let month = MonthId::new();
        let rent = category("Rent", CategoryType::FixedExpense, month);
        let id = rent.id;
        repo.upsert(rent).unwrap();
        repo.save().unwrap();

        let repo2 = CategoryRepository::new(temp_dir.path().join("categories.json"));
        repo2.load().unwrap();
        let found = repo2.active_for_month(month).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, id);
    }
}
