//! Category service
//!
//! Business logic for a month's budget lines: creation, editing, soft
//! deletion, ordering, and the project lifecycle. Every change that affects
//! planned amounts refreshes the owning month's totals.

use chrono::Utc;
use tracing::{debug, info};

use crate::audit::EntityType;
use crate::error::{BudgetError, BudgetResult};
use crate::models::{Category, CategoryId, CategoryType, Money, MonthId};
use crate::storage::Storage;

use super::month::refresh_month_totals;

/// Input for a new ordinary category
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub month_id: MonthId,
    pub name: String,
    pub category_type: CategoryType,
    pub target_amount: Money,
    pub description: Option<String>,
    pub rollover_enabled: bool,
    /// Group this line under an existing project
    pub parent_project_id: Option<CategoryId>,
}

impl NewCategory {
    pub fn new(
        month_id: MonthId,
        name: impl Into<String>,
        category_type: CategoryType,
        target_amount: Money,
    ) -> Self {
        Self {
            month_id,
            name: name.into(),
            category_type,
            target_amount,
            description: None,
            rollover_enabled: false,
            parent_project_id: None,
        }
    }
}

/// Input for a new project
#[derive(Debug, Clone)]
pub struct NewProject {
    pub month_id: MonthId,
    pub name: String,
    pub total_budget: Money,
    pub description: Option<String>,
}

/// Fields to change on an existing category; `None` leaves a field alone
#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub category_type: Option<CategoryType>,
    pub target_amount: Option<Money>,
    pub description: Option<String>,
    pub rollover_enabled: Option<bool>,
    pub project_total_budget: Option<Money>,
}

/// Service for category management
pub struct CategoryService<'a> {
    storage: &'a Storage,
}

impl<'a> CategoryService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create an ordinary (non-project) category in a month
    pub fn create_category(&self, input: NewCategory) -> BudgetResult<Category> {
        if input.category_type == CategoryType::ProjectExpense {
            return Err(BudgetError::Validation(
                "Project categories are created with create_project".into(),
            ));
        }

        self.require_month(input.month_id)?;
        let name = input.name.trim().to_string();
        self.ensure_unique_name(input.month_id, &name, None)?;

        if let Some(parent_id) = input.parent_project_id {
            let parent = self.get_active(parent_id)?;
            if !parent.is_project_like() {
                return Err(BudgetError::Validation(format!(
                    "'{}' is not a project",
                    parent.name
                )));
            }
        }

        let mut category = Category::new(name, input.category_type, input.target_amount, input.month_id);
        category.description = input.description.unwrap_or_default();
        category.rollover_enabled = input.rollover_enabled;
        category.parent_project_id = input.parent_project_id;
        category.display_order = self.next_display_order(input.month_id)?;

        self.insert(category)
    }

    /// Create a project whose budget spans several months
    pub fn create_project(&self, input: NewProject) -> BudgetResult<Category> {
        self.require_month(input.month_id)?;
        let name = input.name.trim().to_string();
        self.ensure_unique_name(input.month_id, &name, None)?;

        let mut category = Category::new_project(name, input.total_budget, input.month_id);
        category.description = input.description.unwrap_or_default();
        category.display_order = self.next_display_order(input.month_id)?;

        self.insert(category)
    }

    pub fn get(&self, id: CategoryId) -> BudgetResult<Option<Category>> {
        self.storage.categories.get(id)
    }

    /// Find a category visible in a month by name, full id or short id
    pub fn find_in_month(&self, month_id: MonthId, identifier: &str) -> BudgetResult<Option<Category>> {
        let visible = self.storage.categories_in_month(month_id)?;

        let wanted = identifier.trim().to_lowercase();
        if let Some(category) = visible.iter().find(|c| c.name.to_lowercase() == wanted) {
            return Ok(Some(category.clone()));
        }

        if let Ok(id) = identifier.parse::<CategoryId>() {
            return Ok(visible.into_iter().find(|c| c.id == id));
        }

        let mut matches = visible.into_iter().filter(|c| c.id.matches(identifier));
        match (matches.next(), matches.next()) {
            (Some(category), None) => Ok(Some(category)),
            (Some(_), Some(_)) => Err(BudgetError::Validation(format!(
                "'{}' matches more than one category",
                identifier
            ))),
            _ => Ok(None),
        }
    }

    /// Categories shown in a month: its own in display order, then open
    /// projects and project lines carried from earlier months
    pub fn list_for_month(&self, month_id: MonthId) -> BudgetResult<Vec<Category>> {
        self.storage.categories_in_month(month_id)
    }

    pub fn list_for_month_and_type(
        &self,
        month_id: MonthId,
        category_type: CategoryType,
    ) -> BudgetResult<Vec<Category>> {
        let mut list = self
            .storage
            .categories
            .active_for_month_and_type(month_id, category_type)?;
        list.extend(
            self.list_for_month(month_id)?
                .into_iter()
                .filter(|c| c.month_id != month_id && c.category_type == category_type),
        );
        Ok(list)
    }

    pub fn update_category(&self, id: CategoryId, update: CategoryUpdate) -> BudgetResult<Category> {
        let mut category = self.get_active(id)?;
        let before = category.clone();

        if let Some(name) = update.name {
            let name = name.trim().to_string();
            self.ensure_unique_name(category.month_id, &name, Some(id))?;
            category.name = name;
        }

        if let Some(category_type) = update.category_type {
            let to_project = category_type == CategoryType::ProjectExpense;
            if to_project != category.is_project_like() {
                return Err(BudgetError::Validation(
                    "A category cannot be converted to or from a project".into(),
                ));
            }
            category.category_type = category_type;
        }

        if let Some(target) = update.target_amount {
            category.target_amount = target;
        }

        if let Some(description) = update.description {
            category.description = description;
        }

        if let Some(rollover) = update.rollover_enabled {
            category.rollover_enabled = rollover;
        }

        if let Some(budget) = update.project_total_budget {
            if !category.is_project {
                return Err(BudgetError::Validation(format!(
                    "'{}' is not a project",
                    category.name
                )));
            }
            category.project_total_budget = budget;
        }

        category.updated_at = Utc::now();
        category
            .validate()
            .map_err(|e| BudgetError::Validation(e.to_string()))?;

        self.storage.categories.upsert(category.clone())?;
        self.storage.categories.save()?;

        self.storage.log_update(
            EntityType::Category,
            category.id.to_string(),
            Some(category.name.clone()),
            &before,
            &category,
        )?;

        refresh_month_totals(self.storage, category.month_id)?;
        Ok(category)
    }

    /// Soft delete; the category's transactions stay queryable
    pub fn delete_category(&self, id: CategoryId) -> BudgetResult<Category> {
        let category = self.get_active(id)?;

        self.storage.categories.soft_delete(id)?;
        self.storage.categories.save()?;

        self.storage.log_delete(
            EntityType::Category,
            category.id.to_string(),
            Some(category.name.clone()),
            &category,
        )?;

        info!(category = %category.name, "Deleted category");
        refresh_month_totals(self.storage, category.month_id)?;
        Ok(category)
    }

    /// Soft delete a category and all of its active transactions; returns
    /// the number of transactions removed
    pub fn delete_category_cascade(&self, id: CategoryId) -> BudgetResult<(Category, usize)> {
        let category = self.delete_category(id)?;

        let removed = self.storage.transactions.soft_delete_for_categories(&[id])?;
        if removed > 0 {
            self.storage.transactions.save()?;
        }

        debug!(category = %category.name, transactions = removed, "Cascaded category delete");
        Ok((category, removed))
    }

    /// Assign display order from the position of each id in `ordered`
    pub fn reorder(&self, month_id: MonthId, ordered: &[CategoryId]) -> BudgetResult<Vec<Category>> {
        let active = self.storage.categories.active_for_month(month_id)?;

        for (position, id) in ordered.iter().enumerate() {
            let mut category = active
                .iter()
                .find(|c| c.id == *id)
                .cloned()
                .ok_or_else(|| BudgetError::category_not_found(id.to_string()))?;

            if category.display_order != position as i32 {
                category.display_order = position as i32;
                category.updated_at = Utc::now();
                self.storage.categories.upsert(category)?;
            }
        }

        self.storage.categories.save()?;
        self.storage.categories.active_for_month(month_id)
    }

    pub fn complete_project(&self, id: CategoryId) -> BudgetResult<Category> {
        let mut category = self.get_project(id)?;
        if category.is_project_complete() {
            return Err(BudgetError::Validation(format!(
                "Project '{}' is already complete",
                category.name
            )));
        }

        let before = category.clone();
        category.mark_complete(Utc::now());
        self.save_update(&before, &category)?;

        info!(project = %category.name, "Completed project");
        Ok(category)
    }

    pub fn reopen_project(&self, id: CategoryId) -> BudgetResult<Category> {
        let mut category = self.get_project(id)?;
        if !category.is_project_complete() {
            return Err(BudgetError::Validation(format!(
                "Project '{}' is not complete",
                category.name
            )));
        }

        let before = category.clone();
        category.reopen();
        self.save_update(&before, &category)?;
        Ok(category)
    }

    /// Set `actual_amount` to the sum of the category's active transactions
    pub fn recalculate_actual(&self, id: CategoryId) -> BudgetResult<Category> {
        let mut category = self
            .storage
            .categories
            .get(id)?
            .ok_or_else(|| BudgetError::category_not_found(id.to_string()))?;

        let actual = self.storage.transactions.sum_for_category(id)?;
        if category.actual_amount != actual {
            debug!(
                category = %category.name,
                from = %category.actual_amount,
                to = %actual,
                "Recalculated actual"
            );
            category.set_actual(actual);
            self.storage.categories.upsert(category.clone())?;
            self.storage.categories.save()?;
        }

        Ok(category)
    }

    fn insert(&self, category: Category) -> BudgetResult<Category> {
        category
            .validate()
            .map_err(|e| BudgetError::Validation(e.to_string()))?;

        self.storage.categories.upsert(category.clone())?;
        self.storage.categories.save()?;

        self.storage.log_create(
            EntityType::Category,
            category.id.to_string(),
            Some(category.name.clone()),
            &category,
        )?;

        info!(category = %category.name, kind = %category.category_type, "Created category");
        refresh_month_totals(self.storage, category.month_id)?;
        Ok(category)
    }

    fn save_update(&self, before: &Category, after: &Category) -> BudgetResult<()> {
        self.storage.categories.upsert(after.clone())?;
        self.storage.categories.save()?;
        self.storage.log_update(
            EntityType::Category,
            after.id.to_string(),
            Some(after.name.clone()),
            before,
            after,
        )
    }

    fn require_month(&self, month_id: MonthId) -> BudgetResult<()> {
        match self.storage.months.get(month_id)? {
            Some(month) if month.is_active => Ok(()),
            _ => Err(BudgetError::month_not_found(month_id.to_string())),
        }
    }

    fn get_active(&self, id: CategoryId) -> BudgetResult<Category> {
        self.storage
            .categories
            .get(id)?
            .filter(|c| c.is_active)
            .ok_or_else(|| BudgetError::category_not_found(id.to_string()))
    }

    fn get_project(&self, id: CategoryId) -> BudgetResult<Category> {
        let category = self.get_active(id)?;
        if !category.is_project_like() {
            return Err(BudgetError::Validation(format!(
                "'{}' is not a project",
                category.name
            )));
        }
        Ok(category)
    }

    fn ensure_unique_name(
        &self,
        month_id: MonthId,
        name: &str,
        except: Option<CategoryId>,
    ) -> BudgetResult<()> {
        let wanted = name.trim().to_lowercase();
        let clash = self
            .storage
            .categories_in_month(month_id)?
            .into_iter()
            .find(|c| c.name.to_lowercase() == wanted);
        match clash {
            Some(existing) if Some(existing.id) != except => Err(BudgetError::Duplicate {
                entity_type: "Category",
                identifier: name.to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn next_display_order(&self, month_id: MonthId) -> BudgetResult<i32> {
        Ok(self
            .storage
            .categories
            .active_for_month(month_id)?
            .iter()
            .map(|c| c.display_order)
            .max()
            .map_or(0, |max| max + 1))
    }
}
