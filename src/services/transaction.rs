//! Transaction service
//!
//! Records money earned or spent against a category. After every change the
//! affected categories' actual amounts are recomputed from their active
//! transactions, so `actual_amount` always equals that sum.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::audit::EntityType;
use crate::config::Settings;
use crate::error::{BudgetError, BudgetResult};
use crate::models::{Category, CategoryId, Money, MonthId, Transaction, TransactionId};
use crate::storage::Storage;

use super::category::CategoryService;
use super::month::refresh_month_totals;

/// Input for a new transaction
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub category_id: CategoryId,
    pub amount: Money,
    pub description: Option<String>,
    /// Defaults to now
    pub occurred_at: Option<DateTime<Utc>>,
}

impl NewTransaction {
    pub fn new(category_id: CategoryId, amount: Money) -> Self {
        Self {
            category_id,
            amount,
            description: None,
            occurred_at: None,
        }
    }
}

/// Fields to change on an existing transaction
#[derive(Debug, Clone, Default)]
pub struct TransactionUpdate {
    pub category_id: Option<CategoryId>,
    pub amount: Option<Money>,
    pub description: Option<String>,
    pub occurred_at: Option<DateTime<Utc>>,
}

/// Service for transaction management
pub struct TransactionService<'a> {
    storage: &'a Storage,
    settings: &'a Settings,
}

impl<'a> TransactionService<'a> {
    pub fn new(storage: &'a Storage, settings: &'a Settings) -> Self {
        Self { storage, settings }
    }

    pub fn create(&self, input: NewTransaction) -> BudgetResult<Transaction> {
        let category = self.active_category(input.category_id)?;

        let mut txn = Transaction::new(
            category.id,
            input.amount,
            input.occurred_at.unwrap_or_else(Utc::now),
        );
        if let Some(description) = input.description {
            txn.description = description.trim().to_string();
        }

        txn.validate(self.settings.max_transaction_amount)
            .map_err(|e| BudgetError::Validation(e.to_string()))?;

        self.storage.transactions.upsert(txn.clone())?;
        self.storage.transactions.save()?;

        self.storage.log_create(
            EntityType::Transaction,
            txn.id.to_string(),
            Some(describe(&txn, &category)),
            &txn,
        )?;

        info!(category = %category.name, amount = %txn.amount, "Recorded transaction");
        self.settle(&[category.id])?;
        Ok(txn)
    }

    pub fn get(&self, id: TransactionId) -> BudgetResult<Option<Transaction>> {
        self.storage.transactions.get(id)
    }

    /// Active transactions of a category, newest first
    pub fn list_for_category(&self, category_id: CategoryId) -> BudgetResult<Vec<Transaction>> {
        self.storage.transactions.active_for_category(category_id)
    }

    pub fn list_for_categories(&self, category_ids: &[CategoryId]) -> BudgetResult<Vec<Transaction>> {
        self.storage.transactions.active_for_categories(category_ids)
    }

    /// Active transactions counted in a month, newest first. Project
    /// spending shows up in the month it is dated in.
    pub fn list_for_month(&self, month_id: MonthId) -> BudgetResult<Vec<Transaction>> {
        let month = self
            .storage
            .months
            .get(month_id)?
            .ok_or_else(|| BudgetError::month_not_found(month_id.to_string()))?;
        let categories = self.storage.categories_in_month(month_id)?;
        self.storage.transactions_in_month(&month, &categories)
    }

    pub fn sum_for_category(&self, category_id: CategoryId) -> BudgetResult<Money> {
        self.storage.transactions.sum_for_category(category_id)
    }

    /// Find an active transaction of a month by full or short id
    pub fn find_in_month(&self, month_id: MonthId, identifier: &str) -> BudgetResult<Option<Transaction>> {
        let transactions = self.list_for_month(month_id)?;

        if let Ok(id) = identifier.parse::<TransactionId>() {
            return Ok(transactions.into_iter().find(|t| t.id == id));
        }

        let mut matches = transactions.into_iter().filter(|t| t.id.matches(identifier));
        match (matches.next(), matches.next()) {
            (Some(txn), None) => Ok(Some(txn)),
            (Some(_), Some(_)) => Err(BudgetError::Validation(format!(
                "'{}' matches more than one transaction",
                identifier
            ))),
            _ => Ok(None),
        }
    }

    pub fn update(&self, id: TransactionId, update: TransactionUpdate) -> BudgetResult<Transaction> {
        let mut txn = self.active_transaction(id)?;
        let before = txn.clone();

        if let Some(category_id) = update.category_id {
            self.active_category(category_id)?;
            txn.category_id = category_id;
        }

        if let Some(amount) = update.amount {
            txn.amount = amount;
        }

        if let Some(description) = update.description {
            txn.description = description.trim().to_string();
        }

        if let Some(occurred_at) = update.occurred_at {
            txn.occurred_at = occurred_at;
        }

        txn.updated_at = Utc::now();
        txn.validate(self.settings.max_transaction_amount)
            .map_err(|e| BudgetError::Validation(e.to_string()))?;

        self.storage.transactions.upsert(txn.clone())?;
        self.storage.transactions.save()?;

        let label = self
            .storage
            .categories
            .get(txn.category_id)?
            .map(|category| describe(&txn, &category));
        self.storage.log_update(
            EntityType::Transaction,
            txn.id.to_string(),
            label,
            &before,
            &txn,
        )?;

        if before.category_id == txn.category_id {
            self.settle(&[txn.category_id])?;
        } else {
            self.settle(&[before.category_id, txn.category_id])?;
        }
        Ok(txn)
    }

    /// Soft delete
    pub fn delete(&self, id: TransactionId) -> BudgetResult<Transaction> {
        let txn = self.active_transaction(id)?;

        self.storage.transactions.soft_delete(id)?;
        self.storage.transactions.save()?;

        self.storage
            .log_delete(EntityType::Transaction, txn.id.to_string(), None, &txn)?;

        self.settle(&[txn.category_id])?;
        Ok(txn)
    }

    /// Recompute actual amounts and refresh the owning months
    fn settle(&self, category_ids: &[CategoryId]) -> BudgetResult<()> {
        let categories = CategoryService::new(self.storage);
        for &id in category_ids {
            let category = categories.recalculate_actual(id)?;
            refresh_month_totals(self.storage, category.month_id)?;
        }
        Ok(())
    }

    fn active_category(&self, id: CategoryId) -> BudgetResult<Category> {
        self.storage
            .categories
            .get(id)?
            .filter(|c| c.is_active)
            .ok_or_else(|| BudgetError::category_not_found(id.to_string()))
    }

    fn active_transaction(&self, id: TransactionId) -> BudgetResult<Transaction> {
        self.storage
            .transactions
            .get(id)?
            .filter(|t| t.is_active)
            .ok_or_else(|| BudgetError::transaction_not_found(id.to_string()))
    }
}

fn describe(txn: &Transaction, category: &Category) -> String {
    if txn.description.is_empty() {
        format!("{} {}", category.name, txn.amount)
    } else {
        format!("{} {} ({})", category.name, txn.amount, txn.description)
    }
}
