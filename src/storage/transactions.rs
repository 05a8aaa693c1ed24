//! Transaction repository for JSON storage
//!
//! Manages loading and saving transactions to transactions.json, with a
//! category index so per-category sums don't scan every row.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::BudgetError;
use crate::models::{CategoryId, Money, Transaction, TransactionId};

use super::file_io::{lock_error, read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct TransactionData {
    #[serde(default)]
    transactions: Vec<Transaction>,
}

/// Repository for transaction persistence with a category index
pub struct TransactionRepository {
    path: PathBuf,
    data: RwLock<HashMap<TransactionId, Transaction>>,
    /// Index: category_id -> transaction_ids
    by_category: RwLock<HashMap<CategoryId, Vec<TransactionId>>>,
}

fn newest_first(list: &mut [Transaction]) {
    list.sort_by(|a, b| {
        b.occurred_at
            .cmp(&a.occurred_at)
            .then(b.created_at.cmp(&a.created_at))
    });
}

impl TransactionRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
            by_category: RwLock::new(HashMap::new()),
        }
    }

    /// Load transactions from disk and rebuild the index
    pub fn load(&self) -> Result<(), BudgetError> {
        let file_data: TransactionData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(lock_error)?;
        let mut by_category = self.by_category.write().map_err(lock_error)?;

        data.clear();
        by_category.clear();

        for txn in file_data.transactions {
            by_category.entry(txn.category_id).or_default().push(txn.id);
            data.insert(txn.id, txn);
        }

        Ok(())
    }

    pub fn save(&self) -> Result<(), BudgetError> {
        let data = self.data.read().map_err(lock_error)?;

        let mut transactions: Vec<_> = data.values().cloned().collect();
        newest_first(&mut transactions);

        write_json_atomic(&self.path, &TransactionData { transactions })
    }

    pub fn get(&self, id: TransactionId) -> Result<Option<Transaction>, BudgetError> {
        let data = self.data.read().map_err(lock_error)?;
        Ok(data.get(&id).cloned())
    }

    /// Every transaction of a category, including soft-deleted ones
    pub fn all_for_category(&self, category_id: CategoryId) -> Result<Vec<Transaction>, BudgetError> {
        let data = self.data.read().map_err(lock_error)?;
        let by_category = self.by_category.read().map_err(lock_error)?;

        let ids = by_category
            .get(&category_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[]);
        let mut transactions: Vec<_> = ids.iter().filter_map(|id| data.get(id).cloned()).collect();
        newest_first(&mut transactions);
        Ok(transactions)
    }

    /// Active transactions of a category, newest first
    pub fn active_for_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Transaction>, BudgetError> {
        Ok(self
            .all_for_category(category_id)?
            .into_iter()
            .filter(|t| t.is_active)
            .collect())
    }

    /// Active transactions across a set of categories, newest first
    pub fn active_for_categories(
        &self,
        category_ids: &[CategoryId],
    ) -> Result<Vec<Transaction>, BudgetError> {
        let data = self.data.read().map_err(lock_error)?;
        let by_category = self.by_category.read().map_err(lock_error)?;

        let mut transactions: Vec<_> = category_ids
            .iter()
            .filter_map(|cat_id| by_category.get(cat_id))
            .flatten()
            .filter_map(|id| data.get(id))
            .filter(|t| t.is_active)
            .cloned()
            .collect();
        newest_first(&mut transactions);
        Ok(transactions)
    }

    /// Sum of active transaction amounts for a category
    pub fn sum_for_category(&self, category_id: CategoryId) -> Result<Money, BudgetError> {
        let data = self.data.read().map_err(lock_error)?;
        let by_category = self.by_category.read().map_err(lock_error)?;

        Ok(by_category
            .get(&category_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| data.get(id))
                    .filter(|t| t.is_active)
                    .map(|t| t.amount)
                    .sum()
            })
            .unwrap_or_default())
    }

    /// Insert or update a transaction, moving it between index buckets if
    /// its category changed
    pub fn upsert(&self, txn: Transaction) -> Result<(), BudgetError> {
        let mut data = self.data.write().map_err(lock_error)?;
        let mut by_category = self.by_category.write().map_err(lock_error)?;

        if let Some(old) = data.get(&txn.id) {
            if let Some(ids) = by_category.get_mut(&old.category_id) {
                ids.retain(|&id| id != txn.id);
            }
        }

        by_category.entry(txn.category_id).or_default().push(txn.id);
        data.insert(txn.id, txn);
        Ok(())
    }

    /// Clear the active flag; false if unknown or already inactive
    pub fn soft_delete(&self, id: TransactionId) -> Result<bool, BudgetError> {
        let mut data = self.data.write().map_err(lock_error)?;
        match data.get_mut(&id) {
            Some(txn) if txn.is_active => {
                txn.deactivate();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Soft delete every active transaction of the given categories
    pub fn soft_delete_for_categories(
        &self,
        category_ids: &[CategoryId],
    ) -> Result<usize, BudgetError> {
        let mut data = self.data.write().map_err(lock_error)?;
        let by_category = self.by_category.read().map_err(lock_error)?;

        let mut count = 0;
        for id in category_ids
            .iter()
            .filter_map(|cat_id| by_category.get(cat_id))
            .flatten()
        {
            if let Some(txn) = data.get_mut(id) {
                if txn.is_active {
                    txn.deactivate();
                    count += 1;
                }
            }
        }
        Ok(count)
    }

    /// Remove every transaction row of the given categories
    pub fn hard_delete_for_categories(
        &self,
        category_ids: &[CategoryId],
    ) -> Result<usize, BudgetError> {
        let mut data = self.data.write().map_err(lock_error)?;
        let mut by_category = self.by_category.write().map_err(lock_error)?;

        let mut count = 0;
        for cat_id in category_ids {
            if let Some(ids) = by_category.remove(cat_id) {
                for id in ids {
                    if data.remove(&id).is_some() {
                        count += 1;
                    }
                }
            }
        }
        Ok(count)
    }

    pub fn count(&self) -> Result<usize, BudgetError> {
        let data = self.data.read().map_err(lock_error)?;
        Ok(data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, TransactionRepository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = TransactionRepository::new(temp_dir.path().join("transactions.json"));
        repo.load().unwrap();
        (temp_dir, repo)
    }

    fn txn(category_id: CategoryId, cents: i64) -> Transaction {
        Transaction::new(category_id, Money::from_cents(cents), Utc::now())
    }

    #[test]
    fn test_sum_ignores_inactive() {
        let (_temp_dir, repo) = create_test_repo();
        let cat = CategoryId::new();

        let first = txn(cat, 1_000);
        let second = txn(cat, 2_500);
        let second_id = second.id;
        repo.upsert(first).unwrap();
        repo.upsert(second).unwrap();
        repo.upsert(txn(CategoryId::new(), 9_999)).unwrap();

        assert_eq!(repo.sum_for_category(cat).unwrap().cents(), 3_500);

        assert!(repo.soft_delete(second_id).unwrap());
        assert_eq!(repo.sum_for_category(cat).unwrap().cents(), 1_000);
        assert_eq!(repo.active_for_category(cat).unwrap().len(), 1);
        assert_eq!(repo.all_for_category(cat).unwrap().len(), 2);
    }

    #[test]
    fn test_upsert_moves_index_bucket() {
        let (_temp_dir, repo) = create_test_repo();
        let from = CategoryId::new();
        let to = CategoryId::new();

        let mut t = txn(from, 700);
        repo.upsert(t.clone()).unwrap();
        t.category_id = to;
        repo.upsert(t).unwrap();

        assert!(repo.active_for_category(from).unwrap().is_empty());
        assert_eq!(repo.sum_for_category(to).unwrap().cents(), 700);
    }

    #[test]
    fn test_newest_first() {
        let (_temp_dir, repo) = create_test_repo();
        let cat = CategoryId::new();
        let now = Utc::now();
        repo.upsert(Transaction::new(cat, Money::from_cents(1), now - Duration::days(3)))
            .unwrap();
        repo.upsert(Transaction::new(cat, Money::from_cents(2), now))
            .unwrap();

        let list = repo.active_for_categories(&[cat]).unwrap();
        assert_eq!(list[0].amount.cents(), 2);
        assert_eq!(list[1].amount.cents(), 1);
    }

    #[test]
    fn test_bulk_deletes() {
        let (_temp_dir, repo) = create_test_repo();
        let a = CategoryId::new();
        let b = CategoryId::new();
        repo.upsert(txn(a, 100)).unwrap();
        repo.upsert(txn(a, 200)).unwrap();
        repo.upsert(txn(b, 300)).unwrap();

        assert_eq!(repo.soft_delete_for_categories(&[a]).unwrap(), 2);
        assert_eq!(repo.sum_for_category(a).unwrap(), Money::zero());

        assert_eq!(repo.hard_delete_for_categories(&[a, b]).unwrap(), 3);
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn test_save_and_reload() {
        let (temp_dir, repo) = create_test_repo();
        let cat = CategoryId::new();
        let t = txn(cat, 4_200);
        let id = t.id;
        repo.upsert(t).unwrap();
        repo.save().unwrap();

        let repo2 = TransactionRepository::new(temp_dir.path().join("transactions.json"));
        repo2.load().unwrap();
        assert_eq!(repo2.get(id).unwrap().unwrap().amount.cents(), 4_200);
        assert_eq!(repo2.sum_for_category(cat).unwrap().cents(), 4_200);
    }
}
