//! Month repository for JSON storage
//!
//! Persists months and the id of the month currently selected for
//! navigation to `months.json`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::BudgetError;
use crate::models::{Month, MonthId, YearMonth};

use super::file_io::{lock_error, read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct MonthData {
    #[serde(default)]
    months: Vec<Month>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    current: Option<MonthId>,
}

/// Repository for month persistence
pub struct MonthRepository {
    path: PathBuf,
    months: RwLock<HashMap<MonthId, Month>>,
    current: RwLock<Option<MonthId>>,
}

impl MonthRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            months: RwLock::new(HashMap::new()),
            current: RwLock::new(None),
        }
    }

    pub fn load(&self) -> Result<(), BudgetError> {
        let file_data: MonthData = read_json(&self.path)?;

        let mut months = self.months.write().map_err(lock_error)?;
        let mut current = self.current.write().map_err(lock_error)?;

        months.clear();
        for month in file_data.months {
            months.insert(month.id, month);
        }
        *current = file_data.current.filter(|id| months.contains_key(id));

        Ok(())
    }

    pub fn save(&self) -> Result<(), BudgetError> {
        let months = self.months.read().map_err(lock_error)?;
        let current = self.current.read().map_err(lock_error)?;

        let mut list: Vec<_> = months.values().cloned().collect();
        list.sort_by_key(|m| m.period);

        let file_data = MonthData {
            months: list,
            current: *current,
        };
        write_json_atomic(&self.path, &file_data)
    }

    pub fn get(&self, id: MonthId) -> Result<Option<Month>, BudgetError> {
        let months = self.months.read().map_err(lock_error)?;
        Ok(months.get(&id).cloned())
    }

    /// Find the active month for a calendar (year, month)
    pub fn find_by_period(&self, period: YearMonth) -> Result<Option<Month>, BudgetError> {
        let months = self.months.read().map_err(lock_error)?;
        Ok(months
            .values()
            .find(|m| m.is_active && m.period == period)
            .cloned())
    }

    /// All active months, oldest first
    pub fn get_all_active(&self) -> Result<Vec<Month>, BudgetError> {
        let months = self.months.read().map_err(lock_error)?;
        let mut list: Vec<_> = months.values().filter(|m| m.is_active).cloned().collect();
        list.sort_by_key(|m| m.period);
        Ok(list)
    }

    pub fn upsert(&self, month: Month) -> Result<(), BudgetError> {
        let mut months = self.months.write().map_err(lock_error)?;
        months.insert(month.id, month);
        Ok(())
    }

    /// Remove a month record entirely
    pub fn hard_delete(&self, id: MonthId) -> Result<bool, BudgetError> {
        let mut months = self.months.write().map_err(lock_error)?;
        let mut current = self.current.write().map_err(lock_error)?;

        if *current == Some(id) {
            *current = None;
        }
        Ok(months.remove(&id).is_some())
    }

    pub fn current(&self) -> Result<Option<MonthId>, BudgetError> {
        let current = self.current.read().map_err(lock_error)?;
        Ok(*current)
    }

    pub fn set_current(&self, id: MonthId) -> Result<(), BudgetError> {
        let months = self.months.read().map_err(lock_error)?;
        if !months.contains_key(&id) {
            return Err(BudgetError::month_not_found(id.to_string()));
        }
        let mut current = self.current.write().map_err(lock_error)?;
        *current = Some(id);
        Ok(())
    }

    pub fn count(&self) -> Result<usize, BudgetError> {
        let months = self.months.read().map_err(lock_error)?;
        Ok(months.len())
    }
}
