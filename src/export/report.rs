//! Month report export
//!
//! One month with its categories, transactions and computed summary, as
//! JSON or YAML.

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::Settings;
use crate::error::{BudgetError, BudgetResult};
use crate::models::{Category, Month, MonthId, Transaction};
use crate::services::{BudgetAggregator, MonthSummary};
use crate::storage::Storage;

/// Current export schema version
pub const EXPORT_SCHEMA_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Serialize)]
pub struct MonthReport {
    pub schema_version: String,

    pub exported_at: DateTime<Utc>,

    /// Application version that created the export
    pub app_version: String,

    pub month: Month,

    /// Categories visible in the month in display order
    pub categories: Vec<Category>,

    /// Transactions counted in the month, newest first
    pub transactions: Vec<Transaction>,

    pub summary: MonthSummary,
}

impl MonthReport {
    pub fn build(storage: &Storage, settings: &Settings, month_id: MonthId) -> BudgetResult<Self> {
        let month = storage
            .months
            .get(month_id)?
            .ok_or_else(|| BudgetError::month_not_found(month_id.to_string()))?;

        let categories = storage.categories_in_month(month_id)?;
        let transactions = storage.transactions_in_month(&month, &categories)?;
        let summary = BudgetAggregator::new(storage, settings).month_summary(month_id)?;

        Ok(Self {
            schema_version: EXPORT_SCHEMA_VERSION.to_string(),
            exported_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            month,
            categories,
            transactions,
            summary,
        })
    }
}

/// Write a month report as pretty-printed JSON
pub fn export_month_json<W: Write>(
    storage: &Storage,
    settings: &Settings,
    month_id: MonthId,
    writer: &mut W,
) -> BudgetResult<()> {
    let report = MonthReport::build(storage, settings, month_id)?;

    serde_json::to_writer_pretty(&mut *writer, &report)
        .map_err(|e| BudgetError::Export(e.to_string()))?;
    writeln!(writer).map_err(|e| BudgetError::Export(e.to_string()))?;

    Ok(())
}

/// Write a month report as YAML with a short comment header
pub fn export_month_yaml<W: Write>(
    storage: &Storage,
    settings: &Settings,
    month_id: MonthId,
    writer: &mut W,
) -> BudgetResult<()> {
    let report = MonthReport::build(storage, settings, month_id)?;

    writeln!(writer, "# Monthwise report for {}", report.month.name)
        .map_err(|e| BudgetError::Export(e.to_string()))?;
    writeln!(writer, "# Generated: {}", report.exported_at)
        .map_err(|e| BudgetError::Export(e.to_string()))?;
    writeln!(writer).map_err(|e| BudgetError::Export(e.to_string()))?;

    serde_yaml::to_writer(writer, &report).map_err(|e| BudgetError::Export(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::MonthwisePaths;
    use crate::models::{CategoryType, Money, YearMonth};
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage, MonthId) {
        let temp_dir = TempDir::new().unwrap();
        let paths = MonthwisePaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();

        let month = Month::new(YearMonth::new(2025, 8).unwrap());
        let month_id = month.id;
        storage.months.upsert(month).unwrap();

        let salary = Category::new("Salary", CategoryType::Income, Money::from_cents(200_000), month_id);
        storage.categories.upsert(salary.clone()).unwrap();
        storage
            .transactions
            .upsert(Transaction::new(salary.id, Money::from_cents(200_000), Utc::now()))
            .unwrap();

        (temp_dir, storage, month_id)
    }

    #[test]
    fn test_json_export() {
        let (_temp_dir, storage, month_id) = create_test_storage();
        let mut output = Vec::new();
        export_month_json(&storage, &Settings::default(), month_id, &mut output).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(value["schema_version"], EXPORT_SCHEMA_VERSION);
        assert_eq!(value["month"]["name"], "August 2025");
        assert_eq!(value["categories"].as_array().unwrap().len(), 1);
        assert_eq!(value["summary"]["financial_health_score"], 100);
    }

    #[test]
    fn test_yaml_export() {
        let (_temp_dir, storage, month_id) = create_test_storage();
        let mut output = Vec::new();
        export_month_yaml(&storage, &Settings::default(), month_id, &mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        assert!(text.starts_with("# Monthwise report for August 2025"));
        assert!(text.contains("summary:"));
        assert!(text.contains("name: Salary"));
    }

    #[test]
    fn test_unknown_month() {
        let (_temp_dir, storage, _) = create_test_storage();
        let mut output = Vec::new();
        let err = export_month_json(&storage, &Settings::default(), MonthId::new(), &mut output)
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
