//! User settings for Monthwise
//!
//! Holds display preferences and the product constants used by validation
//! and by the budget aggregator.

use serde::{Deserialize, Serialize};

use super::paths::MonthwisePaths;
use crate::error::BudgetError;
use crate::models::Money;

/// Largest single transaction accepted (999,999.99)
pub const DEFAULT_MAX_TRANSACTION_CENTS: i64 = 99_999_999;

/// User settings for Monthwise
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Default currency symbol
    #[serde(default = "default_currency")]
    pub currency_symbol: String,

    /// Date format preference (strftime format)
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Upper bound (inclusive) for a transaction amount
    #[serde(default = "default_max_transaction_amount")]
    pub max_transaction_amount: Money,

    /// Trailing window used to project a category's daily spend rate
    #[serde(default = "default_spending_window_days")]
    pub spending_window_days: i64,

    /// Cap applied to the displayed spending percentage (2.0 = 200%)
    #[serde(default = "default_spending_percentage_cap")]
    pub spending_percentage_cap: f64,

    /// Fraction of the target at which an expense is flagged as near its limit
    #[serde(default = "default_near_limit_threshold")]
    pub near_limit_threshold: f64,

    /// Copy the previous month's categories when a new month is created
    #[serde(default = "default_auto_rollover")]
    pub auto_rollover: bool,
}

fn default_schema_version() -> u32 {
    1
}

fn default_currency() -> String {
    "$".to_string()
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

fn default_max_transaction_amount() -> Money {
    Money::from_cents(DEFAULT_MAX_TRANSACTION_CENTS)
}

fn default_spending_window_days() -> i64 {
    7
}

fn default_spending_percentage_cap() -> f64 {
    2.0
}

fn default_near_limit_threshold() -> f64 {
    0.8
}

fn default_auto_rollover() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            currency_symbol: default_currency(),
            date_format: default_date_format(),
            max_transaction_amount: default_max_transaction_amount(),
            spending_window_days: default_spending_window_days(),
            spending_percentage_cap: default_spending_percentage_cap(),
            near_limit_threshold: default_near_limit_threshold(),
            auto_rollover: default_auto_rollover(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or fall back to defaults if the file doesn't exist
    pub fn load_or_create(paths: &MonthwisePaths) -> Result<Self, BudgetError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path)
                .map_err(|e| BudgetError::Io(format!("Failed to read settings file: {}", e)))?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                BudgetError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            settings.validate()?;
            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &MonthwisePaths) -> Result<(), BudgetError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| BudgetError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| BudgetError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }

    /// Reject constants that would make the aggregator meaningless
    pub fn validate(&self) -> Result<(), BudgetError> {
        if !self.max_transaction_amount.is_positive() {
            return Err(BudgetError::Config(
                "max_transaction_amount must be positive".into(),
            ));
        }
        if self.spending_window_days <= 0 {
            return Err(BudgetError::Config(
                "spending_window_days must be at least 1".into(),
            ));
        }
        if self.spending_percentage_cap <= 0.0 {
            return Err(BudgetError::Config(
                "spending_percentage_cap must be positive".into(),
            ));
        }
        Ok(())
    }
}
