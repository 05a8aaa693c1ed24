//! Service layer for Monthwise
//!
//! Business logic on top of the storage layer: validation, derived amounts,
//! rollover and cross-entity operations.

pub mod aggregator;
pub mod category;
pub mod month;
pub mod rollover;
pub mod transaction;

pub use aggregator::{BudgetAggregator, CategoryStatus, MonthSummary, SpendingStatus};
pub use category::{CategoryService, CategoryUpdate, NewCategory, NewProject};
pub use month::{CreatedMonth, DeletedMonth, MonthService};
pub use rollover::{MonthRolloverEngine, RolloverReport, RolloverStore};
pub use transaction::{NewTransaction, TransactionService, TransactionUpdate};
