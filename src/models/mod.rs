//! Core data models for Monthwise
//!
//! Months own categories by reference and categories own transactions by
//! reference; deletion cascades downward only.

pub mod category;
pub mod ids;
pub mod money;
pub mod month;
pub mod transaction;

pub use category::{Category, CategoryType, CategoryValidationError};
pub use ids::{CategoryId, MonthId, TransactionId};
pub use money::Money;
pub use month::{Month, PeriodParseError, YearMonth};
pub use transaction::{Transaction, TransactionValidationError};
