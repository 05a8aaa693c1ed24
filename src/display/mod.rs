//! Display formatting for terminal output
//!
//! Tables for lists, plain aligned text for detail views.

pub mod category;
pub mod month;
pub mod transaction;

pub use category::{format_category_details, format_category_table};
pub use month::{format_month_header, format_month_list, format_month_summary};
pub use transaction::{format_transaction_details, format_transaction_register};
