//! Export module for Monthwise
//!
//! - CSV: a month's transactions (spreadsheet-compatible)
//! - JSON / YAML: a full month report with categories and summary

pub mod report;
pub mod transactions;

pub use report::{export_month_json, export_month_yaml, MonthReport, EXPORT_SCHEMA_VERSION};
pub use transactions::export_month_csv;
