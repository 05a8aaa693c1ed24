//! Monthwise - monthly budgeting from the terminal
//!
//! Each calendar month holds a set of categories (income, fixed,
//! variable, discretionary, and projects with a budget of their own) with
//! planned targets. Transactions record what was actually earned or spent,
//! and the aggregator compares the two.
//!
//! # Architecture
//!
//! - `config`: Path resolution and user settings
//! - `error`: Custom error types
//! - `models`: Months, categories, transactions, money and ids
//! - `storage`: JSON file storage layer
//! - `audit`: Append-only change log
//! - `services`: Business logic, including rollover and aggregation
//! - `display`: Terminal formatting
//! - `export`: CSV, JSON and YAML month exports
//! - `cli`: Command handlers used by the binary
//!
//! # Example
//!
//! ```rust,ignore
//! use monthwise::config::{MonthwisePaths, Settings};
//! use monthwise::services::MonthService;
//! use monthwise::storage::Storage;
//!
//! let paths = MonthwisePaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let storage = Storage::new(paths)?;
//! storage.load_all()?;
//! let month = MonthService::new(&storage, &settings).current()?;
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{BudgetError, BudgetResult};
