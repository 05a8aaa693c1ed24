//! Custom error types for Monthwise
//!
//! Every fallible operation in the library returns a [`BudgetError`]. The
//! variants fall into three families: validation problems with user input,
//! references to records that no longer exist, and storage failures.

use thiserror::Error;

/// Message shown to users when the underlying store failed.
pub const STORAGE_FAILURE_MESSAGE: &str =
    "Something went wrong while saving your budget. Please try again.";

/// The main error type for Monthwise operations
#[derive(Error, Debug)]
pub enum BudgetError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// User input out of bounds or missing
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Duplicate entity errors
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    /// Export errors
    #[error("Export error: {0}")]
    Export(String),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl BudgetError {
    /// Create a "not found" error for months
    pub fn month_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Month",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for categories
    pub fn category_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Category",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for transactions
    pub fn transaction_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Transaction",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this error came from the persistence layer
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Io(_) | Self::Json(_))
    }

    /// Text suitable for showing to the user.
    ///
    /// Validation and lookup failures are shown as-is. Storage failures get a
    /// generic retry message; the cause stays available through `Display`.
    pub fn user_message(&self) -> String {
        if self.is_storage() {
            STORAGE_FAILURE_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }
}

impl From<std::io::Error> for BudgetError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BudgetError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for Monthwise operations
pub type BudgetResult<T> = Result<T, BudgetError>;
