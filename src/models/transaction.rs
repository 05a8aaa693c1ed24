//! Transaction model
//!
//! A transaction records money earned or spent against one category.
//! Amounts are always positive; the category type decides whether it counts
//! as income or expense.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{CategoryId, TransactionId};
use super::money::Money;

/// Maximum length of a transaction description
pub const MAX_DESCRIPTION_LEN: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,

    pub category_id: CategoryId,

    pub amount: Money,

    #[serde(default)]
    pub description: String,

    /// When the money moved
    pub occurred_at: DateTime<Utc>,

    #[serde(default = "default_true")]
    pub is_active: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl Transaction {
    pub fn new(category_id: CategoryId, amount: Money, occurred_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            id: TransactionId::new(),
            category_id,
            amount,
            description: String::new(),
            occurred_at,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(
        category_id: CategoryId,
        amount: Money,
        occurred_at: DateTime<Utc>,
        description: impl Into<String>,
    ) -> Self {
        let mut txn = Self::new(category_id, amount, occurred_at);
        txn.description = description.into();
        txn
    }

    /// Soft delete
    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.updated_at = Utc::now();
    }

    /// Check amount bounds and description length
    pub fn validate(&self, max_amount: Money) -> Result<(), TransactionValidationError> {
        if !self.amount.is_positive() {
            return Err(TransactionValidationError::NonPositiveAmount);
        }

        if self.amount > max_amount {
            return Err(TransactionValidationError::AmountTooLarge(max_amount));
        }

        if self.description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(TransactionValidationError::DescriptionTooLong(
                self.description.chars().count(),
            ));
        }

        Ok(())
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            self.occurred_at.format("%Y-%m-%d"),
            self.amount
        )?;
        if !self.description.is_empty() {
            write!(f, " {}", self.description)?;
        }
        Ok(())
    }
}

/// Validation errors for transactions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionValidationError {
    NonPositiveAmount,
    AmountTooLarge(Money),
    DescriptionTooLong(usize),
}

impl fmt::Display for TransactionValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveAmount => write!(f, "Amount must be greater than zero"),
            Self::AmountTooLarge(max) => write!(f, "Amount cannot exceed {}", max),
            Self::DescriptionTooLong(len) => write!(
                f,
                "Description too long ({} chars, max {})",
                len, MAX_DESCRIPTION_LEN
            ),
        }
    }
}

impl std::error::Error for TransactionValidationError {}
