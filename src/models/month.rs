//! Budget months
//!
//! [`YearMonth`] is the calendar value used for navigation and ordering;
//! [`Month`] is the stored record that categories point at.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::MonthId;
use super::money::Money;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// A calendar month, e.g. 2025-01
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    /// Create a year/month pair, rejecting month numbers outside 1..=12
    pub fn new(year: i32, month: u32) -> Result<Self, PeriodParseError> {
        if !(1..=12).contains(&month) {
            return Err(PeriodParseError::InvalidMonth(month));
        }
        Ok(Self { year, month })
    }

    /// The month containing today's local date
    pub fn current() -> Self {
        Self::containing(chrono::Local::now().date_naive())
    }

    /// The month containing `date`
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn start_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Last day of the month (inclusive)
    pub fn end_date(&self) -> NaiveDate {
        self.next().start_date() - Duration::days(1)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date() && date <= self.end_date()
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn prev(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Human-readable name, e.g. "January 2025"
    pub fn display_name(&self) -> String {
        let name = MONTH_NAMES
            .get(self.month.saturating_sub(1) as usize)
            .copied()
            .unwrap_or("Unknown");
        format!("{} {}", name, self.year)
    }

    /// Parse `YYYY-MM`
    pub fn parse(s: &str) -> Result<Self, PeriodParseError> {
        let s = s.trim();
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| PeriodParseError::InvalidFormat(s.to_string()))?;

        let year: i32 = year
            .parse()
            .map_err(|_| PeriodParseError::InvalidFormat(s.to_string()))?;
        let month: u32 = month
            .parse()
            .map_err(|_| PeriodParseError::InvalidFormat(s.to_string()))?;

        Self::new(year, month)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// A stored budget month
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Month {
    pub id: MonthId,

    /// Display name, e.g. "January 2025"
    pub name: String,

    pub period: YearMonth,

    /// Planned income, refreshed from the month's categories
    #[serde(default)]
    pub total_income: Money,

    /// Planned expenses, refreshed from the month's categories
    #[serde(default)]
    pub total_expenses: Money,

    #[serde(default = "default_true")]
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl Month {
    pub fn new(period: YearMonth) -> Self {
        Self {
            id: MonthId::new(),
            name: period.display_name(),
            period,
            total_income: Money::zero(),
            total_expenses: Money::zero(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn remaining_budget(&self) -> Money {
        self.total_income - self.total_expenses
    }

    /// Overwrite the cached totals
    pub fn set_totals(&mut self, total_income: Money, total_expenses: Money) {
        self.total_income = total_income;
        self.total_expenses = total_expenses;
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Error type for month parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeriodParseError {
    InvalidFormat(String),
    InvalidMonth(u32),
}

impl fmt::Display for PeriodParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFormat(s) => write!(f, "Invalid month format (expected YYYY-MM): {}", s),
            Self::InvalidMonth(m) => write!(f, "Invalid month: {}", m),
        }
    }
}

impl std::error::Error for PeriodParseError {}
