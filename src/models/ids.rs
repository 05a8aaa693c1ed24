//! Strongly-typed ID wrappers
//!
//! Months, categories and transactions each get their own newtype so ids
//! cannot be mixed up at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident, $display_prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random id
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Short form used in tables, e.g. `cat-1a2b3c4d`
            pub fn short(&self) -> String {
                format!("{}{}", $display_prefix, &self.0.simple().to_string()[..8])
            }

            /// Check whether a user-typed fragment refers to this id
            pub fn matches(&self, fragment: &str) -> bool {
                let fragment = fragment.trim();
                let bare = fragment.strip_prefix($display_prefix).unwrap_or(fragment);
                !bare.is_empty()
                    && (self.0.to_string().starts_with(bare)
                        || self.0.simple().to_string().starts_with(bare))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.short())
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                let s = s.strip_prefix($display_prefix).unwrap_or(s);
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

define_id!(MonthId, "mon-");
define_id!(CategoryId, "cat-");
define_id!(TransactionId, "txn-");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_display() {
        let id = CategoryId::new();
        let display = id.to_string();
        assert!(display.starts_with("cat-"));
        assert_eq!(display.len(), 12);
    }

    #[test]
    fn test_fresh_ids_differ() {
        assert_ne!(MonthId::new(), MonthId::new());
    }

    #[test]
    fn test_parse_with_and_without_prefix() {
        let uuid_str = "550e8400-e29b-41d4-a716-446655440000";
        let plain: TransactionId = uuid_str.parse().unwrap();
        let prefixed: TransactionId = format!("txn-{}", uuid_str).parse().unwrap();
        assert_eq!(plain, prefixed);
        assert_eq!(plain.as_uuid().to_string(), uuid_str);
    }

    #[test]
    fn test_matches_short_form() {
        let id = CategoryId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap());
        assert!(id.matches("cat-550e8400"));
        assert!(id.matches("550e84"));
        assert!(!id.matches("cat-"));
        assert!(!id.matches("deadbeef"));
    }
}
