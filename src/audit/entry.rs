//! Audit entry data structures
//!
//! Each entry is one JSON line in `audit.log`. Snapshots are stored as raw
//! JSON values so the log stays readable even after the models change.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fields that change on every write and would drown out real changes
const IGNORED_FIELDS: &[&str] = &["updated_at"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        })
    }
}

/// Kind of record an entry refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Month,
    Category,
    Transaction,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Month => "Month",
            Self::Category => "Category",
            Self::Transaction => "Transaction",
        })
    }
}

/// A single line of the audit log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub operation: Operation,
    pub entity_type: EntityType,
    pub entity_id: String,

    /// Human-readable label, e.g. the category name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<Value>,

    /// Changed top-level fields, e.g. `target_amount: 40000 -> 45000`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_summary: Option<String>,
}

fn snapshot<T: Serialize>(entity: &T) -> Option<Value> {
    serde_json::to_value(entity).ok()
}

impl AuditEntry {
    fn record(
        operation: Operation,
        entity_type: EntityType,
        entity_id: String,
        entity_name: Option<String>,
        before: Option<Value>,
        after: Option<Value>,
    ) -> Self {
        let diff_summary = match (&before, &after) {
            (Some(old), Some(new)) => summarize_changes(old, new),
            _ => None,
        };

        Self {
            timestamp: Utc::now(),
            operation,
            entity_type,
            entity_id,
            entity_name,
            before,
            after,
            diff_summary,
        }
    }

    pub fn create<T: Serialize>(
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> Self {
        let after = snapshot(entity);
        Self::record(Operation::Create, entity_type, entity_id.into(), entity_name, None, after)
    }

    /// Record an update; the diff summary is derived from the two snapshots
    pub fn update<T: Serialize>(
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        before: &T,
        after: &T,
    ) -> Self {
        Self::record(
            Operation::Update,
            entity_type,
            entity_id.into(),
            entity_name,
            snapshot(before),
            snapshot(after),
        )
    }

    pub fn delete<T: Serialize>(
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> Self {
        let before = snapshot(entity);
        Self::record(Operation::Delete, entity_type, entity_id.into(), entity_name, before, None)
    }

    /// One-line rendering for `monthwise history`
    pub fn format_human_readable(&self) -> String {
        let label = self
            .entity_name
            .as_ref()
            .map(|name| format!(" ({})", name))
            .unwrap_or_default();
        let mut line = format!(
            "{}  {} {} {}{}",
            self.timestamp.format("%Y-%m-%d %H:%M"),
            self.operation,
            self.entity_type,
            self.entity_id,
            label
        );

        if let Some(changes) = &self.diff_summary {
            line.push_str("\n    ");
            line.push_str(changes);
        }
        line
    }
}

fn tracked(key: &str) -> bool {
    !IGNORED_FIELDS.contains(&key)
}

fn object_changes(old: &Map<String, Value>, new: &Map<String, Value>) -> Vec<String> {
    let changed = old.iter().filter(|(k, _)| tracked(k)).filter_map(|(key, was)| {
        match new.get(key) {
            Some(now) if now == was => None,
            Some(now) => Some(format!("{}: {} -> {}", key, was, now)),
            None => Some(format!("{}: {} -> (removed)", key, was)),
        }
    });
    let added = new
        .iter()
        .filter(|(k, _)| tracked(k) && !old.contains_key(*k))
        .map(|(key, now)| format!("{}: (added) -> {}", key, now));

    changed.chain(added).collect()
}

fn summarize_changes(before: &Value, after: &Value) -> Option<String> {
    let changes = match (before, after) {
        (Value::Object(old), Value::Object(new)) => object_changes(old, new),
        _ if before != after => vec![format!("{} -> {}", before, after)],
        _ => Vec::new(),
    };

    (!changes.is_empty()).then(|| changes.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display() {
        assert_eq!(Operation::Delete.to_string(), "DELETE");
        assert_eq!(EntityType::Category.to_string(), "Category");
    }

    #[test]
    fn test_create_entry() {
        let data = json!({"name": "Rent", "target_amount": 120000});
        let entry = AuditEntry::create(EntityType::Category, "cat-12345678", Some("Rent".into()), &data);

        assert_eq!(entry.operation, Operation::Create);
        assert!(entry.before.is_none());
        assert_eq!(entry.after, Some(data));
    }

    #[test]
    fn test_update_summarizes_changed_fields() {
        let before = json!({"name": "Rent", "target_amount": 120000, "updated_at": "a"});
        let after = json!({"name": "Rent", "target_amount": 125000, "updated_at": "b"});
        let entry = AuditEntry::update(EntityType::Category, "cat-1", None, &before, &after);

        assert_eq!(
            entry.diff_summary.as_deref(),
            Some("target_amount: 120000 -> 125000")
        );
    }

    #[test]
    fn test_update_without_changes_has_no_summary() {
        let value = json!({"name": "Rent"});
        let entry = AuditEntry::update(EntityType::Category, "cat-1", None, &value, &value);
        assert!(entry.diff_summary.is_none());
    }

    #[test]
    fn test_human_readable() {
        let entry = AuditEntry::delete(
            EntityType::Transaction,
            "txn-abcdef12",
            Some("Coffee".into()),
            &json!({"amount": 450}),
        );
        let text = entry.format_human_readable();
        assert!(text.contains("DELETE Transaction txn-abcdef12 (Coffee)"));
        assert!(!text.contains('\n'));
    }
}
