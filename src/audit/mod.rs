//! Audit logging for Monthwise
//!
//! Every create, update and delete of a month, category or transaction is
//! appended to `audit.log` as a JSON line with before/after snapshots.
//!
//! ```rust,ignore
//! use monthwise::audit::{AuditEntry, AuditLogger, EntityType};
//!
//! let logger = AuditLogger::new(paths.audit_log());
//! logger.log(&AuditEntry::create(
//!     EntityType::Category,
//!     category.id.to_string(),
//!     Some(category.name.clone()),
//!     &category,
//! ))?;
//! ```

mod entry;
mod logger;

pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
