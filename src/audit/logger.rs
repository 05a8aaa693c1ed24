//! Change history on disk
//!
//! History lives in one JSONL file next to the data directory. A line is
//! appended per change and never rewritten.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use crate::error::{BudgetError, BudgetResult};

use super::entry::AuditEntry;

fn io_failure(action: &str) -> impl FnOnce(std::io::Error) -> BudgetError + '_ {
    move |e| BudgetError::Io(format!("Audit log: could not {}: {}", action, e))
}

pub struct AuditLogger {
    log_path: PathBuf,
}

impl AuditLogger {
    pub fn new(log_path: PathBuf) -> Self {
        Self { log_path }
    }

    /// Appends `entry` as a single line
    pub fn log(&self, entry: &AuditEntry) -> BudgetResult<()> {
        let mut line = serde_json::to_vec(entry)
            .map_err(|e| BudgetError::Json(format!("Audit log: could not encode entry: {}", e)))?;
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(io_failure("open"))?;
        file.write_all(&line).map_err(io_failure("append"))?;
        file.flush().map_err(io_failure("flush"))
    }

    /// Every recorded change in the order it happened
    pub fn read_all(&self) -> BudgetResult<Vec<AuditEntry>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&self.log_path).map_err(io_failure("open"))?);
        let mut entries = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line_no = index + 1;
            let line = line.map_err(|e| {
                BudgetError::Io(format!("Audit log: could not read line {}: {}", line_no, e))
            })?;
            if line.trim().is_empty() {
                continue;
            }
            entries.push(serde_json::from_str(&line).map_err(|e| {
                BudgetError::Json(format!("Audit log: bad entry on line {}: {}", line_no, e))
            })?);
        }
        Ok(entries)
    }

    /// The last `count` changes, oldest of them first
    pub fn read_recent(&self, count: usize) -> BudgetResult<Vec<AuditEntry>> {
        let mut entries = self.read_all()?;
        let start = entries.len().saturating_sub(count);
        Ok(entries.split_off(start))
    }

    pub fn path(&self) -> &PathBuf {
        &self.log_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{EntityType, Operation};
    use serde_json::json;
    use tempfile::TempDir;

    fn logger() -> (TempDir, AuditLogger) {
        let temp_dir = TempDir::new().unwrap();
        let logger = AuditLogger::new(temp_dir.path().join("audit.log"));
        (temp_dir, logger)
    }

    #[test]
    fn test_missing_log_is_empty() {
        let (_temp_dir, logger) = logger();
        assert!(logger.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_append_and_read_recent() {
        let (_temp_dir, logger) = logger();
        for i in 0..5 {
            let entry = AuditEntry::create(
                EntityType::Transaction,
                format!("txn-{}", i),
                None,
                &json!({"amount": i}),
            );
            logger.log(&entry).unwrap();
        }

        let recent = logger.read_recent(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].entity_id, "txn-3");
        assert_eq!(recent[1].entity_id, "txn-4");
        assert_eq!(recent[1].operation, Operation::Create);
    }

    #[test]
    fn test_corrupt_line_reports_line_number() {
        let (_temp_dir, logger) = logger();
        std::fs::write(logger.path(), "not json\n").unwrap();
        let err = logger.read_all().unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }
}
