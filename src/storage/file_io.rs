//! JSON persistence helpers
//!
//! Every data file is replaced whole. Readers see either the previous
//! contents or the new ones.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::BudgetError;

fn storage_failure(what: String) -> impl FnOnce(std::io::Error) -> BudgetError {
    move |e| BudgetError::Storage(format!("{}: {}", what, e))
}

/// Decode `path`, or `T::default()` when nothing has been saved yet
pub fn read_json<T, P>(path: P) -> Result<T, BudgetError>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if !path.exists() {
        return Ok(T::default());
    }

    let file = File::open(path).map_err(storage_failure(format!("Cannot open {}", path.display())))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| BudgetError::Storage(format!("{} is not valid JSON: {}", path.display(), e)))
}

/// Staging file used while `path` is rewritten
fn staging_path(path: &Path) -> PathBuf {
    path.with_extension("json.tmp")
}

/// Replace `path` with the pretty-printed JSON of `data`
///
/// The bytes go to a staging file beside `path`, are synced, and then
/// renamed over it.
pub fn write_json_atomic<T, P>(path: P, data: &T) -> Result<(), BudgetError>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .map_err(storage_failure(format!("Cannot create {}", dir.display())))?;
    }

    let staging = staging_path(path);
    let mut writer = BufWriter::new(
        File::create(&staging).map_err(storage_failure(format!("Cannot create {}", staging.display())))?,
    );
    serde_json::to_writer_pretty(&mut writer, data)
        .map_err(|e| BudgetError::Storage(format!("Cannot encode {}: {}", path.display(), e)))?;
    writer.flush().map_err(storage_failure(format!("Cannot write {}", staging.display())))?;
    writer
        .get_ref()
        .sync_all()
        .map_err(storage_failure(format!("Cannot sync {}", staging.display())))?;

    if let Err(e) = fs::rename(&staging, path) {
        let _ = fs::remove_file(&staging);
        return Err(BudgetError::Storage(format!("Cannot replace {}: {}", path.display(), e)));
    }
    Ok(())
}

/// Map a poisoned lock into a storage error
pub(crate) fn lock_error<E: std::fmt::Display>(e: E) -> BudgetError {
    BudgetError::Storage(format!("Repository lock poisoned: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
    struct Snapshot {
        label: String,
        rows: Vec<i64>,
    }

    #[test]
    fn test_missing_file_reads_default() {
        let temp_dir = TempDir::new().unwrap();
        let data: Snapshot = read_json(temp_dir.path().join("missing.json")).unwrap();
        assert_eq!(data, Snapshot::default());
    }

    #[test]
    fn test_write_then_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("months.json");

        let data = Snapshot {
            label: "2025-01".into(),
            rows: vec![1, 2, 3],
        };
        write_json_atomic(&path, &data).unwrap();

        let loaded: Snapshot = read_json(&path).unwrap();
        assert_eq!(loaded, data);
        assert!(!temp_dir.path().join("nested").join("months.json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file_is_storage_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let result: Result<Snapshot, _> = read_json(&path);
        assert!(matches!(result, Err(BudgetError::Storage(_))));
    }
}
