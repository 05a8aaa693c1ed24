//! Path management for Monthwise
//!
//! ## Path Resolution Order
//!
//! 1. `MONTHWISE_DATA_DIR` environment variable (if set)
//! 2. The platform config directory reported by `directories`
//!    (`~/.config/monthwise` on Linux)

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::BudgetError;

/// Environment variable that overrides the data location
pub const DATA_DIR_ENV: &str = "MONTHWISE_DATA_DIR";

/// Manages all paths used by Monthwise
#[derive(Debug, Clone)]
pub struct MonthwisePaths {
    base_dir: PathBuf,
}

impl MonthwisePaths {
    /// Resolve paths from the environment or the platform defaults
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn new() -> Result<Self, BudgetError> {
        let base_dir = match std::env::var(DATA_DIR_ENV) {
            Ok(custom) if !custom.trim().is_empty() => PathBuf::from(custom),
            _ => resolve_default_path()?,
        };

        Ok(Self { base_dir })
    }

    /// Create paths rooted at a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the data directory (`<base>/data/`)
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to the audit log
    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    pub fn months_file(&self) -> PathBuf {
        self.data_dir().join("months.json")
    }

    pub fn categories_file(&self) -> PathBuf {
        self.data_dir().join("categories.json")
    }

    pub fn transactions_file(&self) -> PathBuf {
        self.data_dir().join("transactions.json")
    }

    /// Ensure the base and data directories exist
    pub fn ensure_directories(&self) -> Result<(), BudgetError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| BudgetError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.data_dir())
            .map_err(|e| BudgetError::Io(format!("Failed to create data directory: {}", e)))?;

        Ok(())
    }

    /// Check if Monthwise has been initialized (config file exists)
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

fn resolve_default_path() -> Result<PathBuf, BudgetError> {
    ProjectDirs::from("", "", "monthwise")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| BudgetError::Config("Could not determine a home directory".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_custom_base_dir() {
        let temp_dir = TempDir::new().unwrap();
        let paths = MonthwisePaths::with_base_dir(temp_dir.path().to_path_buf());

        assert_eq!(paths.base_dir(), temp_dir.path());
        assert_eq!(paths.data_dir(), temp_dir.path().join("data"));
    }

    #[test]
    fn test_ensure_directories() {
        let temp_dir = TempDir::new().unwrap();
        let paths = MonthwisePaths::with_base_dir(temp_dir.path().join("nested"));

        paths.ensure_directories().unwrap();

        assert!(paths.data_dir().exists());
        assert!(!paths.is_initialized());
    }

    #[test]
    fn test_file_paths() {
        let temp_dir = TempDir::new().unwrap();
        let paths = MonthwisePaths::with_base_dir(temp_dir.path().to_path_buf());

        assert_eq!(paths.settings_file(), temp_dir.path().join("config.json"));
        assert_eq!(
            paths.categories_file(),
            temp_dir.path().join("data").join("categories.json")
        );
        assert_eq!(
            paths.months_file(),
            temp_dir.path().join("data").join("months.json")
        );
    }
}
