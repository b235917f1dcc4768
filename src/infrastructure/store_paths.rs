//! Message store path discovery.
//!
//! The data path may point straight at a database file or at a directory
//! holding one.

use std::path::{Path, PathBuf};

use crate::domain::{AppError, Result};

/// Database file name looked up inside a data directory.
pub const STORE_DB_NAME: &str = "store.db";

/// Resolves a data path to the store database file.
///
/// # Errors
/// Returns `StoreUnavailable` if no database exists at the path.
pub fn resolve_store_database(data_path: &Path) -> Result<PathBuf> {
    let candidate = if data_path.is_dir() {
        data_path.join(STORE_DB_NAME)
    } else {
        data_path.to_path_buf()
    };

    if candidate.is_file() {
        tracing::debug!("Found message store: {}", candidate.display());
        Ok(candidate)
    } else {
        Err(AppError::StoreUnavailable {
            path: candidate,
            message: "data path does not exist".into(),
            source: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_resolves_directory() {
        let dir = tempdir().unwrap();
        let db = dir.path().join(STORE_DB_NAME);
        std::fs::write(&db, b"").unwrap();

        assert_eq!(resolve_store_database(dir.path()).unwrap(), db);
    }

    #[test]
    fn test_resolves_file() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("custom.db");
        std::fs::write(&db, b"").unwrap();

        assert_eq!(resolve_store_database(&db).unwrap(), db);
    }

    #[test]
    fn test_missing_path_is_unavailable() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            resolve_store_database(&dir.path().join("nope")),
            Err(AppError::StoreUnavailable { .. })
        ));
        assert!(matches!(
            resolve_store_database(dir.path()),
            Err(AppError::StoreUnavailable { .. })
        ));
    }
}
