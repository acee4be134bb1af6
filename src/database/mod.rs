use crate::config::DatabaseConfig;
use crate::error::AppError;
use media_gallery::SqliteMediaStore;
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

/// Opens the media database and initializes its schema
pub fn init_database(config: &DatabaseConfig) -> Result<SqliteMediaStore, AppError> {
    let db_path = Path::new(&config.path);

    // Make sure the directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(db_path)?;

    log::info!("Opened media database {:?}", db_path);

    let store = SqliteMediaStore::from_connection(conn)?
        .with_busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use media_gallery::{MediaFilter, MediaStore};

    #[test]
    fn test_init_creates_directory_and_schema() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            path: dir
                .path()
                .join("nested")
                .join("photoshare.db")
                .to_string_lossy()
                .to_string(),
            busy_timeout_ms: 100,
        };

        let store = init_database(&config).unwrap();
        assert_eq!(store.count(&MediaFilter::All).unwrap(), 0);
        assert!(dir.path().join("nested").join("photoshare.db").exists());

        // Reopening keeps the schema
        drop(store);
        let store = init_database(&config).unwrap();
        assert_eq!(store.count(&MediaFilter::All).unwrap(), 0);
    }
}
