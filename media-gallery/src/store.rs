//! Metadata store capability and its backends.
//!
//! Every backend provides insert, point lookup by filter, offset paging and
//! random selection. Backends without a native random primitive pick a
//! random offset client-side (see [`random_by_offset`]).

use crate::error::StoreError;
use crate::models::{MediaFilter, MediaRecord};
use crate::schema::init_media_schema;
use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, RwLock};
use std::time::Duration;

/// Result of inserting a single record
pub type InsertOutcome = Result<(), StoreError>;

/// Document-store capabilities required by the media pipeline
pub trait MediaStore: Send + Sync {
    /// Inserts each record independently; one outcome per record, in order.
    ///
    /// A failing record never prevents the others from being committed.
    fn insert(&self, records: &[MediaRecord]) -> Vec<InsertOutcome>;

    fn find_one(&self, filter: &MediaFilter) -> Result<Option<MediaRecord>, StoreError>;

    /// Returns up to `limit` records starting at `offset`, in a stable order
    fn find_page(
        &self,
        filter: &MediaFilter,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<MediaRecord>, StoreError>;

    fn count(&self, filter: &MediaFilter) -> Result<u64, StoreError>;

    /// Picks one record at random; [`StoreError::Empty`] when there is none
    fn random_one(&self) -> Result<MediaRecord, StoreError>;

    fn insert_one(&self, record: &MediaRecord) -> InsertOutcome {
        self.insert(std::slice::from_ref(record))
            .pop()
            .unwrap_or_else(|| Err(StoreError::Other("No insert outcome".to_string())))
    }
}

/// Random selection by counting and fetching one record at a random offset
pub fn random_by_offset<S: MediaStore + ?Sized>(store: &S) -> Result<MediaRecord, StoreError> {
    let total = store.count(&MediaFilter::All)?;
    if total == 0 {
        return Err(StoreError::Empty);
    }

    let offset = rand::rng().random_range(0..total);
    store
        .find_page(&MediaFilter::All, 1, offset)?
        .into_iter()
        .next()
        .ok_or(StoreError::Empty)
}

impl TryFrom<&rusqlite::Row<'_>> for MediaRecord {
    type Error = rusqlite::Error;

    fn try_from(row: &rusqlite::Row<'_>) -> Result<Self, Self::Error> {
        let size_bytes: Option<i64> = row.get(6)?;
        Ok(MediaRecord {
            name: row.get(0)?,
            storage_path: row.get(1)?,
            thumbnail_path: row.get(2)?,
            mime_type: row.get(3)?,
            url: row.get(4)?,
            thumbnail_url: row.get(5)?,
            size_bytes: size_bytes.map(|s| s as u64),
        })
    }
}

const MEDIA_COLUMNS: &str =
    "name, storage_path, thumbnail_path, mime_type, url, thumbnail_url, size_bytes";

/// SQLite-backed store
pub struct SqliteMediaStore {
    conn: Mutex<Connection>,
}

impl SqliteMediaStore {
    /// Opens (or creates) the database at `path` and initializes the schema
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        init_media_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// How long a call waits on a locked database before failing
    pub fn with_busy_timeout(self, timeout: Duration) -> Result<Self, StoreError> {
        self.lock()?.busy_timeout(timeout)?;
        Ok(self)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    fn insert_record(conn: &Connection, record: &MediaRecord) -> InsertOutcome {
        let result = conn.execute(
            "INSERT INTO media
                (name, storage_path, thumbnail_path, mime_type, url, thumbnail_url, size_bytes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                &record.name,
                &record.storage_path,
                &record.thumbnail_path,
                &record.mime_type,
                &record.url,
                &record.thumbnail_url,
                record.size_bytes.map(|s| s as i64),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::Duplicate(record.name.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl MediaStore for SqliteMediaStore {
    fn insert(&self, records: &[MediaRecord]) -> Vec<InsertOutcome> {
        let conn = match self.lock() {
            Ok(conn) => conn,
            Err(_) => return records.iter().map(|_| Err(StoreError::Poisoned)).collect(),
        };

        records
            .iter()
            .map(|record| Self::insert_record(&conn, record))
            .collect()
    }

    fn find_one(&self, filter: &MediaFilter) -> Result<Option<MediaRecord>, StoreError> {
        let conn = self.lock()?;
        let record = match filter {
            MediaFilter::All => conn
                .query_row(
                    &format!("SELECT {} FROM media ORDER BY id LIMIT 1", MEDIA_COLUMNS),
                    [],
                    |row| MediaRecord::try_from(row),
                )
                .optional()?,
            MediaFilter::Name(name) => conn
                .query_row(
                    &format!("SELECT {} FROM media WHERE name = ?1", MEDIA_COLUMNS),
                    params![name],
                    |row| MediaRecord::try_from(row),
                )
                .optional()?,
        };
        Ok(record)
    }

    fn find_page(
        &self,
        filter: &MediaFilter,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<MediaRecord>, StoreError> {
        let conn = self.lock()?;
        let mut out = Vec::new();

        match filter {
            MediaFilter::All => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM media ORDER BY id LIMIT ?1 OFFSET ?2",
                    MEDIA_COLUMNS
                ))?;
                let rows = stmt.query_map(params![limit, offset as i64], |row| {
                    MediaRecord::try_from(row)
                })?;
                for r in rows {
                    out.push(r?);
                }
            }
            MediaFilter::Name(name) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM media WHERE name = ?1 ORDER BY id LIMIT ?2 OFFSET ?3",
                    MEDIA_COLUMNS
                ))?;
                let rows = stmt.query_map(params![name, limit, offset as i64], |row| {
                    MediaRecord::try_from(row)
                })?;
                for r in rows {
                    out.push(r?);
                }
            }
        }

        Ok(out)
    }

    fn count(&self, filter: &MediaFilter) -> Result<u64, StoreError> {
        let conn = self.lock()?;
        let count: i64 = match filter {
            MediaFilter::All => {
                conn.query_row("SELECT COUNT(*) FROM media", [], |row| row.get(0))?
            }
            MediaFilter::Name(name) => conn.query_row(
                "SELECT COUNT(*) FROM media WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )?,
        };
        Ok(count as u64)
    }

    fn random_one(&self) -> Result<MediaRecord, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("SELECT {} FROM media ORDER BY RANDOM() LIMIT 1", MEDIA_COLUMNS),
            [],
            |row| MediaRecord::try_from(row),
        )
        .optional()?
        .ok_or(StoreError::Empty)
    }
}

/// In-memory store, kept in insertion order
#[derive(Default)]
pub struct MemoryMediaStore {
    records: RwLock<Vec<MediaRecord>>,
}

impl MemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MediaStore for MemoryMediaStore {
    fn insert(&self, records: &[MediaRecord]) -> Vec<InsertOutcome> {
        let mut stored = match self.records.write() {
            Ok(stored) => stored,
            Err(_) => return records.iter().map(|_| Err(StoreError::Poisoned)).collect(),
        };

        records
            .iter()
            .map(|record| {
                if stored.iter().any(|r| r.name == record.name) {
                    return Err(StoreError::Duplicate(record.name.clone()));
                }
                stored.push(record.clone());
                Ok(())
            })
            .collect()
    }

    fn find_one(&self, filter: &MediaFilter) -> Result<Option<MediaRecord>, StoreError> {
        let stored = self.records.read().map_err(|_| StoreError::Poisoned)?;
        Ok(stored.iter().find(|r| filter.matches(r)).cloned())
    }

    fn find_page(
        &self,
        filter: &MediaFilter,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<MediaRecord>, StoreError> {
        let stored = self.records.read().map_err(|_| StoreError::Poisoned)?;
        Ok(stored
            .iter()
            .filter(|r| filter.matches(r))
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    fn count(&self, filter: &MediaFilter) -> Result<u64, StoreError> {
        let stored = self.records.read().map_err(|_| StoreError::Poisoned)?;
        Ok(stored.iter().filter(|r| filter.matches(r)).count() as u64)
    }

    fn random_one(&self) -> Result<MediaRecord, StoreError> {
        random_by_offset(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GalleryConfig;
    use std::collections::HashSet;

    fn record(name: &str) -> MediaRecord {
        MediaRecord::new(name, &GalleryConfig::default())
            .with_mime_type("png")
            .with_size(10)
    }

    fn backends() -> Vec<Box<dyn MediaStore>> {
        vec![
            Box::new(SqliteMediaStore::open_in_memory().unwrap()),
            Box::new(MemoryMediaStore::new()),
        ]
    }

    #[test]
    fn test_insert_and_find_by_name() {
        for store in backends() {
            let outcomes = store.insert(&[record("a.png"), record("b.png")]);
            assert!(outcomes.iter().all(|o| o.is_ok()));

            let found = store
                .find_one(&MediaFilter::Name("b.png".into()))
                .unwrap()
                .unwrap();
            assert_eq!(found, record("b.png"));

            assert!(store
                .find_one(&MediaFilter::Name("missing.png".into()))
                .unwrap()
                .is_none());
        }
    }

    #[test]
    fn test_bulk_insert_is_not_all_or_nothing() {
        for store in backends() {
            store.insert_one(&record("dup.png")).unwrap();

            let outcomes = store.insert(&[record("one.png"), record("dup.png"), record("two.png")]);

            assert!(outcomes[0].is_ok());
            assert!(matches!(&outcomes[1], Err(StoreError::Duplicate(n)) if n == "dup.png"));
            assert!(outcomes[2].is_ok());
            assert_eq!(store.count(&MediaFilter::All).unwrap(), 3);
        }
    }

    #[test]
    fn test_pages_are_disjoint_and_stable() {
        for store in backends() {
            let records: Vec<_> = (0..95).map(|i| record(&format!("{:03}.png", i))).collect();
            store.insert(&records);

            let first = store.find_page(&MediaFilter::All, 40, 0).unwrap();
            let second = store.find_page(&MediaFilter::All, 40, 40).unwrap();
            let third = store.find_page(&MediaFilter::All, 40, 80).unwrap();

            assert_eq!(first.len(), 40);
            assert_eq!(second.len(), 40);
            assert_eq!(third.len(), 15);

            let names: HashSet<_> = first
                .iter()
                .chain(second.iter())
                .chain(third.iter())
                .map(|r| r.name.clone())
                .collect();
            assert_eq!(names.len(), 95);

            assert_eq!(store.find_page(&MediaFilter::All, 40, 0).unwrap(), first);
        }
    }

    #[test]
    fn test_random_on_empty_store() {
        for store in backends() {
            assert!(matches!(store.random_one(), Err(StoreError::Empty)));
        }
    }

    #[test]
    fn test_random_covers_whole_population() {
        for store in backends() {
            let records: Vec<_> = (0..5).map(|i| record(&format!("{}.png", i))).collect();
            store.insert(&records);

            let mut seen = HashSet::new();
            for _ in 0..500 {
                seen.insert(store.random_one().unwrap().name);
            }
            assert_eq!(seen.len(), 5);
        }
    }

    #[test]
    fn test_sqlite_size_round_trip() {
        let store = SqliteMediaStore::open_in_memory().unwrap();
        let mut big = record("big.jpeg");
        big.size_bytes = Some(244_999_000);
        big.mime_type = None;
        store.insert_one(&big).unwrap();

        let found = store.find_one(&MediaFilter::Name("big.jpeg".into())).unwrap();
        assert_eq!(found, Some(big));
    }
}
