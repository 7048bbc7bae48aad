//! SQLite-backed mastery record store.

use crate::db::error::DbError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use wordmatch_core::{MasteryRecord, MasteryStore, StoreError};

type Result<T> = std::result::Result<T, DbError>;

/// SQLite implementation of [`MasteryStore`].
pub struct SqliteMasteryStore {
    conn: Mutex<Connection>,
}

impl SqliteMasteryStore {
    /// Open database at path, creating if necessary.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize()?;
        Ok(store)
    }

    /// Open in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(super::schema::SCHEMA)?;
        conn.execute_batch(super::schema::INIT_SCHEMA_VERSION)?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }

    pub fn schema_version(&self) -> Result<i32> {
        self.conn()?
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
            .map_err(Into::into)
    }

    /// Insert or overwrite a record, progress included.
    pub fn put(&self, record: &MasteryRecord) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn()?.execute(
            "INSERT INTO mastery_records (pair_id, translation, success_count, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT(pair_id) DO UPDATE SET
                translation = excluded.translation,
                success_count = excluded.success_count,
                updated_at = excluded.updated_at",
            params![record.pair_id, record.translation, record.success_count, now],
        )?;
        Ok(())
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<MasteryRecord> {
        Ok(MasteryRecord {
            pair_id: row.get(0)?,
            translation: row.get(1)?,
            success_count: row.get(2)?,
        })
    }

    fn get_record(&self, pair_id: &str) -> Result<Option<MasteryRecord>> {
        self.conn()?
            .query_row(
                "SELECT pair_id, translation, success_count FROM mastery_records WHERE pair_id = ?1",
                params![pair_id],
                Self::row_to_record,
            )
            .optional()
            .map_err(Into::into)
    }

    fn insert_record(&self, record: &MasteryRecord) -> Result<bool> {
        let now = Utc::now().to_rfc3339();
        let inserted = self.conn()?.execute(
            "INSERT OR IGNORE INTO mastery_records (pair_id, translation, success_count, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![record.pair_id, record.translation, record.success_count, now],
        )?;
        Ok(inserted > 0)
    }

    fn increment(&self, pair_id: &str) -> Result<Option<u32>> {
        let now = Utc::now().to_rfc3339();
        self.conn()?
            .query_row(
                "UPDATE mastery_records SET success_count = success_count + 1, updated_at = ?2
                 WHERE pair_id = ?1
                 RETURNING success_count",
                params![pair_id, now],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    fn delete_record(&self, pair_id: &str) -> Result<bool> {
        let deleted = self.conn()?.execute(
            "DELETE FROM mastery_records WHERE pair_id = ?1",
            params![pair_id],
        )?;
        Ok(deleted > 0)
    }

    fn all_records(&self) -> Result<Vec<MasteryRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT pair_id, translation, success_count FROM mastery_records
             ORDER BY updated_at ASC, pair_id ASC",
        )?;

        let records = stmt
            .query_map([], Self::row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn count_records(&self) -> Result<usize> {
        let count: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM mastery_records", [], |row| row.get(0))?;
        usize::try_from(count).map_err(|_| DbError::InvalidData(format!("negative count {count}")))
    }
}

impl MasteryStore for SqliteMasteryStore {
    fn get(&self, pair_id: &str) -> std::result::Result<Option<MasteryRecord>, StoreError> {
        Ok(self.get_record(pair_id)?)
    }

    fn insert_if_absent(&self, record: &MasteryRecord) -> std::result::Result<bool, StoreError> {
        Ok(self.insert_record(record)?)
    }

    fn increment_success(&self, pair_id: &str) -> std::result::Result<Option<u32>, StoreError> {
        Ok(self.increment(pair_id)?)
    }

    fn delete(&self, pair_id: &str) -> std::result::Result<bool, StoreError> {
        Ok(self.delete_record(pair_id)?)
    }

    fn list_all(&self) -> std::result::Result<Vec<MasteryRecord>, StoreError> {
        Ok(self.all_records()?)
    }

    fn count(&self) -> std::result::Result<usize, StoreError> {
        Ok(self.count_records()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::SCHEMA_VERSION;
    use pretty_assertions::assert_eq;
    use wordmatch_core::MasteryTracker;

    fn store() -> SqliteMasteryStore {
        SqliteMasteryStore::open_in_memory().unwrap()
    }

    #[test]
    fn schema_version_is_recorded() {
        assert_eq!(store().schema_version().unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn insert_if_absent_is_idempotent() {
        let store = store();
        assert!(store.insert_if_absent(&MasteryRecord::new("cat", "猫")).unwrap());
        store.increment_success("cat").unwrap();
        assert!(!store.insert_if_absent(&MasteryRecord::new("cat", "ねこ")).unwrap());

        let record = store.get("cat").unwrap().unwrap();
        assert_eq!(record.success_count, 1);
        assert_eq!(record.translation, "猫");
    }

    #[test]
    fn increment_returns_new_count() {
        let store = store();
        store.insert_if_absent(&MasteryRecord::new("dog", "犬")).unwrap();
        assert_eq!(store.increment_success("dog").unwrap(), Some(1));
        assert_eq!(store.increment_success("dog").unwrap(), Some(2));
    }

    #[test]
    fn increment_missing_is_none() {
        assert_eq!(store().increment_success("ghost").unwrap(), None);
    }

    #[test]
    fn delete_and_count() {
        let store = store();
        store.insert_if_absent(&MasteryRecord::new("cat", "猫")).unwrap();
        store.insert_if_absent(&MasteryRecord::new("dog", "犬")).unwrap();
        assert_eq!(store.count().unwrap(), 2);

        assert!(store.delete("cat").unwrap());
        assert!(!store.delete("cat").unwrap());
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.get("cat").unwrap(), None);
    }

    #[test]
    fn put_overwrites_progress() {
        let store = store();
        store
            .put(&MasteryRecord {
                pair_id: "dog".to_string(),
                translation: "犬".to_string(),
                success_count: 9,
            })
            .unwrap();
        assert_eq!(store.get("dog").unwrap().unwrap().success_count, 9);
    }

    #[test]
    fn list_all_returns_every_record() {
        let store = store();
        for (term, translation) in [("cat", "猫"), ("dog", "犬"), ("book", "本")] {
            store
                .insert_if_absent(&MasteryRecord::new(term, translation))
                .unwrap();
        }
        let mut ids: Vec<String> = store
            .list_all()
            .unwrap()
            .into_iter()
            .map(|r| r.pair_id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["book", "cat", "dog"]);
    }

    #[test]
    fn graduation_through_tracker() {
        let tracker = MasteryTracker::new(store());
        tracker.record_miss("dog", "犬").unwrap();
        let mut count = 0;
        for _ in 0..10 {
            count = tracker.record_success("dog").unwrap();
        }
        assert!(tracker.graduation_candidate(count));
        assert!(tracker.confirm_graduation("dog").unwrap());
        assert_eq!(tracker.store().count().unwrap(), 0);
    }

    #[test]
    fn open_on_disk_persists() {
        let dir = std::env::temp_dir().join(format!("wordmatch-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("mastery.db");
        {
            let store = SqliteMasteryStore::open(&path).unwrap();
            store.insert_if_absent(&MasteryRecord::new("cat", "猫")).unwrap();
        }
        let reopened = SqliteMasteryStore::open(&path).unwrap();
        assert_eq!(reopened.count().unwrap(), 1);
        std::fs::remove_dir_all(&dir).ok();
    }
}
