//! Cross-round mastery tracking for missed words.
//!
//! Words missed in normal play get a [`MasteryRecord`] with a zero success
//! counter. Each successful match in a remedial round bumps the counter; once
//! it reaches the graduation threshold the word is proposed for graduation,
//! and only an explicit confirmation deletes the record.
//!
//! The tracker never caches records. Every call reads and writes through the
//! [`MasteryStore`].

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::error::{MasteryError, StoreError};
use crate::types::{MasteryRecord, GRADUATION_THRESHOLD};

/// Persistent storage for mastery records, keyed by pair id.
pub trait MasteryStore {
    fn get(&self, pair_id: &str) -> Result<Option<MasteryRecord>, StoreError>;

    /// Insert `record` unless a record with the same pair id exists.
    /// Returns whether a row was inserted.
    fn insert_if_absent(&self, record: &MasteryRecord) -> Result<bool, StoreError>;

    /// Atomically add one to the success counter. `None` if the record is missing.
    fn increment_success(&self, pair_id: &str) -> Result<Option<u32>, StoreError>;

    /// Remove a record. Returns whether one existed.
    fn delete(&self, pair_id: &str) -> Result<bool, StoreError>;

    /// All records, least recently touched first where the backend tracks it.
    fn list_all(&self) -> Result<Vec<MasteryRecord>, StoreError>;

    fn count(&self) -> Result<usize, StoreError>;
}

impl<S: MasteryStore + ?Sized> MasteryStore for Arc<S> {
    fn get(&self, pair_id: &str) -> Result<Option<MasteryRecord>, StoreError> {
        (**self).get(pair_id)
    }

    fn insert_if_absent(&self, record: &MasteryRecord) -> Result<bool, StoreError> {
        (**self).insert_if_absent(record)
    }

    fn increment_success(&self, pair_id: &str) -> Result<Option<u32>, StoreError> {
        (**self).increment_success(pair_id)
    }

    fn delete(&self, pair_id: &str) -> Result<bool, StoreError> {
        (**self).delete(pair_id)
    }

    fn list_all(&self) -> Result<Vec<MasteryRecord>, StoreError> {
        (**self).list_all()
    }

    fn count(&self) -> Result<usize, StoreError> {
        (**self).count()
    }
}

/// In-process store backed by a map.
#[derive(Debug, Default)]
pub struct MemoryMasteryStore {
    records: Mutex<BTreeMap<String, MasteryRecord>>,
}

impl MemoryMasteryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with `records`, replacing duplicates.
    pub fn with_records(records: impl IntoIterator<Item = MasteryRecord>) -> Self {
        let map = records
            .into_iter()
            .map(|record| (record.pair_id.clone(), record))
            .collect();
        Self {
            records: Mutex::new(map),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, MasteryRecord>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::new("memory store lock poisoned"))
    }
}

impl MasteryStore for MemoryMasteryStore {
    fn get(&self, pair_id: &str) -> Result<Option<MasteryRecord>, StoreError> {
        Ok(self.lock()?.get(pair_id).cloned())
    }

    fn insert_if_absent(&self, record: &MasteryRecord) -> Result<bool, StoreError> {
        let mut records = self.lock()?;
        if records.contains_key(&record.pair_id) {
            return Ok(false);
        }
        records.insert(record.pair_id.clone(), record.clone());
        Ok(true)
    }

    fn increment_success(&self, pair_id: &str) -> Result<Option<u32>, StoreError> {
        Ok(self.lock()?.get_mut(pair_id).map(|record| {
            record.success_count += 1;
            record.success_count
        }))
    }

    fn delete(&self, pair_id: &str) -> Result<bool, StoreError> {
        Ok(self.lock()?.remove(pair_id).is_some())
    }

    fn list_all(&self) -> Result<Vec<MasteryRecord>, StoreError> {
        Ok(self.lock()?.values().cloned().collect())
    }

    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.len())
    }
}

/// Applies the miss, success and graduation rules on top of a store.
#[derive(Debug)]
pub struct MasteryTracker<S> {
    store: S,
    threshold: u32,
}

impl<S: MasteryStore> MasteryTracker<S> {
    pub fn new(store: S) -> Self {
        Self::with_threshold(store, GRADUATION_THRESHOLD)
    }

    pub fn with_threshold(store: S, threshold: u32) -> Self {
        Self { store, threshold }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Start tracking a missed word. An existing record keeps its counter.
    /// Returns whether a new record was created.
    pub fn record_miss(&self, pair_id: &str, translation: &str) -> Result<bool, MasteryError> {
        let created = self
            .store
            .insert_if_absent(&MasteryRecord::new(pair_id, translation))?;
        if created {
            tracing::info!(pair_id, "word added to review pool");
        }
        Ok(created)
    }

    /// Count a successful remedial match and return the new counter.
    pub fn record_success(&self, pair_id: &str) -> Result<u32, MasteryError> {
        let count = self
            .store
            .increment_success(pair_id)?
            .ok_or_else(|| MasteryError::RecordNotFound(pair_id.to_string()))?;
        tracing::debug!(pair_id, count, "review success recorded");
        Ok(count)
    }

    pub fn graduation_candidate(&self, count: u32) -> bool {
        count >= self.threshold
    }

    /// Delete a record after the player confirmed graduation.
    pub fn confirm_graduation(&self, pair_id: &str) -> Result<bool, MasteryError> {
        let removed = self.store.delete(pair_id)?;
        if removed {
            tracing::info!(pair_id, "word graduated");
        }
        Ok(removed)
    }

    /// Leave the record and its counter untouched.
    pub fn deny_graduation(&self, pair_id: &str) {
        tracing::debug!(pair_id, "graduation declined");
    }
}
