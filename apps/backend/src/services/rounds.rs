//! In-memory registry of rounds being played.
//!
//! Each round belongs to one controller. Handlers lock the registry, run one
//! controller operation to completion and release it before any await.
//!
//! Rounds nobody touches for `idle_ttl` are dropped on the next insert, and
//! the registry never holds more than `max_rounds` controllers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use uuid::Uuid;
use wordmatch_core::{RoundController, Stage};

use crate::db::SqliteMasteryStore;
use crate::error::{ApiError, Result};

pub type Controller = RoundController<Arc<SqliteMasteryStore>>;

const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(30 * 60);
const DEFAULT_MAX_ROUNDS: usize = 256;

struct Entry {
    controller: Controller,
    touched: Instant,
}

pub struct RoundRegistry {
    rounds: Mutex<HashMap<Uuid, Entry>>,
    idle_ttl: Duration,
    max_rounds: usize,
}

impl Default for RoundRegistry {
    fn default() -> Self {
        Self::with_limits(DEFAULT_IDLE_TTL, DEFAULT_MAX_ROUNDS)
    }
}

impl RoundRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(idle_ttl: Duration, max_rounds: usize) -> Self {
        Self {
            rounds: Mutex::new(HashMap::new()),
            idle_ttl,
            max_rounds: max_rounds.max(1),
        }
    }

    /// Register a controller and return its round id. Idle rounds are swept
    /// first; if the registry is still full the least recently touched round
    /// is evicted, finished rounds before ones still being played.
    pub fn insert(&self, controller: Controller) -> Result<Uuid> {
        let mut rounds = self.lock()?;
        let now = Instant::now();

        let before = rounds.len();
        rounds.retain(|_, entry| now.duration_since(entry.touched) < self.idle_ttl);
        let swept = before - rounds.len();

        while rounds.len() >= self.max_rounds {
            let Some(oldest) = rounds
                .iter()
                .min_by_key(|(_, entry)| (entry.controller.stage() == Stage::Playing, entry.touched))
                .map(|(id, _)| *id)
            else {
                break;
            };
            rounds.remove(&oldest);
            tracing::warn!(id = %oldest, "round registry full, evicted round");
        }

        let id = Uuid::new_v4();
        rounds.insert(
            id,
            Entry {
                controller,
                touched: now,
            },
        );
        tracing::debug!(%id, swept, rounds = rounds.len(), "round registered");
        Ok(id)
    }

    /// Run `f` against the round with `id`.
    pub fn with_round<T>(&self, id: Uuid, f: impl FnOnce(&mut Controller) -> T) -> Result<T> {
        let mut rounds = self.lock()?;
        let entry = rounds
            .get_mut(&id)
            .ok_or_else(|| ApiError::NotFound(format!("Round {id}")))?;
        entry.touched = Instant::now();
        Ok(f(&mut entry.controller))
    }

    pub fn remove(&self, id: Uuid) -> Result<bool> {
        Ok(self.lock()?.remove(&id).is_some())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, Entry>>> {
        self.rounds
            .lock()
            .map_err(|_| ApiError::Internal("round registry lock poisoned".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use wordmatch_core::{GameSettings, Tier};

    fn controller() -> Controller {
        let store = Arc::new(SqliteMasteryStore::open_in_memory().unwrap());
        RoundController::new(GameSettings::default(), store)
    }

    fn playing() -> Controller {
        let mut controller = controller();
        controller
            .start_normal(Tier::Beginner, &mut StdRng::seed_from_u64(1), chrono::Utc::now())
            .unwrap();
        controller
    }

    #[test]
    fn insert_and_lookup() {
        let registry = RoundRegistry::new();
        let id = registry.insert(controller()).unwrap();
        let stage = registry.with_round(id, |c| c.stage()).unwrap();
        assert_eq!(stage, Stage::Setup);
        assert_eq!(registry.len().unwrap(), 1);
    }

    #[test]
    fn unknown_round_is_not_found() {
        let registry = RoundRegistry::new();
        let result = registry.with_round(Uuid::new_v4(), |c| c.stage());
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[test]
    fn remove_round() {
        let registry = RoundRegistry::new();
        let id = registry.insert(controller()).unwrap();
        assert!(registry.remove(id).unwrap());
        assert!(!registry.remove(id).unwrap());
        assert_eq!(registry.len().unwrap(), 0);
    }

    #[test]
    fn idle_rounds_are_swept_on_insert() {
        let registry = RoundRegistry::with_limits(Duration::ZERO, 16);
        let first = registry.insert(playing()).unwrap();
        let second = registry.insert(playing()).unwrap();

        assert_eq!(registry.len().unwrap(), 1);
        assert!(registry.with_round(first, |c| c.stage()).is_err());
        assert!(registry.with_round(second, |c| c.stage()).is_ok());
    }

    #[test]
    fn full_registry_evicts_finished_rounds_first() {
        let registry = RoundRegistry::with_limits(DEFAULT_IDLE_TTL, 2);
        let active = registry.insert(playing()).unwrap();
        let finished = registry.insert(playing()).unwrap();
        registry.with_round(finished, |c| c.retire()).unwrap().unwrap();

        let newest = registry.insert(playing()).unwrap();

        assert_eq!(registry.len().unwrap(), 2);
        assert!(registry.with_round(finished, |c| c.stage()).is_err());
        assert!(registry.with_round(active, |c| c.stage()).is_ok());
        assert!(registry.with_round(newest, |c| c.stage()).is_ok());
    }

    #[test]
    fn registry_never_exceeds_cap() {
        let registry = RoundRegistry::with_limits(DEFAULT_IDLE_TTL, 3);
        for _ in 0..10 {
            registry.insert(playing()).unwrap();
        }
        assert_eq!(registry.len().unwrap(), 3);
    }
}
