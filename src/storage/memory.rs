//! In-process store with staged, all-or-nothing transactions.
//!
//! Transactions read committed state under a short shared lock and keep
//! their writes in a private staging area. Commit applies everything under
//! a single exclusive lock, so readers observe either the state before the
//! batch or the state after it.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::core::{Fix, Observation};
use crate::storage::animals::{AnimalRegistry, Registration};
use crate::storage::{FixStore, StoreTransaction};
use crate::validation::error::{FixError, PersistenceError};

/// Serializable image of the store's contents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub observations: Vec<Observation>,
    #[serde(default)]
    pub fixes: Vec<Fix>,
    #[serde(default = "AnimalRegistry::seeded")]
    pub animals: AnimalRegistry,
}

#[derive(Debug, Default)]
struct StoreState {
    observations: Vec<Observation>,
    fixes: BTreeMap<String, Fix>,
    animals: AnimalRegistry,
}

/// Thread-safe in-memory [`FixStore`]
#[derive(Debug)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Empty store with the default animal registry
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState {
                animals: AnimalRegistry::seeded(),
                ..StoreState::default()
            }),
        }
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let fixes = snapshot
            .fixes
            .into_iter()
            .map(|fix| (fix.group_id.clone(), fix))
            .collect();

        Self {
            state: RwLock::new(StoreState {
                observations: snapshot.observations,
                fixes,
                animals: snapshot.animals,
            }),
        }
    }

    pub fn snapshot(&self) -> Result<StoreSnapshot, PersistenceError> {
        let state = self.read("snapshot")?;
        Ok(StoreSnapshot {
            observations: state.observations.clone(),
            fixes: state.fixes.values().cloned().collect(),
            animals: state.animals.clone(),
        })
    }

    /// Load a JSON snapshot; a missing file yields an empty store
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("no snapshot at {}, starting empty", path.display());
            return Ok(Self::new());
        }
        let contents = fs::read_to_string(path)?;
        let snapshot: StoreSnapshot = serde_json::from_str(&contents)?;
        debug!(
            "loaded {} observations and {} fixes from {}",
            snapshot.observations.len(),
            snapshot.fixes.len(),
            path.display()
        );
        Ok(Self::from_snapshot(snapshot))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(&self.snapshot()?)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Total number of stored observations
    pub fn observation_count(&self) -> Result<usize, PersistenceError> {
        Ok(self.read("observation_count")?.observations.len())
    }

    /// Operator override: relabel a stored fix. Returns false if the group has no fix.
    pub fn annotate_fix(&self, group_id: &str, animal_id: &str, note: &str) -> Result<bool, PersistenceError> {
        let mut state = self.write("annotate_fix")?;
        match state.fixes.get_mut(group_id) {
            Some(fix) => {
                fix.animal_id = animal_id.to_string();
                fix.note = note.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Operator override: drop a stored fix. Returns false if the group has no fix.
    pub fn remove_fix(&self, group_id: &str) -> Result<bool, PersistenceError> {
        Ok(self.write("remove_fix")?.fixes.remove(group_id).is_some())
    }

    pub fn animals(&self) -> Result<Vec<String>, PersistenceError> {
        Ok(self.read("animals")?.animals.ids())
    }

    pub fn register_animal(&self, id: &str) -> Result<Registration, FixError> {
        Ok(self.write("register_animal")?.animals.register(id)?)
    }

    fn read(&self, operation: &'static str) -> Result<RwLockReadGuard<'_, StoreState>, PersistenceError> {
        self.state.read().map_err(|_| PersistenceError::Unavailable {
            operation,
            reason: "store lock poisoned".to_string(),
        })
    }

    fn write(&self, operation: &'static str) -> Result<RwLockWriteGuard<'_, StoreState>, PersistenceError> {
        self.state.write().map_err(|_| PersistenceError::Unavailable {
            operation,
            reason: "store lock poisoned".to_string(),
        })
    }
}

impl FixStore for MemoryStore {
    type Transaction<'a> = MemoryTransaction<'a>;

    fn begin(&self) -> Result<Self::Transaction<'_>, PersistenceError> {
        Ok(MemoryTransaction {
            store: self,
            staged_observations: Vec::new(),
            staged_fixes: BTreeMap::new(),
        })
    }

    fn fix(&self, group_id: &str) -> Result<Option<Fix>, PersistenceError> {
        Ok(self.read("fix")?.fixes.get(group_id).cloned())
    }

    fn fixes(&self) -> Result<Vec<Fix>, PersistenceError> {
        Ok(self.read("fixes")?.fixes.values().cloned().collect())
    }

    fn observations(&self, group_id: &str) -> Result<Vec<Observation>, PersistenceError> {
        Ok(self
            .read("observations")?
            .observations
            .iter()
            .filter(|o| o.group_id == group_id)
            .cloned()
            .collect())
    }
}

/// Staged writes against a [`MemoryStore`]
#[derive(Debug)]
pub struct MemoryTransaction<'a> {
    store: &'a MemoryStore,
    staged_observations: Vec<Observation>,
    /// `None` stages a deletion
    staged_fixes: BTreeMap<String, Option<Fix>>,
}

impl StoreTransaction for MemoryTransaction<'_> {
    fn insert_observations(&mut self, observations: &[Observation]) -> Result<(), PersistenceError> {
        self.staged_observations.extend_from_slice(observations);
        Ok(())
    }

    fn observations_for_group(&self, group_id: &str) -> Result<Vec<Observation>, PersistenceError> {
        let mut found = self.store.observations(group_id)?;
        found.extend(
            self.staged_observations
                .iter()
                .filter(|o| o.group_id == group_id)
                .cloned(),
        );
        Ok(found)
    }

    fn replace_fix(&mut self, fix: Fix) -> Result<(), PersistenceError> {
        self.staged_fixes.insert(fix.group_id.clone(), Some(fix));
        Ok(())
    }

    fn delete_fix(&mut self, group_id: &str) -> Result<(), PersistenceError> {
        self.staged_fixes.insert(group_id.to_string(), None);
        Ok(())
    }

    fn commit(self) -> Result<(), PersistenceError> {
        let mut state = self.store.write("commit")?;
        let inserted = self.staged_observations.len();
        let fix_writes = self.staged_fixes.len();

        state.observations.extend(self.staged_observations);
        for (group_id, fix) in self.staged_fixes {
            match fix {
                Some(fix) => {
                    state.fixes.insert(group_id, fix);
                }
                None => {
                    state.fixes.remove(&group_id);
                }
            }
        }

        debug!("committed {} observations and {} fix writes", inserted, fix_writes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GeodeticPoint;
    use chrono::Utc;

    fn observation(group_id: &str, animal_id: &str, bearing: f64) -> Observation {
        Observation {
            group_id: group_id.to_string(),
            animal_id: animal_id.to_string(),
            observer: "MK".to_string(),
            position: GeodeticPoint::new(19.05, 73.05),
            bearing_deg: bearing,
            gps_accuracy_m: None,
            timestamp: Utc::now(),
        }
    }

    fn fix(group_id: &str, note: &str) -> Fix {
        Fix {
            group_id: group_id.to_string(),
            animal_id: "P01".to_string(),
            latitude: 19.05,
            longitude: 73.05,
            note: note.to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_staged_writes_invisible_until_commit() {
        let store = MemoryStore::new();
        let mut tx = store.begin().unwrap();
        tx.insert_observations(&[observation("G1", "P01", 10.0)]).unwrap();
        tx.replace_fix(fix("G1", "first")).unwrap();

        // The transaction sees its own observations, the store does not yet
        assert_eq!(tx.observations_for_group("G1").unwrap().len(), 1);
        assert!(store.observations("G1").unwrap().is_empty());
        assert!(store.fix("G1").unwrap().is_none());

        tx.commit().unwrap();
        assert_eq!(store.observations("G1").unwrap().len(), 1);
        assert_eq!(store.fix("G1").unwrap().unwrap().note, "first");
    }

    #[test]
    fn test_dropped_transaction_rolls_back() {
        let store = MemoryStore::new();
        {
            let mut tx = store.begin().unwrap();
            tx.insert_observations(&[observation("G1", "P01", 10.0)]).unwrap();
            tx.replace_fix(fix("G1", "never")).unwrap();
        }
        assert_eq!(store.observation_count().unwrap(), 0);
        assert!(store.fixes().unwrap().is_empty());
    }

    #[test]
    fn test_replace_keeps_single_fix_per_group() {
        let store = MemoryStore::new();
        for note in ["first", "second", "third"] {
            let mut tx = store.begin().unwrap();
            tx.replace_fix(fix("G1", note)).unwrap();
            tx.commit().unwrap();
        }

        let fixes = store.fixes().unwrap();
        assert_eq!(fixes.len(), 1);
        assert_eq!(fixes[0].note, "third");
    }

    #[test]
    fn test_delete_fix() {
        let store = MemoryStore::new();
        let mut tx = store.begin().unwrap();
        tx.replace_fix(fix("G1", "first")).unwrap();
        tx.commit().unwrap();

        let mut tx = store.begin().unwrap();
        tx.delete_fix("G1").unwrap();
        tx.delete_fix("missing").unwrap();
        tx.commit().unwrap();
        assert!(store.fix("G1").unwrap().is_none());
    }

    #[test]
    fn test_observations_keep_insertion_order() {
        let store = MemoryStore::new();
        let mut tx = store.begin().unwrap();
        tx.insert_observations(&[observation("G1", "P04", 10.0), observation("G2", "P09", 20.0)])
            .unwrap();
        tx.commit().unwrap();

        let mut tx = store.begin().unwrap();
        tx.insert_observations(&[observation("G1", "P05", 30.0)]).unwrap();
        let group = tx.observations_for_group("G1").unwrap();
        assert_eq!(group.len(), 2);
        assert_eq!(group[0].animal_id, "P04");
        assert_eq!(group[1].animal_id, "P05");
    }

    #[test]
    fn test_operator_edits() {
        let store = MemoryStore::new();
        let mut tx = store.begin().unwrap();
        tx.replace_fix(fix("G1", "Least squares")).unwrap();
        tx.commit().unwrap();

        assert!(store.annotate_fix("G1", "P07", "verified in field").unwrap());
        let stored = store.fix("G1").unwrap().unwrap();
        assert_eq!(stored.animal_id, "P07");
        assert_eq!(stored.note, "verified in field");

        assert!(!store.annotate_fix("G9", "P07", "x").unwrap());
        assert!(store.remove_fix("G1").unwrap());
        assert!(!store.remove_fix("G1").unwrap());
    }

    #[test]
    fn test_animal_registry() {
        let store = MemoryStore::new();
        assert_eq!(store.animals().unwrap().len(), 16);
        assert_eq!(store.register_animal("P20").unwrap(), Registration::Added);
        assert_eq!(store.register_animal("P20").unwrap(), Registration::Exists);
        assert_eq!(store.animals().unwrap().len(), 17);
        assert!(matches!(store.register_animal(""), Err(FixError::Validation(_))));
    }

    #[test]
    fn test_snapshot_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = MemoryStore::load(&path).unwrap();
        let mut tx = store.begin().unwrap();
        tx.insert_observations(&[observation("G1", "P01", 10.0)]).unwrap();
        tx.replace_fix(fix("G1", "first")).unwrap();
        tx.commit().unwrap();
        store.save(&path).unwrap();

        let reloaded = MemoryStore::load(&path).unwrap();
        assert_eq!(reloaded.snapshot().unwrap(), store.snapshot().unwrap());
    }
}
