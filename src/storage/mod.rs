//! Persistence collaborator interface.
//!
//! The engine never talks to a storage technology directly. It opens a
//! [`StoreTransaction`], reads the observations of the groups it is
//! recomputing, stages fix replacements and deletions, and commits. Staged
//! writes become visible together at commit; a transaction dropped without
//! committing leaves the store untouched.

pub mod animals;
pub mod memory;

pub use animals::{AnimalRegistry, Registration};
pub use memory::{MemoryStore, MemoryTransaction, StoreSnapshot};

use crate::core::{Fix, Observation};
use crate::validation::error::PersistenceError;

/// Storage owning observations and fixes
pub trait FixStore: Send + Sync {
    type Transaction<'a>: StoreTransaction
    where
        Self: 'a;

    /// Open a transaction scope
    fn begin(&self) -> Result<Self::Transaction<'_>, PersistenceError>;

    /// Current fix for a group, if any
    fn fix(&self, group_id: &str) -> Result<Option<Fix>, PersistenceError>;

    /// All current fixes, ordered by group id
    fn fixes(&self) -> Result<Vec<Fix>, PersistenceError>;

    /// All committed observations of a group in insertion order
    fn observations(&self, group_id: &str) -> Result<Vec<Observation>, PersistenceError>;
}

/// Unit of work against a [`FixStore`]
pub trait StoreTransaction {
    /// Stage new observations; they are visible to reads in this transaction
    fn insert_observations(&mut self, observations: &[Observation]) -> Result<(), PersistenceError>;

    /// Every observation on file for a group, staged ones included, in insertion order
    fn observations_for_group(&self, group_id: &str) -> Result<Vec<Observation>, PersistenceError>;

    /// Stage a delete-then-insert of the group's fix
    fn replace_fix(&mut self, fix: Fix) -> Result<(), PersistenceError>;

    /// Stage removal of the group's fix, if one exists
    fn delete_fix(&mut self, group_id: &str) -> Result<(), PersistenceError>;

    /// Apply all staged writes atomically
    fn commit(self) -> Result<(), PersistenceError>;
}
