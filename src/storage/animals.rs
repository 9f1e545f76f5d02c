//! Registry of known animal identifiers

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::validation::error::ValidationError;

/// Number of tagged animals the registry starts with
pub const SEEDED_ANIMAL_COUNT: usize = 16;

/// Result of registering an animal id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Added,
    Exists,
}

/// Sorted set of animal ids
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnimalRegistry {
    ids: BTreeSet<String>,
}

impl AnimalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with `P01` through `P16`
    pub fn seeded() -> Self {
        Self {
            ids: (1..=SEEDED_ANIMAL_COUNT).map(|i| format!("P{:02}", i)).collect(),
        }
    }

    pub fn register(&mut self, id: &str) -> Result<Registration, ValidationError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ValidationError::InvalidField {
                index: 0,
                field: "animal_id",
                value: String::new(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.ids.insert(id.to_string()) {
            Ok(Registration::Added)
        } else {
            Ok(Registration::Exists)
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.ids.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
