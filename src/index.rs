//! Job identifier index.

use serde::{Deserialize, Serialize};

/// Ordered collection of the job identifiers the manager considers live.
///
/// Identifiers are unique within the index and keep their insertion order.
/// Serializes transparently as a JSON array of strings, so the persisted
/// index record is a plain identifier list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobIndex {
    ids: Vec<String>,
}

impl JobIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self { ids: Vec::new() }
    }

    /// Build an index from identifiers, keeping the first occurrence of each.
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut index = Self::new();
        for id in ids {
            index.insert(id);
        }
        index
    }

    /// Append an identifier unless it is already present.
    ///
    /// Returns whether the identifier was appended.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.contains(&id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    /// Remove an identifier. Returns whether it was present.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.ids.len();
        self.ids.retain(|existing| existing != id);
        self.ids.len() != before
    }

    /// Whether an identifier is present.
    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|existing| existing == id)
    }

    /// The identifiers in index order.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Number of indexed identifiers.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
