//! Dedup memory: every triplet collected so far in one run.
//!
//! Monotonically growing, never holds a duplicate, and keeps insertion order
//! so the reflection prompt is deterministic. Scoped to a single run; a new
//! question starts with a fresh memory.

use std::collections::HashSet;

use crate::graph::TripletKey;

/// Insertion-ordered set of triplet keys.
#[derive(Debug, Default)]
pub struct TripletMemory {
    seen: HashSet<TripletKey>,
    order: Vec<TripletKey>,
}

impl TripletMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the triplet was already collected at an earlier depth.
    pub fn contains(&self, key: &TripletKey) -> bool {
        self.seen.contains(key)
    }

    /// Adds the keys that are not yet present, keeping first-seen order.
    pub fn extend(&mut self, keys: impl IntoIterator<Item = TripletKey>) {
        for key in keys {
            if self.seen.insert(key.clone()) {
                self.order.push(key);
            }
        }
    }

    /// All collected keys in first-seen order.
    pub fn keys(&self) -> &[TripletKey] {
        &self.order
    }

    /// Copy of the membership set, for search stages that also need to dedup
    /// within their own pass.
    pub fn snapshot(&self) -> HashSet<TripletKey> {
        self.seen.clone()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
