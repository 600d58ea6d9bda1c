//! Graph capability: entities, relationships, triplets, and the backend trait.
//!
//! The reasoning loop only ever talks to a graph through [`Graph`]; concrete
//! stores (a local SQLite triplet table, a remote property graph, a federated
//! triple store) live behind it. All pruning and dedup comparisons in the loop
//! operate on **labels**, not identifiers — two distinct nodes sharing a label
//! are indistinguishable to the loop (documented by a fixture test in
//! `tests/reason_scenarios.rs`, not silently fixed).

mod filter;
mod mock;
mod sqlite;

pub use filter::filter_relationships;
pub use mock::MockGraph;
pub use sqlite::SqliteGraph;

use async_trait::async_trait;

use crate::error::GraphError;

/// An opaque graph node: stable identifier plus display label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entity {
    /// Backend identifier (uuid, QID, …). Never used for pruning comparisons.
    pub id: String,
    /// Display label; the comparison key throughout the loop.
    pub label: String,
}

impl Entity {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// An opaque edge type. Direction-agnostic relative to an entity: it may
/// describe an incoming or an outgoing edge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Relationship {
    pub label: String,
}

impl Relationship {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

/// A concrete directed edge, head → tail by construction once fetched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Triplet {
    pub head: Entity,
    pub relationship: Relationship,
    pub tail: Entity,
}

/// Label triple used for dedup and for everything shown to the oracle.
pub type TripletKey = (String, String, String);

impl Triplet {
    pub fn new(head: Entity, relationship: Relationship, tail: Entity) -> Self {
        Self {
            head,
            relationship,
            tail,
        }
    }

    /// (head-label, relationship-label, tail-label) — the identity of this
    /// triplet as far as dedup memory and the oracle are concerned.
    pub fn key(&self) -> TripletKey {
        (
            self.head.label.clone(),
            self.relationship.label.clone(),
            self.tail.label.clone(),
        )
    }
}

/// A candidate expansion step: frontier entity plus one of its relationships.
pub type Pair = (Entity, Relationship);

/// Knowledge graph backend.
///
/// **Interaction**: Called by the search stages of `reason`; every call is
/// counted in the run's telemetry by the caller, and every failure is
/// classified into the graph category.
#[async_trait]
pub trait Graph: Send + Sync {
    /// Fetches entities by backend identifier. Unknown ids are skipped.
    async fn get_entities(&self, ids: &[String]) -> Result<Vec<Entity>, GraphError>;

    /// Returns all distinct relationship types incident to `entity`, ingoing
    /// and outgoing alike.
    async fn get_relationships(&self, entity: &Entity) -> Result<Vec<Relationship>, GraphError>;

    /// Returns all triplets containing the given entity and relationship, in
    /// `(head, outgoing relationship, tail)` form.
    async fn get_triplets(
        &self,
        entity: &Entity,
        relationship: &Relationship,
    ) -> Result<Vec<Triplet>, GraphError>;

    /// Best-effort fuzzy lookup of entities from keyword queries. Backends
    /// without a fuzzy index may return an empty list.
    async fn find(&self, queries: &[String]) -> Result<Vec<Entity>, GraphError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: key() is the label triple, ignoring ids.
    #[test]
    fn triplet_key_is_label_triple() {
        let t = Triplet::new(
            Entity::new("q1", "Tokyo"),
            Relationship::new("capital of"),
            Entity::new("q2", "Empire of Japan"),
        );
        assert_eq!(
            t.key(),
            (
                "Tokyo".to_string(),
                "capital of".to_string(),
                "Empire of Japan".to_string()
            )
        );
    }

    /// **Scenario**: two entities with different ids but the same label produce
    /// equal triplet keys — the label-identity ambiguity the loop inherits.
    #[test]
    fn triplet_key_collides_for_shared_labels() {
        let a = Triplet::new(
            Entity::new("q1", "Mercury"),
            Relationship::new("discovered by"),
            Entity::new("q9", "Unknown"),
        );
        let b = Triplet::new(
            Entity::new("q2", "Mercury"),
            Relationship::new("discovered by"),
            Entity::new("q9", "Unknown"),
        );
        assert_eq!(a.key(), b.key());
    }
}
