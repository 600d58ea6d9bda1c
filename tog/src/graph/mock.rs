//! Mock graph for tests and demos.
//!
//! In-memory maps keyed by entity label; builder methods seed relationships,
//! triplets, and fuzzy-find results. Backend failures are switchable per
//! method so tests can drive every branch of the graph error category.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::GraphError;
use super::{Entity, Graph, Relationship, Triplet};

/// In-memory graph: fixed answers per entity label / (entity, relationship) pair.
///
/// **Interaction**: Implements [`Graph`]; used by the `reason` integration
/// tests the way a fixture database would be.
#[derive(Default)]
pub struct MockGraph {
    entities: HashMap<String, Entity>,
    relationships: HashMap<String, Vec<Relationship>>,
    triplets: HashMap<(String, String), Vec<Triplet>>,
    find_results: Vec<Entity>,
    fail_relationships: bool,
    fail_triplets: bool,
}

impl MockGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entity for `get_entities` lookup by id.
    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.entities.insert(entity.id.clone(), entity);
        self
    }

    /// Seeds the relationships returned for an entity label.
    pub fn with_relationships(mut self, entity_label: &str, labels: &[&str]) -> Self {
        self.relationships.insert(
            entity_label.to_string(),
            labels.iter().map(|l| Relationship::new(*l)).collect(),
        );
        self
    }

    /// Seeds the triplets returned for an (entity label, relationship label) pair.
    pub fn with_triplets(
        mut self,
        entity_label: &str,
        relationship_label: &str,
        triplets: Vec<Triplet>,
    ) -> Self {
        self.triplets.insert(
            (entity_label.to_string(), relationship_label.to_string()),
            triplets,
        );
        self
    }

    /// Seeds the entities returned by `find`, regardless of the queries.
    pub fn with_find_results(mut self, entities: Vec<Entity>) -> Self {
        self.find_results = entities;
        self
    }

    /// Makes `get_relationships` fail with a backend error.
    pub fn with_failing_relationships(mut self) -> Self {
        self.fail_relationships = true;
        self
    }

    /// Makes `get_triplets` fail with a backend error.
    pub fn with_failing_triplets(mut self) -> Self {
        self.fail_triplets = true;
        self
    }
}

#[async_trait]
impl Graph for MockGraph {
    async fn get_entities(&self, ids: &[String]) -> Result<Vec<Entity>, GraphError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.entities.get(id).cloned())
            .collect())
    }

    async fn get_relationships(&self, entity: &Entity) -> Result<Vec<Relationship>, GraphError> {
        if self.fail_relationships {
            return Err(GraphError::Backend("mock relationship failure".into()));
        }
        Ok(self
            .relationships
            .get(&entity.label)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_triplets(
        &self,
        entity: &Entity,
        relationship: &Relationship,
    ) -> Result<Vec<Triplet>, GraphError> {
        if self.fail_triplets {
            return Err(GraphError::Backend("mock triplet failure".into()));
        }
        Ok(self
            .triplets
            .get(&(entity.label.clone(), relationship.label.clone()))
            .cloned()
            .unwrap_or_default())
    }

    async fn find(&self, _queries: &[String]) -> Result<Vec<Entity>, GraphError> {
        Ok(self.find_results.clone())
    }
}
