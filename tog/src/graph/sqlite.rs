//! SQLite-backed triplet store implementing [`Graph`].
//!
//! One `triplets` table (head id/label, relationship label, tail id/label);
//! incident relationships are collected from both directions and `find` is a
//! case-insensitive `LIKE` over labels. Each call opens its own connection
//! inside `spawn_blocking`, so the store is cheap to share across tasks.
//!
//! This is the self-contained backend for the CLI and the serve façade;
//! remote property graphs and federated triple stores stay behind the same
//! trait in their own crates.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rusqlite::params;
use tracing::debug;

use crate::error::GraphError;
use super::{Entity, Graph, Relationship, Triplet};

/// Local triplet store. `new` creates the table when missing.
pub struct SqliteGraph {
    db_path: PathBuf,
}

impl SqliteGraph {
    /// Opens (and initializes) the store at `path`.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, GraphError> {
        let db_path = path.as_ref().to_path_buf();
        let conn = open(&db_path)?;
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS triplets (
                head_id TEXT NOT NULL,
                head_label TEXT NOT NULL,
                relationship TEXT NOT NULL,
                tail_id TEXT NOT NULL,
                tail_label TEXT NOT NULL
            )
            "#,
            [],
        )
        .map_err(backend)?;
        Ok(Self { db_path })
    }

    /// Inserts one triplet. Used by ingestion scripts and test fixtures.
    pub fn add_triplet(&self, triplet: &Triplet) -> Result<(), GraphError> {
        let conn = open(&self.db_path)?;
        conn.execute(
            "INSERT INTO triplets (head_id, head_label, relationship, tail_id, tail_label) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                triplet.head.id,
                triplet.head.label,
                triplet.relationship.label,
                triplet.tail.id,
                triplet.tail.label
            ],
        )
        .map_err(backend)?;
        Ok(())
    }

    async fn with_conn<T, F>(&self, op: F) -> Result<T, GraphError>
    where
        T: Send + 'static,
        F: FnOnce(&rusqlite::Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = open(&db_path)?;
            op(&conn).map_err(backend)
        })
        .await
        .map_err(|e| GraphError::Backend(format!("blocking task failed: {e}")))?
    }
}

fn open(path: &Path) -> Result<rusqlite::Connection, GraphError> {
    rusqlite::Connection::open(path).map_err(backend)
}

fn backend(e: rusqlite::Error) -> GraphError {
    GraphError::Backend(e.to_string())
}

fn row_to_triplet(row: &rusqlite::Row<'_>) -> rusqlite::Result<Triplet> {
    Ok(Triplet::new(
        Entity::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?),
        Relationship::new(row.get::<_, String>(2)?),
        Entity::new(row.get::<_, String>(3)?, row.get::<_, String>(4)?),
    ))
}

const TRIPLET_COLUMNS: &str = "head_id, head_label, relationship, tail_id, tail_label";

#[async_trait]
impl Graph for SqliteGraph {
    async fn get_entities(&self, ids: &[String]) -> Result<Vec<Entity>, GraphError> {
        let ids = ids.to_vec();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT head_id, head_label FROM triplets WHERE head_id = ?1 \
                 UNION SELECT tail_id, tail_label FROM triplets WHERE tail_id = ?1 LIMIT 1",
            )?;
            let mut out = Vec::new();
            for id in &ids {
                let entity = stmt
                    .query_row([id], |row| {
                        Ok(Entity::new(
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                        ))
                    });
                match entity {
                    Ok(e) => out.push(e),
                    Err(rusqlite::Error::QueryReturnedNoRows) => continue,
                    Err(e) => return Err(e),
                }
            }
            Ok(out)
        })
        .await
    }

    async fn get_relationships(&self, entity: &Entity) -> Result<Vec<Relationship>, GraphError> {
        let label = entity.label.clone();
        debug!(entity = %label, "sqlite get_relationships");
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT DISTINCT relationship FROM triplets \
                 WHERE head_label = ?1 OR tail_label = ?1 ORDER BY relationship",
            )?;
            let rows = stmt.query_map([&label], |row| row.get::<_, String>(0))?;
            let mut out = Vec::new();
            for row in rows {
                out.push(Relationship::new(row?));
            }
            Ok(out)
        })
        .await
    }

    async fn get_triplets(
        &self,
        entity: &Entity,
        relationship: &Relationship,
    ) -> Result<Vec<Triplet>, GraphError> {
        let label = entity.label.clone();
        let rel = relationship.label.clone();
        debug!(entity = %label, relationship = %rel, "sqlite get_triplets");
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TRIPLET_COLUMNS} FROM triplets \
                 WHERE (head_label = ?1 OR tail_label = ?1) AND relationship = ?2"
            ))?;
            let rows = stmt.query_map(params![label, rel], row_to_triplet)?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
        .await
    }

    async fn find(&self, queries: &[String]) -> Result<Vec<Entity>, GraphError> {
        let queries = queries.to_vec();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT DISTINCT head_id, head_label FROM triplets WHERE head_label LIKE ?1 \
                 UNION SELECT DISTINCT tail_id, tail_label FROM triplets WHERE tail_label LIKE ?1",
            )?;
            let mut out: Vec<Entity> = Vec::new();
            for query in &queries {
                let pattern = format!("%{}%", query);
                let rows = stmt.query_map([&pattern], |row| {
                    Ok(Entity::new(
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                    ))
                })?;
                for row in rows {
                    let entity = row?;
                    if !out.iter().any(|e| e.id == entity.id) {
                        out.push(entity);
                    }
                }
            }
            Ok(out)
        })
        .await
    }
}
