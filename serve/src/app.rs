//! Axum app: state, router, and the config/reset handlers.
//!
//! The oracle and the graph are built once from the environment at startup;
//! only [`RunSettings`] (beam width, depth, default seeds) is editable at
//! runtime over `PUT /config`.

use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{oneshot, RwLock};
use tracing::info;

use tog::{ChatOracle, Graph, Oracle, SqliteGraph};

use super::chat::chat_handler;

/// Runtime-editable knobs for each chat run.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub(crate) struct RunSettings {
    /// Beam width: selection cardinality at every prune.
    pub(crate) max_paths: usize,
    /// Exploration iterations per run.
    pub(crate) max_depth: usize,
    /// Entity ids to fall back to when seed resolution finds nothing.
    pub(crate) default_seed_entities: Vec<String>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            max_paths: 3,
            max_depth: 3,
            default_seed_entities: Vec::new(),
        }
    }
}

/// Builds RunSettings from environment variables, falling back to [`Default`]
/// for unset or invalid values.
///
/// - `MAX_PATHS` (default 3)
/// - `MAX_DEPTH` (default 3)
/// - `DEFAULT_SEED_ENTITIES` (comma-separated ids, default empty)
pub(crate) fn settings_from_env() -> RunSettings {
    let default = RunSettings::default();
    RunSettings {
        max_paths: std::env::var("MAX_PATHS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(default.max_paths),
        max_depth: std::env::var("MAX_DEPTH")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(default.max_depth),
        default_seed_entities: std::env::var("DEFAULT_SEED_ENTITIES")
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or(default.default_seed_entities),
    }
}

/// Shared state for the façade.
pub(crate) struct AppState {
    pub(crate) oracle: Arc<dyn Oracle>,
    pub(crate) graph: Arc<dyn Graph>,
    pub(crate) settings: RwLock<RunSettings>,
    /// When set, the first finished chat run sends on this to signal server
    /// exit (once mode).
    pub(crate) shutdown_tx: Mutex<Option<oneshot::Sender<()>>>,
}

/// Builds state from the environment: `GRAPH_DB` (default `graph.db`),
/// `ORACLE_MODEL` (default `gpt-4o-mini`), plus [`settings_from_env`].
pub(crate) fn state_from_env(
    shutdown_tx: Option<oneshot::Sender<()>>,
) -> Result<AppState, Box<dyn std::error::Error + Send + Sync>> {
    let db_path = std::env::var("GRAPH_DB").unwrap_or_else(|_| "graph.db".to_string());
    let model = std::env::var("ORACLE_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
    info!(db_path, model, "building oracle and graph from env");
    let graph = SqliteGraph::new(&db_path)?;
    let oracle = ChatOracle::new(model).with_context();
    Ok(AppState {
        oracle: Arc::new(oracle),
        graph: Arc::new(graph),
        settings: RwLock::new(settings_from_env()),
        shutdown_tx: Mutex::new(shutdown_tx),
    })
}

/// Routes: chat (SSE), config get/put, oracle reset.
pub(crate) fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/chat", get(chat_handler))
        .route("/config", get(get_config).put(put_config))
        .route("/reset-oracle", post(reset_oracle))
        .with_state(state)
}

/// Handles `GET /config`: the current run settings.
async fn get_config(State(state): State<Arc<AppState>>) -> Json<RunSettings> {
    Json(state.settings.read().await.clone())
}

/// Handles `PUT /config`: replaces the run settings, echoes the new value.
async fn put_config(
    State(state): State<Arc<AppState>>,
    Json(new_settings): Json<RunSettings>,
) -> Json<RunSettings> {
    info!(?new_settings, "run settings updated");
    *state.settings.write().await = new_settings.clone();
    Json(new_settings)
}

/// Handles `POST /reset-oracle`: clears the rolling oracle context.
async fn reset_oracle(State(state): State<Arc<AppState>>) -> Json<bool> {
    state.oracle.flush_context().await;
    Json(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tog::{MockGraph, MockOracle};

    fn mock_state() -> Arc<AppState> {
        Arc::new(AppState {
            oracle: Arc::new(MockOracle::new()),
            graph: Arc::new(MockGraph::new()),
            settings: RwLock::new(RunSettings::default()),
            shutdown_tx: Mutex::new(None),
        })
    }

    /// **Scenario**: PUT replaces the settings and GET returns the new value.
    #[tokio::test]
    async fn put_config_replaces_settings() {
        let state = mock_state();
        let new_settings = RunSettings {
            max_paths: 5,
            max_depth: 1,
            default_seed_entities: vec!["q42".to_string()],
        };

        let Json(echoed) = put_config(State(state.clone()), Json(new_settings.clone())).await;
        assert_eq!(echoed, new_settings);

        let Json(current) = get_config(State(state)).await;
        assert_eq!(current, new_settings);
    }

    /// **Scenario**: reset-oracle flushes the oracle context.
    #[tokio::test]
    async fn reset_oracle_flushes_context() {
        let oracle = Arc::new(MockOracle::new());
        let state = Arc::new(AppState {
            oracle: oracle.clone(),
            graph: Arc::new(MockGraph::new()),
            settings: RwLock::new(RunSettings::default()),
            shutdown_tx: Mutex::new(None),
        });

        let Json(ok) = reset_oracle(State(state)).await;
        assert!(ok);
        assert_eq!(oracle.flush_count(), 1);
    }

    /// **Scenario**: settings serialize with the field names the UI keys on.
    #[test]
    fn settings_serialize_with_stable_field_names() {
        let json = serde_json::to_value(RunSettings::default()).unwrap();
        assert!(json.get("max_paths").is_some());
        assert!(json.get("max_depth").is_some());
        assert!(json.get("default_seed_entities").is_some());
    }
}
