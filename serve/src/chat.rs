//! `GET /chat?prompt=`: one reasoning run on a dedicated worker thread,
//! streamed as SSE.
//!
//! The worker thread runs its own current-thread runtime with a thread-scoped
//! tracing subscriber whose writer forwards each formatted log line into a
//! channel; the handler drains that channel into the SSE stream, then emits
//! the final `RunRecord` JSON and a `[DONE]` sentinel. No cancellation
//! mid-run: dropping the response leaves the worker to finish on its own.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use serde::Deserialize;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::{Stream, StreamExt};
use tracing::error;
use tracing_subscriber::EnvFilter;

use tog::reason::{reason, resolve_seed_entities};
use tog::{Graph, Oracle, RunRecord, TogError};

use super::app::{AppState, RunSettings};

#[derive(Deserialize)]
pub(crate) struct ChatParams {
    prompt: String,
}

/// What the worker pushes over the channel, in order: log lines, then either
/// the record JSON or an error, then the sentinel.
pub(crate) enum ChatEvent {
    Log(String),
    Error(String),
    Data(String),
}

pub(crate) const DONE_SENTINEL: &str = "[DONE]";

/// Handles `GET /chat`: snapshots the settings, spawns the worker, and maps
/// its channel into SSE events.
pub(crate) async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ChatParams>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let settings = state.settings.read().await.clone();
    let shutdown_tx = state
        .shutdown_tx
        .lock()
        .ok()
        .and_then(|mut guard| guard.take());
    let rx = spawn_run(
        params.prompt,
        state.oracle.clone(),
        state.graph.clone(),
        settings,
        shutdown_tx,
    );

    let stream = UnboundedReceiverStream::new(rx).map(|event| {
        Ok::<_, Infallible>(match event {
            ChatEvent::Log(line) | ChatEvent::Data(line) => Event::default().data(line),
            ChatEvent::Error(message) => Event::default().event("error").data(message),
        })
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Spawns the worker thread and returns the receiving end of its channel.
pub(crate) fn spawn_run(
    prompt: String,
    oracle: Arc<dyn Oracle>,
    graph: Arc<dyn Graph>,
    settings: RunSettings,
    shutdown_tx: Option<oneshot::Sender<()>>,
) -> mpsc::UnboundedReceiver<ChatEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        worker(prompt, oracle, graph, settings, tx);
        if let Some(done) = shutdown_tx {
            let _ = done.send(());
        }
    });
    rx
}

/// The worker body: thread-scoped log capture around one blocking run.
fn worker(
    prompt: String,
    oracle: Arc<dyn Oracle>,
    graph: Arc<dyn Graph>,
    settings: RunSettings,
    tx: mpsc::UnboundedSender<ChatEvent>,
) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tog=info,serve=info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(log_writer::LogSink::new(tx.clone()))
        .finish();

    let outcome = tracing::subscriber::with_default(subscriber, || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| TogError::Other(format!("worker runtime: {e}")))?;
        runtime.block_on(run_chat(&prompt, oracle.as_ref(), graph.as_ref(), &settings))
    });

    match outcome.and_then(|record| {
        serde_json::to_string(&record).map_err(|e| TogError::Other(e.to_string()))
    }) {
        Ok(json) => {
            let _ = tx.send(ChatEvent::Data(json));
        }
        Err(e) => {
            error!(error = %e, "chat run failed before producing a record");
            let _ = tx.send(ChatEvent::Error(e.to_string()));
        }
    }
    let _ = tx.send(ChatEvent::Data(DONE_SENTINEL.to_string()));
}

/// One chat run: resolve seeds (falling back to the configured default
/// entities when resolution finds nothing), then reason. The resolution
/// calls are folded into the returned record's counters.
async fn run_chat(
    prompt: &str,
    oracle: &dyn Oracle,
    graph: &dyn Graph,
    settings: &RunSettings,
) -> Result<RunRecord, TogError> {
    let mut pre = RunRecord::default();
    let seeds = match resolve_seed_entities(prompt, oracle, graph, settings.max_paths, &mut pre)
        .await
    {
        Ok(seeds) => seeds,
        Err(TogError::NoSeeds(_)) if !settings.default_seed_entities.is_empty() => {
            tracing::info!("no seed entities resolved, using the configured defaults");
            pre.kg_calls += 1;
            graph
                .get_entities(&settings.default_seed_entities)
                .await
                .map_err(TogError::from)?
        }
        Err(TogError::NoSeeds(_)) => Vec::new(),
        Err(e) => return Err(e),
    };

    let mut record = reason(
        prompt,
        oracle,
        graph,
        settings.max_paths,
        settings.max_depth,
        Some(seeds),
        false,
    )
    .await;
    record.kg_calls += pre.kg_calls;
    record.oracle_calls += pre.oracle_calls;
    Ok(record)
}

mod log_writer {
    //! A `MakeWriter` that turns each formatted tracing event into channel
    //! messages, one per line.

    use std::io;

    use tokio::sync::mpsc;

    use super::ChatEvent;

    pub(crate) struct LogSink {
        tx: mpsc::UnboundedSender<ChatEvent>,
    }

    impl LogSink {
        pub(crate) fn new(tx: mpsc::UnboundedSender<ChatEvent>) -> Self {
            Self { tx }
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogSink {
        type Writer = LineBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            LineBuffer {
                tx: self.tx.clone(),
                buf: Vec::new(),
            }
        }
    }

    /// Buffers one event's bytes; flushes whole lines on drop.
    pub(crate) struct LineBuffer {
        tx: mpsc::UnboundedSender<ChatEvent>,
        buf: Vec<u8>,
    }

    impl io::Write for LineBuffer {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            self.buf.extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Drop for LineBuffer {
        fn drop(&mut self) {
            let text = String::from_utf8_lossy(&self.buf);
            for line in text.lines().filter(|l| !l.trim().is_empty()) {
                let _ = self.tx.send(ChatEvent::Log(line.to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tog::{Entity, Instruction, MockGraph, MockOracle, Relationship, Triplet};

    fn settings(max_paths: usize, max_depth: usize, defaults: &[&str]) -> RunSettings {
        RunSettings {
            max_paths,
            max_depth,
            default_seed_entities: defaults.iter().map(|s| s.to_string()).collect(),
        }
    }

    async fn drain(mut rx: mpsc::UnboundedReceiver<ChatEvent>) -> Vec<ChatEvent> {
        let mut out = Vec::new();
        while let Some(event) = rx.recv().await {
            out.push(event);
        }
        out
    }

    fn one_hop_graph() -> MockGraph {
        MockGraph::new()
            .with_find_results(vec![Entity::new("q1", "Japan")])
            .with_relationships("Japan", &["capital"])
            .with_triplets(
                "Japan",
                "capital",
                vec![Triplet::new(
                    Entity::new("q1", "Japan"),
                    Relationship::new("capital"),
                    Entity::new("q2", "Tokyo"),
                )],
            )
    }

    /// **Scenario**: a full run streams log lines, then the record JSON, then
    /// the sentinel; resolution calls are folded into the record's counters.
    #[tokio::test]
    async fn worker_streams_logs_record_and_sentinel() {
        let oracle = MockOracle::new()
            .on(Instruction::RetrieveQueries, r#"{"queries": ["Japan"]}"#)
            .on(
                Instruction::PickSeedEntities,
                r#"{"seed_entities": ["Japan"], "reason": "the subject"}"#,
            )
            .on(
                Instruction::Reflect,
                r#"{"found_knowledge": true, "machine_answer": "Tokyo",
                    "user_answer": "The capital of Japan is Tokyo.", "reason": "stated"}"#,
            );
        let rx = spawn_run(
            "What is the capital of Japan?".to_string(),
            Arc::new(oracle),
            Arc::new(one_hop_graph()),
            settings(3, 2, &[]),
            None,
        );

        let events = drain(rx).await;

        assert!(matches!(
            events.last(),
            Some(ChatEvent::Data(s)) if s == DONE_SENTINEL
        ));
        let record: RunRecord = match &events[events.len() - 2] {
            ChatEvent::Data(json) => serde_json::from_str(json).unwrap(),
            other => panic!(
                "expected record before sentinel, got {}",
                match other {
                    ChatEvent::Log(s) | ChatEvent::Error(s) | ChatEvent::Data(s) => s,
                }
            ),
        };
        assert_eq!(record.machine_answer, "Tokyo");
        assert!(record.is_kg_based_answer);
        assert_eq!(record.oracle_calls, 3);
        assert_eq!(record.kg_calls, 3);
        assert!(events.iter().any(|e| matches!(e, ChatEvent::Log(_))));
    }

    /// **Scenario**: when resolution finds nothing, the configured default
    /// entities seed the run and the extra lookup is counted.
    #[tokio::test]
    async fn default_seed_entities_rescue_empty_resolution() {
        let graph = MockGraph::new()
            .with_entity(Entity::new("q1", "Japan"))
            .with_relationships("Japan", &["capital"])
            .with_triplets(
                "Japan",
                "capital",
                vec![Triplet::new(
                    Entity::new("q1", "Japan"),
                    Relationship::new("capital"),
                    Entity::new("q2", "Tokyo"),
                )],
            );
        let oracle = MockOracle::new()
            .on(Instruction::RetrieveQueries, r#"{"queries": ["nothing"]}"#)
            .on(
                Instruction::Reflect,
                r#"{"found_knowledge": true, "machine_answer": "Tokyo",
                    "user_answer": "Tokyo.", "reason": "stated"}"#,
            );

        let record = run_chat(
            "What is the capital of Japan?",
            &oracle,
            &graph,
            &settings(3, 2, &["q1"]),
        )
        .await
        .unwrap();

        assert_eq!(record.machine_answer, "Tokyo");
        assert_eq!(record.kg_calls, 4);
        assert_eq!(record.oracle_calls, 2);
        assert!(!record.has_error());
    }

    /// **Scenario**: empty resolution with no defaults still produces a record
    /// (the no-seeds failure is classified, the fallback answers).
    #[tokio::test]
    async fn empty_resolution_without_defaults_classifies_no_seeds() {
        let oracle = MockOracle::new()
            .on(Instruction::RetrieveQueries, r#"{"queries": ["nothing"]}"#)
            .on(
                Instruction::Answer,
                r#"{"machine_answer": "Tokyo", "user_answer": "Tokyo."}"#,
            );

        let record = run_chat("q", &oracle, &MockGraph::new(), &settings(3, 2, &[]))
            .await
            .unwrap();

        assert!(record.has_err_reasoning);
        assert!(!record.is_kg_based_answer);
        assert_eq!(record.machine_answer, "Tokyo");
    }

    /// **Scenario**: an oracle failure during resolution aborts the run with an
    /// error event, followed by the sentinel.
    #[tokio::test]
    async fn resolution_failure_streams_error_then_sentinel() {
        let rx = spawn_run(
            "q".to_string(),
            Arc::new(MockOracle::new()),
            Arc::new(MockGraph::new()),
            settings(3, 2, &[]),
            None,
        );

        let events = drain(rx).await;

        assert!(matches!(
            events.last(),
            Some(ChatEvent::Data(s)) if s == DONE_SENTINEL
        ));
        assert!(events
            .iter()
            .any(|e| matches!(e, ChatEvent::Error(msg) if msg.contains("oracle"))));
    }
}
