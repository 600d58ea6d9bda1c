//! The reasoning loop: oracle-guided beam search over a knowledge graph.
//!
//! One call to [`reason`] answers one question. Each depth iteration runs
//! relationship search, relationship prune, entity search, entity prune, and
//! a reflection; the frontier then advances along the selected triplets.
//! Any failure, and depth exhaustion, falls through to an oracle-only
//! fallback answer, so a [`RunRecord`] always comes back.
//!
//! **Interaction**: Consumes the [`Oracle`] and [`Graph`] capabilities; the
//! CLI and the serve façade both drive it and serialize the record.

mod memory;
mod record;
mod stages;

pub use record::RunRecord;
pub use stages::resolve_seed_entities;

use tracing::{info, warn};

use crate::error::TogError;
use crate::graph::{Entity, Graph};
use crate::oracle::Oracle;

use memory::TripletMemory;
use stages::Reflection;

/// How a completed exploration ended.
enum Outcome {
    /// Reflection produced a usable answer.
    Answered {
        machine_answer: String,
        user_answer: String,
    },
    /// Every iteration ran without finding one.
    DepthExhausted,
}

/// Answers `prompt` by exploring `graph` under `oracle` guidance.
///
/// `max_paths` is the beam width (selection cardinality at every prune),
/// `max_depth` the number of exploration iterations. Seeds come from
/// `seed_entities` when given; otherwise, with `allow_seed_resolution`, they
/// are resolved from the question via the oracle and a fuzzy graph lookup.
/// Never returns an error: failures are classified onto the record and the
/// fallback answer fills in what it can.
pub async fn reason(
    prompt: &str,
    oracle: &dyn Oracle,
    graph: &dyn Graph,
    max_paths: usize,
    max_depth: usize,
    seed_entities: Option<Vec<Entity>>,
    allow_seed_resolution: bool,
) -> RunRecord {
    let mut record = RunRecord::default();
    oracle.flush_context().await;
    info!(prompt, max_paths, max_depth, "reasoning run started");

    match explore(
        prompt,
        oracle,
        graph,
        max_paths,
        max_depth,
        seed_entities,
        allow_seed_resolution,
        &mut record,
    )
    .await
    {
        Ok(Outcome::Answered {
            machine_answer,
            user_answer,
        }) => {
            info!(depth = record.depth, "answered from graph knowledge");
            record.machine_answer = machine_answer;
            record.user_answer = user_answer;
        }
        Ok(Outcome::DepthExhausted) => {
            info!(depth = record.depth, "depth exhausted without an answer");
            stages::fallback_answer(oracle, prompt, &mut record).await;
        }
        Err(e) => {
            warn!(error = %e, depth = record.depth, "exploration failed");
            classify(&e, &mut record);
            stages::fallback_answer(oracle, prompt, &mut record).await;
        }
    }
    record
}

/// The exploration proper. Returns the first failure unclassified; the caller
/// owns flag assignment and the fallback.
#[allow(clippy::too_many_arguments)]
async fn explore(
    prompt: &str,
    oracle: &dyn Oracle,
    graph: &dyn Graph,
    max_paths: usize,
    max_depth: usize,
    seed_entities: Option<Vec<Entity>>,
    allow_seed_resolution: bool,
    record: &mut RunRecord,
) -> Result<Outcome, TogError> {
    let seeds = match seed_entities {
        Some(seeds) if !seeds.is_empty() => seeds,
        Some(_) => {
            return Err(TogError::NoSeeds(
                "an empty seed entity list was provided".to_string(),
            ))
        }
        None if allow_seed_resolution => {
            stages::resolve_seed_entities(prompt, oracle, graph, max_paths, record).await?
        }
        None => {
            return Err(TogError::NoSeeds(
                "no seed entities provided and resolution is disabled".to_string(),
            ))
        }
    };

    // The frontier never exceeds the beam width, seeds included.
    let mut frontier = seeds;
    frontier.truncate(max_paths);

    let mut memory = TripletMemory::new();
    for iteration in 1..=max_depth {
        record.depth = iteration as u32;
        info!(
            iteration,
            frontier = ?frontier.iter().map(|e| e.label.as_str()).collect::<Vec<_>>(),
            "exploration iteration"
        );

        let candidates = stages::relationship_search(&frontier, graph, record).await?;
        let pairs =
            stages::relationship_prune(candidates, oracle, prompt, max_paths, record).await?;
        let triplets = stages::entity_search(&pairs, &memory, graph, record).await?;
        let selected = stages::entity_prune(triplets, oracle, prompt, max_paths, record).await?;
        memory.extend(selected.iter().map(|t| t.key()));

        let remaining = max_depth - iteration;
        match stages::reflect(&memory, oracle, prompt, remaining, record).await? {
            Reflection::Found {
                machine_answer,
                user_answer,
            } => {
                return Ok(Outcome::Answered {
                    machine_answer,
                    user_answer,
                })
            }
            Reflection::NotFound => {}
        }
        if iteration < max_depth {
            frontier = stages::advance_frontier(&selected, &frontier)?;
        }
    }
    Ok(Outcome::DepthExhausted)
}

/// Maps the first exploration failure onto exactly one record flag.
fn classify(error: &TogError, record: &mut RunRecord) {
    match error {
        TogError::Oracle(_) => record.has_err_oracle = true,
        TogError::Graph(_) => record.has_err_graph = true,
        TogError::NoSeeds(_) => record.has_err_reasoning = true,
        TogError::Instruction(_) => record.has_err_instruction = true,
        TogError::Other(_) => record.has_err_other = true,
    }
}
