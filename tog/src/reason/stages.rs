//! The individual stages of one depth iteration, plus seed resolution and the
//! fallback answerer.
//!
//! Every stage returns `Result<_, TogError>` so the driver in `mod.rs` can
//! classify the first failure and fall through to the fallback. Counters on
//! the [`RunRecord`] are incremented here, next to the call they count.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::error::TogError;
use crate::graph::{filter_relationships, Entity, Graph, Pair, Triplet};
use crate::oracle::schema::{
    self, AnswerResponse, PickRelationshipsResponse, PickSeedEntitiesResponse,
    PickTripletsResponse, ReflectResponse, RetrieveQueriesResponse,
};
use crate::oracle::{Instruction, Oracle, PromptParams};

use super::memory::TripletMemory;
use super::record::RunRecord;

/// Collects candidate (entity, relationship) pairs for the whole frontier.
///
/// Each distinct frontier entity (label-deduplicated within this call) is
/// queried once; denylisted relationships are dropped before the pairs are
/// accumulated. An empty combined result is a dead end for the whole
/// frontier, not per entity.
pub(crate) async fn relationship_search(
    frontier: &[Entity],
    graph: &dyn Graph,
    record: &mut RunRecord,
) -> Result<Vec<Pair>, TogError> {
    let mut candidates: Vec<Pair> = Vec::new();
    let mut checked: HashSet<&str> = HashSet::new();
    for entity in frontier {
        if !checked.insert(entity.label.as_str()) {
            debug!(entity = %entity.label, "already expanded this frontier entity");
            continue;
        }
        record.kg_calls += 1;
        let relationships = graph.get_relationships(entity).await?;
        let relationships = filter_relationships(relationships);
        info!(
            entity = %entity.label,
            count = relationships.len(),
            "relationships found after filtering"
        );
        candidates.extend(
            relationships
                .into_iter()
                .map(|rel| (entity.clone(), rel)),
        );
    }
    if candidates.is_empty() {
        return Err(TogError::Graph(
            "no relationships found for the current frontier".to_string(),
        ));
    }
    info!(count = candidates.len(), "candidate relationship pairs collected");
    Ok(candidates)
}

/// Reduces candidate pairs to at most `max_paths`.
///
/// Within budget the candidates pass unchanged, in input order, with no
/// oracle call. Otherwise one oracle call must return exactly `max_paths`
/// rows, each resolving against the candidate set by exact label equality;
/// a single unresolvable row invalidates the entire selection.
pub(crate) async fn relationship_prune(
    candidates: Vec<Pair>,
    oracle: &dyn Oracle,
    prompt: &str,
    max_paths: usize,
    record: &mut RunRecord,
) -> Result<Vec<Pair>, TogError> {
    if candidates.len() <= max_paths {
        debug!(count = candidates.len(), "within beam width, skipping prune");
        return Ok(candidates);
    }

    record.oracle_calls += 1;
    let rows: Vec<(String, String)> = candidates
        .iter()
        .map(|(entity, rel)| (entity.label.clone(), rel.label.clone()))
        .collect();
    let raw = oracle
        .run(
            Instruction::PickRelationships,
            prompt,
            PromptParams::with_pairs(rows, max_paths),
        )
        .await?;
    let parsed: PickRelationshipsResponse = schema::parse(Instruction::PickRelationships, &raw)?;

    if parsed.selection.len() != max_paths {
        return Err(TogError::Instruction(format!(
            "pick_relationships returned {} rows, expected exactly {max_paths}",
            parsed.selection.len()
        )));
    }
    let mut selected = Vec::with_capacity(max_paths);
    for choice in &parsed.selection {
        let hit = candidates.iter().find(|(entity, rel)| {
            entity.label == choice.entity && rel.label == choice.relationship
        });
        match hit {
            Some(pair) => selected.push(pair.clone()),
            None => {
                return Err(TogError::Instruction(format!(
                    "pick_relationships referenced an unknown pair: [{}]-[{}]",
                    choice.entity, choice.relationship
                )))
            }
        }
    }
    info!(count = selected.len(), "relationship pairs selected");
    Ok(selected)
}

/// Expands each selected pair into triplets, excluding everything already in
/// dedup memory and everything already collected earlier in this pass.
pub(crate) async fn entity_search(
    selected: &[Pair],
    memory: &TripletMemory,
    graph: &dyn Graph,
    record: &mut RunRecord,
) -> Result<Vec<Triplet>, TogError> {
    let mut candidates: Vec<Triplet> = Vec::new();
    let mut checked = memory.snapshot();
    for (entity, relationship) in selected {
        record.kg_calls += 1;
        let triplets = graph.get_triplets(entity, relationship).await?;
        let mut fresh = 0usize;
        for triplet in triplets {
            if checked.insert(triplet.key()) {
                candidates.push(triplet);
                fresh += 1;
            }
        }
        info!(
            entity = %entity.label,
            relationship = %relationship.label,
            count = fresh,
            "new triplets found for pair"
        );
    }
    if candidates.is_empty() {
        return Err(TogError::Graph(
            "dead ends only: no new triplets were found".to_string(),
        ));
    }
    info!(count = candidates.len(), "candidate triplets collected");
    Ok(candidates)
}

/// Reduces candidate triplets to at most `max_paths`.
///
/// Same all-or-nothing contract as [`relationship_prune`]; the oracle must
/// never permute head, relationship, and tail, so all three fields match
/// exactly or the entry is invalid.
pub(crate) async fn entity_prune(
    candidates: Vec<Triplet>,
    oracle: &dyn Oracle,
    prompt: &str,
    max_paths: usize,
    record: &mut RunRecord,
) -> Result<Vec<Triplet>, TogError> {
    if candidates.len() <= max_paths {
        debug!(count = candidates.len(), "within beam width, skipping prune");
        return Ok(candidates);
    }

    record.oracle_calls += 1;
    let rows: Vec<(String, String, String)> =
        candidates.iter().map(|t| t.key()).collect();
    let raw = oracle
        .run(
            Instruction::PickTriplets,
            prompt,
            PromptParams::with_triplets(rows, max_paths),
        )
        .await?;
    let parsed: PickTripletsResponse = schema::parse(Instruction::PickTriplets, &raw)?;

    if parsed.selection.len() != max_paths {
        return Err(TogError::Instruction(format!(
            "pick_triplets returned {} rows, expected exactly {max_paths}",
            parsed.selection.len()
        )));
    }
    let mut selected = Vec::with_capacity(max_paths);
    for choice in &parsed.selection {
        let hit = candidates.iter().find(|t| {
            t.head.label == choice.head
                && t.relationship.label == choice.relationship
                && t.tail.label == choice.tail
        });
        match hit {
            Some(triplet) => selected.push(triplet.clone()),
            None => {
                return Err(TogError::Instruction(format!(
                    "pick_triplets referenced an unknown triplet: [{}]-[{}]-[{}]",
                    choice.head, choice.relationship, choice.tail
                )))
            }
        }
    }
    info!(count = selected.len(), "triplets selected");
    Ok(selected)
}

/// Outcome of one reflection call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Reflection {
    /// The collected triplets answer the question; the run terminates.
    Found {
        machine_answer: String,
        user_answer: String,
    },
    /// Keep exploring (or fall back when depth runs out).
    NotFound,
}

/// Asks the oracle whether the memory collected so far answers the question.
///
/// The contract that `found_knowledge == false` implies empty answers is
/// enforced here rather than assumed. `found_knowledge == true` with an empty
/// machine answer is treated as "not yet": the oracle signalled confidence
/// without producing a usable value, so exploration continues.
pub(crate) async fn reflect(
    memory: &TripletMemory,
    oracle: &dyn Oracle,
    prompt: &str,
    remaining_iterations: usize,
    record: &mut RunRecord,
) -> Result<Reflection, TogError> {
    record.oracle_calls += 1;
    let raw = oracle
        .run(
            Instruction::Reflect,
            prompt,
            PromptParams::for_reflect(memory.keys().to_vec(), remaining_iterations),
        )
        .await?;
    let parsed: ReflectResponse = schema::parse(Instruction::Reflect, &raw)?;

    if !parsed.found_knowledge
        && (!parsed.machine_answer.is_empty() || !parsed.user_answer.is_empty())
    {
        return Err(TogError::Instruction(
            "reflect returned answers despite found_knowledge=false".to_string(),
        ));
    }
    if parsed.found_knowledge && !parsed.machine_answer.is_empty() {
        return Ok(Reflection::Found {
            machine_answer: parsed.machine_answer,
            user_answer: parsed.user_answer,
        });
    }
    Ok(Reflection::NotFound)
}

/// Computes the next frontier from the selected triplets.
///
/// For each triplet, the next-hop entity is whichever endpoint does not
/// label-match the previous frontier entity that produced the expansion. A
/// triplet matching neither endpoint means the oracle or the graph invented
/// an edge, which is a graph-category failure.
pub(crate) fn advance_frontier(
    selected: &[Triplet],
    previous: &[Entity],
) -> Result<Vec<Entity>, TogError> {
    let mut next = Vec::with_capacity(selected.len());
    for triplet in selected {
        let hop = previous.iter().find_map(|entity| {
            if triplet.head.label == entity.label {
                Some(triplet.tail.clone())
            } else if triplet.tail.label == entity.label {
                Some(triplet.head.clone())
            } else {
                None
            }
        });
        match hop {
            Some(entity) => next.push(entity),
            None => {
                return Err(TogError::Graph(format!(
                    "no frontier entity matches triplet [{}]-[{}]-[{}]",
                    triplet.head.label, triplet.relationship.label, triplet.tail.label
                )))
            }
        }
    }
    Ok(next)
}

/// Resolves seed entities from the bare question: keyword queries from the
/// oracle, fuzzy lookup against the graph, then an oracle pick of at most
/// `max_paths` of the returned candidates.
///
/// Public so a caller that wants its own fallback on [`TogError::NoSeeds`]
/// (e.g. configured default entities) can run this step itself, passing the
/// same record so the calls stay counted, and then hand the seeds to
/// [`super::reason`].
pub async fn resolve_seed_entities(
    prompt: &str,
    oracle: &dyn Oracle,
    graph: &dyn Graph,
    max_paths: usize,
    record: &mut RunRecord,
) -> Result<Vec<Entity>, TogError> {
    record.oracle_calls += 1;
    let raw = oracle
        .run(Instruction::RetrieveQueries, prompt, PromptParams::default())
        .await?;
    let parsed: RetrieveQueriesResponse = schema::parse(Instruction::RetrieveQueries, &raw)?;
    info!(queries = ?parsed.queries, "derived seed queries");

    record.kg_calls += 1;
    let found = graph.find(&parsed.queries).await?;
    if found.is_empty() {
        return Err(TogError::NoSeeds(
            "fuzzy lookup returned no candidate entities".to_string(),
        ));
    }

    record.oracle_calls += 1;
    let labels: Vec<String> = found.iter().map(|e| e.label.clone()).collect();
    let raw = oracle
        .run(
            Instruction::PickSeedEntities,
            prompt,
            PromptParams::with_entities(labels, max_paths),
        )
        .await?;
    let parsed: PickSeedEntitiesResponse = schema::parse(Instruction::PickSeedEntities, &raw)?;

    let picked: HashSet<&str> = parsed.seed_entities.iter().map(String::as_str).collect();
    let seeds: Vec<Entity> = found
        .into_iter()
        .filter(|entity| picked.contains(entity.label.as_str()))
        .take(max_paths)
        .collect();
    if seeds.is_empty() {
        return Err(TogError::NoSeeds(
            "oracle picked no usable seed entities".to_string(),
        ));
    }
    info!(seeds = ?seeds.iter().map(|e| e.label.as_str()).collect::<Vec<_>>(), "seed entities resolved");
    Ok(seeds)
}

/// Answers from the oracle's own knowledge. Used whenever the graph path is
/// exhausted or fails; failures here are classified independently of the
/// original cause, so a run can end up with two flags set.
pub(crate) async fn fallback_answer(oracle: &dyn Oracle, prompt: &str, record: &mut RunRecord) {
    info!("answering from oracle knowledge only");
    record.is_kg_based_answer = false;
    record.oracle_calls += 1;
    let raw = match oracle
        .run(Instruction::Answer, prompt, PromptParams::default())
        .await
    {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "fallback oracle call failed");
            record.has_err_oracle = true;
            return;
        }
    };
    match schema::parse::<AnswerResponse>(Instruction::Answer, &raw) {
        Ok(answer) => {
            record.machine_answer = answer.machine_answer;
            record.user_answer = answer.user_answer;
        }
        Err(e) => {
            warn!(error = %e, "fallback answer violated its schema");
            record.has_err_instruction = true;
        }
    }
}
