//! Structured response schemas, one per instruction kind.
//!
//! The oracle returns raw text; nothing in the loop touches a field before
//! the text has round-tripped through the kind's schema here. Parsing is
//! strict (`deny_unknown_fields`), so a missing, extra, or mistyped field is
//! an instruction violation, never a silent default.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::Instruction;
use crate::error::TogError;

/// One picked (entity, relationship) row.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PairChoice {
    pub entity: String,
    pub relationship: String,
}

/// `pick_relationships` response: rows ordered most → least important.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PickRelationshipsResponse {
    pub selection: Vec<PairChoice>,
    pub reason: String,
}

/// One picked (head, relationship, tail) row. Field order is part of the
/// contract; the oracle must never permute head and tail.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TripletChoice {
    pub head: String,
    pub relationship: String,
    pub tail: String,
}

/// `pick_triplets` response: rows ordered most → least important.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PickTripletsResponse {
    pub selection: Vec<TripletChoice>,
    pub reason: String,
}

/// `reflect` response. When `found_knowledge` is false both answers must be
/// empty; that cross-field rule is enforced by the reflect stage, not here.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReflectResponse {
    pub found_knowledge: bool,
    pub machine_answer: String,
    pub user_answer: String,
    pub reason: String,
}

/// `answer` response (fallback path, no triplets involved).
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnswerResponse {
    pub machine_answer: String,
    pub user_answer: String,
}

/// `retrieve_queries` response: keyword queries for seed lookup.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetrieveQueriesResponse {
    pub queries: Vec<String>,
}

/// `pick_seed_entities` response: at most `amount` labels from the offer.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PickSeedEntitiesResponse {
    pub seed_entities: Vec<String>,
    pub reason: String,
}

/// Parses `raw` as the schema for `instruction`, classifying any serde
/// failure as an instruction violation with enough context to debug the run.
pub fn parse<T: DeserializeOwned>(instruction: Instruction, raw: &str) -> Result<T, TogError> {
    serde_json::from_str(raw).map_err(|e| {
        TogError::Instruction(format!(
            "{instruction} response failed schema validation: {e} -- response: {raw}"
        ))
    })
}
