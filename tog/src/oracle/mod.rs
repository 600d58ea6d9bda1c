//! Oracle capability: the external language-model judge.
//!
//! Every pruning, reflection, and answer decision in the loop is delegated to
//! an [`Oracle`]. The instruction kinds form a closed enum so every dispatch
//! over them is exhaustiveness-checked; each kind has a structured response
//! schema in [`schema`] that the caller validates before trusting any field.

pub mod schema;

mod mock;
mod openai;

pub use mock::MockOracle;
pub use openai::ChatOracle;

use async_trait::async_trait;

use crate::error::OracleError;

/// The six things the loop ever asks of the oracle.
///
/// Closed by design: adding a kind means adding a schema, a prompt template,
/// and a call site, and the compiler points at all three.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Instruction {
    /// Reduce candidate (entity, relationship) pairs to the beam width.
    PickRelationships,
    /// Reduce candidate triplets to the beam width.
    PickTriplets,
    /// Judge whether the collected triplets answer the question.
    Reflect,
    /// Answer from the oracle's own knowledge (fallback path).
    Answer,
    /// Derive keyword queries from the question for seed lookup.
    RetrieveQueries,
    /// Pick seed entities from fuzzy-find candidates.
    PickSeedEntities,
}

impl Instruction {
    /// Stable name used in logs and prompt lookups.
    pub fn as_str(self) -> &'static str {
        match self {
            Instruction::PickRelationships => "pick_relationships",
            Instruction::PickTriplets => "pick_triplets",
            Instruction::Reflect => "reflect",
            Instruction::Answer => "answer",
            Instruction::RetrieveQueries => "retrieve_queries",
            Instruction::PickSeedEntities => "pick_seed_entities",
        }
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data accompanying one oracle call, rendered into the user prompt.
///
/// Only the fields relevant to the instruction kind are set; the rest stay at
/// their defaults and render to nothing.
#[derive(Clone, Debug, Default)]
pub struct PromptParams {
    /// (entity label, relationship label) rows for `pick_relationships`.
    pub pairs: Vec<(String, String)>,
    /// (head, relationship, tail) rows for `pick_triplets` and `reflect`.
    pub triplets: Vec<(String, String, String)>,
    /// Entity labels for `pick_seed_entities`.
    pub entities: Vec<String>,
    /// Exact (or maximum, for seeds) selection count.
    pub amount: Option<usize>,
    /// Exploration iterations left, shown to `reflect`.
    pub remaining_iterations: Option<usize>,
}

impl PromptParams {
    pub fn with_pairs(pairs: Vec<(String, String)>, amount: usize) -> Self {
        Self {
            pairs,
            amount: Some(amount),
            ..Self::default()
        }
    }

    pub fn with_triplets(triplets: Vec<(String, String, String)>, amount: usize) -> Self {
        Self {
            triplets,
            amount: Some(amount),
            ..Self::default()
        }
    }

    pub fn for_reflect(
        triplets: Vec<(String, String, String)>,
        remaining_iterations: usize,
    ) -> Self {
        Self {
            triplets,
            remaining_iterations: Some(remaining_iterations),
            ..Self::default()
        }
    }

    pub fn with_entities(entities: Vec<String>, amount: usize) -> Self {
        Self {
            entities,
            amount: Some(amount),
            ..Self::default()
        }
    }
}

/// Language-model judge behind the loop.
///
/// `run` returns raw response text; validation against the instruction's
/// schema is the caller's job (see [`schema`]). Implementations may keep a
/// rolling conversation context; it is mutated by every call, so a run owns
/// its oracle instance and `flush_context` must be called before reuse.
///
/// **Interaction**: Implemented by [`MockOracle`] (tests) and [`ChatOracle`]
/// (Chat Completions API); consumed by every prune/reflect/answer stage.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// One judgment call: instruction kind, user question, and payload.
    async fn run(
        &self,
        instruction: Instruction,
        prompt: &str,
        params: PromptParams,
    ) -> Result<String, OracleError>;

    /// Resets conversational memory. Required between runs on a shared instance.
    async fn flush_context(&self);
}
