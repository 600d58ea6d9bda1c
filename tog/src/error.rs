//! Failure taxonomy for one reasoning run.
//!
//! Every stage of the loop returns `Result<_, TogError>`; the top-level driver
//! pattern-matches on the variant to set exactly one telemetry flag and then
//! falls through to the fallback answerer. Expected domain outcomes (dead end,
//! reflection success, depth exhausted) are *not* errors here; they travel as
//! ordinary values through the loop.

use thiserror::Error;

/// Error from the graph capability itself (backend/network/query).
///
/// Distinct from a dead end: a backend that answers with zero rows is a dead
/// end, a backend that fails to answer is a `GraphError`. Both end up in the
/// same telemetry category ([`TogError::Graph`]).
#[derive(Debug, Error)]
pub enum GraphError {
    /// The graph backend failed to execute the request.
    #[error("graph backend error: {0}")]
    Backend(String),
}

/// Error from the oracle capability itself (network/auth/backend).
///
/// A response that arrives but violates its schema is *not* an `OracleError`;
/// that is an instruction violation classified by the caller.
#[derive(Debug, Error)]
pub enum OracleError {
    /// The oracle backend failed to produce a response.
    #[error("oracle backend error: {0}")]
    Backend(String),
}

/// Classified failure of one reasoning stage.
///
/// Mutually exclusive per run for the exploration loop: the first failure wins
/// and is recorded. The fallback answerer classifies its own failures
/// independently and may add a second flag on top (see `reason`).
#[derive(Debug, Error)]
pub enum TogError {
    /// The oracle capability errored rather than returning a response.
    #[error("oracle call failed: {0}")]
    Oracle(#[from] OracleError),

    /// The graph capability errored, or a search stage found zero candidates
    /// after filtering (a dead end for the whole frontier).
    #[error("graph exploration failed: {0}")]
    Graph(String),

    /// No seed entities available after resolution: an unrecoverable starting
    /// condition, kept distinct from mid-exploration dead ends.
    #[error("no seed entities: {0}")]
    NoSeeds(String),

    /// The oracle answered, but the structured response failed schema
    /// validation, the cardinality contract, or referenced candidates that do
    /// not exist in the offered set.
    #[error("oracle response violated instructions: {0}")]
    Instruction(String),

    /// Any remaining unexpected failure.
    #[error("unexpected failure: {0}")]
    Other(String),
}

impl From<GraphError> for TogError {
    fn from(e: GraphError) -> Self {
        TogError::Graph(e.to_string())
    }
}
