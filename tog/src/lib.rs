//! # tog
//!
//! Answer natural-language questions by **oracle-guided beam search over a
//! knowledge graph**. An LLM oracle steers the search: it prunes candidate
//! relationships and triplets at every hop, reflects on the knowledge
//! collected so far, and falls back to its own knowledge when the graph runs
//! out. The graph itself stays external behind the [`Graph`] trait.
//!
//! ## Main modules
//!
//! - [`reason`]: the exploration loop — [`reason::reason`] answers one
//!   question and returns a [`RunRecord`] with answers, counters, and error
//!   flags.
//! - [`graph`]: [`Entity`], [`Relationship`], [`Triplet`], the [`Graph`]
//!   backend trait, relationship noise filtering, [`SqliteGraph`], [`MockGraph`].
//! - [`oracle`]: the [`Oracle`] trait and its closed [`Instruction`] set,
//!   response schemas, [`ChatOracle`] (Chat Completions), [`MockOracle`].
//! - [`prompts`]: the system instruction templates and user-block renderers.
//! - [`error`]: [`TogError`] and the capability error types.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use tog::{reason::reason, ChatOracle, Entity, SqliteGraph};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let oracle = ChatOracle::new("gpt-4o-mini").with_temperature(0.0);
//! let graph = SqliteGraph::new("triplets.db")?;
//! let seeds = vec![Entity::new("q1", "Mesih Pasha")];
//!
//! let record = reason(
//!     "Which empire did Mesih Pasha serve?",
//!     &oracle,
//!     &graph,
//!     3, // beam width
//!     2, // exploration depth
//!     Some(seeds),
//!     false,
//! )
//! .await;
//! println!("{}", record.user_answer);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod graph;
pub mod oracle;
pub mod prompts;
pub mod reason;

pub use error::{GraphError, OracleError, TogError};
pub use graph::{Entity, Graph, MockGraph, Relationship, SqliteGraph, Triplet};
pub use oracle::{ChatOracle, Instruction, MockOracle, Oracle, PromptParams};
pub use reason::RunRecord;
