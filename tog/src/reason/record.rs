//! Telemetry record for one reasoning run.
//!
//! Created once per question, mutated by every stage, returned once. The only
//! artifact that outlives a run; the evaluation harness and the serve façade
//! both consume it as JSON.

use serde::{Deserialize, Serialize};

/// Counters, error flags, and the final answers of one run.
///
/// The exploration loop sets at most one `has_err_*` flag (first classified
/// cause wins); the fallback answerer may add a second one on top, since its
/// failure describes a different stage. `is_kg_based_answer` starts `true`
/// and flips to `false` the moment control reaches the fallback path.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RunRecord {
    /// Concise machine-readable answer (may be empty when nothing answered).
    pub machine_answer: String,
    /// Natural-language answer for display.
    pub user_answer: String,
    /// True when the answer came from graph exploration, false for fallback.
    pub is_kg_based_answer: bool,
    /// Graph capability calls made during the run.
    pub kg_calls: u32,
    /// Oracle capability calls made during the run. Serialized as
    /// `agent_calls`, the field name downstream consumers key on.
    #[serde(rename = "agent_calls")]
    pub oracle_calls: u32,
    /// Last depth iteration entered (0 when the loop never ran).
    pub depth: u32,
    /// The oracle capability itself errored.
    pub has_err_oracle: bool,
    /// Graph capability error or exploration dead end.
    pub has_err_graph: bool,
    /// No seed entities available: the run could not start.
    pub has_err_reasoning: bool,
    /// The oracle's response violated its schema or selection contract.
    pub has_err_instruction: bool,
    /// Anything not covered above.
    pub has_err_other: bool,
}

impl Default for RunRecord {
    fn default() -> Self {
        Self {
            machine_answer: String::new(),
            user_answer: String::new(),
            is_kg_based_answer: true,
            kg_calls: 0,
            oracle_calls: 0,
            depth: 0,
            has_err_oracle: false,
            has_err_graph: false,
            has_err_reasoning: false,
            has_err_instruction: false,
            has_err_other: false,
        }
    }
}

impl RunRecord {
    /// True when any error flag is set.
    pub fn has_error(&self) -> bool {
        self.has_err_oracle
            || self.has_err_graph
            || self.has_err_reasoning
            || self.has_err_instruction
            || self.has_err_other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: a fresh record assumes a graph-based answer and no errors.
    #[test]
    fn default_record_is_clean_and_kg_based() {
        let record = RunRecord::default();
        assert!(record.is_kg_based_answer);
        assert!(!record.has_error());
        assert_eq!(record.depth, 0);
        assert_eq!(record.kg_calls, 0);
        assert_eq!(record.oracle_calls, 0);
        assert!(record.machine_answer.is_empty());
    }

    /// **Scenario**: the record serializes with the exact field names downstream
    /// consumers key on.
    #[test]
    fn record_serializes_with_stable_field_names() {
        let json = serde_json::to_value(RunRecord::default()).unwrap();
        for field in [
            "machine_answer",
            "user_answer",
            "is_kg_based_answer",
            "kg_calls",
            "agent_calls",
            "depth",
            "has_err_oracle",
            "has_err_graph",
            "has_err_reasoning",
            "has_err_instruction",
            "has_err_other",
        ] {
            assert!(json.get(field).is_some(), "missing field {field}");
        }
        assert!(json.get("oracle_calls").is_none(), "internal name leaked");
    }
}
