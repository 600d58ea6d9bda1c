//! Mock oracle for tests.
//!
//! Scripted responses are queued per instruction kind and popped in order; a
//! call with no scripted response is a backend error, which doubles as the
//! easiest way to exercise the oracle-call-failure branch. A call log records
//! every instruction seen so tests can assert that a stage was (or was not)
//! consulted.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::OracleError;
use super::{Instruction, Oracle, PromptParams};

/// Scripted oracle: fixed response queues per instruction, plus a call log.
///
/// **Interaction**: Implements [`Oracle`]; used by stage unit tests and the
/// `reason` integration scenarios.
#[derive(Default)]
pub struct MockOracle {
    scripts: Mutex<HashMap<Instruction, VecDeque<String>>>,
    calls: Mutex<Vec<Instruction>>,
    flushes: Mutex<usize>,
}

impl MockOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues one response for `instruction` (builder).
    pub fn on(self, instruction: Instruction, response: impl Into<String>) -> Self {
        self.scripts
            .lock()
            .expect("script lock")
            .entry(instruction)
            .or_default()
            .push_back(response.into());
        self
    }

    /// Every instruction the oracle was called with, in order.
    pub fn calls(&self) -> Vec<Instruction> {
        self.calls.lock().expect("call log lock").clone()
    }

    /// Number of `flush_context` invocations.
    pub fn flush_count(&self) -> usize {
        *self.flushes.lock().expect("flush lock")
    }
}

#[async_trait]
impl Oracle for MockOracle {
    async fn run(
        &self,
        instruction: Instruction,
        _prompt: &str,
        _params: PromptParams,
    ) -> Result<String, OracleError> {
        self.calls.lock().expect("call log lock").push(instruction);
        self.scripts
            .lock()
            .expect("script lock")
            .get_mut(&instruction)
            .and_then(|queue| queue.pop_front())
            .ok_or_else(|| {
                OracleError::Backend(format!("no scripted response for {instruction}"))
            })
    }

    async fn flush_context(&self) {
        *self.flushes.lock().expect("flush lock") += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: scripted responses pop in FIFO order per instruction.
    #[tokio::test]
    async fn scripted_responses_pop_in_order() {
        let oracle = MockOracle::new()
            .on(Instruction::Reflect, "first")
            .on(Instruction::Reflect, "second");
        let p = || PromptParams::default();
        assert_eq!(
            oracle.run(Instruction::Reflect, "q", p()).await.unwrap(),
            "first"
        );
        assert_eq!(
            oracle.run(Instruction::Reflect, "q", p()).await.unwrap(),
            "second"
        );
    }

    /// **Scenario**: an unscripted instruction is a backend error and still logged.
    #[tokio::test]
    async fn unscripted_call_is_backend_error() {
        let oracle = MockOracle::new();
        let res = oracle
            .run(Instruction::Answer, "q", PromptParams::default())
            .await;
        assert!(matches!(res, Err(OracleError::Backend(_))));
        assert_eq!(oracle.calls(), vec![Instruction::Answer]);
    }

    /// **Scenario**: flush_context is counted.
    #[tokio::test]
    async fn flushes_are_counted() {
        let oracle = MockOracle::new();
        oracle.flush_context().await;
        oracle.flush_context().await;
        assert_eq!(oracle.flush_count(), 2);
    }
}
