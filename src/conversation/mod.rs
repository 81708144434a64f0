//! Threads back-reference scope across the turns of one conversation.
//!
//! Each turn's program may reference any result produced by an earlier
//! turn through global trace indices. The ordering invariant (turn N
//! never sees a later turn's results) holds by construction: turns are
//! processed strictly sequentially and the cumulative trace is
//! append-only.

use crate::context::DocumentContext;
use crate::execution::{Engine, ExecutionError, ExecutionTrace};
use crate::program::Program;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversationError {
    #[error("conversation is closed and accepts no further turns")]
    Exhausted,
    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

/// Lifecycle of a conversation. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Empty,
    InProgress { turns: usize },
    Closed,
}

/// The single sequential state machine driving one conversation.
///
/// Owns the only mutable structure in the core — the cumulative trace —
/// and is never shared across conversations or threads.
pub struct Conversation<'a> {
    engine: Engine<'a>,
    cumulative: ExecutionTrace,
    phase: Phase,
}

impl<'a> Conversation<'a> {
    pub fn new(context: &'a DocumentContext) -> Self {
        Self {
            engine: Engine::new(context),
            cumulative: ExecutionTrace::new(),
            phase: Phase::Empty,
        }
    }

    /// Executes one turn's program with the cumulative trace as its
    /// back-reference scope, appends the turn's results, and returns
    /// the final value of just this turn's operations.
    ///
    /// On error the cumulative trace is left exactly as the previous
    /// successful turns built it; the caller decides whether to halt or
    /// continue with the next turn. No guessed value is ever
    /// back-filled.
    pub fn advance(&mut self, program: &Program) -> Result<f64, ConversationError> {
        if self.phase == Phase::Closed {
            return Err(ConversationError::Exhausted);
        }

        let evaluation = self.engine.execute(program, &self.cumulative)?;
        self.cumulative.extend_from(&evaluation.trace);
        self.phase = Phase::InProgress {
            turns: self.turns() + 1,
        };
        Ok(evaluation.final_value)
    }

    /// Marks the conversation exhausted; further `advance` calls fail.
    pub fn close(&mut self) {
        self.phase = Phase::Closed;
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn turns(&self) -> usize {
        match self.phase {
            Phase::InProgress { turns } => turns,
            _ => 0,
        }
    }

    /// All results produced so far, across turns, in execution order.
    pub fn cumulative_trace(&self) -> &ExecutionTrace {
        &self.cumulative
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::parse;

    fn context() -> DocumentContext {
        DocumentContext::new(
            &[
                vec!["".into(), "12/31/04".into(), "12/31/06".into()],
                vec!["united parcel service inc.".into(), "100.00".into(), "91.06".into()],
            ],
            &[],
            &[],
        )
    }

    #[test]
    fn backrefs_thread_across_turns() {
        let ctx = context();
        let mut conversation = Conversation::new(&ctx);
        assert_eq!(conversation.phase(), Phase::Empty);

        let turn1 = parse("subtract(91.06, const_100)").unwrap();
        let value1 = conversation.advance(&turn1).unwrap();
        assert!((value1 + 8.94).abs() < 1e-9);
        assert_eq!(conversation.phase(), Phase::InProgress { turns: 1 });

        // #0 names turn 1's result through the cumulative trace.
        let turn2 = parse("divide(#0, const_100)").unwrap();
        let value2 = conversation.advance(&turn2).unwrap();
        assert!((value2 + 0.0894).abs() < 1e-9);

        assert_eq!(conversation.cumulative_trace().len(), 2);
        assert_eq!(conversation.turns(), 2);
    }

    #[test]
    fn failed_turn_leaves_cumulative_trace_intact() {
        let ctx = context();
        let mut conversation = Conversation::new(&ctx);
        conversation.advance(&parse("add(1, 1)").unwrap()).unwrap();

        let bad = parse("add(1, 1), divide(#0, 0)").unwrap();
        let err = conversation.advance(&bad).unwrap_err();
        assert!(matches!(err, ConversationError::Execution(_)));

        // The failing turn's partial results were discarded.
        assert_eq!(conversation.cumulative_trace().len(), 1);
        assert_eq!(conversation.turns(), 1);

        // The conversation can still continue at the caller's choice.
        let value = conversation.advance(&parse("add(#0, 1)").unwrap()).unwrap();
        assert_eq!(value, 3.0);
    }

    #[test]
    fn closed_conversation_rejects_turns() {
        let ctx = context();
        let mut conversation = Conversation::new(&ctx);
        conversation.close();
        assert_eq!(conversation.phase(), Phase::Closed);
        assert_eq!(
            conversation.advance(&parse("add(1, 1)").unwrap()).unwrap_err(),
            ConversationError::Exhausted
        );
    }

    #[test]
    fn forward_reference_within_a_turn_is_rejected() {
        let ctx = context();
        let mut conversation = Conversation::new(&ctx);
        // #1 would name this turn's own second operation before it runs.
        let err = conversation
            .advance(&parse("add(#1, 1), add(1, 1)").unwrap())
            .unwrap_err();
        assert!(matches!(err, ConversationError::Execution(ExecutionError::UnresolvedOperand { .. })));
    }
}
