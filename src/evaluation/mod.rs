//! Judges candidate predictions against gold annotations.
pub mod judge;
pub mod processor;

pub use judge::{EquivalenceKind, Judge, Verdict};
pub use processor::{evaluate_batch, evaluate_conversation, EvaluationSummary, TurnEvaluation};
