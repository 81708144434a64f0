//! Deterministic execution and judging core for financial reasoning
//! programs.
//!
//! Answers in this domain are encoded as short arithmetic programs over
//! literals, table cells, and back-references to earlier results,
//! threaded across the turns of a conversation. This crate parses that
//! notation, resolves operands against a financial report, executes
//! programs with cumulative back-reference scope, and judges candidate
//! (program, answer) pairs against gold ones under numeric tolerance
//! and percent/decimal scale equivalence.
//!
//! The core is pure and synchronous: no network, no files, no hidden
//! state. All I/O boundaries are the in-memory record shapes in
//! [`records`].

pub mod context;
pub mod conversation;
pub mod evaluation;
pub mod execution;
pub mod program;
pub mod records;
pub mod validation;

pub use context::{DocumentContext, Resolution};
pub use conversation::{Conversation, ConversationError, Phase};
pub use evaluation::{
    evaluate_batch, evaluate_conversation, EquivalenceKind, EvaluationSummary, Judge,
    TurnEvaluation, Verdict,
};
pub use execution::{Engine, Evaluation, ExecutionError, ExecutionTrace};
pub use program::{parse, Operand, Operation, Operator, ParseError, Program};
pub use records::{ConversationRecord, DocumentRecord, PredictionRecord, TurnRecord};
