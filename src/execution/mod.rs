//! Executes parsed programs against a document context.
pub mod engine;
pub mod trace;

pub use engine::{Engine, Evaluation, ExecutionError};
pub use trace::ExecutionTrace;
