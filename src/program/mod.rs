//! The reasoning-program data model and its textual notation.
pub mod ast;
pub mod parser;

pub use ast::{named_constant, Operand, Operation, Operator, Program};
pub use parser::{parse, ParseError};
