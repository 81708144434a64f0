//! A synchronous, single-threaded program execution engine.
//!
//! Evaluates a parsed program in operation order against one document
//! context and a prior (cumulative) trace. Execution is pure and
//! deterministic: the same program, context, and prior trace always
//! yield an identical trace.

use super::trace::ExecutionTrace;
use crate::context::{DocumentContext, Resolution};
use crate::program::{Operand, Operation, Operator, Program};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("program has no operations")]
    EmptyProgram,
    #[error("unresolved operand '{operand}' in operation {op_index}")]
    UnresolvedOperand { op_index: usize, operand: String },
    #[error("division by zero in operation {op_index}")]
    DivisionByZero { op_index: usize },
    #[error("zero raised to a negative power in operation {op_index}")]
    DomainError { op_index: usize },
    #[error("aggregate in operation {op_index} resolved no table cells")]
    EmptyAggregate { op_index: usize },
}

/// The result of one program run: the trace of this run's operations
/// (prior entries are not repeated) and the last operation's value.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub trace: ExecutionTrace,
    pub final_value: f64,
}

pub struct Engine<'a> {
    context: &'a DocumentContext,
}

impl<'a> Engine<'a> {
    pub fn new(context: &'a DocumentContext) -> Self {
        Self { context }
    }

    /// Executes `program` with back-references resolved first against
    /// `prior` (earlier turns), then against the trace being built here.
    ///
    /// Any error aborts this run; the partial local trace is discarded
    /// and `prior` is never touched.
    pub fn execute(
        &self,
        program: &Program,
        prior: &ExecutionTrace,
    ) -> Result<Evaluation, ExecutionError> {
        if program.is_empty() {
            return Err(ExecutionError::EmptyProgram);
        }

        let mut trace = ExecutionTrace::new();
        for (op_index, operation) in program.operations.iter().enumerate() {
            let result = self.evaluate_operation(operation, op_index, prior, &trace)?;
            trace.push(result);
        }

        // Non-empty program, so the trace has a last entry.
        let final_value = trace.last().unwrap_or_default();
        Ok(Evaluation { trace, final_value })
    }

    fn evaluate_operation(
        &self,
        operation: &Operation,
        op_index: usize,
        prior: &ExecutionTrace,
        local: &ExecutionTrace,
    ) -> Result<f64, ExecutionError> {
        if operation.operator.is_aggregate() {
            self.evaluate_aggregate(operation, op_index)
        } else {
            self.evaluate_binary(operation, op_index, prior, local)
        }
    }

    fn evaluate_binary(
        &self,
        operation: &Operation,
        op_index: usize,
        prior: &ExecutionTrace,
        local: &ExecutionTrace,
    ) -> Result<f64, ExecutionError> {
        let a = self.resolve_operand(&operation.operands[0], op_index, prior, local)?;
        let b = self.resolve_operand(&operation.operands[1], op_index, prior, local)?;

        match operation.operator {
            Operator::Add => Ok(a + b),
            Operator::Subtract => Ok(a - b),
            Operator::Multiply => Ok(a * b),
            Operator::Divide => {
                if b == 0.0 {
                    Err(ExecutionError::DivisionByZero { op_index })
                } else {
                    Ok(a / b)
                }
            }
            Operator::Exp => {
                if a == 0.0 && b < 0.0 {
                    Err(ExecutionError::DomainError { op_index })
                } else {
                    Ok(a.powf(b))
                }
            }
            // Boolean encoded numerically, by domain convention.
            Operator::Greater => Ok(if a > b { 1.0 } else { 0.0 }),
            _ => unreachable!("aggregates are dispatched separately"),
        }
    }

    fn evaluate_aggregate(
        &self,
        operation: &Operation,
        op_index: usize,
    ) -> Result<f64, ExecutionError> {
        // Unresolved entries are skipped, not zero-padded; the aggregate
        // only fails when nothing at all resolved.
        let mut values = Vec::new();
        for operand in &operation.operands {
            if let Operand::TableRef(token) = operand {
                values.extend(self.context.resolve_values(token).iter().map(|r| r.value));
            }
        }
        if values.is_empty() {
            return Err(ExecutionError::EmptyAggregate { op_index });
        }

        let result = match operation.operator {
            Operator::TableSum => values.iter().sum(),
            Operator::TableAverage => values.iter().sum::<f64>() / values.len() as f64,
            Operator::TableMax => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Operator::TableMin => values.iter().copied().fold(f64::INFINITY, f64::min),
            _ => unreachable!("binary operators are dispatched separately"),
        };
        Ok(result)
    }

    fn resolve_operand(
        &self,
        operand: &Operand,
        op_index: usize,
        prior: &ExecutionTrace,
        local: &ExecutionTrace,
    ) -> Result<f64, ExecutionError> {
        match operand {
            Operand::Literal(value) => Ok(*value),
            Operand::NamedConstant { value, .. } => Ok(*value),
            Operand::BackRef(position) => {
                // Global index: prior turns first, then this run.
                if let Some(value) = prior.get(*position) {
                    return Ok(value);
                }
                local
                    .get(position - prior.len())
                    .ok_or(ExecutionError::UnresolvedOperand {
                        op_index,
                        operand: format!("#{position}"),
                    })
            }
            Operand::TableRef(token) => self
                .context
                .resolve_scalar(token)
                .map(|r: Resolution| r.value)
                .ok_or(ExecutionError::UnresolvedOperand {
                    op_index,
                    operand: token.clone(),
                }),
            // Nested applications feed the enclosing operation directly;
            // they produce no trace entry of their own.
            Operand::Expression(nested) => {
                self.evaluate_operation(nested, op_index, prior, local)
            }
        }
    }
}
