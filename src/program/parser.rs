//! Parses the textual program notation into an operation sequence.
//!
//! The wire grammar is a comma-separated list of `operator(operand, ...)`
//! units, with commas inside parentheses belonging to the unit. Parsing
//! is all-or-nothing: any malformed unit fails the whole program, and
//! the error names the offending unit and its index.

use super::ast::{named_constant, Operand, Operation, Operator, Program};
use smallvec::SmallVec;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("program text is empty")]
    EmptyProgram,
    #[error("unbalanced parentheses in unit {index}: '{unit}'")]
    UnbalancedParentheses { index: usize, unit: String },
    #[error("unit {index} is not of the form operator(...): '{unit}'")]
    MalformedUnit { index: usize, unit: String },
    #[error("unknown operator '{name}' in unit {index}")]
    UnknownOperator { index: usize, name: String },
    #[error("operator '{operator}' in unit {index} takes {expected} operands, got {actual}")]
    WrongArity {
        index: usize,
        operator: &'static str,
        expected: &'static str,
        actual: usize,
    },
    #[error("invalid operand '{operand}' in unit {index}: {reason}")]
    InvalidOperand {
        index: usize,
        operand: String,
        reason: &'static str,
    },
}

/// Parses program text into an immutable [`Program`].
pub fn parse(text: &str) -> Result<Program, ParseError> {
    let units = split_top_level(text)?;
    if units.is_empty() {
        return Err(ParseError::EmptyProgram);
    }

    let mut operations = Vec::with_capacity(units.len());
    for (index, unit) in units.iter().enumerate() {
        operations.push(parse_unit(unit, index)?);
    }
    Ok(Program { operations })
}

/// Splits `text` on commas that sit outside any parentheses.
///
/// Whitespace-only segments between separators are dropped, so a
/// trailing comma is tolerated; an entirely blank text yields no units.
fn split_top_level(text: &str) -> Result<Vec<String>, ParseError> {
    let mut units = Vec::new();
    let mut current = String::new();
    let mut depth: u32 = 0;

    for c in text.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                if depth == 0 {
                    return Err(ParseError::UnbalancedParentheses {
                        index: units.len(),
                        unit: current.trim().to_string(),
                    });
                }
                depth -= 1;
                current.push(c);
            }
            ',' if depth == 0 => {
                let unit = current.trim();
                if !unit.is_empty() {
                    units.push(unit.to_string());
                }
                current.clear();
            }
            _ => current.push(c),
        }
    }

    if depth != 0 {
        return Err(ParseError::UnbalancedParentheses {
            index: units.len(),
            unit: current.trim().to_string(),
        });
    }
    let unit = current.trim();
    if !unit.is_empty() {
        units.push(unit.to_string());
    }
    Ok(units)
}

fn parse_unit(unit: &str, index: usize) -> Result<Operation, ParseError> {
    let open = unit.find('(').ok_or_else(|| ParseError::MalformedUnit {
        index,
        unit: unit.to_string(),
    })?;
    if !unit.ends_with(')') {
        return Err(ParseError::MalformedUnit {
            index,
            unit: unit.to_string(),
        });
    }

    let name = unit[..open].trim();
    let operator = Operator::from_name(name).ok_or_else(|| ParseError::UnknownOperator {
        index,
        name: name.to_string(),
    })?;

    let inner = &unit[open + 1..unit.len() - 1];
    let mut operands: SmallVec<[Operand; 2]> = SmallVec::new();
    // Commas inside a nested operand belong to that operand.
    for raw in split_top_level(inner)? {
        operands.push(parse_operand(&raw, index)?);
    }

    check_arity(operator, &operands, index)?;
    Ok(Operation { operator, operands })
}

fn parse_operand(token: &str, index: usize) -> Result<Operand, ParseError> {
    // A nested operator application, e.g. the inner subtraction of
    // `divide(subtract(a, b), b)`.
    if token.contains('(') {
        return Ok(Operand::Expression(Box::new(parse_unit(token, index)?)));
    }

    if let Some(digits) = token.strip_prefix('#') {
        let position = digits
            .parse::<usize>()
            .map_err(|_| ParseError::InvalidOperand {
                index,
                operand: token.to_string(),
                reason: "back-reference must be '#' followed by a position",
            })?;
        return Ok(Operand::BackRef(position));
    }

    if token.starts_with("const_") {
        let value = named_constant(token).ok_or(ParseError::InvalidOperand {
            index,
            operand: token.to_string(),
            reason: "unknown named constant",
        })?;
        return Ok(Operand::NamedConstant {
            name: token.to_string(),
            value,
        });
    }

    if let Ok(value) = token.parse::<f64>() {
        return Ok(Operand::Literal(value));
    }

    // Anything else is an opaque table-reference token; the context
    // resolver interprets its surface form at execution time.
    Ok(Operand::TableRef(token.to_string()))
}

fn check_arity(
    operator: Operator,
    operands: &[Operand],
    index: usize,
) -> Result<(), ParseError> {
    if operator.is_aggregate() {
        if operands.is_empty() {
            return Err(ParseError::WrongArity {
                index,
                operator: operator.name(),
                expected: "at least 1",
                actual: 0,
            });
        }
        for operand in operands {
            if !matches!(operand, Operand::TableRef(_)) {
                return Err(ParseError::InvalidOperand {
                    index,
                    operand: operand.to_string(),
                    reason: "aggregate operands must be table references",
                });
            }
        }
        return Ok(());
    }

    if operands.len() != 2 {
        return Err(ParseError::WrongArity {
            index,
            operator: operator.name(),
            expected: "exactly 2",
            actual: operands.len(),
        });
    }
    Ok(())
}
