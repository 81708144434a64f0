//! Defines the operation sequence that makes up a reasoning program.
//!
//! A program is the "skeleton" of a numeric answer. It records which
//! arithmetic steps to take and in what order, but holds no computed
//! values itself (those live in the `execution::ExecutionTrace`).

use smallvec::SmallVec;
use std::fmt;

/// The closed set of operators a program may use.
///
/// The operator vocabulary is fixed by domain convention, so a tagged
/// enum with one evaluation rule per variant is preferred over any
/// open-ended registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Exp,
    Greater,
    TableSum,
    TableAverage,
    TableMax,
    TableMin,
}

impl Operator {
    /// Looks up an operator by its surface name.
    ///
    /// Names are case-insensitive, and `-` / `_` are interchangeable
    /// (`table-sum` and `table_sum` name the same operator).
    pub fn from_name(name: &str) -> Option<Self> {
        let canonical: String = name
            .trim()
            .chars()
            .map(|c| if c == '-' { '_' } else { c.to_ascii_lowercase() })
            .collect();

        match canonical.as_str() {
            "add" => Some(Operator::Add),
            "subtract" => Some(Operator::Subtract),
            "multiply" => Some(Operator::Multiply),
            "divide" => Some(Operator::Divide),
            "exp" => Some(Operator::Exp),
            "greater" => Some(Operator::Greater),
            "table_sum" => Some(Operator::TableSum),
            "table_average" => Some(Operator::TableAverage),
            "table_max" => Some(Operator::TableMax),
            "table_min" => Some(Operator::TableMin),
            _ => None,
        }
    }

    /// The canonical (lowercase, underscore) surface name.
    pub fn name(&self) -> &'static str {
        match self {
            Operator::Add => "add",
            Operator::Subtract => "subtract",
            Operator::Multiply => "multiply",
            Operator::Divide => "divide",
            Operator::Exp => "exp",
            Operator::Greater => "greater",
            Operator::TableSum => "table_sum",
            Operator::TableAverage => "table_average",
            Operator::TableMax => "table_max",
            Operator::TableMin => "table_min",
        }
    }

    /// Aggregate operators take a variable-length list of table
    /// references; everything else is strictly binary.
    pub fn is_aggregate(&self) -> bool {
        matches!(
            self,
            Operator::TableSum
                | Operator::TableAverage
                | Operator::TableMax
                | Operator::TableMin
        )
    }
}

/// Resolves a `const_*` token to its numeric value.
///
/// The vocabulary is the fixed set used by the source corpus. Anything
/// else under the `const_` prefix is rejected at parse time.
pub fn named_constant(token: &str) -> Option<f64> {
    match token {
        "const_1" => Some(1.0),
        "const_2" => Some(2.0),
        "const_3" => Some(3.0),
        "const_4" => Some(4.0),
        "const_5" => Some(5.0),
        "const_10" => Some(10.0),
        "const_100" => Some(100.0),
        "const_1000" => Some(1000.0),
        "const_1000000" => Some(1_000_000.0),
        "const_m1" => Some(-1.0),
        _ => None,
    }
}

/// A single argument to an operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A bare signed decimal written directly in the program text.
    Literal(f64),
    /// A `const_*` token. The surface name is kept for round-trip
    /// serialization; the value is fixed at parse time.
    NamedConstant { name: String, value: f64 },
    /// `#N`: the result of the operation at position `N` in the
    /// cumulative trace (global, 0-based, spanning conversation turns).
    BackRef(usize),
    /// An opaque table-reference token. The parser passes it through
    /// untouched; the context resolver interprets it at execution time.
    TableRef(String),
    /// A nested operator application used in place, e.g. the inner
    /// subtraction of `divide(subtract(a, b), b)`. Its result feeds the
    /// enclosing operation directly and never lands in the trace.
    Expression(Box<Operation>),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(v) => write!(f, "{}", v),
            Operand::NamedConstant { name, .. } => write!(f, "{}", name),
            Operand::BackRef(i) => write!(f, "#{}", i),
            Operand::TableRef(token) => write!(f, "{}", token),
            Operand::Expression(op) => write!(f, "{}", op),
        }
    }
}

/// One step of a program: an operator plus its ordered operands.
///
/// Operand order is significant for the non-commutative operators
/// (subtract, divide, exp, greater).
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub operator: Operator,
    // Two inline slots: every non-aggregate operation is binary.
    pub operands: SmallVec<[Operand; 2]>,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.operator.name())?;
        for (i, operand) in self.operands.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", operand)?;
        }
        write!(f, ")")
    }
}

/// An ordered, immutable sequence of operations.
///
/// The program's value is the result of its last operation; an empty
/// program has no value and is rejected by the parser.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub operations: Vec<Operation>,
}

impl Program {
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl fmt::Display for Program {
    /// Normalized textual form: canonical operator names, `", "`
    /// separators. Re-parsing this form yields an equal operation
    /// sequence.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, op) in self.operations.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", op)?;
        }
        Ok(())
    }
}
