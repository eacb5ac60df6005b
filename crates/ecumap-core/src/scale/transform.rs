//! Single invertible arithmetic steps

use crate::error::{CodecError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Arithmetic operation applied by one pipeline step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// `x + c`
    Add,
    /// `x - c`
    Subtract,
    /// `x * c`
    Multiply,
    /// `x / c`
    Divide,
    /// `x ^ c`
    Exponent,
    /// Multiply by `2^c`
    ShiftLeft,
    /// Divide by `2^c`
    ShiftRight,
}

impl Operation {
    /// Every operation, in display order
    pub const ALL: [Operation; 7] = [
        Operation::Add,
        Operation::Subtract,
        Operation::Multiply,
        Operation::Divide,
        Operation::Exponent,
        Operation::ShiftLeft,
        Operation::ShiftRight,
    ];

    /// Short operator text used when rendering a pipeline
    pub fn symbol(&self) -> &'static str {
        match self {
            Operation::Add => "+",
            Operation::Subtract => "-",
            Operation::Multiply => "*",
            Operation::Divide => "/",
            Operation::Exponent => "^",
            Operation::ShiftLeft => "<<",
            Operation::ShiftRight => ">>",
        }
    }

    /// Parse an operation from its symbol or name
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "+" | "add" => Some(Operation::Add),
            "-" | "subtract" | "sub" => Some(Operation::Subtract),
            "*" | "multiply" | "mul" => Some(Operation::Multiply),
            "/" | "divide" | "div" => Some(Operation::Divide),
            "^" | "exponent" | "pow" => Some(Operation::Exponent),
            "<<" | "shift_left" | "lshift" => Some(Operation::ShiftLeft),
            ">>" | "shift_right" | "rshift" => Some(Operation::ShiftRight),
            _ => None,
        }
    }

    /// Whether a zero coefficient makes this operation non-invertible
    fn rejects_zero(&self) -> bool {
        !matches!(self, Operation::Add | Operation::Subtract)
    }

    /// raw -> engineering
    pub fn forward(&self, a: f64, c: f64) -> f64 {
        match self {
            Operation::Add => a + c,
            Operation::Subtract => a - c,
            Operation::Multiply => a * c,
            Operation::Divide => a / c,
            Operation::Exponent => a.powf(c),
            Operation::ShiftLeft => a * c.exp2(),
            Operation::ShiftRight => a / c.exp2(),
        }
    }

    /// engineering -> raw
    ///
    /// `Exponent` takes the real `1/c` root, so negative inputs with an
    /// even root yield NaN.
    pub fn reverse(&self, a: f64, c: f64) -> f64 {
        match self {
            Operation::Add => a - c,
            Operation::Subtract => a + c,
            Operation::Multiply => a / c,
            Operation::Divide => a * c,
            Operation::Exponent => a.powf(1.0 / c),
            Operation::ShiftLeft => a / c.exp2(),
            Operation::ShiftRight => a * c.exp2(),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// One validated (operation, coefficient) step of a scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TransformSpec", into = "TransformSpec")]
pub struct Transform {
    operation: Operation,
    coefficient: f64,
}

/// Unvalidated serde form of [`Transform`]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct TransformSpec {
    op: Operation,
    coefficient: f64,
}

impl Transform {
    /// Create a step, rejecting coefficients that have no inverse
    pub fn new(operation: Operation, coefficient: f64) -> Result<Self> {
        if !coefficient.is_finite() {
            return Err(CodecError::invalid(format!(
                "coefficient for {operation:?} must be finite, got {coefficient}"
            )));
        }
        if coefficient == 0.0 && operation.rejects_zero() {
            return Err(CodecError::invalid(format!(
                "{operation:?} with a zero coefficient is not invertible"
            )));
        }
        Ok(Self {
            operation,
            coefficient,
        })
    }

    /// Operation applied by this step
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Constant operand `c`
    pub fn coefficient(&self) -> f64 {
        self.coefficient
    }

    /// Apply this step in the raw -> engineering direction
    pub fn forward(&self, a: f64) -> f64 {
        self.operation.forward(a, self.coefficient)
    }

    /// Undo this step
    pub fn reverse(&self, a: f64) -> f64 {
        self.operation.reverse(a, self.coefficient)
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.operation, self.coefficient)
    }
}

impl TryFrom<TransformSpec> for Transform {
    type Error = CodecError;

    fn try_from(spec: TransformSpec) -> Result<Self> {
        Transform::new(spec.op, spec.coefficient)
    }
}

impl From<Transform> for TransformSpec {
    fn from(t: Transform) -> Self {
        TransformSpec {
            op: t.operation,
            coefficient: t.coefficient,
        }
    }
}
