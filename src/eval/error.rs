
use crate::units::compose::CompositionError;
use crate::units::parsing::UnitExprError;
use crate::units::transform::ConversionError;

use thiserror::Error;

/// Failure while evaluating one statement. Every variant carries a
/// complete, human-readable message; operands are already rendered.
#[derive(Debug, Clone, Error, PartialEq)]
#[non_exhaustive]
pub enum EvalError {
  #[error("Cannot apply `{op}` to {left} and {right}")]
  TypeMismatch { op: String, left: String, right: String },
  #[error("Cannot apply `{op}` to {operand}")]
  UnaryTypeMismatch { op: String, operand: String },
  #[error("Dimensions of {left} and {right} do not match")]
  DimensionMismatch { left: String, right: String },
  #[error("The {side} unit `{unit}` needs an independent variable, bind one with `@`")]
  MissingIndependentVariable { side: &'static str, unit: String },
  #[error("Unknown identifier `{0}`")]
  UnknownIdentifier(String),
  #[error("`{term}` is ambiguous: {count} candidates match")]
  Ambiguous { term: String, count: usize },
  #[error("{function}: {message}")]
  Domain { function: String, message: String },
  #[error("{function} expects {expected} argument(s), got {actual}")]
  Arity { function: String, expected: String, actual: usize },
  #[error("{0}")]
  Composition(#[from] CompositionError),
  #[error("{0}")]
  Conversion(#[from] ConversionError),
  #[error("{0}")]
  UnitExpression(#[from] UnitExprError),
}

impl EvalError {
  pub fn domain(function: impl Into<String>, message: impl Into<String>) -> Self {
    EvalError::Domain { function: function.into(), message: message.into() }
  }
}
