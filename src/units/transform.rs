
use super::scalar::Scalar;

use thiserror::Error;

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// A one-directional conversion between a unit and the base unit of
/// its dimension. The second argument is the independent variable of
/// a dependent unit, already expressed in its own base unit.
pub type TransformFn = dyn Fn(&Scalar, Option<&Scalar>) -> Result<Scalar, ConversionError> + Send + Sync;

/// Failure inside a unit transform.
#[derive(Debug, Clone, Error, PartialEq)]
#[non_exhaustive]
pub enum ConversionError {
  #[error("Expected a {expected}, got a {actual}")]
  WrongPayload { expected: &'static str, actual: &'static str },
  #[error("Cannot read '{input}' as a fraction")]
  BadFraction { input: String },
  #[error("Expected {expected} components, got {actual}")]
  WrongComponentCount { expected: usize, actual: usize },
  #[error("This conversion requires an independent variable")]
  MissingIndependentVariable,
  #[error("Invalid conversion instructions '{source_text}': {reason}")]
  BadInstructions { source_text: String, reason: String },
  #[error("{0}")]
  Custom(String),
}

impl ConversionError {
  pub fn wrong_payload(expected: &'static str, actual: &Scalar) -> Self {
    ConversionError::WrongPayload { expected, actual: actual.kind() }
  }
}

/// Extracts a number from a payload, or reports what was found
/// instead.
pub fn expect_number(x: &Scalar) -> Result<f64, ConversionError> {
  x.as_number().ok_or_else(|| ConversionError::wrong_payload("number", x))
}

/// A pair of opaque conversion functions: `forward` converts from the
/// owning unit to the base unit, `reverse` converts back.
#[derive(Clone)]
pub struct Transform {
  forward: Arc<TransformFn>,
  reverse: Arc<TransformFn>,
}

/// A conversion that is a pure scale: one of the unit is
/// `multiplier / divisor` of the base unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ratio {
  pub multiplier: f64,
  pub divisor: f64,
}

impl Transform {
  pub fn new<F, R>(forward: F, reverse: R) -> Self
  where F: Fn(&Scalar, Option<&Scalar>) -> Result<Scalar, ConversionError> + Send + Sync + 'static,
        R: Fn(&Scalar, Option<&Scalar>) -> Result<Scalar, ConversionError> + Send + Sync + 'static {
    Self {
      forward: Arc::new(forward),
      reverse: Arc::new(reverse),
    }
  }

  /// A transform over plain numbers that ignores the independent
  /// variable.
  pub fn numeric<F, R>(forward: F, reverse: R) -> Self
  where F: Fn(f64) -> f64 + Send + Sync + 'static,
        R: Fn(f64) -> f64 + Send + Sync + 'static {
    Self::new(
      move |x, _| Ok(Scalar::Number(forward(expect_number(x)?))),
      move |x, _| Ok(Scalar::Number(reverse(expect_number(x)?))),
    )
  }

  pub fn to_base(&self, x: &Scalar, dep: Option<&Scalar>) -> Result<Scalar, ConversionError> {
    (self.forward)(x, dep)
  }

  pub fn from_base(&self, x: &Scalar, dep: Option<&Scalar>) -> Result<Scalar, ConversionError> {
    (self.reverse)(x, dep)
  }

  /// The same transform with its directions swapped.
  pub fn inverse(&self) -> Self {
    Self {
      forward: Arc::clone(&self.reverse),
      reverse: Arc::clone(&self.forward),
    }
  }

  pub fn ptr_eq(&self, other: &Transform) -> bool {
    Arc::ptr_eq(&self.forward, &other.forward) && Arc::ptr_eq(&self.reverse, &other.reverse)
  }
}

impl Debug for Transform {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "Transform {{ .. }}")
  }
}

impl Ratio {
  pub const ONE: Ratio = Ratio { multiplier: 1.0, divisor: 1.0 };

  pub fn new(multiplier: f64, divisor: f64) -> Self {
    Self { multiplier, divisor }
  }

  pub fn to_base(&self, x: f64) -> f64 {
    x * self.multiplier / self.divisor
  }

  pub fn from_base(&self, x: f64) -> f64 {
    x * self.divisor / self.multiplier
  }

  /// The amount of the base unit in one of this unit.
  pub fn value(&self) -> f64 {
    self.multiplier / self.divisor
  }

  pub fn is_nan(&self) -> bool {
    self.multiplier.is_nan() || self.divisor.is_nan()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use approx::assert_abs_diff_eq;

  #[test]
  fn test_ratio_round_trip() {
    let r = Ratio::new(1_609_344.0, 1_000.0);
    for x in [0.0, -3.5, 1.0, 12345.678, 1e12] {
      assert_abs_diff_eq!(r.from_base(r.to_base(x)), x, epsilon = 1e-9 * x.abs().max(1.0));
    }
    assert_abs_diff_eq!(r.value(), 1609.344);
  }

  #[test]
  fn test_numeric_transform() {
    let t = Transform::numeric(|x| x + 273.15, |x| x - 273.15);
    assert_eq!(t.to_base(&Scalar::Number(0.0), None), Ok(Scalar::Number(273.15)));
    assert_eq!(t.inverse().to_base(&Scalar::Number(273.15), None), Ok(Scalar::Number(0.0)));
    assert_eq!(
      t.to_base(&Scalar::Text("x".to_owned()), None),
      Err(ConversionError::WrongPayload { expected: "number", actual: "text" }),
    );
  }

  #[test]
  fn test_inverse_twice_shares_callables() {
    let t = Transform::numeric(|x| x * 2.0, |x| x / 2.0);
    assert!(t.inverse().inverse().ptr_eq(&t));
    assert!(!t.inverse().ptr_eq(&t));
  }
}
