
use std::fmt::{self, Formatter, Display};

/// The payload a unit transform operates on. Most units convert plain
/// numbers; text-datatype units (fractions, color codes) exchange
/// strings with their base unit, and tuple-datatype units
/// (hierarchical compositions) exchange one component per sub-unit.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
  Number(f64),
  Text(String),
  Tuple(Vec<Scalar>),
}

impl Scalar {
  pub fn as_number(&self) -> Option<f64> {
    match self {
      Scalar::Number(x) => Some(*x),
      _ => None,
    }
  }

  pub fn as_text(&self) -> Option<&str> {
    match self {
      Scalar::Text(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_tuple(&self) -> Option<&[Scalar]> {
    match self {
      Scalar::Tuple(elems) => Some(elems),
      _ => None,
    }
  }

  /// A short description of the payload kind, used in conversion
  /// error messages.
  pub fn kind(&self) -> &'static str {
    match self {
      Scalar::Number(_) => "number",
      Scalar::Text(_) => "text",
      Scalar::Tuple(_) => "tuple",
    }
  }
}

impl From<f64> for Scalar {
  fn from(x: f64) -> Self {
    Scalar::Number(x)
  }
}

impl From<String> for Scalar {
  fn from(s: String) -> Self {
    Scalar::Text(s)
  }
}

impl From<&str> for Scalar {
  fn from(s: &str) -> Self {
    Scalar::Text(s.to_owned())
  }
}

impl Display for Scalar {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self {
      Scalar::Number(x) => write!(f, "{x}"),
      Scalar::Text(s) => write!(f, "{s}"),
      Scalar::Tuple(elems) => {
        for (i, elem) in elems.iter().enumerate() {
          if i > 0 {
            write!(f, " ")?;
          }
          write!(f, "{elem}")?;
        }
        Ok(())
      }
    }
  }
}
