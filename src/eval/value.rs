
//! Runtime values of the expression language.

use super::function::FunctionValue;
use crate::catalog::language::{Plural, DEFAULT_LANGUAGE};
use crate::units::scalar::Scalar;
use crate::units::unit::Unit;
use crate::util::matrix::Matrix;

use std::fmt::{self, Display, Formatter};

/// A runtime value. Values are immutable; every operator returns a
/// fresh one.
#[derive(Debug, Clone)]
pub enum Value {
  Number(f64),
  String(String),
  Boolean(bool),
  /// A list. An array whose elements are all arrays of one length is
  /// also a matrix, row by row.
  Array(Vec<Value>),
  Unit(Box<Unit>),
  ValueUnit(Box<ValueUnit>),
  Function(FunctionValue),
  UnitType(CatalogRef),
  Include(CatalogRef),
  Element(CatalogRef),
  Solver(CatalogRef),
}

/// A payload expressed in a unit. Dependent units also carry the
/// bound independent variable, when there is one.
#[derive(Debug, Clone)]
pub struct ValueUnit {
  pub value: Value,
  pub unit: Unit,
  pub depvalue: Option<Value>,
  /// Unit of `depvalue`. A bare number is taken to be in the base
  /// unit of the independent variable's dimension.
  pub depunit: Option<Unit>,
}

/// A catalog record the evaluator can only look up and print.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRef {
  pub key: String,
  pub name: String,
}

impl Value {
  pub fn unit(unit: Unit) -> Self {
    Value::Unit(Box::new(unit))
  }

  pub fn quantity(value: Value, unit: Unit) -> Self {
    Value::ValueUnit(Box::new(ValueUnit::new(value, unit)))
  }

  /// Short name of the value's runtime type.
  pub fn kind(&self) -> &'static str {
    match self {
      Value::Number(_) => "number",
      Value::String(_) => "string",
      Value::Boolean(_) => "boolean",
      Value::Array(_) => "array",
      Value::Unit(_) => "unit",
      Value::ValueUnit(_) => "value",
      Value::Function(_) => "function",
      Value::UnitType(_) => "unittype",
      Value::Include(_) => "include",
      Value::Element(_) => "element",
      Value::Solver(_) => "solver",
    }
  }

  pub fn as_number(&self) -> Option<f64> {
    match self {
      Value::Number(x) => Some(*x),
      _ => None,
    }
  }

  pub fn as_bool(&self) -> Option<bool> {
    match self {
      Value::Boolean(b) => Some(*b),
      _ => None,
    }
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Value::String(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_array(&self) -> Option<&[Value]> {
    match self {
      Value::Array(elems) => Some(elems),
      _ => None,
    }
  }

  pub fn as_function(&self) -> Option<&FunctionValue> {
    match self {
      Value::Function(f) => Some(f),
      _ => None,
    }
  }

  /// The rows of the value if it is a non-empty rectangular array of
  /// arrays.
  pub fn as_matrix(&self) -> Option<Matrix<Value>> {
    let rows = self.as_array()?;
    let body = rows.iter()
      .map(|row| row.as_array().map(<[Value]>::to_vec))
      .collect::<Option<Vec<_>>>()?;
    let matrix = Matrix::new(body).ok()?;
    (!matrix.is_empty()).then_some(matrix)
  }

  pub fn from_matrix(matrix: Matrix<Value>) -> Self {
    Value::Array(matrix.into_row_major().into_iter().map(Value::Array).collect())
  }

  /// The unit transform payload for this value, if it has one.
  pub fn to_scalar(&self) -> Option<Scalar> {
    match self {
      Value::Number(x) => Some(Scalar::Number(*x)),
      Value::String(s) => Some(Scalar::Text(s.clone())),
      Value::Array(elems) => elems.iter().map(Value::to_scalar).collect::<Option<Vec<_>>>().map(Scalar::Tuple),
      _ => None,
    }
  }

  pub fn from_scalar(scalar: Scalar) -> Self {
    match scalar {
      Scalar::Number(x) => Value::Number(x),
      Scalar::Text(s) => Value::String(s),
      Scalar::Tuple(elems) => Value::Array(elems.into_iter().map(Value::from_scalar).collect()),
    }
  }

  /// Human-readable rendering, used for output and inside error
  /// messages. Unit names are taken in `lang`.
  pub fn render(&self, lang: &str) -> String {
    match self {
      Value::Number(x) => format_number(*x),
      Value::String(s) => format!("{s:?}"),
      Value::Boolean(b) => b.to_string(),
      Value::Array(elems) => {
        let inner: Vec<_> = elems.iter().map(|e| e.render(lang)).collect();
        format!("[{}]", inner.join(", "))
      }
      Value::Unit(unit) => format!("unit `{}`", unit.display_name(lang)),
      Value::ValueUnit(vu) => vu.render(lang),
      Value::Function(f) => format!("function `{f}`"),
      Value::UnitType(r) | Value::Include(r) | Value::Element(r) | Value::Solver(r) => {
        format!("{} `{}`", self.kind(), r.name)
      }
    }
  }
}

impl ValueUnit {
  pub fn new(value: Value, unit: Unit) -> Self {
    Self { value, unit, depvalue: None, depunit: None }
  }

  pub fn with_binding(mut self, depvalue: Value, depunit: Option<Unit>) -> Self {
    self.depvalue = Some(depvalue);
    self.depunit = depunit;
    self
  }

  /// A copy with a new payload, in the same unit and binding.
  pub fn with_value(&self, value: Value) -> Self {
    Self {
      value,
      unit: self.unit.clone(),
      depvalue: self.depvalue.clone(),
      depunit: self.depunit.clone(),
    }
  }

  pub fn render(&self, lang: &str) -> String {
    let mut text = format!("{} {}", render_payload(&self.value, lang), quantity_name(&self.unit, &self.value, lang));
    if let Some(depvalue) = &self.depvalue {
      let depname = match &self.depunit {
        Some(unit) => quantity_name(unit, depvalue, lang),
        None => self.unit.dependent.as_ref()
          .and_then(|dep| dep.name.lookup(lang, Plural::Other))
          .unwrap_or_default(),
      };
      let suffix = format!(" at {} {}", render_payload(depvalue, lang), depname);
      text.push_str(suffix.trim_end());
    }
    text
  }
}

/// Payloads print bare: text-datatype results such as `3 1/7` are
/// not quoted, including inside hierarchical components.
fn render_payload(value: &Value, lang: &str) -> String {
  match value {
    Value::String(s) => s.clone(),
    Value::Array(elems) => {
      let inner: Vec<_> = elems.iter().map(|e| render_payload(e, lang)).collect();
      format!("[{}]", inner.join(", "))
    }
    other => other.render(lang),
  }
}

fn quantity_name(unit: &Unit, value: &Value, lang: &str) -> String {
  let plural = value.as_number().map_or(Plural::Other, Plural::for_amount);
  unit.name_in(lang, plural)
    .or_else(|| unit.symbol_text())
    .unwrap_or_else(|| unit.display_name(lang))
}

/// Integers print without a fractional part; infinities print with
/// the infinity glyph.
pub fn format_number(x: f64) -> String {
  if x.is_nan() {
    "nan".to_owned()
  } else if x.is_infinite() {
    if x > 0.0 { "∞".to_owned() } else { "-∞".to_owned() }
  } else if x == 0.0 {
    "0".to_owned()
  } else {
    x.to_string()
  }
}

impl Display for Value {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.render(DEFAULT_LANGUAGE))
  }
}

impl From<f64> for Value {
  fn from(x: f64) -> Self {
    Value::Number(x)
  }
}

impl From<bool> for Value {
  fn from(b: bool) -> Self {
    Value::Boolean(b)
  }
}

impl From<String> for Value {
  fn from(s: String) -> Self {
    Value::String(s)
  }
}

impl From<Vec<Value>> for Value {
  fn from(elems: Vec<Value>) -> Self {
    Value::Array(elems)
  }
}
