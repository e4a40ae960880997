
use super::dimension::Dimension;
use super::scalar::Scalar;
use super::transform::{Transform, Ratio, ConversionError, expect_number};
use crate::catalog::instructions::Instructions;
use crate::catalog::language::{LangString, Plural};

use std::fmt::{self, Formatter, Display};

/// A unit is an immutable record describing how a quantity in some
/// [`Dimension`] is written and how it converts to the base unit of
/// that dimension.
///
/// Units never change after construction. Every composition function
/// in [`crate::units::compose`] builds a fresh record.
#[derive(Debug, Clone)]
pub struct Unit {
  /// Catalog key, if this unit came from the catalog directly.
  pub id: Option<String>,
  pub symbol: Option<UnitSymbol>,
  pub name: Option<LangString>,
  pub dimension: Dimension,
  pub datatype: Datatype,
  pub conversion: Conversion,
  /// Required for [`Datatype::Dependent`] units.
  pub dependent: Option<DependentVariable>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitSymbol {
  Single(String),
  /// One symbol per component of a tuple-valued unit.
  Tuple(Vec<String>),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Datatype {
  #[default]
  Numeric,
  Text,
  Tuple,
  Dependent,
  ColorCode,
}

/// How a unit converts to its base unit.
#[derive(Debug, Clone, Default)]
pub enum Conversion {
  /// The unit is the base unit.
  #[default]
  Identity,
  Ratio(Ratio),
  Instructions(Instructions),
  Functions(Transform),
}

/// The independent variable a dependent unit's conversion needs.
#[derive(Debug, Clone)]
pub struct DependentVariable {
  pub dimension: Dimension,
  pub name: LangString,
}

impl Unit {
  /// A base unit (identity conversion) in the given dimension.
  pub fn new(dimension: Dimension) -> Self {
    Self {
      id: None,
      symbol: None,
      name: None,
      dimension,
      datatype: Datatype::Numeric,
      conversion: Conversion::Identity,
      dependent: None,
    }
  }

  pub fn with_id(mut self, id: impl Into<String>) -> Self {
    self.id = Some(id.into());
    self
  }

  pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
    self.symbol = Some(UnitSymbol::Single(symbol.into()));
    self
  }

  pub fn with_name(mut self, name: LangString) -> Self {
    self.name = Some(name);
    self
  }

  pub fn with_datatype(mut self, datatype: Datatype) -> Self {
    self.datatype = datatype;
    self
  }

  pub fn with_ratio(mut self, multiplier: f64, divisor: f64) -> Self {
    self.conversion = Conversion::Ratio(Ratio::new(multiplier, divisor));
    self
  }

  pub fn with_instructions(mut self, instructions: Instructions) -> Self {
    self.conversion = Conversion::Instructions(instructions);
    self
  }

  pub fn with_transform(mut self, transform: Transform) -> Self {
    self.conversion = Conversion::Functions(transform);
    self
  }

  /// Marks the unit as dependent on an independent variable of the
  /// given dimension.
  pub fn with_dependent(mut self, dimension: Dimension, name: LangString) -> Self {
    self.datatype = Datatype::Dependent;
    self.dependent = Some(DependentVariable { dimension, name });
    self
  }

  pub fn is_dependent(&self) -> bool {
    self.datatype == Datatype::Dependent
  }

  /// The conversion as a multiplier/divisor pair, if it is one. Units
  /// with this property are called rationalizable.
  pub fn ratio(&self) -> Option<Ratio> {
    match &self.conversion {
      Conversion::Identity => Some(Ratio::ONE),
      Conversion::Ratio(r) => Some(*r),
      Conversion::Instructions(instr) => instr.compiled().ok()?.ratio,
      Conversion::Functions(_) => None,
    }
  }

  /// Converts a payload in this unit to the base unit of the
  /// dimension. `dep` is the independent variable, in its base unit.
  pub fn to_base(&self, x: &Scalar, dep: Option<&Scalar>) -> Result<Scalar, ConversionError> {
    match &self.conversion {
      Conversion::Identity => Ok(x.clone()),
      Conversion::Ratio(r) => Ok(Scalar::Number(r.to_base(expect_number(x)?))),
      Conversion::Instructions(instr) => instr.compiled()?.transform.to_base(x, dep),
      Conversion::Functions(t) => t.to_base(x, dep),
    }
  }

  pub fn from_base(&self, x: &Scalar, dep: Option<&Scalar>) -> Result<Scalar, ConversionError> {
    match &self.conversion {
      Conversion::Identity => Ok(x.clone()),
      Conversion::Ratio(r) => Ok(Scalar::Number(r.from_base(expect_number(x)?))),
      Conversion::Instructions(instr) => instr.compiled()?.transform.from_base(x, dep),
      Conversion::Functions(t) => t.from_base(x, dep),
    }
  }

  pub fn to_base_number(&self, x: f64, dep: Option<f64>) -> Result<f64, ConversionError> {
    let dep = dep.map(Scalar::Number);
    expect_number(&self.to_base(&Scalar::Number(x), dep.as_ref())?)
  }

  pub fn from_base_number(&self, x: f64, dep: Option<f64>) -> Result<f64, ConversionError> {
    let dep = dep.map(Scalar::Number);
    expect_number(&self.from_base(&Scalar::Number(x), dep.as_ref())?)
  }

  pub fn symbol_text(&self) -> Option<String> {
    self.symbol.as_ref().map(UnitSymbol::to_string)
  }

  pub fn name_in(&self, lang: &str, plural: Plural) -> Option<String> {
    self.name.as_ref().and_then(|name| name.lookup(lang, plural))
  }

  /// Human-readable name for messages: the singular name in `lang`,
  /// else the symbol, else the catalog key.
  pub fn display_name(&self, lang: &str) -> String {
    self.name_in(lang, Plural::One)
      .or_else(|| self.symbol_text())
      .or_else(|| self.id.clone())
      .unwrap_or_else(|| format!("unit of {}", self.dimension))
  }
}

impl Display for UnitSymbol {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self {
      UnitSymbol::Single(s) => write!(f, "{s}"),
      UnitSymbol::Tuple(parts) => write!(f, "{}", parts.join(" ")),
    }
  }
}

impl Display for Datatype {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    let name = match self {
      Datatype::Numeric => "numeric",
      Datatype::Text => "text",
      Datatype::Tuple => "tuple",
      Datatype::Dependent => "dependent",
      Datatype::ColorCode => "color-code",
    };
    write!(f, "{name}")
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::instructions::LinearCompiler;

  use approx::assert_abs_diff_eq;

  use std::sync::Arc;

  fn mile() -> Unit {
    Unit::new(Dimension::singleton("length"))
      .with_id("mile")
      .with_symbol("mi")
      .with_name(LangString::english("mile", "miles"))
      .with_ratio(1_609_344.0, 1_000.0)
  }

  #[test]
  fn test_ratio_round_trip() {
    let mile = mile();
    for x in [0.0, -7.25, 1.0, 3.0e9] {
      let base = mile.to_base_number(x, None).unwrap();
      assert_abs_diff_eq!(mile.from_base_number(base, None).unwrap(), x, epsilon = 1e-9 * x.abs().max(1.0));
    }
  }

  #[test]
  fn test_ratio_of_conversions() {
    assert_eq!(Unit::new(Dimension::one()).ratio(), Some(Ratio::ONE));
    assert_abs_diff_eq!(mile().ratio().unwrap().value(), 1609.344);
    let celsius = Unit::new(Dimension::singleton("temperature"))
      .with_instructions(Instructions::new("+273.15", Arc::new(LinearCompiler)));
    assert!(celsius.ratio().is_none());
    let scaled = Unit::new(Dimension::singleton("temperature"))
      .with_instructions(Instructions::new("*5 /9", Arc::new(LinearCompiler)));
    assert_abs_diff_eq!(scaled.ratio().unwrap().value(), 5.0 / 9.0);
  }

  #[test]
  fn test_display_name_fallbacks() {
    assert_eq!(mile().display_name("en"), "mile");
    let unnamed = Unit::new(Dimension::singleton("length")).with_symbol("mi");
    assert_eq!(unnamed.display_name("en"), "mi");
    let bare = Unit::new(Dimension::singleton("length")).with_id("x");
    assert_eq!(bare.display_name("en"), "x");
  }

  #[test]
  fn test_ratio_rejects_text() {
    let err = mile().to_base(&Scalar::Text("3".to_owned()), None).unwrap_err();
    assert_eq!(err, ConversionError::WrongPayload { expected: "number", actual: "text" });
  }
}
