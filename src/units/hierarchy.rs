
//! Mixed-radix units, such as feet and inches or hours, minutes and
//! seconds, written as one component per sub-unit.

use super::compose::{CompositionError, check_composable, check_composable_dimension};
use super::scalar::Scalar;
use super::transform::{Transform, ConversionError, expect_number};
use super::unit::{Unit, UnitSymbol, Datatype, Conversion};
use crate::catalog::{Catalog, LangString};

/// Relative tolerance within which a component is snapped to the
/// nearest integer before truncation, so that `5.999999999` feet
/// becomes 6 feet rather than 5 feet and 12 inches.
const SNAP_TOLERANCE: f64 = 1e-9;

/// Truncates toward zero, snapping near-integers first.
fn truncate(value: f64) -> f64 {
  let nearest = value.round();
  if (value - nearest).abs() <= SNAP_TOLERANCE * value.abs().max(1.0) {
    nearest
  } else if value < 0.0 {
    value.ceil()
  } else {
    value.floor()
  }
}

/// Splits a base value into components. Every component but the last
/// is truncated to an integer, and the remainder carries over to the
/// next component.
fn decompose(units: &[Unit], base: f64, dep: Option<&Scalar>) -> Result<Vec<Scalar>, ConversionError> {
  let mut remaining = base;
  let mut components = Vec::with_capacity(units.len());
  let Some((last, init)) = units.split_last() else {
    return Ok(components);
  };
  for unit in init {
    let value = expect_number(&unit.from_base(&Scalar::Number(remaining), dep)?)?;
    let whole = truncate(value);
    remaining -= expect_number(&unit.to_base(&Scalar::Number(whole), dep)?)?;
    components.push(Scalar::Number(whole));
  }
  components.push(last.from_base(&Scalar::Number(remaining), dep)?);
  Ok(components)
}

fn recompose(units: &[Unit], components: &Scalar, dep: Option<&Scalar>) -> Result<Scalar, ConversionError> {
  let parts = components.as_tuple().ok_or_else(|| ConversionError::wrong_payload("tuple", components))?;
  if parts.len() != units.len() {
    return Err(ConversionError::WrongComponentCount { expected: units.len(), actual: parts.len() });
  }
  let mut total = 0.0;
  for (unit, part) in units.iter().zip(parts) {
    total += expect_number(&unit.to_base(part, dep)?)?;
  }
  Ok(Scalar::Number(total))
}

/// Composes units of identical dimension into one tuple-datatype unit,
/// most significant first. The least significant component may be a
/// fraction unit, in which case it is displayed as fraction text.
pub fn hierarchical(catalog: &Catalog, units: &[&Unit]) -> Result<Unit, CompositionError> {
  let Some(first) = units.first() else {
    return Err(CompositionError::NoOperands);
  };
  for (i, unit) in units.iter().enumerate() {
    if i + 1 == units.len() && unit.datatype == Datatype::Text {
      check_composable_dimension(catalog, unit)?;
    } else {
      check_composable(catalog, unit)?;
    }
    if unit.dimension != first.dimension {
      return Err(CompositionError::DimensionsDiffer {
        first: first.display_name(catalog.language()),
        second: unit.display_name(catalog.language()),
      });
    }
  }

  let symbol = units.iter()
    .map(|u| u.symbol_text())
    .collect::<Option<Vec<_>>>()
    .map(UnitSymbol::Tuple);
  let name = units.iter()
    .map(|u| u.name.clone())
    .collect::<Option<Vec<_>>>()
    .map(|names| {
      let joiner = &catalog.joiners().hierarchical;
      let refs: Vec<&LangString> = names.iter().collect();
      catalog.language_service().join(&joiner.name, &joiner.order, &refs)
    });

  let components: Vec<Unit> = units.iter().map(|u| (*u).clone()).collect();
  let reader = components.clone();
  let transform = Transform::new(
    move |x, dep| recompose(&reader, x, dep),
    move |x, dep| Ok(Scalar::Tuple(decompose(&components, expect_number(x)?, dep)?)),
  );
  Ok(Unit {
    id: None,
    symbol,
    name,
    dimension: first.dimension.clone(),
    datatype: Datatype::Tuple,
    conversion: Conversion::Functions(transform),
    dependent: None,
  })
}
