
//! Building new units out of existing ones: products, quotients,
//! powers and prefixes.
//!
//! Every operation first checks that its operands are composable
//! (numeric, and in no dimension the catalog marks as
//! non-composable), and reports failure as a [`CompositionError`]
//! naming the offending unit.

use super::dimension::Dimension;
use super::scalar::Scalar;
use super::transform::{Transform, Ratio, expect_number};
use super::unit::{Unit, UnitSymbol, Datatype, Conversion};
use crate::catalog::{Catalog, Joiner, LangString};

use num::rational::Rational64;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum CompositionError {
  #[error("Nothing to compose")]
  NoOperands,
  #[error("Unit `{unit}` is {datatype}, not numeric")]
  NotNumeric { unit: String, datatype: String },
  #[error("Unit `{unit}` has a non-composable dimension `{dimension}`")]
  NotComposable { unit: String, dimension: String },
  #[error("Unit `{unit}` is not a simple ratio of its base unit")]
  NotRationalizable { unit: String },
  #[error("Units `{first}` and `{second}` have different dimensions")]
  DimensionsDiffer { first: String, second: String },
  #[error("No degree is defined for the power {exponent}")]
  UnknownDegree { exponent: String },
  #[error("No prefix is defined for {base}^{exponent}")]
  UnknownPrefix { base: u32, exponent: i32 },
  #[error("Raising `{unit}` to the power {exponent} is undefined")]
  UndefinedPower { unit: String, exponent: String },
}

/// Checks that the unit is numeric and that none of its base
/// dimensions is non-composable.
pub fn check_composable(catalog: &Catalog, unit: &Unit) -> Result<(), CompositionError> {
  if unit.datatype != Datatype::Numeric {
    return Err(CompositionError::NotNumeric {
      unit: unit.display_name(catalog.language()),
      datatype: unit.datatype.to_string(),
    });
  }
  check_composable_dimension(catalog, unit)
}

/// The dimension half of [`check_composable`].
pub fn check_composable_dimension(catalog: &Catalog, unit: &Unit) -> Result<(), CompositionError> {
  match catalog.non_composable_base(&unit.dimension) {
    None => Ok(()),
    Some(base) => Err(CompositionError::NotComposable {
      unit: unit.display_name(catalog.language()),
      dimension: base.to_owned(),
    }),
  }
}

fn rationalize(catalog: &Catalog, unit: &Unit) -> Result<Ratio, CompositionError> {
  unit.ratio().ok_or_else(|| CompositionError::NotRationalizable {
    unit: unit.display_name(catalog.language()),
  })
}

/// Joins the symbols of all the units, if every one of them has a
/// single symbol.
fn join_symbols(catalog: &Catalog, joiner: &Joiner, units: &[&Unit]) -> Option<String> {
  let symbols: Vec<LangString> = units.iter()
    .map(|u| match &u.symbol {
      Some(UnitSymbol::Single(s)) => Some(LangString::plain(s.clone())),
      _ => None,
    })
    .collect::<Option<_>>()?;
  let refs: Vec<&LangString> = symbols.iter().collect();
  let joined = catalog.language_service().join(&joiner.symbol, &joiner.order, &refs);
  joined.lookup(catalog.language(), crate::catalog::Plural::Other)
}

fn join_names(catalog: &Catalog, joiner: &Joiner, names: &[LangString]) -> LangString {
  let refs: Vec<&LangString> = names.iter().collect();
  catalog.language_service().join(&joiner.name, &joiner.order, &refs)
}

fn all_names(units: &[&Unit]) -> Option<Vec<LangString>> {
  units.iter().map(|u| u.name.clone()).collect()
}

fn ratio_unit(dimension: Dimension, ratio: Ratio, symbol: Option<String>, name: Option<LangString>) -> Unit {
  let mut unit = Unit::new(dimension).with_ratio(ratio.multiplier, ratio.divisor);
  unit.symbol = symbol.map(UnitSymbol::Single);
  unit.name = name;
  unit
}

/// The product of the units. All operands must be rationalizable.
pub fn multiply(catalog: &Catalog, units: &[&Unit]) -> Result<Unit, CompositionError> {
  if units.is_empty() {
    return Err(CompositionError::NoOperands);
  }
  let mut ratio = Ratio::ONE;
  for unit in units {
    check_composable(catalog, unit)?;
    let r = rationalize(catalog, unit)?;
    ratio = Ratio::new(ratio.multiplier * r.multiplier, ratio.divisor * r.divisor);
  }
  let joiner = &catalog.joiners().product;
  let dimension = Dimension::multiply(units.iter().map(|u| &u.dimension));
  let symbol = join_symbols(catalog, joiner, units);
  let name = all_names(units).map(|names| join_names(catalog, joiner, &names));
  Ok(ratio_unit(dimension, ratio, symbol, name))
}

/// The first unit divided by each of the rest. All operands must be
/// rationalizable. Denominator names are taken in the singular, so
/// that the result reads "meters per second".
pub fn divide(catalog: &Catalog, units: &[&Unit]) -> Result<Unit, CompositionError> {
  let Some((first, rest)) = units.split_first() else {
    return Err(CompositionError::NoOperands);
  };
  check_composable(catalog, first)?;
  let mut ratio = rationalize(catalog, first)?;
  for unit in rest {
    check_composable(catalog, unit)?;
    let r = rationalize(catalog, unit)?;
    ratio = Ratio::new(ratio.multiplier * r.divisor, ratio.divisor * r.multiplier);
  }
  let joiner = &catalog.joiners().quotient;
  let dimension = Dimension::divide(&first.dimension, rest.iter().map(|u| &u.dimension));
  let symbol = join_symbols(catalog, joiner, units);
  let name = all_names(units).map(|mut names| {
    for name in names.iter_mut().skip(1) {
      *name = name.singular();
    }
    join_names(catalog, joiner, &names)
  });
  Ok(ratio_unit(dimension, ratio, symbol, name))
}

/// Interprets a floating-point exponent as a small rational, as used
/// to key degree descriptors. Only denominators up to 12 are tried.
pub fn rational_exponent(exponent: f64) -> Option<Rational64> {
  if !exponent.is_finite() {
    return None;
  }
  (1..=12i64).find_map(|denom| {
    let numer = (exponent * denom as f64).round();
    ((numer / denom as f64 - exponent).abs() < 1e-9 && numer.abs() < i64::MAX as f64)
      .then(|| Rational64::new(numer as i64, denom))
  })
}

/// Raises a rationalizable unit to a power for which the catalog has a
/// degree descriptor.
pub fn power(catalog: &Catalog, unit: &Unit, exponent: f64) -> Result<Unit, CompositionError> {
  check_composable(catalog, unit)?;
  let degree = rational_exponent(exponent)
    .and_then(|r| catalog.degree(r).map(|d| (r, d)));
  let Some((rational, degree)) = degree else {
    return Err(CompositionError::UnknownDegree { exponent: exponent.to_string() });
  };
  let r = rationalize(catalog, unit)?;
  let ratio = Ratio::new(r.multiplier.powf(exponent), r.divisor.powf(exponent));
  if ratio.is_nan() {
    return Err(CompositionError::UndefinedPower {
      unit: unit.display_name(catalog.language()),
      exponent: exponent.to_string(),
    });
  }
  let symbol = unit.symbol_text().map(|s| format!("{s}{}", degree.symbol));
  // "per square meter", not "per square meters".
  let name = unit.name.as_ref().map(|name| {
    let name = if exponent < 0.0 { name.singular() } else { name.clone() };
    catalog.language_service().format(&degree.name, &[&name])
  });
  Ok(ratio_unit(unit.dimension.pow(rational), ratio, symbol, name))
}

/// Applies the prefix `base^exponent` (such as kilo for 10^3 or kibi
/// for 2^10) to a unit.
///
/// Rationalizable units get their multiplier or divisor scaled. Other
/// units only need a composable dimension, and get a new conversion
/// that scales the payload before delegating to the original one.
pub fn prefix(catalog: &Catalog, unit: &Unit, base: u32, exponent: i32) -> Result<Unit, CompositionError> {
  let descriptor = catalog.prefix(base, exponent)
    .ok_or(CompositionError::UnknownPrefix { base, exponent })?;
  let symbol = unit.symbol_text().map(|s| format!("{}{s}", descriptor.symbol));
  let name = unit.name.as_ref().map(|name| catalog.language_service().format(&descriptor.name, &[name]));

  if let Some(r) = unit.ratio() {
    check_composable(catalog, unit)?;
    let scale = f64::from(base).powi(exponent.abs());
    let ratio = if exponent > 0 {
      Ratio::new(r.multiplier * scale, r.divisor)
    } else {
      Ratio::new(r.multiplier, r.divisor * scale)
    };
    return Ok(ratio_unit(unit.dimension.clone(), ratio, symbol, name));
  }

  check_composable_dimension(catalog, unit)?;
  let factor = f64::from(base).powi(exponent);
  let inner = unit.clone();
  let outer = unit.clone();
  let transform = Transform::new(
    move |x, dep| inner.to_base(&Scalar::Number(expect_number(x)? * factor), dep),
    move |x, dep| Ok(Scalar::Number(expect_number(&outer.from_base(x, dep)?)? / factor)),
  );
  Ok(Unit {
    id: None,
    symbol: symbol.map(UnitSymbol::Single),
    name,
    dimension: unit.dimension.clone(),
    datatype: unit.datatype,
    conversion: Conversion::Functions(transform),
    dependent: unit.dependent.clone(),
  })
}

#[cfg(test)]
pub(crate) mod test_utils {
  use crate::catalog::{Catalog, DimensionInfo, DegreeDescriptor, PrefixDescriptor, Joiner, Joiners, LangString};
  use crate::units::dimension::Dimension;
  use crate::units::transform::Transform;
  use crate::units::unit::Unit;

  use num::rational::Rational64;

  /// A small catalog with English joiners, for composition tests.
  pub fn sample_catalog() -> Catalog {
    let joiners = Joiners {
      product: Joiner { symbol: LangString::plain("·"), name: LangString::plain(" "), order: LangString::new() },
      quotient: Joiner { symbol: LangString::plain("/"), name: LangString::plain(" per "), order: LangString::new() },
      hierarchical: Joiner { symbol: LangString::plain(" "), name: LangString::plain(" and "), order: LangString::new() },
    };
    let mut catalog = Catalog::new().with_joiners(joiners);
    catalog.add_dimension("length", DimensionInfo { composable: true, name: LangString::plain("length") });
    catalog.add_dimension("time", DimensionInfo { composable: true, name: LangString::plain("time") });
    catalog.add_dimension("currency", DimensionInfo { composable: false, name: LangString::plain("currency") });
    catalog.add_degree(Rational64::from_integer(2), DegreeDescriptor { symbol: "²".to_owned(), name: LangString::plain("square {0}") });
    catalog.add_degree(Rational64::from_integer(-1), DegreeDescriptor { symbol: "⁻¹".to_owned(), name: LangString::plain("per {0}") });
    catalog.add_degree(Rational64::new(1, 2), DegreeDescriptor { symbol: "^½".to_owned(), name: LangString::plain("square root {0}") });
    catalog.add_prefix(10, 3, PrefixDescriptor { symbol: "k".to_owned(), name: LangString::plain("kilo{0}") });
    catalog.add_prefix(10, -3, PrefixDescriptor { symbol: "m".to_owned(), name: LangString::plain("milli{0}") });
    catalog.add_prefix(2, 10, PrefixDescriptor { symbol: "Ki".to_owned(), name: LangString::plain("kibi{0}") });

    catalog.add_unit("meter", Unit::new(Dimension::singleton("length")).with_symbol("m").with_name(LangString::english("meter", "meters")));
    catalog.add_unit("foot", Unit::new(Dimension::singleton("length")).with_symbol("ft").with_name(LangString::english("foot", "feet")).with_ratio(3048.0, 10000.0));
    catalog.add_unit("inch", Unit::new(Dimension::singleton("length")).with_symbol("in").with_name(LangString::english("inch", "inches")).with_ratio(254.0, 10000.0));
    catalog.add_unit("second", Unit::new(Dimension::singleton("time")).with_symbol("s").with_name(LangString::english("second", "seconds")));
    catalog.add_unit("hour", Unit::new(Dimension::singleton("time")).with_symbol("h").with_name(LangString::english("hour", "hours")).with_ratio(3600.0, 1.0));
    catalog.add_unit("dollar", Unit::new(Dimension::singleton("currency")).with_symbol("$").with_name(LangString::english("dollar", "dollars")));
    catalog.add_unit(
      "lognum",
      Unit::new(Dimension::singleton("length"))
        .with_symbol("lm")
        .with_name(LangString::english("log meter", "log meters"))
        .with_transform(Transform::numeric(f64::exp, f64::ln)),
    );
    let offset = catalog.instructions("+10");
    catalog.add_unit("offset", Unit::new(Dimension::singleton("length")).with_symbol("om").with_instructions(offset));
    catalog
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use super::test_utils::sample_catalog;
  use crate::catalog::Plural;

  use approx::assert_abs_diff_eq;

  fn unit<'a>(catalog: &'a Catalog, key: &str) -> &'a Unit {
    catalog.unit(key).unwrap()
  }

  fn en(unit: &Unit) -> String {
    unit.name_in("en", Plural::Other).unwrap()
  }

  #[test]
  fn test_multiply() {
    let catalog = sample_catalog();
    let result = multiply(&catalog, &[unit(&catalog, "foot"), unit(&catalog, "hour")]).unwrap();
    assert_eq!(result.symbol_text().as_deref(), Some("ft·h"));
    assert_eq!(en(&result), "feet hours");
    assert_abs_diff_eq!(result.ratio().unwrap().value(), 0.3048 * 3600.0, epsilon = 1e-9);
    assert_eq!(result.dimension, Dimension::singleton("length") * Dimension::singleton("time"));
  }

  #[test]
  fn test_multiply_is_commutative_up_to_naming() {
    let catalog = sample_catalog();
    let a = multiply(&catalog, &[unit(&catalog, "foot"), unit(&catalog, "hour")]).unwrap();
    let b = multiply(&catalog, &[unit(&catalog, "hour"), unit(&catalog, "foot")]).unwrap();
    assert_eq!(a.dimension, b.dimension);
    assert_abs_diff_eq!(a.ratio().unwrap().value(), b.ratio().unwrap().value(), epsilon = 1e-9);
  }

  #[test]
  fn test_divide() {
    let catalog = sample_catalog();
    let result = divide(&catalog, &[unit(&catalog, "meter"), unit(&catalog, "second")]).unwrap();
    assert_eq!(result.symbol_text().as_deref(), Some("m/s"));
    assert_eq!(en(&result), "meters per second");
    let d = Dimension::singleton("length") / Dimension::singleton("time");
    assert_eq!(result.dimension, d);

    let fph = divide(&catalog, &[unit(&catalog, "foot"), unit(&catalog, "hour")]).unwrap();
    assert_abs_diff_eq!(fph.to_base_number(1.0, None).unwrap(), 0.3048 / 3600.0, epsilon = 1e-15);
  }

  #[test]
  fn test_names_only_when_all_named() {
    let catalog = sample_catalog();
    let result = multiply(&catalog, &[unit(&catalog, "meter"), unit(&catalog, "offset")]);
    // The offset unit is not rationalizable.
    assert_eq!(result.unwrap_err(), CompositionError::NotRationalizable { unit: "om".to_owned() });

    let unnamed = Unit::new(Dimension::singleton("length")).with_ratio(2.0, 1.0);
    let result = multiply(&catalog, &[unit(&catalog, "meter"), &unnamed]).unwrap();
    assert!(result.name.is_none());
    assert!(result.symbol.is_none());
  }

  #[test]
  fn test_non_composable() {
    let catalog = sample_catalog();
    let err = multiply(&catalog, &[unit(&catalog, "dollar"), unit(&catalog, "hour")]).unwrap_err();
    assert_eq!(err, CompositionError::NotComposable { unit: "dollar".to_owned(), dimension: "currency".to_owned() });
    let err = prefix(&catalog, unit(&catalog, "dollar"), 10, 3).unwrap_err();
    assert!(matches!(err, CompositionError::NotComposable { .. }));
  }

  #[test]
  fn test_power() {
    let catalog = sample_catalog();
    let sq = power(&catalog, unit(&catalog, "foot"), 2.0).unwrap();
    assert_eq!(sq.symbol_text().as_deref(), Some("ft²"));
    assert_eq!(en(&sq), "square feet");
    assert_abs_diff_eq!(sq.ratio().unwrap().value(), 0.3048 * 0.3048, epsilon = 1e-12);
    assert_eq!(sq.dimension.get("length"), Rational64::from_integer(2));

    let root = power(&catalog, &sq, 0.5).unwrap();
    assert_abs_diff_eq!(root.ratio().unwrap().value(), 0.3048, epsilon = 1e-12);
    assert_eq!(root.dimension, Dimension::singleton("length"));
  }

  #[test]
  fn test_power_failures() {
    let catalog = sample_catalog();
    let err = power(&catalog, unit(&catalog, "foot"), 7.0).unwrap_err();
    assert_eq!(err, CompositionError::UnknownDegree { exponent: "7".to_owned() });
    let negative = Unit::new(Dimension::singleton("length")).with_ratio(-2.0, 1.0);
    let err = power(&catalog, &negative, 0.5).unwrap_err();
    assert!(matches!(err, CompositionError::UndefinedPower { .. }));
  }

  #[test]
  fn test_rational_exponent() {
    assert_eq!(rational_exponent(2.0), Some(Rational64::from_integer(2)));
    assert_eq!(rational_exponent(-0.5), Some(Rational64::new(-1, 2)));
    assert_eq!(rational_exponent(1.0 / 3.0), Some(Rational64::new(1, 3)));
    assert_eq!(rational_exponent(std::f64::consts::PI), None);
    assert_eq!(rational_exponent(f64::NAN), None);
  }

  #[test]
  fn test_prefix_ratio() {
    let catalog = sample_catalog();
    let km = prefix(&catalog, unit(&catalog, "meter"), 10, 3).unwrap();
    assert_eq!(km.symbol_text().as_deref(), Some("km"));
    assert_eq!(en(&km), "kilometers");
    assert_abs_diff_eq!(km.to_base_number(2.5, None).unwrap(), 2500.0);
    let ms = prefix(&catalog, unit(&catalog, "second"), 10, -3).unwrap();
    assert_eq!(ms.ratio(), Some(Ratio::new(1.0, 1000.0)));
    let kib = prefix(&catalog, unit(&catalog, "meter"), 2, 10).unwrap();
    assert_abs_diff_eq!(kib.to_base_number(1.0, None).unwrap(), 1024.0);
  }

  #[test]
  fn test_prefix_non_linear() {
    let catalog = sample_catalog();
    let klog = prefix(&catalog, unit(&catalog, "lognum"), 10, 3).unwrap();
    assert!(klog.ratio().is_none());
    assert_eq!(klog.symbol_text().as_deref(), Some("klm"));
    let base = klog.to_base_number(0.002, None).unwrap();
    assert_abs_diff_eq!(base, 2.0f64.exp(), epsilon = 1e-12);
    assert_abs_diff_eq!(klog.from_base_number(base, None).unwrap(), 0.002, epsilon = 1e-12);
  }

  #[test]
  fn test_unknown_prefix() {
    let catalog = sample_catalog();
    let err = prefix(&catalog, unit(&catalog, "meter"), 10, 7).unwrap_err();
    assert_eq!(err, CompositionError::UnknownPrefix { base: 10, exponent: 7 });
  }
}
