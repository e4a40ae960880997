
//! A small built-in catalog, used by the command line driver and by
//! the tests.

use super::{Catalog, CatalogEntry, DimensionInfo, DegreeDescriptor, PrefixDescriptor, Joiner, Joiners};
use super::language::{LangString, Plural};
use super::search::SearchKind;
use crate::units::dimension::Dimension;
use crate::units::scalar::Scalar;
use crate::units::transform::{Transform, ConversionError, expect_number};
use crate::units::unit::{Unit, Datatype};

use num::rational::Rational64;

use std::f64::consts::PI;

/// Speed of sound in dry air per square root of kelvin, in meters per
/// second.
const SOUND_SPEED_FACTOR: f64 = 20.0468;

const RESISTOR_COLORS: [&str; 10] = [
  "black", "brown", "red", "orange", "yellow", "green", "blue", "violet", "grey", "white",
];

pub fn default_catalog() -> Catalog {
  let mut catalog = Catalog::new().with_joiners(default_joiners());
  add_dimensions(&mut catalog);
  add_prefixes(&mut catalog);
  add_degrees(&mut catalog);
  add_units(&mut catalog);
  add_entries(&mut catalog);
  catalog
}

pub fn default_joiners() -> Joiners {
  Joiners {
    product: Joiner {
      symbol: LangString::plain("·"),
      name: LangString::plain(" ").with("fr", Plural::Other, "-"),
      order: LangString::new(),
    },
    quotient: Joiner {
      symbol: LangString::plain("/"),
      name: LangString::plain(" per ").with("fr", Plural::Other, " par "),
      order: LangString::new(),
    },
    hierarchical: Joiner {
      symbol: LangString::plain(" "),
      name: LangString::plain(" and ").with("fr", Plural::Other, " et "),
      order: LangString::new(),
    },
  }
}

fn dim(key: &str) -> Dimension {
  Dimension::singleton(key)
}

fn dim_pow(key: &str, exponent: i64) -> Dimension {
  dim(key).pow(Rational64::from_integer(exponent))
}

fn add_dimensions(catalog: &mut Catalog) {
  let dimensions = [
    ("length", true),
    ("mass", true),
    ("time", true),
    ("temperature", true),
    ("current", true),
    ("luminous_intensity", true),
    ("amount", true),
    ("angle", true),
    ("information", true),
    ("currency", false),
  ];
  for (key, composable) in dimensions {
    let name = LangString::plain(key.replace('_', " "));
    catalog.add_dimension(key, DimensionInfo { composable, name });
  }
}

fn add_prefixes(catalog: &mut Catalog) {
  let si = [
    ("Q", "quetta", 30), ("R", "ronna", 27), ("Y", "yotta", 24), ("Z", "zetta", 21),
    ("E", "exa", 18), ("P", "peta", 15), ("T", "tera", 12), ("G", "giga", 9),
    ("M", "mega", 6), ("k", "kilo", 3), ("h", "hecto", 2), ("da", "deca", 1),
    ("d", "deci", -1), ("c", "centi", -2), ("m", "milli", -3), ("μ", "micro", -6),
    ("n", "nano", -9), ("p", "pico", -12), ("f", "femto", -15), ("a", "atto", -18),
    ("z", "zepto", -21), ("y", "yocto", -24), ("r", "ronto", -27), ("q", "quecto", -30),
  ];
  for (symbol, name, exponent) in si {
    let descriptor = PrefixDescriptor { symbol: symbol.to_owned(), name: LangString::plain(format!("{name}{{0}}")) };
    catalog.add_prefix(10, exponent, descriptor);
  }
  let binary = [
    ("Ki", "kibi", 10), ("Mi", "mebi", 20), ("Gi", "gibi", 30),
    ("Ti", "tebi", 40), ("Pi", "pebi", 50), ("Ei", "exbi", 60),
  ];
  for (symbol, name, exponent) in binary {
    let descriptor = PrefixDescriptor { symbol: symbol.to_owned(), name: LangString::plain(format!("{name}{{0}}")) };
    catalog.add_prefix(2, exponent, descriptor);
  }
}

fn add_degrees(catalog: &mut Catalog) {
  let degrees = [
    (Rational64::from_integer(-3), "⁻³", "per cubic {0}"),
    (Rational64::from_integer(-2), "⁻²", "per square {0}"),
    (Rational64::from_integer(-1), "⁻¹", "per {0}"),
    (Rational64::from_integer(2), "²", "square {0}"),
    (Rational64::from_integer(3), "³", "cubic {0}"),
    (Rational64::from_integer(4), "⁴", "{0} to the fourth"),
    (Rational64::new(1, 2), "^½", "square root of {0}"),
    (Rational64::new(1, 3), "^⅓", "cube root of {0}"),
  ];
  for (exponent, symbol, name) in degrees {
    catalog.add_degree(exponent, DegreeDescriptor { symbol: symbol.to_owned(), name: LangString::plain(name) });
  }
}

fn named(dimension: Dimension, symbol: &str, one: &str, other: &str) -> Unit {
  Unit::new(dimension).with_symbol(symbol).with_name(LangString::english(one, other))
}

fn add_units(catalog: &mut Catalog) {
  let length = || dim("length");
  let time = || dim("time");
  let mass = || dim("mass");
  let speed = || dim("length") / dim("time");

  let units = vec![
    // Length units
    ("meter", named(length(), "m", "meter", "meters")
      .with_name(LangString::english("meter", "meters").with("fr", Plural::One, "mètre").with("fr", Plural::Other, "mètres"))),
    ("inch", named(length(), "in", "inch", "inches").with_ratio(254.0, 10_000.0)),
    ("foot", named(length(), "ft", "foot", "feet").with_ratio(3_048.0, 10_000.0)),
    ("yard", named(length(), "yd", "yard", "yards").with_ratio(9_144.0, 10_000.0)),
    ("mile", named(length(), "mi", "mile", "miles").with_ratio(1_609_344.0, 1_000.0)),
    ("nautical_mile", named(length(), "nmi", "nautical mile", "nautical miles").with_ratio(1_852.0, 1.0)),
    ("astronomical_unit", named(length(), "au", "astronomical unit", "astronomical units").with_ratio(149_597_870_700.0, 1.0)),
    // Time units
    ("second", named(time(), "s", "second", "seconds")
      .with_name(LangString::english("second", "seconds").with("fr", Plural::One, "seconde").with("fr", Plural::Other, "secondes"))),
    ("minute", named(time(), "min", "minute", "minutes").with_ratio(60.0, 1.0)),
    ("hour", named(time(), "hr", "hour", "hours").with_ratio(3_600.0, 1.0)),
    ("day", named(time(), "d", "day", "days").with_ratio(86_400.0, 1.0)),
    ("week", named(time(), "wk", "week", "weeks").with_ratio(604_800.0, 1.0)),
    ("year", named(time(), "yr", "year", "years").with_ratio(31_557_600.0, 1.0)),
    // Mass units
    ("gram", named(mass(), "g", "gram", "grams")),
    ("pound", named(mass(), "lb", "pound", "pounds").with_ratio(45_359_237.0, 100_000.0)),
    ("ounce", named(mass(), "oz", "ounce", "ounces").with_ratio(45_359_237.0, 1_600_000.0)),
    ("tonne", named(mass(), "t", "tonne", "tonnes").with_ratio(1_000_000.0, 1.0)),
    // Angle units
    ("radian", named(dim("angle"), "rad", "radian", "radians")),
    ("degree", named(dim("angle"), "°", "degree", "degrees").with_ratio(PI, 180.0)),
    ("turn", named(dim("angle"), "tr", "turn", "turns").with_ratio(2.0 * PI, 1.0)),
    // Information units
    ("bit", named(dim("information"), "bit", "bit", "bits")),
    ("byte", named(dim("information"), "B", "byte", "bytes").with_ratio(8.0, 1.0)),
    // Derived units
    ("hertz", named(dim_pow("time", -1), "Hz", "hertz", "hertz")),
    ("liter", named(dim_pow("length", 3), "L", "liter", "liters").with_ratio(1.0, 1_000.0)),
    ("knot", named(speed(), "kn", "knot", "knots").with_ratio(463.0, 900.0)),
    ("newton", named(Dimension::multiply([&mass(), &speed(), &dim_pow("time", -1)]), "N", "newton", "newtons").with_ratio(1_000.0, 1.0)),
    ("joule", named(Dimension::multiply([&mass(), &speed(), &speed()]), "J", "joule", "joules").with_ratio(1_000.0, 1.0)),
    ("ohm", named(resistance(), "Ω", "ohm", "ohms").with_ratio(1_000.0, 1.0)),
    // Currency units
    ("dollar", named(dim("currency"), "$", "dollar", "dollars")),
    ("euro", named(dim("currency"), "€", "euro", "euros").with_ratio(108.0, 100.0)),
    ("pound_sterling", named(dim("currency"), "£", "pound", "pounds").with_ratio(127.0, 100.0)),
  ];
  for (key, unit) in units {
    catalog.add_unit(key, unit);
  }

  // Temperature units
  catalog.add_unit("kelvin", named(dim("temperature"), "K", "kelvin", "kelvins"));
  let celsius = catalog.instructions("+273.15");
  catalog.add_unit("celsius", named(dim("temperature"), "°C", "degree Celsius", "degrees Celsius").with_instructions(celsius));
  let fahrenheit = catalog.instructions("-32 *5 /9 +273.15");
  catalog.add_unit("fahrenheit", named(dim("temperature"), "°F", "degree Fahrenheit", "degrees Fahrenheit").with_instructions(fahrenheit));
  let rankine = catalog.instructions("*5 /9");
  catalog.add_unit("rankine", named(dim("temperature"), "°R", "degree Rankine", "degrees Rankine").with_instructions(rankine));

  catalog.add_unit("mach", mach());
  catalog.add_unit("resistor_code", resistor_code());
}

fn resistance() -> Dimension {
  Dimension::multiply([
    &dim("mass"),
    &dim_pow("length", 2),
    &dim_pow("time", -3),
    &dim_pow("current", -2),
  ])
}

/// Mach number, which depends on the air temperature.
fn mach() -> Unit {
  let speed_of_sound = |dep: Option<&Scalar>| -> Result<f64, ConversionError> {
    let kelvin = expect_number(dep.ok_or(ConversionError::MissingIndependentVariable)?)?;
    Ok(SOUND_SPEED_FACTOR * kelvin.sqrt())
  };
  let transform = Transform::new(
    move |x, dep| Ok(Scalar::Number(expect_number(x)? * speed_of_sound(dep)?)),
    move |x, dep| Ok(Scalar::Number(expect_number(x)? / speed_of_sound(dep)?)),
  );
  named(dim("length") / dim("time"), "Ma", "mach", "mach")
    .with_transform(transform)
    .with_dependent(dim("temperature"), LangString::plain("temperature"))
}

/// Resistor color bands: two digit bands and a multiplier band, such
/// as `brown black red` for 1000 ohms.
fn resistor_code() -> Unit {
  let transform = Transform::new(
    |x, _| {
      let text = x.as_text().ok_or_else(|| ConversionError::wrong_payload("text", x))?;
      read_color_code(text).map(Scalar::Number)
    },
    |x, _| write_color_code(expect_number(x)? / 1_000.0).map(Scalar::Text),
  );
  Unit::new(resistance())
    .with_name(LangString::english("resistor color code", "resistor color codes"))
    .with_datatype(Datatype::ColorCode)
    .with_transform(transform)
}

fn color_value(color: &str) -> Option<i32> {
  match color {
    "gold" => Some(-1),
    "silver" => Some(-2),
    _ => RESISTOR_COLORS.iter().position(|c| *c == color).map(|i| i as i32),
  }
}

/// Reads color bands into a base value (gram-based, so ohms times
/// 1000).
fn read_color_code(text: &str) -> Result<f64, ConversionError> {
  let bad = || ConversionError::Custom(format!("Invalid resistor color code '{text}'"));
  let bands: Vec<i32> = text.split_whitespace()
    .map(|band| color_value(&band.to_lowercase()))
    .collect::<Option<_>>()
    .ok_or_else(bad)?;
  let Some((multiplier, digits)) = bands.split_last() else {
    return Err(bad());
  };
  if digits.is_empty() || digits.iter().any(|d| *d < 0) {
    return Err(bad());
  }
  let significand = digits.iter().fold(0.0, |acc, d| acc * 10.0 + f64::from(*d));
  Ok(significand * 10f64.powi(*multiplier) * 1_000.0)
}

fn write_color_code(ohms: f64) -> Result<String, ConversionError> {
  if !ohms.is_finite() || ohms <= 0.0 {
    return Err(ConversionError::Custom(format!("No resistor color code for {ohms} ohms")));
  }
  let mut exponent = ohms.log10().floor() as i32 - 1;
  let mut significand = (ohms / 10f64.powi(exponent)).round();
  if significand >= 100.0 {
    significand /= 10.0;
    exponent += 1;
  }
  let multiplier = match exponent {
    -2 => "silver",
    -1 => "gold",
    0..=9 => RESISTOR_COLORS[exponent as usize],
    _ => return Err(ConversionError::Custom(format!("No resistor color code for {ohms} ohms"))),
  };
  let tens = RESISTOR_COLORS[(significand / 10.0).floor() as usize % 10];
  let ones = RESISTOR_COLORS[significand as usize % 10];
  Ok(format!("{tens} {ones} {multiplier}"))
}

fn add_entries(catalog: &mut Catalog) {
  let unit_types = [
    ("length", "Length"), ("mass", "Mass"), ("time", "Time"),
    ("temperature", "Temperature"), ("speed", "Speed"), ("angle", "Angle"),
  ];
  for (key, name) in unit_types {
    catalog.add_entry(SearchKind::UnitType, key, CatalogEntry::new(LangString::plain(name)));
  }

  let functions = [("sqrt", "square root"), ("ln", "natural logarithm"), ("abs", "absolute value")];
  for (key, name) in functions {
    catalog.add_entry(SearchKind::Function, key, CatalogEntry::new(LangString::plain(name)));
  }

  let elements = [("hydrogen", "H"), ("helium", "He"), ("carbon", "C"), ("oxygen", "O")];
  for (key, symbol) in elements {
    let name = LangString::plain(format!("{}{}", key[..1].to_uppercase(), &key[1..]));
    catalog.add_entry(SearchKind::Element, key, CatalogEntry::new(name).with_symbol(symbol));
  }

  catalog.add_entry(SearchKind::Include, "constants", CatalogEntry::new(LangString::plain("physical constants")));
  catalog.add_entry(SearchKind::Solver, "ideal_gas", CatalogEntry::new(LangString::plain("ideal gas law")));
  catalog.add_entry(SearchKind::Solver, "ohms_law", CatalogEntry::new(LangString::plain("Ohm's law")));
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::search::SearchHit;
  use crate::units::parsing::parse_unit_expression;

  use approx::assert_abs_diff_eq;

  #[test]
  fn test_temperature_units() {
    let catalog = default_catalog();
    let fahrenheit = catalog.unit("fahrenheit").unwrap();
    let celsius = catalog.unit("celsius").unwrap();
    let base = fahrenheit.to_base_number(212.0, None).unwrap();
    assert_abs_diff_eq!(celsius.from_base_number(base, None).unwrap(), 100.0, epsilon = 1e-9);
    assert!(celsius.ratio().is_none());
    assert_abs_diff_eq!(catalog.unit("rankine").unwrap().ratio().unwrap().value(), 5.0 / 9.0);
  }

  #[test]
  fn test_degree_to_radian() {
    let catalog = default_catalog();
    let degree = catalog.unit("degree").unwrap();
    assert_abs_diff_eq!(degree.to_base_number(5.0, None).unwrap(), 0.08726646, epsilon = 1e-8);
  }

  #[test]
  fn test_mach_needs_temperature() {
    let catalog = default_catalog();
    let mach = catalog.unit("mach").unwrap();
    assert!(mach.is_dependent());
    assert_eq!(mach.to_base_number(1.0, None), Err(ConversionError::MissingIndependentVariable));
    let speed = mach.to_base_number(1.0, Some(288.15)).unwrap();
    assert_abs_diff_eq!(speed, 340.3, epsilon = 0.1);
  }

  #[test]
  fn test_resistor_code() {
    let catalog = default_catalog();
    let code = catalog.unit("resistor_code").unwrap();
    let base = code.to_base(&Scalar::from("brown black red"), None).unwrap().as_number().unwrap();
    assert_abs_diff_eq!(base, 1_000.0 * 1_000.0);
    assert_eq!(code.from_base(&Scalar::Number(4_700.0 * 1_000.0), None).unwrap(), Scalar::from("yellow violet red"));
    assert_eq!(code.from_base(&Scalar::Number(10.0 * 1_000.0), None).unwrap(), Scalar::from("brown black black"));
    assert!(code.to_base(&Scalar::from("mauve black red"), None).is_err());
  }

  #[test]
  fn test_currency_is_not_composable() {
    let catalog = default_catalog();
    assert!(parse_unit_expression("dollar/hour", &catalog).is_err());
    assert!(parse_unit_expression("meter/second", &catalog).is_ok());
  }

  #[test]
  fn test_pound_is_ambiguous() {
    let catalog = default_catalog();
    let mut hits = catalog.search("pound");
    hits.sort();
    assert_eq!(hits, vec![
      SearchHit::new(SearchKind::Unit, "pound"),
      SearchHit::new(SearchKind::Unit, "pound_sterling"),
    ]);
  }

  #[test]
  fn test_french_names() {
    let catalog = default_catalog().with_language("fr");
    let unit = parse_unit_expression("meter/second", &catalog).unwrap();
    assert_eq!(unit.name_in("fr", Plural::Other).as_deref(), Some("mètres par seconde"));
  }
}
