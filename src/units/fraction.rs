
//! Fractional display units, which write a value as an integer part
//! followed by a common fraction, such as `3 1/7`.

use super::compose::{CompositionError, check_composable};
use super::scalar::Scalar;
use super::transform::{Transform, ConversionError, expect_number};
use super::unit::{Unit, Datatype, Conversion};
use crate::catalog::Catalog;

use num::integer::gcd;
use once_cell::sync::Lazy;
use regex::Regex;

/// Bounds on the denominators a fraction may use. Each family is
/// searched independently, and a bound of zero disables it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FractionBounds {
  /// Any denominator up to this bound.
  pub max_odd: u32,
  /// Even denominators up to this bound.
  pub max_even: u32,
  /// Powers of two up to this bound.
  pub max_pow2: u32,
}

pub const INFINITY_GLYPH: &str = "∞";

static TERM_RE: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"^([-+]?)(\d+(?:\.\d*)?|\.\d+)((?:/(?:\d+(?:\.\d*)?|\.\d+))*)$").unwrap()
});

impl FractionBounds {
  pub fn new(max_odd: u32, max_even: u32, max_pow2: u32) -> Self {
    Self { max_odd, max_even, max_pow2 }
  }

  /// Every candidate denominator, in search order. Always starts
  /// with 1.
  fn denominators(&self) -> impl Iterator<Item = u64> {
    let odd = 2..=u64::from(self.max_odd);
    let even = (2..=u64::from(self.max_even)).step_by(2);
    let max_pow2 = u64::from(self.max_pow2);
    let pow2 = std::iter::successors(Some(2u64), |d| d.checked_mul(2)).take_while(move |d| *d <= max_pow2);
    std::iter::once(1).chain(odd).chain(even).chain(pow2)
  }
}

/// Writes `x` as an integer part and a fraction, choosing the
/// fraction with the least error among the allowed denominators.
/// Negative values carry the sign on each term (`-2 -1/2`), so that
/// the terms always sum to the value.
pub fn format_fraction(x: f64, bounds: FractionBounds) -> String {
  if x.is_nan() {
    return String::new();
  }
  if x.is_infinite() {
    return if x > 0.0 { INFINITY_GLYPH.to_owned() } else { format!("-{INFINITY_GLYPH}") };
  }
  let sign = if x < 0.0 { "-" } else { "" };
  let abs = x.abs();
  let mut integer = abs.floor();
  let remainder = abs - integer;

  let mut best = (remainder.round() as u64, 1u64);
  let mut best_error = (remainder - best.0 as f64).abs();
  for denom in bounds.denominators() {
    let numer = (remainder * denom as f64).round() as u64;
    let error = (remainder - numer as f64 / denom as f64).abs();
    if error < best_error {
      best = (numer, denom);
      best_error = error;
    }
  }

  let (mut numer, mut denom) = best;
  if numer == denom {
    integer += 1.0;
    numer = 0;
  }
  if numer != 0 {
    let g = gcd(numer, denom);
    numer /= g;
    denom /= g;
  }

  let mut terms = Vec::with_capacity(2);
  if integer != 0.0 {
    terms.push(format!("{sign}{integer}"));
  }
  if numer != 0 {
    terms.push(format!("{sign}{numer}/{denom}"));
  }
  if terms.is_empty() {
    return "0".to_owned();
  }
  terms.join(" ")
}

/// Reads text written by [`format_fraction`] (or by hand) back into a
/// number. Terms are separated by whitespace; each term is a signed
/// number optionally divided by further numbers, and the terms are
/// summed. The empty string reads as NaN.
pub fn parse_fraction(text: &str) -> Result<f64, ConversionError> {
  let text = text.trim();
  if text.is_empty() {
    return Ok(f64::NAN);
  }
  match text {
    INFINITY_GLYPH | "+∞" => return Ok(f64::INFINITY),
    "-∞" => return Ok(f64::NEG_INFINITY),
    _ => {}
  }
  let bad = || ConversionError::BadFraction { input: text.to_owned() };
  let mut total = 0.0;
  for term in text.split_whitespace() {
    let caps = TERM_RE.captures(term).ok_or_else(bad)?;
    let mut value: f64 = caps[2].parse().map_err(|_| bad())?;
    for divisor in caps[3].split('/').filter(|s| !s.is_empty()) {
      value /= divisor.parse::<f64>().map_err(|_| bad())?;
    }
    if &caps[1] == "-" {
      value = -value;
    }
    total += value;
  }
  Ok(total)
}

/// A text-datatype unit displaying `unit` as fractions. Reading from
/// text parses the fraction and converts it from `unit`; writing
/// converts into `unit` and formats.
pub fn fractionalize(catalog: &Catalog, unit: &Unit, bounds: FractionBounds) -> Result<Unit, CompositionError> {
  check_composable(catalog, unit)?;
  let reader = unit.clone();
  let writer = unit.clone();
  let transform = Transform::new(
    move |x, dep| {
      let text = x.as_text().ok_or_else(|| ConversionError::wrong_payload("text", x))?;
      reader.to_base(&Scalar::Number(parse_fraction(text)?), dep)
    },
    move |x, dep| {
      let value = expect_number(&writer.from_base(x, dep)?)?;
      Ok(Scalar::Text(format_fraction(value, bounds)))
    },
  );
  Ok(Unit {
    id: None,
    symbol: unit.symbol.clone(),
    name: unit.name.clone(),
    dimension: unit.dimension.clone(),
    datatype: Datatype::Text,
    conversion: Conversion::Functions(transform),
    dependent: None,
  })
}
