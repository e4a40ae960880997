
use num::{Zero, One};
use num::rational::Rational64;
use itertools::Itertools;

use std::collections::BTreeMap;
use std::fmt::{self, Formatter, Display};
use std::ops::{Mul, Div};

/// A dimension is a formal product and quotient of zero or more base
/// dimensions, each raised to a rational power. Base dimensions are
/// identified by the catalog's string keys ("length", "time",
/// "currency", ...).
///
/// Entries with exponent zero are never stored, so two dimensions are
/// equal exactly when their maps are equal. The empty dimension is
/// "dimensionless".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Dimension {
  exponents: BTreeMap<String, Rational64>,
}

impl Dimension {
  /// The dimensionless dimension.
  pub fn one() -> Self {
    Self::default()
  }

  pub fn singleton(base: impl Into<String>) -> Self {
    Self::from_components([(base.into(), Rational64::one())])
  }

  /// Builds a dimension from `(base, exponent)` pairs. Repeated bases
  /// have their exponents summed, and zero results are dropped.
  pub fn from_components<S, I>(components: I) -> Self
  where S: Into<String>,
        I: IntoIterator<Item = (S, Rational64)> {
    let mut exponents = BTreeMap::new();
    for (base, exponent) in components {
      let base = base.into();
      let entry = exponents.entry(base).or_insert_with(Rational64::zero);
      *entry += exponent;
    }
    exponents.retain(|_, exponent| !exponent.is_zero());
    Self { exponents }
  }

  pub fn get(&self, base: &str) -> Rational64 {
    self.exponents.get(base).copied().unwrap_or_else(Rational64::zero)
  }

  /// The base dimensions with nonzero exponent, in key order.
  pub fn components(&self) -> impl Iterator<Item = (&str, Rational64)> + '_ {
    self.exponents.iter().map(|(base, exponent)| (base.as_str(), *exponent))
  }

  pub fn bases(&self) -> impl Iterator<Item = &str> + '_ {
    self.exponents.keys().map(String::as_str)
  }

  /// True iff the dimension has no nonzero entries.
  pub fn is_empty(&self) -> bool {
    self.exponents.is_empty()
  }

  /// Sums the exponents of all of the inputs.
  pub fn multiply<'a>(dims: impl IntoIterator<Item = &'a Dimension>) -> Dimension {
    Dimension::from_components(
      dims.into_iter().flat_map(|d| d.exponents.iter().map(|(k, v)| (k.clone(), *v))),
    )
  }

  /// Subtracts the exponents of every dimension in `rest` from
  /// `first`.
  pub fn divide<'a>(first: &Dimension, rest: impl IntoIterator<Item = &'a Dimension>) -> Dimension {
    let negated = rest.into_iter().flat_map(|d| d.exponents.iter().map(|(k, v)| (k.clone(), -*v)));
    Dimension::from_components(
      first.exponents.iter().map(|(k, v)| (k.clone(), *v)).chain(negated),
    )
  }

  /// Scales every exponent by `exponent`. A zero exponent yields the
  /// dimensionless dimension.
  pub fn pow(&self, exponent: Rational64) -> Dimension {
    Dimension::from_components(
      self.exponents.iter().map(|(k, v)| (k.clone(), *v * exponent)),
    )
  }

  /// Dimensional equality, defined as the quotient being empty.
  pub fn eq_dim(&self, other: &Dimension) -> bool {
    Dimension::divide(self, [other]).is_empty()
  }

  /// Two dimensions are complementary if their product is
  /// dimensionless, as with frequency and period.
  pub fn complementary(&self, other: &Dimension) -> bool {
    Dimension::multiply([self, other]).is_empty()
  }
}

impl Mul for Dimension {
  type Output = Dimension;

  fn mul(self, other: Dimension) -> Dimension {
    Dimension::multiply([&self, &other])
  }
}

impl Mul<&Dimension> for &Dimension {
  type Output = Dimension;

  fn mul(self, other: &Dimension) -> Dimension {
    Dimension::multiply([self, other])
  }
}

impl Div for Dimension {
  type Output = Dimension;

  fn div(self, other: Dimension) -> Dimension {
    Dimension::divide(&self, [&other])
  }
}

impl Div<&Dimension> for &Dimension {
  type Output = Dimension;

  fn div(self, other: &Dimension) -> Dimension {
    Dimension::divide(self, [other])
  }
}

impl Display for Dimension {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    if self.is_empty() {
      return write!(f, "1");
    }
    let text = self.exponents.iter()
      .map(|(base, exponent)| {
        if exponent.is_one() {
          base.to_owned()
        } else if exponent.is_integer() {
          format!("{base}^{}", exponent.numer())
        } else {
          format!("{base}^({}/{})", exponent.numer(), exponent.denom())
        }
      })
      .join(" ");
    write!(f, "{text}")
  }
}
