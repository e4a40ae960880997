
//! Parser for unit expressions such as `km/h`, `m_3^2` or `ft,in%16`.
//!
//! From tightest to loosest binding:
//!
//! * `name` or `( ... )`: catalog unit or grouping.
//! * `u_n` prefixes `u` by 10^n; `u.n` and `u:n` prefix by 2^n.
//! * `u^x` raises to a power.
//! * `u*v`, then `u/v`, multiply and divide.
//! * `u%a,b,c` displays as fractions, with denominator bounds for
//!   the odd, even and power-of-two families.
//! * `u,v` composes hierarchically, most significant first.

use crate::catalog::Catalog;
use crate::parsing::tokenizer::TokenizerState;
use crate::units::compose::{self, CompositionError};
use crate::units::fraction::{fractionalize, FractionBounds};
use crate::units::hierarchy::hierarchical;
use crate::units::unit::Unit;

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum UnitExprError {
  #[error("Syntax error in unit expression at '{remainder}'")]
  Syntax { remainder: String },
  #[error("Cannot compose {units}: {source}")]
  Composition { units: String, #[source] source: CompositionError },
}

static IDENT_RE: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"^[^\s\d()*/^%,_.:+\-][^\s()*/^%,_.:]*").unwrap()
});
static NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"^[-+]?(?:\d+(?:\.\d*)?|\.\d+)").unwrap()
});
static INT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-+]?\d+").unwrap());

/// Parses a unit expression against the units of `catalog`.
pub fn parse_unit_expression(text: &str, catalog: &Catalog) -> Result<Unit, UnitExprError> {
  let mut parser = UnitExprParser { state: TokenizerState::new(text), catalog };
  let unit = parser.hier()?;
  parser.state.consume_spaces();
  if !parser.state.is_eof() {
    return Err(parser.syntax_error());
  }
  Ok(unit)
}

struct UnitExprParser<'a, 'c> {
  state: TokenizerState<'a>,
  catalog: &'c Catalog,
}

impl<'a, 'c> UnitExprParser<'a, 'c> {
  fn syntax_error(&self) -> UnitExprError {
    let remainder = self.state.remaining();
    UnitExprError::Syntax {
      remainder: if remainder.is_empty() { "end of input".to_owned() } else { remainder.to_owned() },
    }
  }

  fn composition_error(&self, units: &[&Unit], source: CompositionError) -> UnitExprError {
    let lang = self.catalog.language();
    UnitExprError::Composition {
      units: units.iter().map(|u| format!("`{}`", u.display_name(lang))).join(", "),
      source,
    }
  }

  fn literal(&mut self, lit: &str) -> bool {
    self.state.consume_spaces();
    self.state.read_literal(lit).is_some()
  }

  fn number(&mut self) -> Result<f64, UnitExprError> {
    self.state.consume_spaces();
    self.state.read_regex(&NUMBER_RE)
      .and_then(|m| m.as_str().parse().ok())
      .ok_or_else(|| self.syntax_error())
  }

  fn int(&mut self) -> Result<i64, UnitExprError> {
    self.state.consume_spaces();
    self.state.read_regex(&INT_RE)
      .and_then(|m| m.as_str().parse().ok())
      .ok_or_else(|| self.syntax_error())
  }

  /// An optional `, int` continuation of a fraction's bounds. Leaves
  /// the input untouched if the comma introduces something else.
  fn optional_bound(&mut self) -> Result<Option<u32>, UnitExprError> {
    let start = self.state.current_pos();
    if !self.literal(",") {
      return Ok(None);
    }
    self.state.consume_spaces();
    if !INT_RE.is_match(self.state.remaining()) {
      self.state.seek(start);
      return Ok(None);
    }
    self.bound().map(Some)
  }

  fn bound(&mut self) -> Result<u32, UnitExprError> {
    let n = self.int()?;
    u32::try_from(n).map_err(|_| self.syntax_error())
  }

  fn hier(&mut self) -> Result<Unit, UnitExprError> {
    let mut units = vec![self.frac()?];
    while self.literal(",") {
      units.push(self.frac()?);
    }
    if units.len() == 1 {
      return Ok(units.swap_remove(0));
    }
    let refs: Vec<&Unit> = units.iter().collect();
    hierarchical(self.catalog, &refs).map_err(|err| self.composition_error(&refs, err))
  }

  fn frac(&mut self) -> Result<Unit, UnitExprError> {
    let unit = self.div()?;
    if !self.literal("%") {
      return Ok(unit);
    }
    let max_odd = self.bound()?;
    let max_even = self.optional_bound()?;
    let max_pow2 = match max_even {
      Some(_) => self.optional_bound()?,
      None => None,
    };
    let bounds = FractionBounds::new(max_odd, max_even.unwrap_or(0), max_pow2.unwrap_or(0));
    fractionalize(self.catalog, &unit, bounds).map_err(|err| self.composition_error(&[&unit], err))
  }

  fn div(&mut self) -> Result<Unit, UnitExprError> {
    let mut units = vec![self.mul()?];
    while self.literal("/") {
      units.push(self.mul()?);
    }
    if units.len() == 1 {
      return Ok(units.swap_remove(0));
    }
    let refs: Vec<&Unit> = units.iter().collect();
    compose::divide(self.catalog, &refs).map_err(|err| self.composition_error(&refs, err))
  }

  fn mul(&mut self) -> Result<Unit, UnitExprError> {
    let mut units = vec![self.pow()?];
    while self.literal("*") {
      units.push(self.pow()?);
    }
    if units.len() == 1 {
      return Ok(units.swap_remove(0));
    }
    let refs: Vec<&Unit> = units.iter().collect();
    compose::multiply(self.catalog, &refs).map_err(|err| self.composition_error(&refs, err))
  }

  fn pow(&mut self) -> Result<Unit, UnitExprError> {
    let unit = self.exp()?;
    if !self.literal("^") {
      return Ok(unit);
    }
    let exponent = self.number()?;
    compose::power(self.catalog, &unit, exponent).map_err(|err| self.composition_error(&[&unit], err))
  }

  fn exp(&mut self) -> Result<Unit, UnitExprError> {
    let unit = self.atom()?;
    let base = if self.literal("_") {
      10
    } else if self.literal(".") || self.literal(":") {
      2
    } else {
      return Ok(unit);
    };
    let exponent = self.int()?;
    let exponent = i32::try_from(exponent).map_err(|_| self.syntax_error())?;
    compose::prefix(self.catalog, &unit, base, exponent).map_err(|err| self.composition_error(&[&unit], err))
  }

  fn atom(&mut self) -> Result<Unit, UnitExprError> {
    if self.literal("(") {
      let unit = self.hier()?;
      if !self.literal(")") {
        return Err(self.syntax_error());
      }
      return Ok(unit);
    }
    self.state.consume_spaces();
    let start = self.state.current_pos();
    let Some(m) = self.state.read_regex(&IDENT_RE) else {
      return Err(self.syntax_error());
    };
    match self.catalog.unit(m.as_str()) {
      Some(unit) => Ok(unit.clone()),
      None => {
        self.state.seek(start);
        Err(self.syntax_error())
      }
    }
  }
}
