
//! First-class function values: built-ins, unit conversions, and
//! their compositions and inverses.

use super::algebra::Algebra;
use super::error::EvalError;
use super::value::Value;
use crate::util::pow_by_squaring;

use std::fmt::{self, Debug, Display, Formatter};
use std::sync::Arc;

pub type Callable = dyn Fn(&Algebra<'_>, &[Value]) -> Result<Value, EvalError> + Send + Sync;

/// A function value. The name is kept as a decomposition into
/// `(base, exponent)` terms so that composed and inverted functions
/// print as `sin∘cos²` or `tan⁻¹` without consulting the closures.
#[derive(Clone)]
pub struct FunctionValue {
  forward: Arc<Callable>,
  inverse: Option<Arc<Callable>>,
  names: Vec<NameTerm>,
  arity: Arity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameTerm {
  pub base: String,
  pub exponent: i64,
}

/// Accepted argument counts. `max` of `None` means variadic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
  pub min: usize,
  pub max: Option<usize>,
}

impl Arity {
  pub const UNARY: Arity = Arity::exactly(1);
  pub const BINARY: Arity = Arity::exactly(2);
  pub const VARIADIC: Arity = Arity { min: 1, max: None };

  pub const fn exactly(n: usize) -> Self {
    Arity { min: n, max: Some(n) }
  }

  pub const fn between(min: usize, max: usize) -> Self {
    Arity { min, max: Some(max) }
  }

  pub fn accepts(self, count: usize) -> bool {
    count >= self.min && self.max.map_or(true, |max| count <= max)
  }
}

impl NameTerm {
  pub fn new(base: impl Into<String>, exponent: i64) -> Self {
    Self { base: base.into(), exponent }
  }
}

impl FunctionValue {
  pub fn new<F>(name: impl Into<String>, arity: Arity, forward: F) -> Self
  where F: Fn(&Algebra<'_>, &[Value]) -> Result<Value, EvalError> + Send + Sync + 'static {
    Self {
      forward: Arc::new(forward),
      inverse: None,
      names: vec![NameTerm::new(name, 1)],
      arity,
    }
  }

  /// A function over already shared callables, so that values built
  /// from the same table entry compare equal with [`Self::ptr_eq`].
  pub fn from_callables(name: impl Into<String>, arity: Arity, forward: Arc<Callable>, inverse: Option<Arc<Callable>>) -> Self {
    Self { forward, inverse, names: vec![NameTerm::new(name, 1)], arity }
  }

  pub fn with_inverse<F>(mut self, inverse: F) -> Self
  where F: Fn(&Algebra<'_>, &[Value]) -> Result<Value, EvalError> + Send + Sync + 'static {
    self.inverse = Some(Arc::new(inverse));
    self
  }

  /// The identity function, printed as `id`. Its decomposition is
  /// empty, so composing with it leaves names unchanged.
  pub fn identity() -> Self {
    Self {
      forward: Arc::new(identity_body),
      inverse: Some(Arc::new(identity_body)),
      names: Vec::new(),
      arity: Arity::UNARY,
    }
  }

  pub fn names(&self) -> &[NameTerm] {
    &self.names
  }

  pub fn arity(&self) -> Arity {
    self.arity
  }

  pub fn is_invertible(&self) -> bool {
    self.inverse.is_some()
  }

  pub fn call(&self, algebra: &Algebra<'_>, args: &[Value]) -> Result<Value, EvalError> {
    if !self.arity.accepts(args.len()) {
      let expected = match self.arity.max {
        Some(max) if max == self.arity.min => max.to_string(),
        Some(max) => format!("{} to {}", self.arity.min, max),
        None => format!("at least {}", self.arity.min),
      };
      return Err(EvalError::Arity { function: self.to_string(), expected, actual: args.len() });
    }
    (self.forward)(algebra, args)
  }

  /// `self ∘ inner`: applies `inner` first, then passes its single
  /// result to `self`, so `self` must accept one argument. The result
  /// is invertible when both operands are.
  pub fn compose(&self, inner: &FunctionValue) -> FunctionValue {
    let (f, g) = (self.clone(), inner.clone());
    let forward = callable(move |algebra, args| {
      let y = g.call(algebra, args)?;
      f.call(algebra, &[y])
    });
    let inverse = match (&self.inverse, &inner.inverse) {
      (Some(f_inv), Some(g_inv)) => {
        let (f_inv, g_inv) = (Arc::clone(f_inv), Arc::clone(g_inv));
        Some(callable(move |algebra, args| {
          let y = f_inv(algebra, args)?;
          g_inv(algebra, &[y])
        }))
      }
      _ => None,
    };
    FunctionValue {
      forward,
      inverse,
      names: merge_names(&self.names, &inner.names),
      arity: inner.arity,
    }
  }

  /// Swaps the two directions and reverses the decomposition with
  /// every exponent negated.
  pub fn invert(&self) -> Result<FunctionValue, EvalError> {
    let Some(inverse) = &self.inverse else {
      return Err(EvalError::domain(self.to_string(), "function has no inverse"));
    };
    let names = self.names.iter()
      .rev()
      .map(|term| NameTerm::new(term.base.clone(), -term.exponent))
      .collect();
    Ok(FunctionValue {
      forward: Arc::clone(inverse),
      inverse: Some(Arc::clone(&self.forward)),
      names,
      arity: Arity::UNARY,
    })
  }

  /// Repeated composition. Negative powers compose the inverse.
  pub fn pow(&self, exponent: i64) -> Result<FunctionValue, EvalError> {
    let base = if exponent < 0 { self.invert()? } else { self.clone() };
    pow_by_squaring(base, exponent.unsigned_abs(), FunctionValue::identity(), |a, b| Ok(a.compose(b)))
  }

  /// Whether both values share the same forward callable.
  pub fn ptr_eq(&self, other: &FunctionValue) -> bool {
    Arc::ptr_eq(&self.forward, &other.forward)
  }
}

pub(crate) fn callable<F>(f: F) -> Arc<Callable>
where F: Fn(&Algebra<'_>, &[Value]) -> Result<Value, EvalError> + Send + Sync + 'static {
  Arc::new(f)
}

fn identity_body(_: &Algebra<'_>, args: &[Value]) -> Result<Value, EvalError> {
  Ok(args[0].clone())
}

fn merge_names(outer: &[NameTerm], inner: &[NameTerm]) -> Vec<NameTerm> {
  let mut names = outer.to_vec();
  for term in inner {
    match names.last_mut() {
      Some(last) if last.base == term.base && last.exponent.signum() == term.exponent.signum() => {
        last.exponent += term.exponent;
      }
      _ => names.push(term.clone()),
    }
  }
  names
}

fn superscript(n: i64) -> String {
  const DIGITS: [char; 10] = ['⁰', '¹', '²', '³', '⁴', '⁵', '⁶', '⁷', '⁸', '⁹'];
  let mut result = String::new();
  if n < 0 {
    result.push('⁻');
  }
  for ch in n.unsigned_abs().to_string().chars() {
    // to_string only yields ASCII digits here.
    let digit = ch.to_digit(10).unwrap_or_default() as usize;
    result.push(DIGITS[digit]);
  }
  result
}

impl Display for FunctionValue {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    if self.names.is_empty() {
      return write!(f, "id");
    }
    for (i, term) in self.names.iter().enumerate() {
      if i > 0 {
        write!(f, "∘")?;
      }
      write!(f, "{}", term.base)?;
      if term.exponent != 1 {
        write!(f, "{}", superscript(term.exponent))?;
      }
    }
    Ok(())
  }
}

impl Debug for FunctionValue {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "FunctionValue {{ name: {:?}, arity: {:?}, invertible: {} }}", self.to_string(), self.arity, self.is_invertible())
  }
}
