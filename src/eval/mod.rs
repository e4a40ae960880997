
//! Tree-walking evaluation of parsed expressions.

pub mod algebra;
pub mod builtins;
pub mod error;
pub mod function;
pub mod matrix;
pub mod value;

pub use algebra::Algebra;
pub use error::EvalError;
pub use function::{Arity, FunctionValue};
pub use value::{CatalogRef, Value, ValueUnit};

use crate::catalog::Catalog;
use crate::catalog::language::Plural;
use crate::catalog::search::{SearchHit, SearchKind};
use crate::config::DisambiguationRule;
use crate::expr::{BinaryOp, Expr};

use std::collections::{HashMap, HashSet};

/// Variable bindings of one session. Owned by the session and passed
/// explicitly through every evaluation.
#[derive(Debug, Clone, Default)]
pub struct Context {
  variables: HashMap<String, Value>,
  /// Terms whose disambiguation has already been reported.
  noted: HashSet<String>,
}

/// Evaluates expressions against one catalog.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
  algebra: Algebra<'a>,
  rules: &'a [DisambiguationRule],
}

impl Context {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, name: &str) -> Option<&Value> {
    self.variables.get(name)
  }

  pub fn set(&mut self, name: impl Into<String>, value: Value) {
    self.variables.insert(name.into(), value);
  }

  pub fn is_empty(&self) -> bool {
    self.variables.is_empty()
  }

  /// Records that `term` was disambiguated. Returns `true` the first
  /// time only.
  fn note(&mut self, term: &str) -> bool {
    self.noted.insert(term.to_owned())
  }
}

impl<'a> Evaluator<'a> {
  pub fn new(catalog: &'a Catalog) -> Self {
    Self { algebra: Algebra::new(catalog), rules: &[] }
  }

  pub fn with_disambiguation(mut self, rules: &'a [DisambiguationRule]) -> Self {
    self.rules = rules;
    self
  }

  pub fn algebra(&self) -> &Algebra<'a> {
    &self.algebra
  }

  pub fn evaluate(&self, expr: &Expr, ctx: &mut Context) -> Result<Value, EvalError> {
    match expr {
      Expr::Number(x) => Ok(Value::Number(*x)),
      Expr::String(s) => Ok(Value::String(s.clone())),
      Expr::Boolean(b) => Ok(Value::Boolean(*b)),
      Expr::Ident(name) => self.resolve(name, ctx),
      Expr::List(rows) => match rows.as_slice() {
        [] => Ok(Value::Array(Vec::new())),
        [row] => self.evaluate_all(row, ctx).map(Value::Array),
        rows => rows.iter()
          .map(|row| self.evaluate_all(row, ctx).map(Value::Array))
          .collect::<Result<_, _>>()
          .map(Value::Array),
      },
      Expr::Sequence(elems) => self.evaluate_all(elems, ctx).map(Value::Array),
      Expr::Unary { op, arg } => {
        let arg = self.evaluate(arg, ctx)?;
        self.algebra.unary(*op, &arg)
      }
      Expr::Binary { op: BinaryOp::Convert, left, right } => self.convert(left, right, ctx),
      Expr::Binary { op, left, right } => {
        let left = self.evaluate(left, ctx)?;
        let right = self.evaluate(right, ctx)?;
        self.algebra.binary(*op, &left, &right)
      }
      Expr::Juxtapose(left, right) => self.juxtapose(left, right, ctx),
      Expr::Assign { name, value } => {
        let value = self.evaluate(value, ctx)?;
        tracing::debug!(name = %name, "assigning variable");
        ctx.set(name.clone(), value.clone());
        Ok(value)
      }
    }
  }

  fn evaluate_all(&self, exprs: &[Expr], ctx: &mut Context) -> Result<Vec<Value>, EvalError> {
    exprs.iter().map(|e| self.evaluate(e, ctx)).collect()
  }

  /// `a => u` and `a => u @ v`, where `v` binds the independent
  /// variable of the target unit.
  fn convert(&self, left: &Expr, right: &Expr, ctx: &mut Context) -> Result<Value, EvalError> {
    let value = self.evaluate(left, ctx)?;
    if let Expr::Binary { op: BinaryOp::At, left: target, right: binding } = right {
      let target = self.evaluate(target, ctx)?;
      let binding = self.evaluate(binding, ctx)?;
      return match &target {
        Value::Unit(unit) => self.algebra.convert(&value, unit, Some(&binding)),
        _ => {
          let target = self.algebra.binary(BinaryOp::At, &target, &binding)?;
          self.algebra.binary(BinaryOp::Convert, &value, &target)
        }
      };
    }
    let target = self.evaluate(right, ctx)?;
    self.algebra.binary(BinaryOp::Convert, &value, &target)
  }

  /// Function application when the left-hand side is a function,
  /// multiplication otherwise. A function applied to a function
  /// composes the two.
  fn juxtapose(&self, left: &Expr, right: &Expr, ctx: &mut Context) -> Result<Value, EvalError> {
    let left = self.evaluate(left, ctx)?;
    let Value::Function(f) = &left else {
      let right = self.evaluate(right, ctx)?;
      return self.algebra.mul(&left, &right);
    };
    let args = match right {
      Expr::Sequence(elems) => self.evaluate_all(elems, ctx)?,
      other => match self.evaluate(other, ctx)? {
        Value::Function(g) => return Ok(Value::Function(f.compose(&g))),
        arg => vec![arg],
      },
    };
    tracing::debug!(function = %f, arity = args.len(), "calling function");
    f.call(&self.algebra, &args)
  }

  /// Resolves an identifier: variables first, then built-in functions,
  /// then the catalog.
  pub fn resolve(&self, name: &str, ctx: &mut Context) -> Result<Value, EvalError> {
    if let Some(value) = ctx.get(name) {
      tracing::debug!(term = %name, "resolved from context");
      return Ok(value.clone());
    }
    if let Some(function) = builtins::lookup(name) {
      tracing::debug!(term = %name, "resolved to built-in function");
      return Ok(Value::Function(function));
    }
    let hits = self.algebra.catalog().search(name);
    match hits.as_slice() {
      [] => Err(EvalError::UnknownIdentifier(name.to_owned())),
      [hit] => {
        tracing::debug!(term = %name, kind = hit.kind.name(), key = %hit.key, "resolved from catalog");
        self.catalog_value(name, hit)
      }
      _ => {
        let hit = self.disambiguate(name, &hits).ok_or_else(|| {
          EvalError::Ambiguous { term: name.to_owned(), count: hits.len() }
        })?;
        if ctx.note(name) {
          tracing::info!(term = %name, kind = hit.kind.name(), key = %hit.key, "ambiguous term resolved by configuration");
        }
        self.catalog_value(name, hit)
      }
    }
  }

  /// The unique hit picked out by the disambiguation rules for `term`.
  fn disambiguate<'h>(&self, term: &str, hits: &'h [SearchHit]) -> Option<&'h SearchHit> {
    let rules: Vec<&DisambiguationRule> = self.rules.iter().filter(|rule| rule.applies_to(term)).collect();
    let mut chosen = hits.iter().filter(|hit| rules.iter().any(|rule| rule.matches(hit)));
    let first = chosen.next()?;
    chosen.next().is_none().then_some(first)
  }

  fn catalog_value(&self, term: &str, hit: &SearchHit) -> Result<Value, EvalError> {
    let catalog = self.algebra.catalog();
    let missing = || EvalError::UnknownIdentifier(term.to_owned());
    match hit.kind {
      SearchKind::Unit => catalog.unit(&hit.key).map(|unit| Value::unit(unit.clone())).ok_or_else(missing),
      SearchKind::Function => builtins::lookup(&hit.key).map(Value::Function).ok_or_else(missing),
      kind => {
        let entry = catalog.entry(kind, &hit.key).ok_or_else(missing)?;
        let name = entry.name.lookup(catalog.language(), Plural::One).unwrap_or_else(|| hit.key.clone());
        let reference = CatalogRef { key: hit.key.clone(), name };
        Ok(match kind {
          SearchKind::UnitType => Value::UnitType(reference),
          SearchKind::Include => Value::Include(reference),
          SearchKind::Element => Value::Element(reference),
          _ => Value::Solver(reference),
        })
      }
    }
  }
}

/// Evaluates one expression against `catalog`, with no
/// disambiguation rules.
pub fn evaluate(catalog: &Catalog, expr: &Expr, ctx: &mut Context) -> Result<Value, EvalError> {
  Evaluator::new(catalog).evaluate(expr, ctx)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::defaults::default_catalog;
  use crate::expr::{lex, parse_expression};

  use approx::assert_abs_diff_eq;

  fn run_with(evaluator: &Evaluator<'_>, ctx: &mut Context, input: &str) -> Result<Value, EvalError> {
    let expr = parse_expression(&lex(input).unwrap()).unwrap();
    evaluator.evaluate(&expr, ctx)
  }

  fn run(input: &str) -> Result<Value, EvalError> {
    let catalog = default_catalog();
    run_with(&Evaluator::new(&catalog), &mut Context::new(), input)
  }

  fn number(input: &str) -> f64 {
    run(input).unwrap().as_number().unwrap()
  }

  fn payload(value: &Value) -> f64 {
    match value {
      Value::ValueUnit(x) => x.value.as_number().unwrap(),
      other => panic!("not a quantity: {other}"),
    }
  }

  #[test]
  fn test_precedence() {
    assert_eq!(number("2+3*4"), 14.0);
    assert_eq!(number("2^3^2"), 512.0);
    assert_eq!(number("-2^2"), -4.0);
    assert_eq!(number("(1 + 2) * 3"), 9.0);
    assert_eq!(number("2 3"), 6.0);
  }

  #[test]
  fn test_lists_and_matrices() {
    assert_eq!(run("[1, 2, 3]").unwrap().to_string(), "[1, 2, 3]");
    assert_eq!(run("[1, 2; 3, 4]").unwrap().to_string(), "[[1, 2], [3, 4]]");
    assert_eq!(run("[1, 2; 3, 4] * [1, 0; 0, 1]").unwrap().to_string(), "[[1, 2], [3, 4]]");
    assert_eq!(run("1, 2").unwrap().to_string(), "[1, 2]");
    assert_eq!(run("[]").unwrap().to_string(), "[]");
  }

  #[test]
  fn test_quantities_and_conversion() {
    let radians = run("5 degree to radian").unwrap();
    assert_abs_diff_eq!(payload(&radians), 0.08726646, epsilon = 1e-8);
    let period = run("2 hertz to second").unwrap();
    assert_abs_diff_eq!(payload(&period), 0.5);
    assert_eq!(run("3 meter + 2 meter").unwrap().to_string(), "5 meters");
  }

  #[test]
  fn test_conversion_function_call() {
    assert_abs_diff_eq!(number("(celsius => fahrenheit)(100)"), 212.0, epsilon = 1e-9);
  }

  #[test]
  fn test_conversion_target_binding() {
    let speed = run("661.47 knot to mach @ 288.15 kelvin").unwrap();
    assert_abs_diff_eq!(payload(&speed), 1.0, epsilon = 1e-3);
    assert!(matches!(run("661.47 knot to mach"), Err(EvalError::MissingIndependentVariable { side: "target", .. })));
  }

  #[test]
  fn test_function_application() {
    assert_eq!(number("sqrt(16)"), 4.0);
    assert_eq!(number("max(1, 5, 3)"), 5.0);
    assert_eq!(number("sum [1, 2, 3]"), 6.0);
    assert_abs_diff_eq!(number("(sin / sin)(0.5)"), 0.5, epsilon = 1e-12);
    assert_eq!(run("sin cos").unwrap().to_string(), "function `sin∘cos`");
    assert_eq!(run("sin^-1").unwrap().to_string(), "function `sin⁻¹`");
    assert_eq!(run("id").unwrap().to_string(), "function `id`");
  }

  #[test]
  fn test_composing_into_binary_function_is_an_error() {
    assert!(matches!(run("(atan2 sin)(1)"), Err(EvalError::Arity { actual: 1, .. })));
    assert!(matches!(run("(atan2 sin)(1, 2)"), Err(EvalError::Arity { actual: 2, .. })));
  }

  #[test]
  fn test_assignment() {
    let catalog = default_catalog();
    let evaluator = Evaluator::new(&catalog);
    let mut ctx = Context::new();
    assert_eq!(run_with(&evaluator, &mut ctx, "x = 4").unwrap().as_number(), Some(4.0));
    assert_eq!(run_with(&evaluator, &mut ctx, "x * x").unwrap().as_number(), Some(16.0));
    assert_eq!(run_with(&evaluator, &mut ctx, "meter = 2").unwrap().as_number(), Some(2.0));
    assert_eq!(run_with(&evaluator, &mut ctx, "3 meter").unwrap().as_number(), Some(6.0));
  }

  #[test]
  fn test_unknown_and_ambiguous() {
    assert_eq!(run("furlong").unwrap_err(), EvalError::UnknownIdentifier("furlong".to_owned()));
    assert_eq!(run("pound").unwrap_err(), EvalError::Ambiguous { term: "pound".to_owned(), count: 2 });
  }

  #[test]
  fn test_disambiguation_rules() {
    let catalog = default_catalog();
    let rules = vec![DisambiguationRule::new("pound").with_key("pound_sterling")];
    let evaluator = Evaluator::new(&catalog).with_disambiguation(&rules);
    let mut ctx = Context::new();
    let Value::Unit(unit) = run_with(&evaluator, &mut ctx, "pound").unwrap() else { panic!("expected a unit") };
    assert_eq!(unit.id.as_deref(), Some("pound_sterling"));
    assert!(!ctx.note("pound"));

    let loose = vec![DisambiguationRule::new("pound").with_kind("unit")];
    let evaluator = Evaluator::new(&catalog).with_disambiguation(&loose);
    assert!(matches!(run_with(&evaluator, &mut ctx, "pound"), Err(EvalError::Ambiguous { .. })));
  }

  #[test]
  fn test_catalog_entries() {
    assert_eq!(run("helium").unwrap().to_string(), "element `Helium`");
    assert_eq!(run("he").unwrap().to_string(), "element `Helium`");
    assert_eq!(run("ideal gas law").unwrap_err(), EvalError::UnknownIdentifier("ideal".to_owned()));
  }

  #[test]
  fn test_type_errors() {
    let err = run("true + 1").unwrap_err();
    assert_eq!(err.to_string(), "Cannot apply `+` to true and 1");
    let err = run("meter + 1").unwrap_err();
    assert_eq!(err.to_string(), "Cannot apply `+` to unit `meter` and 1");
  }
}
