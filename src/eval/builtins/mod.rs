
//! The table of built-in functions available to every expression.

mod basic;
mod integer;
mod statistics;
mod tensor;
mod transcendental;

use super::algebra::Algebra;
use super::error::EvalError;
use super::function::{callable, Arity, Callable, FunctionValue};
use super::value::Value;

use once_cell::sync::Lazy;

use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

static STANDARD_TABLE: Lazy<BuiltinTable> = Lazy::new(BuiltinTable::standard);

/// A built-in function, as stored in a [`BuiltinTable`]. Inverse pairs
/// share their callables, so `asin` is literally the inverse of `sin`.
#[derive(Clone)]
pub struct Builtin {
  name: &'static str,
  arity: Arity,
  forward: Arc<Callable>,
  inverse: Option<Arc<Callable>>,
}

/// A table of known built-in functions.
#[derive(Debug, Default)]
pub struct BuiltinTable {
  known_functions: HashMap<String, Builtin>,
}

impl Builtin {
  pub fn new<F>(name: &'static str, arity: Arity, body: F) -> Self
  where F: Fn(&Algebra<'_>, &[Value]) -> Result<Value, EvalError> + Send + Sync + 'static {
    Self { name, arity, forward: callable(body), inverse: None }
  }

  pub fn name(&self) -> &'static str {
    self.name
  }

  pub fn arity(&self) -> Arity {
    self.arity
  }

  pub fn to_function(&self) -> FunctionValue {
    FunctionValue::from_callables(self.name, self.arity, Arc::clone(&self.forward), self.inverse.clone())
  }
}

impl Debug for Builtin {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    f.debug_struct("Builtin")
      .field("name", &self.name)
      .field("arity", &self.arity)
      .field("invertible", &self.inverse.is_some())
      .finish()
  }
}

impl BuiltinTable {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_capacity(capacity: usize) -> Self {
    Self {
      known_functions: HashMap::with_capacity(capacity),
    }
  }

  /// Every built-in function.
  pub fn standard() -> Self {
    let mut table = Self::with_capacity(96);
    basic::append_basic_functions(&mut table);
    transcendental::append_transcendental_functions(&mut table);
    statistics::append_statistics_functions(&mut table);
    integer::append_integer_functions(&mut table);
    tensor::append_tensor_functions(&mut table);
    table
  }

  pub fn insert(&mut self, func: Builtin) {
    self.known_functions.insert(func.name().to_owned(), func);
  }

  /// Inserts two unary functions as each other's inverse.
  pub fn insert_pair(&mut self, mut forward: Builtin, mut backward: Builtin) {
    forward.inverse = Some(Arc::clone(&backward.forward));
    backward.inverse = Some(Arc::clone(&forward.forward));
    self.insert(forward);
    self.insert(backward);
  }

  pub fn get(&self, name: &str) -> Option<&Builtin> {
    self.known_functions.get(name)
  }

  pub fn len(&self) -> usize {
    self.known_functions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.known_functions.is_empty()
  }
}

impl FromIterator<Builtin> for BuiltinTable {
  fn from_iter<I: IntoIterator<Item = Builtin>>(iter: I) -> Self {
    let iter = iter.into_iter();
    let (len_bound, _) = iter.size_hint();
    let mut table = Self::with_capacity(len_bound);
    for func in iter {
      table.insert(func);
    }
    table
  }
}

/// Looks up a built-in function by name. The identity function `id`
/// is special: it has an empty name decomposition, so that composing
/// with it leaves names unchanged.
pub fn lookup(name: &str) -> Option<FunctionValue> {
  if name == "id" {
    return Some(FunctionValue::identity());
  }
  STANDARD_TABLE.get(name).map(Builtin::to_function)
}

pub fn is_builtin(name: &str) -> bool {
  name == "id" || STANDARD_TABLE.get(name).is_some()
}

/// Variadic functions accept either several arguments or a single
/// array of them.
pub(crate) fn flatten_args(args: &[Value]) -> &[Value] {
  match args {
    [Value::Array(elems)] => elems,
    _ => args,
  }
}

/// Applies `f` to the payload of a number, quantity or array,
/// keeping units in place.
pub(crate) fn map_payload(alg: &Algebra<'_>, name: &str, value: &Value, f: fn(f64) -> f64) -> Result<Value, EvalError> {
  match value {
    Value::Number(x) => Ok(Value::Number(f(*x))),
    Value::Array(elems) => {
      elems.iter().map(|e| map_payload(alg, name, e, f)).collect::<Result<_, _>>().map(Value::Array)
    }
    Value::ValueUnit(x) => {
      let payload = map_payload(alg, name, &x.value, f)?;
      Ok(Value::ValueUnit(Box::new(x.with_value(payload))))
    }
    _ => Err(alg.unary_mismatch(name, value)),
  }
}

/// Argument `index` of a function, as an exact integer.
pub(crate) fn integer_arg(alg: &Algebra<'_>, name: &str, args: &[Value], index: usize) -> Result<i64, EvalError> {
  match &args[index] {
    Value::Number(x) => super::algebra::to_integer(name, *x),
    other => Err(alg.unary_mismatch(name, other)),
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_lookup_shares_callables() {
    let sin = lookup("sin").unwrap();
    assert!(sin.ptr_eq(&lookup("sin").unwrap()));
    let asin = lookup("asin").unwrap();
    assert!(sin.invert().unwrap().ptr_eq(&asin));
    assert!(sin.invert().unwrap().invert().unwrap().ptr_eq(&sin));
    assert_eq!(sin.invert().unwrap().invert().unwrap().to_string(), "sin");
  }

  #[test]
  fn test_unknown_builtin() {
    assert!(lookup("frobnicate").is_none());
    assert!(is_builtin("id"));
    assert!(is_builtin("gamma"));
  }

  #[test]
  fn test_table_from_iter() {
    let table: BuiltinTable = vec![
      Builtin::new("one", Arity::exactly(0), |_, _| Ok(Value::Number(1.0))),
      Builtin::new("two", Arity::exactly(0), |_, _| Ok(Value::Number(2.0))),
    ].into_iter().collect();
    assert_eq!(table.len(), 2);
    assert_eq!(table.get("two").unwrap().arity(), Arity::exactly(0));
  }

  #[test]
  fn test_flatten_args() {
    let array = [Value::Array(vec![Value::Number(1.0), Value::Number(2.0)])];
    assert_eq!(flatten_args(&array).len(), 2);
    let several = [Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)];
    assert_eq!(flatten_args(&several).len(), 3);
  }
}
