
//! Statistical reductions. Quantities are first expressed in the
//! unit of the first argument, and the result is given in that unit.

use super::{flatten_args, Builtin, BuiltinTable};
use crate::eval::algebra::Algebra;
use crate::eval::error::EvalError;
use crate::eval::function::Arity;
use crate::eval::value::Value;
use crate::units::compose;
use crate::units::unit::Unit;

pub fn append_statistics_functions(table: &mut BuiltinTable) {
  table.insert(sum());
  table.insert(product());
  table.insert(reduction("rss", |xs| Ok(xs.iter().map(|x| x * x).sum::<f64>().sqrt())));
  table.insert(reduction("rms", |xs| Ok((xs.iter().map(|x| x * x).sum::<f64>() / xs.len() as f64).sqrt())));
  table.insert(reduction("mean", |xs| Ok(mean(xs))));
  table.insert(reduction("gmean", |xs| Ok((xs.iter().map(|x| x.ln()).sum::<f64>() / xs.len() as f64).exp())));
  table.insert(reduction("hmean", |xs| Ok(xs.len() as f64 / xs.iter().map(|x| x.recip()).sum::<f64>())));
  table.insert(variance());
  table.insert(reduction("stdev", |xs| Ok(sample_variance("stdev", xs)?.sqrt())));
  table.insert(reduction("median", |xs| Ok(median(xs))));
  table.insert(reduction("min", |xs| Ok(xs.iter().copied().fold(f64::INFINITY, f64::min))));
  table.insert(reduction("max", |xs| Ok(xs.iter().copied().fold(f64::NEG_INFINITY, f64::max))));
}

pub fn sum() -> Builtin {
  Builtin::new("sum", Arity::VARIADIC, |alg, args| {
    fold(args, Value::Number(0.0), |acc, x| alg.add(acc, x))
  })
}

pub fn product() -> Builtin {
  Builtin::new("product", Arity::VARIADIC, |alg, args| {
    fold(args, Value::Number(1.0), |acc, x| alg.mul(acc, x))
  })
}

fn fold<F>(args: &[Value], empty: Value, mut f: F) -> Result<Value, EvalError>
where F: FnMut(&Value, &Value) -> Result<Value, EvalError> {
  let args = flatten_args(args);
  let Some((first, rest)) = args.split_first() else {
    return Ok(empty);
  };
  rest.iter().try_fold(first.clone(), |acc, x| f(&acc, x))
}

/// A reduction over the magnitudes of the arguments. The result keeps
/// the unit of the first argument.
fn reduction(name: &'static str, f: fn(&[f64]) -> Result<f64, EvalError>) -> Builtin {
  Builtin::new(name, Arity::VARIADIC, move |alg, args| {
    let (xs, unit) = magnitudes(alg, name, args)?;
    let result = Value::Number(f(&xs)?);
    Ok(match unit {
      None => result,
      Some(unit) => Value::quantity(result, unit),
    })
  })
}

/// Sample variance. The unit of the result is the square of the
/// argument unit.
pub fn variance() -> Builtin {
  Builtin::new("var", Arity::VARIADIC, |alg, args| {
    let (xs, unit) = magnitudes(alg, "var", args)?;
    let result = Value::Number(sample_variance("var", &xs)?);
    match unit {
      None => Ok(result),
      Some(unit) => Ok(Value::quantity(result, compose::multiply(alg.catalog(), &[&unit, &unit])?)),
    }
  })
}

/// The arguments as plain numbers, together with the unit they are
/// expressed in, if they are quantities.
fn magnitudes(alg: &Algebra<'_>, name: &str, args: &[Value]) -> Result<(Vec<f64>, Option<Unit>), EvalError> {
  let args = flatten_args(args);
  match args.first() {
    None => Err(EvalError::domain(name, "no values given")),
    Some(Value::ValueUnit(first)) => {
      let mut xs = Vec::with_capacity(args.len());
      for arg in args {
        let Value::ValueUnit(x) = arg else {
          return Err(alg.mismatch(name, &args[0], arg));
        };
        let payload = alg.align(first, x)?;
        xs.push(payload.as_number().ok_or_else(|| alg.unary_mismatch(name, arg))?);
      }
      Ok((xs, Some(first.unit.clone())))
    }
    Some(_) => {
      let xs = args.iter()
        .map(|arg| arg.as_number().ok_or_else(|| alg.unary_mismatch(name, arg)))
        .collect::<Result<_, _>>()?;
      Ok((xs, None))
    }
  }
}

fn mean(xs: &[f64]) -> f64 {
  xs.iter().sum::<f64>() / xs.len() as f64
}

fn sample_variance(name: &str, xs: &[f64]) -> Result<f64, EvalError> {
  if xs.len() < 2 {
    return Err(EvalError::domain(name, "at least two values are needed"));
  }
  let m = mean(xs);
  Ok(xs.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / (xs.len() - 1) as f64)
}

fn median(xs: &[f64]) -> f64 {
  let mut sorted = xs.to_vec();
  sorted.sort_by(f64::total_cmp);
  let mid = sorted.len() / 2;
  if sorted.len() % 2 == 0 {
    (sorted[mid - 1] + sorted[mid]) / 2.0
  } else {
    sorted[mid]
  }
}

#[cfg(test)]
mod tests {
  use super::super::test_utils::{call, call_number};
  use super::*;
  use crate::catalog::defaults::default_catalog;
  use crate::catalog::Catalog;

  use approx::assert_abs_diff_eq;

  #[test]
  fn test_sums() {
    assert_eq!(call_number("sum", &[1.0, 2.0, 3.0]), 6.0);
    assert_eq!(call_number("product", &[2.0, 3.0, 4.0]), 24.0);
    let catalog = Catalog::new();
    let empty = Value::Array(vec![]);
    assert_eq!(call(&catalog, "sum", &[empty]).unwrap().as_number(), Some(0.0));
  }

  #[test]
  fn test_means() {
    assert_eq!(call_number("mean", &[1.0, 2.0, 3.0, 6.0]), 3.0);
    assert_abs_diff_eq!(call_number("gmean", &[2.0, 8.0]), 4.0, epsilon = 1e-12);
    assert_abs_diff_eq!(call_number("hmean", &[1.0, 4.0, 4.0]), 2.0, epsilon = 1e-12);
    assert_eq!(call_number("rss", &[3.0, 4.0]), 5.0);
    assert_abs_diff_eq!(call_number("rms", &[1.0, 7.0]), 5.0, epsilon = 1e-12);
  }

  #[test]
  fn test_spread() {
    assert_abs_diff_eq!(call_number("var", &[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 32.0 / 7.0, epsilon = 1e-12);
    assert_abs_diff_eq!(call_number("stdev", &[1.0, 3.0]), 2f64.sqrt(), epsilon = 1e-12);
    let catalog = Catalog::new();
    assert!(matches!(call(&catalog, "var", &[Value::Number(1.0)]), Err(EvalError::Domain { .. })));
  }

  #[test]
  fn test_order_statistics() {
    assert_eq!(call_number("median", &[5.0, 1.0, 3.0]), 3.0);
    assert_eq!(call_number("median", &[4.0, 1.0, 3.0, 2.0]), 2.5);
    assert_eq!(call_number("min", &[4.0, -1.0, 3.0]), -1.0);
    assert_eq!(call_number("max", &[4.0, -1.0, 3.0]), 4.0);
  }

  #[test]
  fn test_quantities_use_first_unit() {
    let catalog = default_catalog();
    let foot = catalog.unit("foot").unwrap().clone();
    let inch = catalog.unit("inch").unwrap().clone();
    let args = [
      Value::quantity(Value::Number(1.0), foot),
      Value::quantity(Value::Number(12.0), inch),
    ];
    let total = call(&catalog, "sum", &args).unwrap();
    assert_eq!(total.to_string(), "2 feet");
    let mean = call(&catalog, "mean", &args).unwrap();
    let Value::ValueUnit(mean) = mean else { panic!("expected a quantity") };
    assert_abs_diff_eq!(mean.value.as_number().unwrap(), 1.0, epsilon = 1e-12);
    let mixed = [args[0].clone(), Value::Number(1.0)];
    assert!(matches!(call(&catalog, "max", &mixed), Err(EvalError::TypeMismatch { .. })));
  }
}
