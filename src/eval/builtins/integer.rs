
//! Number-theoretic and combinatorial functions over integers.

use super::{flatten_args, integer_arg, Builtin, BuiltinTable};
use super::transcendental::gamma;
use crate::eval::algebra::{to_integer, Algebra};
use crate::eval::error::EvalError;
use crate::eval::function::Arity;
use crate::eval::value::Value;

pub fn append_integer_functions(table: &mut BuiltinTable) {
  table.insert(integer_reduction("gcd", gcd));
  table.insert(integer_reduction("lcm", lcm));
  table.insert(integer_reduction("band", |a, b| a & b));
  table.insert(integer_reduction("bor", |a, b| a | b));
  table.insert(integer_reduction("bxor", |a, b| a ^ b));
  table.insert(factorial());
  table.insert(binomial());
  table.insert(permutations());
}

fn integer_reduction(name: &'static str, f: fn(i64, i64) -> i64) -> Builtin {
  Builtin::new(name, Arity::VARIADIC, move |alg, args| {
    let ints = integers(alg, name, flatten_args(args))?;
    let Some((first, rest)) = ints.split_first() else {
      return Err(EvalError::domain(name, "no values given"));
    };
    Ok(Value::Number(rest.iter().fold(*first, |acc, x| f(acc, *x)) as f64))
  })
}

fn integers(alg: &Algebra<'_>, name: &str, args: &[Value]) -> Result<Vec<i64>, EvalError> {
  args.iter()
    .map(|arg| match arg {
      Value::Number(x) => to_integer(name, *x),
      other => Err(alg.unary_mismatch(name, other)),
    })
    .collect()
}

pub fn gcd(a: i64, b: i64) -> i64 {
  let (mut a, mut b) = (a.unsigned_abs(), b.unsigned_abs());
  while b != 0 {
    (a, b) = (b, a % b);
  }
  i64::try_from(a).unwrap_or(i64::MAX)
}

pub fn lcm(a: i64, b: i64) -> i64 {
  if a == 0 || b == 0 {
    0
  } else {
    (a / gcd(a, b)).saturating_mul(b).saturating_abs()
  }
}

/// `fact(n)`. Non-integers go through the gamma function.
pub fn factorial() -> Builtin {
  Builtin::new("fact", Arity::UNARY, |alg, args| {
    let x = alg.real("fact", &args[0])?;
    if x.fract() != 0.0 {
      return Ok(Value::Number(gamma(x + 1.0)));
    }
    if x < 0.0 {
      return Err(EvalError::domain("fact", "argument must not be a negative integer"));
    }
    Ok(Value::Number(falling_factorial(x, x)))
  })
}

/// `binom(n, k)`, the number of `k`-element subsets of `n` elements.
pub fn binomial() -> Builtin {
  Builtin::new("binom", Arity::BINARY, |alg, args| {
    let (n, k) = counts(alg, "binom", args)?;
    let k = k.min(n - k);
    Ok(Value::Number(falling_factorial(n as f64, k as f64) / falling_factorial(k as f64, k as f64)))
  })
}

/// `perm(n, k)`, the number of ordered `k`-element selections.
pub fn permutations() -> Builtin {
  Builtin::new("perm", Arity::BINARY, |alg, args| {
    let (n, k) = counts(alg, "perm", args)?;
    Ok(Value::Number(falling_factorial(n as f64, k as f64)))
  })
}

fn counts(alg: &Algebra<'_>, name: &str, args: &[Value]) -> Result<(i64, i64), EvalError> {
  let n = integer_arg(alg, name, args, 0)?;
  let k = integer_arg(alg, name, args, 1)?;
  if n < 0 || k < 0 || k > n {
    return Err(EvalError::domain(name, format!("need 0 <= k <= n, got n = {n} and k = {k}")));
  }
  Ok((n, k))
}

/// `n (n-1) ... (n-k+1)`.
fn falling_factorial(n: f64, k: f64) -> f64 {
  let mut result: f64 = 1.0;
  let mut i: f64 = 0.0;
  while i < k && result.is_finite() {
    result *= n - i;
    i += 1.0;
  }
  result
}

#[cfg(test)]
mod tests {
  use super::super::test_utils::{call, call_number};
  use super::*;
  use crate::catalog::Catalog;

  use approx::assert_abs_diff_eq;

  #[test]
  fn test_gcd_lcm() {
    assert_eq!(call_number("gcd", &[12.0, 18.0, 27.0]), 3.0);
    assert_eq!(call_number("lcm", &[4.0, 6.0]), 12.0);
    assert_eq!(gcd(-4, 6), 2);
    assert_eq!(lcm(0, 5), 0);
    let catalog = Catalog::new();
    assert!(matches!(call(&catalog, "gcd", &[Value::Number(1.5), Value::Number(3.0)]), Err(EvalError::Domain { .. })));
  }

  #[test]
  fn test_bitwise_reductions() {
    assert_eq!(call_number("band", &[12.0, 10.0]), 8.0);
    assert_eq!(call_number("bor", &[12.0, 10.0, 1.0]), 15.0);
    assert_eq!(call_number("bxor", &[12.0, 10.0]), 6.0);
  }

  #[test]
  fn test_factorials() {
    assert_eq!(call_number("fact", &[0.0]), 1.0);
    assert_eq!(call_number("fact", &[10.0]), 3_628_800.0);
    assert_abs_diff_eq!(call_number("fact", &[0.5]), std::f64::consts::PI.sqrt() / 2.0, epsilon = 1e-12);
    assert!(call_number("fact", &[200.0]).is_infinite());
    assert_eq!(call_number("binom", &[5.0, 2.0]), 10.0);
    assert_eq!(call_number("binom", &[52.0, 5.0]), 2_598_960.0);
    assert_eq!(call_number("perm", &[5.0, 2.0]), 20.0);
    let catalog = Catalog::new();
    assert!(call(&catalog, "binom", &[Value::Number(2.0), Value::Number(3.0)]).is_err());
  }
}
