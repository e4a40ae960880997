
//! Trigonometric, exponential, and gamma-family functions.

use super::{Builtin, BuiltinTable};
use crate::eval::algebra::Algebra;
use crate::eval::error::EvalError;
use crate::eval::function::Arity;
use crate::eval::value::Value;

use std::f64::consts::PI;

const LANCZOS_G: f64 = 7.0;
const LANCZOS_COEFFICIENTS: [f64; 9] = [
  0.999_999_999_999_809_9,
  676.520_368_121_885_1,
  -1_259.139_216_722_402_8,
  771.323_428_777_653_1,
  -176.615_029_162_140_6,
  12.507_343_278_686_905,
  -0.138_571_095_265_720_12,
  9.984_369_578_019_572e-6,
  1.505_632_735_149_311_6e-7,
];

pub fn append_transcendental_functions(table: &mut BuiltinTable) {
  table.insert_pair(real("sin", f64::sin), real("asin", f64::asin));
  table.insert_pair(real("cos", f64::cos), real("acos", f64::acos));
  table.insert_pair(real("tan", f64::tan), real("atan", f64::atan));
  table.insert_pair(real("sinh", f64::sinh), real("asinh", f64::asinh));
  table.insert_pair(real("cosh", f64::cosh), real("acosh", f64::acosh));
  table.insert_pair(real("tanh", f64::tanh), real("atanh", f64::atanh));
  table.insert_pair(real("exp", f64::exp), real("ln", f64::ln));
  table.insert_pair(real("exp10", exp10), real("log10", f64::log10));
  table.insert_pair(real("exp2", f64::exp2), real("log2", f64::log2));
  table.insert_pair(power("sq", 2.0), root_of("sqrt", 2.0));
  table.insert_pair(power("cube", 3.0), root_of("cbrt", 3.0));
  table.insert(root());
  table.insert(log());
  table.insert(atan2());
  table.insert(hypot());
  table.insert(real("gamma", gamma));
  table.insert(real("lgamma", ln_gamma));
  table.insert(beta());
}

/// A real function. Quantities are taken by their base value, so
/// angles in degrees go through radians.
fn real(name: &'static str, f: fn(f64) -> f64) -> Builtin {
  Builtin::new(name, Arity::UNARY, move |alg, args| alg.map_real(name, &args[0], f))
}

/// Integer powers, which keep track of units.
fn power(name: &'static str, exponent: f64) -> Builtin {
  Builtin::new(name, Arity::UNARY, move |alg, args| alg.pow(&args[0], &Value::Number(exponent)))
}

fn root_of(name: &'static str, degree: f64) -> Builtin {
  Builtin::new(name, Arity::UNARY, move |alg, args| alg.root(&Value::Number(degree), &args[0]))
}

/// `root(x, n)`, the real `n`th root of `x`.
pub fn root() -> Builtin {
  Builtin::new("root", Arity::BINARY, |alg, args| alg.root(&args[1], &args[0]))
}

/// `log(x)` is the natural logarithm; `log(x, b)` takes base `b`.
pub fn log() -> Builtin {
  Builtin::new("log", Arity::between(1, 2), |alg, args| {
    let x = alg.real("log", &args[0])?;
    match args.get(1) {
      None => Ok(Value::Number(x.ln())),
      Some(base) => Ok(Value::Number(x.ln() / alg.real("log", base)?.ln())),
    }
  })
}

pub fn atan2() -> Builtin {
  Builtin::new("atan2", Arity::BINARY, |alg, args| {
    let (y, x) = two_reals(alg, "atan2", args)?;
    Ok(Value::Number(y.atan2(x)))
  })
}

/// `hypot(a, b)`, the length of the hypotenuse. Quantities keep their
/// unit.
pub fn hypot() -> Builtin {
  Builtin::new("hypot", Arity::BINARY, |alg, args| {
    let two = Value::Number(2.0);
    let sum = alg.add(&alg.pow(&args[0], &two)?, &alg.pow(&args[1], &two)?)?;
    alg.root(&two, &sum)
  })
}

pub fn beta() -> Builtin {
  Builtin::new("beta", Arity::BINARY, |alg, args| {
    let (a, b) = two_reals(alg, "beta", args)?;
    if a <= 0.0 || b <= 0.0 {
      return Err(EvalError::domain("beta", "arguments must be positive"));
    }
    Ok(Value::Number((ln_gamma(a) + ln_gamma(b) - ln_gamma(a + b)).exp()))
  })
}

fn two_reals(alg: &Algebra<'_>, name: &str, args: &[Value]) -> Result<(f64, f64), EvalError> {
  Ok((alg.real(name, &args[0])?, alg.real(name, &args[1])?))
}

fn exp10(x: f64) -> f64 {
  10f64.powf(x)
}

/// The gamma function, by the Lanczos approximation. Poles at the
/// non-positive integers come out as NaN.
pub fn gamma(x: f64) -> f64 {
  if x <= 0.0 && x.fract() == 0.0 {
    return f64::NAN;
  }
  if x < 0.5 {
    return PI / ((PI * x).sin() * gamma(1.0 - x));
  }
  let (t, sum) = lanczos_sum(x - 1.0);
  (2.0 * PI).sqrt() * t.powf(x - 0.5) * (-t).exp() * sum
}

/// The logarithm of the absolute value of the gamma function.
pub fn ln_gamma(x: f64) -> f64 {
  if x <= 0.0 && x.fract() == 0.0 {
    return f64::INFINITY;
  }
  if x < 0.5 {
    return (PI / (PI * x).sin()).abs().ln() - ln_gamma(1.0 - x);
  }
  let (t, sum) = lanczos_sum(x - 1.0);
  0.5 * (2.0 * PI).ln() + (x - 0.5) * t.ln() - t + sum.ln()
}

fn lanczos_sum(x: f64) -> (f64, f64) {
  let t = x + LANCZOS_G + 0.5;
  let sum = LANCZOS_COEFFICIENTS.iter()
    .enumerate()
    .skip(1)
    .fold(LANCZOS_COEFFICIENTS[0], |acc, (i, c)| acc + c / (x + i as f64));
  (t, sum)
}
