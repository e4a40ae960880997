
//! Rounding, sign, and other general-purpose functions.

use super::{flatten_args, map_payload, Builtin, BuiltinTable};
use crate::eval::function::Arity;
use crate::eval::value::Value;
use crate::units::parsing::parse_unit_expression;

pub fn append_basic_functions(table: &mut BuiltinTable) {
  table.insert(payload_function("abs", f64::abs));
  table.insert(payload_function("floor", f64::floor));
  table.insert(payload_function("ceil", f64::ceil));
  table.insert(payload_function("round", f64::round));
  table.insert(payload_function("trunc", f64::trunc));
  table.insert(sign());
  table.insert(len());
  table.insert(ordered("ascending", |ordering| ordering.is_le()));
  table.insert(ordered("descending", |ordering| ordering.is_ge()));
  table.insert(unit());
}

fn payload_function(name: &'static str, f: fn(f64) -> f64) -> Builtin {
  Builtin::new(name, Arity::UNARY, move |alg, args| map_payload(alg, name, &args[0], f))
}

/// The sign of a number or quantity, as a plain number.
pub fn sign() -> Builtin {
  Builtin::new("sign", Arity::UNARY, |alg, args| {
    let signum = |x: f64| if x == 0.0 || x.is_nan() { x } else { x.signum() };
    match &args[0] {
      Value::ValueUnit(x) => map_payload(alg, "sign", &x.value, signum),
      other => map_payload(alg, "sign", other, signum),
    }
  })
}

pub fn len() -> Builtin {
  Builtin::new("len", Arity::UNARY, |alg, args| {
    match &args[0] {
      Value::Array(elems) => Ok(Value::Number(elems.len() as f64)),
      Value::String(s) => Ok(Value::Number(s.chars().count() as f64)),
      other => Err(alg.unary_mismatch("len", other)),
    }
  })
}

/// Whether each argument is ordered against the next one as `accept`
/// requires. NaN breaks any ordering.
fn ordered(name: &'static str, accept: fn(std::cmp::Ordering) -> bool) -> Builtin {
  Builtin::new(name, Arity::VARIADIC, move |alg, args| {
    let args = flatten_args(args);
    for pair in args.windows(2) {
      match alg.ordering(name, &pair[0], &pair[1])? {
        Some(ordering) if accept(ordering) => {}
        _ => return Ok(Value::Boolean(false)),
      }
    }
    Ok(Value::Boolean(true))
  })
}

/// Parses a unit expression such as `"kg*m/s^2"` into a bare unit.
pub fn unit() -> Builtin {
  Builtin::new("unit", Arity::UNARY, |alg, args| {
    let Value::String(text) = &args[0] else {
      return Err(alg.unary_mismatch("unit", &args[0]));
    };
    let unit = parse_unit_expression(text, alg.catalog())?;
    Ok(Value::unit(unit))
  })
}
