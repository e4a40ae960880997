
//! Matrix functions.

use super::{integer_arg, Builtin, BuiltinTable};
use crate::eval::algebra::Algebra;
use crate::eval::error::EvalError;
use crate::eval::function::Arity;
use crate::eval::matrix;
use crate::eval::value::Value;
use crate::util::matrix::{Matrix, MatrixIndex};

pub fn append_tensor_functions(table: &mut BuiltinTable) {
  table.insert(Builtin::new("det", Arity::UNARY, |alg, args| {
    matrix::determinant(alg, &matrix_arg(alg, "det", &args[0])?)
  }));
  table.insert(indexed("minor", matrix::minor));
  table.insert(indexed("cofactor", matrix::cofactor));
  table.insert(Builtin::new("comatrix", Arity::UNARY, |alg, args| {
    matrix::comatrix(alg, &matrix_arg(alg, "comatrix", &args[0])?).map(Value::from_matrix)
  }));
  table.insert(Builtin::new("adj", Arity::UNARY, |alg, args| {
    matrix::adjugate(alg, &matrix_arg(alg, "adj", &args[0])?).map(Value::from_matrix)
  }));
  table.insert(Builtin::new("inv", Arity::UNARY, |alg, args| {
    matrix::inverse(alg, &matrix_arg(alg, "inv", &args[0])?).map(Value::from_matrix)
  }));
  table.insert(Builtin::new("transpose", Arity::UNARY, |alg, args| {
    Ok(Value::from_matrix(matrix_arg(alg, "transpose", &args[0])?.transpose()))
  }));
  table.insert(Builtin::new("identity", Arity::UNARY, |alg, args| {
    let n = integer_arg(alg, "identity", args, 0)?;
    match usize::try_from(n) {
      Ok(n) if n > 0 => Ok(Value::from_matrix(matrix::identity(n))),
      _ => Err(EvalError::domain("identity", format!("size must be positive, got {n}"))),
    }
  }));
}

fn matrix_arg(alg: &Algebra<'_>, name: &str, value: &Value) -> Result<Matrix<Value>, EvalError> {
  value.as_matrix().ok_or_else(|| alg.unary_mismatch(name, value))
}

type IndexedFn = fn(&Algebra<'_>, &Matrix<Value>, MatrixIndex) -> Result<Value, EvalError>;

/// `minor(m, i, j)` and `cofactor(m, i, j)`. Indices count rows and
/// columns from 1.
fn indexed(name: &'static str, f: IndexedFn) -> Builtin {
  Builtin::new(name, Arity::exactly(3), move |alg, args| {
    let m = matrix_arg(alg, name, &args[0])?;
    let row = integer_arg(alg, name, args, 1)?;
    let column = integer_arg(alg, name, args, 2)?;
    let in_range = |i: i64, len: usize| usize::try_from(i).ok().filter(|i| (1..=len).contains(i)).map(|i| i - 1);
    match (in_range(row, m.height()), in_range(column, m.width())) {
      (Some(y), Some(x)) => f(alg, &m, MatrixIndex { y, x }),
      _ => Err(EvalError::domain(name, format!("index ({row}, {column}) is outside a {}×{} matrix", m.height(), m.width()))),
    }
  })
}

#[cfg(test)]
mod tests {
  use super::super::test_utils::call;
  use super::*;
  use crate::catalog::Catalog;

  fn matrix_value(rows: &[&[f64]]) -> Value {
    Value::Array(rows.iter().map(|row| Value::Array(row.iter().map(|x| Value::Number(*x)).collect())).collect())
  }

  #[test]
  fn test_det_and_inverse() {
    let catalog = Catalog::new();
    let m = matrix_value(&[&[4.0, 7.0], &[2.0, 6.0]]);
    assert_eq!(call(&catalog, "det", &[m.clone()]).unwrap().as_number(), Some(10.0));
    assert_eq!(call(&catalog, "inv", &[m]).unwrap().to_string(), "[[0.6, -0.7], [-0.2, 0.4]]");
    assert!(call(&catalog, "det", &[Value::Number(3.0)]).is_err());
  }

  #[test]
  fn test_indexed_functions_count_from_one() {
    let catalog = Catalog::new();
    let m = matrix_value(&[&[1.0, 2.0], &[3.0, 4.0]]);
    let args = [m.clone(), Value::Number(1.0), Value::Number(2.0)];
    assert_eq!(call(&catalog, "minor", &args).unwrap().as_number(), Some(3.0));
    assert_eq!(call(&catalog, "cofactor", &args).unwrap().as_number(), Some(-3.0));
    let outside = [m, Value::Number(0.0), Value::Number(1.0)];
    assert!(matches!(call(&catalog, "minor", &outside), Err(EvalError::Domain { .. })));
  }

  #[test]
  fn test_shapes() {
    let catalog = Catalog::new();
    let m = matrix_value(&[&[1.0, 2.0, 3.0]]);
    assert_eq!(call(&catalog, "transpose", &[m]).unwrap().to_string(), "[[1], [2], [3]]");
    assert_eq!(call(&catalog, "identity", &[Value::Number(2.0)]).unwrap().to_string(), "[[1, 0], [0, 1]]");
    assert_eq!(call(&catalog, "adj", &[matrix_value(&[&[1.0, 2.0], &[3.0, 4.0]])]).unwrap().to_string(), "[[4, -2], [-3, 1]]");
    assert!(call(&catalog, "identity", &[Value::Number(0.0)]).is_err());
  }
}
