
//! Matrix operations over runtime values. Elements are combined with
//! the operator algebra, so matrices of quantities work as long as
//! their units compose.

use super::algebra::Algebra;
use super::error::EvalError;
use super::value::Value;
use crate::util::matrix::{Matrix, MatrixIndex};
use crate::util::pow_by_squaring;

pub fn product(alg: &Algebra<'_>, a: &Matrix<Value>, b: &Matrix<Value>) -> Result<Matrix<Value>, EvalError> {
  if a.width() != b.height() {
    let message = format!("cannot multiply a {}×{} matrix by a {}×{} matrix", a.height(), a.width(), b.height(), b.width());
    return Err(EvalError::domain("*", message));
  }
  let mut body = Vec::with_capacity(a.height());
  for y in 0..a.height() {
    let mut row = Vec::with_capacity(b.width());
    for x in 0..b.width() {
      let mut sum: Option<Value> = None;
      for k in 0..a.width() {
        let term = alg.mul(&a[MatrixIndex { y, x: k }], &b[MatrixIndex { y: k, x }])?;
        sum = Some(match sum {
          None => term,
          Some(acc) => alg.add(&acc, &term)?,
        });
      }
      row.push(sum.unwrap_or(Value::Number(0.0)));
    }
    body.push(row);
  }
  Matrix::new(body).map_err(|err| EvalError::domain("*", err.to_string()))
}

pub fn identity(n: usize) -> Matrix<Value> {
  Matrix::from_generator(n, n, |idx| Value::Number(if idx.x == idx.y { 1.0 } else { 0.0 }))
}

fn require_square(function: &str, m: &Matrix<Value>) -> Result<(), EvalError> {
  if m.is_square() && !m.is_empty() {
    Ok(())
  } else {
    Err(EvalError::domain(function, format!("expected a square matrix, got {}×{}", m.height(), m.width())))
  }
}

/// Determinant by cofactor expansion along the first row.
pub fn determinant(alg: &Algebra<'_>, m: &Matrix<Value>) -> Result<Value, EvalError> {
  require_square("det", m)?;
  expand(alg, m)
}

fn expand(alg: &Algebra<'_>, m: &Matrix<Value>) -> Result<Value, EvalError> {
  match m.height() {
    1 => Ok(m[MatrixIndex { y: 0, x: 0 }].clone()),
    2 => {
      let ad = alg.mul(&m[MatrixIndex { y: 0, x: 0 }], &m[MatrixIndex { y: 1, x: 1 }])?;
      let bc = alg.mul(&m[MatrixIndex { y: 0, x: 1 }], &m[MatrixIndex { y: 1, x: 0 }])?;
      alg.sub(&ad, &bc)
    }
    n => {
      let mut total: Option<Value> = None;
      for x in 0..n {
        let index = MatrixIndex { y: 0, x };
        let term = alg.mul(&m[index], &cofactor_at(alg, m, index)?)?;
        total = Some(match total {
          None => term,
          Some(acc) => alg.add(&acc, &term)?,
        });
      }
      total.ok_or_else(|| EvalError::domain("det", "empty matrix"))
    }
  }
}

/// The determinant of `m` with row `index.y` and column `index.x`
/// removed.
pub fn minor(alg: &Algebra<'_>, m: &Matrix<Value>, index: MatrixIndex) -> Result<Value, EvalError> {
  require_square("minor", m)?;
  if m.height() < 2 {
    return Err(EvalError::domain("minor", "matrix is too small to have minors"));
  }
  expand(alg, &m.minor(index))
}

fn cofactor_at(alg: &Algebra<'_>, m: &Matrix<Value>, index: MatrixIndex) -> Result<Value, EvalError> {
  let minor = expand(alg, &m.minor(index))?;
  if (index.x + index.y) % 2 == 0 { Ok(minor) } else { alg.neg(&minor) }
}

pub fn cofactor(alg: &Algebra<'_>, m: &Matrix<Value>, index: MatrixIndex) -> Result<Value, EvalError> {
  require_square("cofactor", m)?;
  if m.height() < 2 {
    return Err(EvalError::domain("cofactor", "matrix is too small to have cofactors"));
  }
  cofactor_at(alg, m, index)
}

/// The matrix of cofactors.
pub fn comatrix(alg: &Algebra<'_>, m: &Matrix<Value>) -> Result<Matrix<Value>, EvalError> {
  require_square("comatrix", m)?;
  if m.height() == 1 {
    return Ok(identity(1));
  }
  let n = m.height();
  let mut body = Vec::with_capacity(n);
  for y in 0..n {
    let row = (0..n).map(|x| cofactor_at(alg, m, MatrixIndex { y, x })).collect::<Result<Vec<_>, _>>()?;
    body.push(row);
  }
  Matrix::new(body).map_err(|err| EvalError::domain("comatrix", err.to_string()))
}

pub fn adjugate(alg: &Algebra<'_>, m: &Matrix<Value>) -> Result<Matrix<Value>, EvalError> {
  Ok(comatrix(alg, m)?.transpose())
}

pub fn inverse(alg: &Algebra<'_>, m: &Matrix<Value>) -> Result<Matrix<Value>, EvalError> {
  require_square("inv", m)?;
  let det = expand(alg, m)?;
  if is_zero(&det) {
    return Err(EvalError::domain("inv", "matrix is singular"));
  }
  let adj = adjugate(alg, m)?;
  let mut body = Vec::with_capacity(adj.height());
  for row in adj.rows() {
    body.push(row.iter().map(|elem| alg.div(elem, &det)).collect::<Result<Vec<_>, _>>()?);
  }
  Matrix::new(body).map_err(|err| EvalError::domain("inv", err.to_string()))
}

/// Integer powers of a square matrix. Negative powers invert first.
pub fn power(alg: &Algebra<'_>, m: &Matrix<Value>, exponent: i64) -> Result<Matrix<Value>, EvalError> {
  require_square("^", m)?;
  let base = if exponent < 0 { inverse(alg, m)? } else { m.clone() };
  pow_by_squaring(base, exponent.unsigned_abs(), identity(m.height()), |a, b| product(alg, a, b))
}

fn is_zero(value: &Value) -> bool {
  match value {
    Value::Number(x) => *x == 0.0,
    Value::ValueUnit(x) => x.value.as_number() == Some(0.0),
    _ => false,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::Catalog;

  fn matrix(rows: &[&[f64]]) -> Matrix<Value> {
    Matrix::new(rows.iter().map(|row| row.iter().map(|x| Value::Number(*x)).collect()).collect()).unwrap()
  }

  fn numbers(m: Matrix<Value>) -> Vec<Vec<f64>> {
    m.into_row_major().into_iter()
      .map(|row| row.into_iter().map(|v| v.as_number().unwrap()).collect())
      .collect()
  }

  #[test]
  fn test_product() {
    let catalog = Catalog::new();
    let alg = Algebra::new(&catalog);
    let a = matrix(&[&[1.0, 2.0], &[3.0, 4.0]]);
    let b = matrix(&[&[5.0], &[6.0]]);
    assert_eq!(numbers(product(&alg, &a, &b).unwrap()), vec![vec![17.0], vec![39.0]]);
    assert!(product(&alg, &b, &b).is_err());
  }

  #[test]
  fn test_determinant() {
    let catalog = Catalog::new();
    let alg = Algebra::new(&catalog);
    let m = matrix(&[&[2.0, 0.0, 1.0], &[1.0, 3.0, 2.0], &[1.0, 1.0, 2.0]]);
    assert_eq!(determinant(&alg, &m).unwrap().as_number(), Some(6.0));
    assert_eq!(determinant(&alg, &matrix(&[&[7.0]])).unwrap().as_number(), Some(7.0));
    assert!(determinant(&alg, &matrix(&[&[1.0, 2.0]])).is_err());
  }

  #[test]
  fn test_minor_and_cofactor() {
    let catalog = Catalog::new();
    let alg = Algebra::new(&catalog);
    let m = matrix(&[&[1.0, 2.0], &[3.0, 4.0]]);
    assert_eq!(minor(&alg, &m, MatrixIndex { y: 0, x: 1 }).unwrap().as_number(), Some(3.0));
    assert_eq!(cofactor(&alg, &m, MatrixIndex { y: 0, x: 1 }).unwrap().as_number(), Some(-3.0));
    assert_eq!(numbers(comatrix(&alg, &m).unwrap()), vec![vec![4.0, -3.0], vec![-2.0, 1.0]]);
    assert_eq!(numbers(adjugate(&alg, &m).unwrap()), vec![vec![4.0, -2.0], vec![-3.0, 1.0]]);
  }

  #[test]
  fn test_inverse() {
    let catalog = Catalog::new();
    let alg = Algebra::new(&catalog);
    let m = matrix(&[&[4.0, 7.0], &[2.0, 6.0]]);
    let inv = numbers(inverse(&alg, &m).unwrap());
    assert_eq!(inv, vec![vec![0.6, -0.7], vec![-0.2, 0.4]]);
    let singular = matrix(&[&[1.0, 2.0], &[2.0, 4.0]]);
    assert_eq!(inverse(&alg, &singular).unwrap_err(), EvalError::domain("inv", "matrix is singular"));
  }

  #[test]
  fn test_power() {
    let catalog = Catalog::new();
    let alg = Algebra::new(&catalog);
    let m = matrix(&[&[1.0, 1.0], &[1.0, 0.0]]);
    assert_eq!(numbers(power(&alg, &m, 5).unwrap()), vec![vec![8.0, 5.0], vec![5.0, 3.0]]);
    assert_eq!(numbers(power(&alg, &m, 0).unwrap()), vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    let back = power(&alg, &m, -1).unwrap();
    assert_eq!(numbers(back), vec![vec![0.0, 1.0], vec![1.0, -1.0]]);
  }
}
