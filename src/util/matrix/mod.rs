
//! Very rudimentary matrix type which enforces consistency in the
//! dimensions of its data.

use crate::util::uniq_element;

use thiserror::Error;

use std::ops::Index;

/// A `Matrix<T>` is a vector of vectors of `T` in which each
/// constituent vector has the same length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix<T> {
  body: Vec<Vec<T>>,
}

/// An index into a matrix. Matrix indices are 0-based, like all Rust
/// data structures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixIndex {
  pub y: usize,
  pub x: usize,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("The dimensions of the matrix are inconsistent")]
pub struct MatrixDimsError;

impl<T> Matrix<T> {
  /// Constructs a matrix from row-major data, failing if the rows are
  /// not all of the same length. A matrix with no rows, or whose rows
  /// are all empty, is considered empty.
  pub fn new(body: Vec<Vec<T>>) -> Result<Matrix<T>, MatrixDimsError> {
    if !body.is_empty() && uniq_element(body.iter().map(|row| row.len())).is_none() {
      return Err(MatrixDimsError);
    }
    Ok(Matrix { body })
  }

  /// Calls `generator` for each index in a new `height * width`
  /// matrix to produce elements for that matrix. The generator will
  /// be called in row-major order.
  pub fn from_generator<F>(height: usize, width: usize, mut generator: F) -> Self
  where F: FnMut(MatrixIndex) -> T {
    let body = (0..height)
      .map(|y| (0..width).map(|x| generator(MatrixIndex { y, x })).collect())
      .collect();
    Matrix { body }
  }

  pub fn into_row_major(self) -> Vec<Vec<T>> {
    self.body
  }

  pub fn get(&self, index: MatrixIndex) -> Option<&T> {
    self.body
      .get(index.y)
      .and_then(|row| row.get(index.x))
  }

  pub fn rows(&self) -> impl Iterator<Item = &[T]> + '_ {
    self.body.iter().map(|row| row.as_slice())
  }

  pub fn width(&self) -> usize {
    self.body
      .first()
      .map(|row| row.len())
      .unwrap_or_default()
  }

  pub fn height(&self) -> usize {
    self.body.len()
  }

  pub fn is_empty(&self) -> bool {
    self.width() == 0
  }

  pub fn is_square(&self) -> bool {
    self.width() == self.height()
  }

  pub fn map<F, U>(self, mut f: F) -> Matrix<U>
  where F: FnMut(T) -> U {
    Matrix {
      body: self
        .body
        .into_iter()
        .map(|row| row.into_iter().map(&mut f).collect())
        .collect(),
    }
  }

  /// The matrix obtained by deleting row `index.y` and column
  /// `index.x` from `self`. Out-of-bounds indices delete nothing
  /// along that axis.
  pub fn minor(&self, index: MatrixIndex) -> Matrix<T>
  where T: Clone {
    let body = self.body.iter()
      .enumerate()
      .filter(|(y, _)| *y != index.y)
      .map(|(_, row)| {
        row.iter()
          .enumerate()
          .filter(|(x, _)| *x != index.x)
          .map(|(_, elem)| elem.clone())
          .collect()
      })
      .collect();
    Matrix { body }
  }

  pub fn transpose(self) -> Self {
    let width = self.width();
    let mut columns: Vec<Vec<T>> = (0..width).map(|_| Vec::with_capacity(self.height())).collect();
    for row in self.body {
      for (x, elem) in row.into_iter().enumerate() {
        columns[x].push(elem);
      }
    }
    Matrix { body: columns }
  }
}

impl<T> TryFrom<Vec<Vec<T>>> for Matrix<T> {
  type Error = MatrixDimsError;

  fn try_from(body: Vec<Vec<T>>) -> Result<Self, Self::Error> {
    Self::new(body)
  }
}

impl<T> Index<MatrixIndex> for Matrix<T> {
  type Output = T;

  fn index(&self, index: MatrixIndex) -> &Self::Output {
    &self.body[index.y][index.x]
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample() -> Matrix<i64> {
    Matrix::new(vec![
      vec![1, 2, 3],
      vec![4, 5, 6],
      vec![7, 8, 9],
    ]).unwrap()
  }

  #[test]
  fn test_inconsistent_rows() {
    Matrix::new(vec![vec![1, 2], vec![3]]).unwrap_err();
    Matrix::<i64>::new(vec![]).unwrap();
  }

  #[test]
  fn test_dimensions() {
    let m = Matrix::new(vec![vec![1, 2, 3], vec![4, 5, 6]]).unwrap();
    assert_eq!(m.height(), 2);
    assert_eq!(m.width(), 3);
    assert!(!m.is_square());
    assert!(sample().is_square());
  }

  #[test]
  fn test_minor() {
    let m = sample().minor(MatrixIndex { y: 0, x: 1 });
    assert_eq!(m.into_row_major(), vec![vec![4, 6], vec![7, 9]]);
  }

  #[test]
  fn test_transpose() {
    let m = Matrix::new(vec![vec![1, 2, 3], vec![4, 5, 6]]).unwrap().transpose();
    assert_eq!(m.into_row_major(), vec![vec![1, 4], vec![2, 5], vec![3, 6]]);
  }

  #[test]
  fn test_from_generator() {
    let m = Matrix::from_generator(2, 2, |idx| idx.y * 10 + idx.x);
    assert_eq!(m[MatrixIndex { y: 1, x: 0 }], 10);
    assert_eq!(m.get(MatrixIndex { y: 1, x: 1 }), Some(&11));
    assert_eq!(m.get(MatrixIndex { y: 2, x: 1 }), None);
  }
}
