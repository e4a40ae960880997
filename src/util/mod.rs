
//! Various utility functions.

pub mod matrix;

use regex::{Regex, escape};

use std::cmp::Reverse;

/// Constructs a regex which matches any string in `options`. Applies
/// the function `helper` to the resulting regex string before
/// compilation. If the result of `helper` is not a valid regular
/// expression, this function will panic.
pub fn regex_opt_with<'a, I, F>(options: I, helper: F) -> Regex
where I : IntoIterator<Item = &'a str>,
      F : FnOnce(String) -> String {
  // Put longer elements first, so we always match the longest thing
  // we can.
  let mut options: Vec<_> = options.into_iter().collect();
  options.sort_by_key(|a| Reverse(a.chars().count()));

  let regex_str = options.into_iter().map(escape).collect::<Vec<_>>().join("|");
  let regex_str = helper(format!("(?:{regex_str})"));
  Regex::new(&regex_str).unwrap_or_else(|_| {
    panic!("Invalid regular expression: {}", regex_str);
  })
}

pub fn clamp<T: PartialOrd>(val: T, min: T, max: T) -> T {
  if val < min { min } else if val > max { max } else { val }
}

/// If the collection is non-empty and all elements of the collection
/// are equal (under `PartialEq`), returns the first element of the
/// collection. If not, returns `None`.
pub fn uniq_element<I>(collection: I) -> Option<I::Item>
where I: IntoIterator,
      I::Item: PartialEq {
  let mut iter = collection.into_iter();
  let first_elem = iter.next()?;
  for elem in iter {
    if first_elem != elem {
      return None;
    }
  }
  Some(first_elem)
}

/// Raises `base` to the non-negative integer power `exponent` by
/// repeated squaring, using `mul` as the multiplication operation and
/// `one` as the identity. `mul` must be associative.
///
/// Negative exponents are the caller's problem: invert `base` first
/// and pass the absolute value.
pub fn pow_by_squaring<T, E, F>(base: T, exponent: u64, one: T, mut mul: F) -> Result<T, E>
where T: Clone,
      F: FnMut(&T, &T) -> Result<T, E> {
  let mut result = one;
  let mut square = base;
  let mut exponent = exponent;
  while exponent > 0 {
    if exponent & 1 == 1 {
      result = mul(&result, &square)?;
    }
    exponent >>= 1;
    if exponent > 0 {
      square = mul(&square, &square)?;
    }
  }
  Ok(result)
}
