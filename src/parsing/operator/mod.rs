
//! Precedence and associativity vocabulary shared by the operator
//! tables.

mod precedence;
mod associativity;

pub use precedence::Precedence;
pub use associativity::Associativity;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_precedence_ordering() {
    assert!(Precedence::new(2) > Precedence::new(1));
    assert_eq!(Precedence::new(3), Precedence::new(3));
  }

  #[test]
  fn test_associativity() {
    assert!(Associativity::Right.is_right_assoc());
    assert!(!Associativity::Left.is_right_assoc());
  }
}
