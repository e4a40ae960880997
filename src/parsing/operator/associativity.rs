
/// Which way a chain of operators at the same precedence groups.
/// `a - b - c` is `(a - b) - c`; `a ^ b ^ c` is `a ^ (b ^ c)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Associativity {
  Left,
  Right,
}

impl Associativity {
  pub const fn is_right_assoc(self) -> bool {
    matches!(self, Associativity::Right)
  }
}
