
/// The precedence of an operator. Larger values bind more tightly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Precedence(u64);

impl Precedence {
  pub const fn new(n: u64) -> Precedence {
    Precedence(n)
  }
}
