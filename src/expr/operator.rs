
//! Operators of the expression language and their precedence table.

use crate::parsing::operator::{Precedence, Associativity};

use std::collections::{hash_map, HashMap};

/// Binary operations. Several symbols may map to the same operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
  Power,
  /// `x _ n` is `x * 10^n`, or a decimal prefix applied to a unit.
  Prefix10,
  /// `x ↓ n` is `x * 2^n`, or a binary prefix applied to a unit.
  Prefix2,
  /// `n √ x` is the `n`th root of `x`.
  Root,
  At,
  Convert,
  Mul,
  Div,
  Mod,
  IntDiv,
  Add,
  Sub,
  Shl,
  Shr,
  BitAnd,
  BitXor,
  BitOr,
  Concat,
  Lt,
  Le,
  Gt,
  Ge,
  Eq,
  Ne,
  And,
  Or,
  Xor,
  Assign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
  Plus,
  Neg,
  BitNot,
  Not,
  Sqrt,
  Cbrt,
  FourthRoot,
}

/// A binary operator symbol, with the operation it denotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator {
  symbol: String,
  op: BinaryOp,
  associativity: Associativity,
  precedence: Precedence,
}

/// A table of binary operators, indexed by symbol.
#[derive(Debug, Clone, Default)]
pub struct OperatorTable {
  by_symbol: HashMap<String, Operator>,
}

pub const EXPONENT_PRECEDENCE: Precedence = Precedence::new(200);
pub const AT_PRECEDENCE: Precedence = Precedence::new(170);
pub const CONVERT_PRECEDENCE: Precedence = Precedence::new(160);
pub const ASSIGN_PRECEDENCE: Precedence = Precedence::new(40);

impl BinaryOp {
  /// The canonical symbol, used when printing expressions.
  pub fn symbol(self) -> &'static str {
    match self {
      BinaryOp::Power => "^",
      BinaryOp::Prefix10 => "_",
      BinaryOp::Prefix2 => "↓",
      BinaryOp::Root => "√",
      BinaryOp::At => "@",
      BinaryOp::Convert => "to",
      BinaryOp::Mul => "*",
      BinaryOp::Div => "/",
      BinaryOp::Mod => "%",
      BinaryOp::IntDiv => "//",
      BinaryOp::Add => "+",
      BinaryOp::Sub => "-",
      BinaryOp::Shl => "<<",
      BinaryOp::Shr => ">>",
      BinaryOp::BitAnd => "&",
      BinaryOp::BitXor => "⊕",
      BinaryOp::BitOr => "|",
      BinaryOp::Concat => ".",
      BinaryOp::Lt => "<",
      BinaryOp::Le => "<=",
      BinaryOp::Gt => ">",
      BinaryOp::Ge => ">=",
      BinaryOp::Eq => "==",
      BinaryOp::Ne => "!=",
      BinaryOp::And => "&&",
      BinaryOp::Or => "||",
      BinaryOp::Xor => "^^",
      BinaryOp::Assign => "=",
    }
  }
}

impl UnaryOp {
  pub const SYMBOLS: [&'static str; 9] = ["+", "-", "−", "~", "!", "¬", "√", "∛", "∜"];

  pub fn from_symbol(symbol: &str) -> Option<UnaryOp> {
    match symbol {
      "+" => Some(UnaryOp::Plus),
      "-" | "−" => Some(UnaryOp::Neg),
      "~" => Some(UnaryOp::BitNot),
      "!" | "¬" => Some(UnaryOp::Not),
      "√" => Some(UnaryOp::Sqrt),
      "∛" => Some(UnaryOp::Cbrt),
      "∜" => Some(UnaryOp::FourthRoot),
      _ => None,
    }
  }

  pub fn symbol(self) -> &'static str {
    match self {
      UnaryOp::Plus => "+",
      UnaryOp::Neg => "-",
      UnaryOp::BitNot => "~",
      UnaryOp::Not => "!",
      UnaryOp::Sqrt => "√",
      UnaryOp::Cbrt => "∛",
      UnaryOp::FourthRoot => "∜",
    }
  }
}

impl Operator {
  pub fn new(symbol: impl Into<String>, op: BinaryOp, associativity: Associativity, precedence: Precedence) -> Self {
    Self {
      symbol: symbol.into(),
      op,
      associativity,
      precedence,
    }
  }

  pub fn symbol(&self) -> &str {
    &self.symbol
  }

  pub fn op(&self) -> BinaryOp {
    self.op
  }

  pub fn associativity(&self) -> Associativity {
    self.associativity
  }

  pub fn precedence(&self) -> Precedence {
    self.precedence
  }

  /// Whether the operator is spelled as a word (`to`, `at`) rather
  /// than with symbols. Word operators are lexed as identifiers.
  pub fn is_word(&self) -> bool {
    self.symbol.chars().all(char::is_alphabetic)
  }
}

impl OperatorTable {
  pub fn new() -> OperatorTable {
    OperatorTable::default()
  }

  pub fn with_capacity(capacity: usize) -> OperatorTable {
    OperatorTable {
      by_symbol: HashMap::with_capacity(capacity),
    }
  }

  pub fn get(&self, symbol: &str) -> Option<&Operator> {
    self.by_symbol.get(symbol)
  }

  pub fn insert(&mut self, op: Operator) {
    self.by_symbol.insert(op.symbol().to_owned(), op);
  }

  pub fn iter(&self) -> impl Iterator<Item = &Operator> {
    self.by_symbol.values()
  }

  /// The distinct precedences of the generic binary levels between
  /// assignment and conversion, loosest first.
  pub fn binary_levels(&self) -> Vec<Precedence> {
    let mut levels: Vec<Precedence> = self.iter()
      .map(Operator::precedence)
      .filter(|p| *p < CONVERT_PRECEDENCE && *p > ASSIGN_PRECEDENCE)
      .collect();
    levels.sort();
    levels.dedup();
    levels
  }

  pub fn common_operators() -> OperatorTable {
    use BinaryOp::*;
    let levels: [(u64, Associativity, &[(&str, BinaryOp)]); 15] = [
      (200, Associativity::Right, &[("**", Power), ("^", Power), ("↑", Power), ("_", Prefix10), ("↓", Prefix2), ("√", Root)]),
      (170, Associativity::Left, &[("@", At), ("at", At)]),
      (160, Associativity::Left, &[("=>", Convert), ("->", Convert), ("→", Convert), ("in", Convert), ("to", Convert)]),
      (150, Associativity::Left, &[("*", Mul), ("/", Div), ("%", Mod), ("×", Mul), ("÷", Div), ("//", IntDiv), ("·", Mul)]),
      (140, Associativity::Left, &[("+", Add), ("-", Sub), ("−", Sub)]),
      (130, Associativity::Left, &[("<<", Shl), (">>", Shr)]),
      (120, Associativity::Left, &[("&", BitAnd)]),
      (110, Associativity::Left, &[("⊕", BitXor)]),
      (100, Associativity::Left, &[("|", BitOr)]),
      (90, Associativity::Left, &[(".", Concat), ("..", Concat)]),
      (80, Associativity::Left, &[("<", Lt), ("<=", Le), (">", Gt), (">=", Ge), ("≤", Le), ("≥", Ge)]),
      (70, Associativity::Left, &[("==", Eq), ("!=", Ne), ("≠", Ne), ("<>", Ne)]),
      (60, Associativity::Left, &[("&&", And), ("∧", And)]),
      (50, Associativity::Left, &[("||", Or), ("∨", Or), ("^^", Xor), ("⊻", Xor)]),
      (40, Associativity::Right, &[("=", Assign)]),
    ];
    levels.into_iter()
      .flat_map(|(prec, assoc, ops)| {
        ops.iter().map(move |(symbol, op)| Operator::new(*symbol, *op, assoc, Precedence::new(prec)))
      })
      .collect()
  }
}

impl IntoIterator for OperatorTable {
  type Item = Operator;
  type IntoIter = hash_map::IntoValues<String, Operator>;

  fn into_iter(self) -> Self::IntoIter {
    self.by_symbol.into_values()
  }
}

impl FromIterator<Operator> for OperatorTable {
  fn from_iter<I>(iter: I) -> Self
  where I : IntoIterator<Item = Operator> {
    let iter = iter.into_iter();
    let (len_bound, _) = iter.size_hint();
    let mut table = OperatorTable::with_capacity(len_bound);
    for op in iter {
      table.insert(op);
    }
    table
  }
}
