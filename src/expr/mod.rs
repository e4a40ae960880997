
//! The expression language: tokens, operators, and the expression
//! tree produced by the parser.

pub mod operator;
pub mod parser;
pub mod tokenizer;

pub use operator::{Operator, OperatorTable, BinaryOp, UnaryOp};
pub use parser::{ExprParser, ParseError, parse_expression};
pub use tokenizer::{ExprTokenizer, Token, TokenData, TokenizerError, lex};

use std::fmt::{self, Display, Formatter};

/// A parsed expression. Evaluation is a direct walk over this tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
  Number(f64),
  String(String),
  Boolean(bool),
  Ident(String),
  /// A bracketed list. A list with more than one row (rows are
  /// separated by `;`) is a matrix.
  List(Vec<Vec<Expr>>),
  /// A parenthesized or top-level sequence of comma-separated
  /// expressions.
  Sequence(Vec<Expr>),
  Unary { op: UnaryOp, arg: Box<Expr> },
  Binary { op: BinaryOp, left: Box<Expr>, right: Box<Expr> },
  /// Two terms with no operator between them: multiplication, or
  /// function application if the left-hand side is a function.
  Juxtapose(Box<Expr>, Box<Expr>),
  Assign { name: String, value: Box<Expr> },
}

impl Expr {
  pub fn unary(op: UnaryOp, arg: Expr) -> Self {
    Expr::Unary { op, arg: Box::new(arg) }
  }

  pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
    Expr::Binary { op, left: Box::new(left), right: Box::new(right) }
  }

  pub fn juxtapose(left: Expr, right: Expr) -> Self {
    Expr::Juxtapose(Box::new(left), Box::new(right))
  }

  pub fn ident(name: impl Into<String>) -> Self {
    Expr::Ident(name.into())
  }
}

fn write_list(f: &mut Formatter<'_>, elems: &[Expr]) -> fmt::Result {
  for (i, elem) in elems.iter().enumerate() {
    if i > 0 {
      write!(f, ", ")?;
    }
    write!(f, "{elem}")?;
  }
  Ok(())
}

impl Display for Expr {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self {
      Expr::Number(n) => write!(f, "{n}"),
      Expr::String(s) => write!(f, "{s:?}"),
      Expr::Boolean(b) => write!(f, "{b}"),
      Expr::Ident(name) => write!(f, "{name}"),
      Expr::List(rows) => {
        write!(f, "[")?;
        for (i, row) in rows.iter().enumerate() {
          if i > 0 {
            write!(f, "; ")?;
          }
          write_list(f, row)?;
        }
        write!(f, "]")
      }
      Expr::Sequence(elems) => {
        write!(f, "(")?;
        write_list(f, elems)?;
        write!(f, ")")
      }
      Expr::Unary { op, arg } => write!(f, "({}{arg})", op.symbol()),
      Expr::Binary { op, left, right } => write!(f, "({left} {} {right})", op.symbol()),
      Expr::Juxtapose(left, right) => write!(f, "({left} {right})"),
      Expr::Assign { name, value } => write!(f, "({name} = {value})"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_display() {
    let expr = Expr::binary(
      BinaryOp::Add,
      Expr::Number(2.0),
      Expr::juxtapose(Expr::ident("sin"), Expr::unary(UnaryOp::Neg, Expr::ident("x"))),
    );
    assert_eq!(expr.to_string(), "(2 + (sin (-x)))");
    let list = Expr::List(vec![vec![Expr::Number(1.0), Expr::Number(2.0)], vec![Expr::Number(3.0), Expr::Number(4.0)]]);
    assert_eq!(list.to_string(), "[1, 2; 3, 4]");
  }
}
