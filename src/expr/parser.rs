
//! Recursive-descent parser for the expression language.
//!
//! From tightest to loosest: factors, exponentiation, juxtaposition,
//! unary prefix operators, `@`, conversion, the generic binary levels
//! of the [`OperatorTable`], assignment, and finally comma/semicolon
//! sequences. Associativity is read from the table.

use super::Expr;
use super::operator::{
  BinaryOp, Operator, OperatorTable, UnaryOp,
  EXPONENT_PRECEDENCE, AT_PRECEDENCE, CONVERT_PRECEDENCE, ASSIGN_PRECEDENCE,
};
use super::tokenizer::{ExprTokenizer, Token, TokenData, TokenizerError};
use crate::parsing::operator::Precedence;
use crate::parsing::source::Span;
use crate::parsing::tokenizer::TokenizerState;

use thiserror::Error;

#[derive(Clone, Debug)]
pub struct ExprParser<'a> {
  operator_table: &'a OperatorTable,
  levels: Vec<Precedence>,
}

#[derive(Debug, Clone, Error, PartialEq)]
#[non_exhaustive]
pub enum ParseError {
  #[error("Unexpected '{found}' at {span}, expected {expected}")]
  Unexpected { found: TokenData, span: Span, expected: &'static str },
  #[error("Unexpected end of input, expected {expected}")]
  UnexpectedEof { expected: &'static str },
  #[error("Only a bare identifier can be assigned to (at {span})")]
  InvalidAssignment { span: Span },
  #[error("{0}")]
  Tokenizer(#[from] TokenizerError),
}

/// Parses a token stream with the common operator table.
pub fn parse_expression(tokens: &[Token]) -> Result<Expr, ParseError> {
  let table = OperatorTable::common_operators();
  ExprParser::new(&table).parse(tokens)
}

struct Cursor<'p, 't> {
  parser: &'p ExprParser<'p>,
  tokens: &'t [Token],
  pos: usize,
}

impl<'a> ExprParser<'a> {
  pub fn new(operator_table: &'a OperatorTable) -> Self {
    Self {
      operator_table,
      levels: operator_table.binary_levels(),
    }
  }

  pub fn operator_table(&self) -> &'a OperatorTable {
    self.operator_table
  }

  pub fn parse(&self, tokens: &[Token]) -> Result<Expr, ParseError> {
    let mut cursor = Cursor { parser: self, tokens, pos: 0 };
    let expr = cursor.sequence()?;
    match cursor.peek() {
      None => Ok(expr),
      Some(token) => Err(ParseError::Unexpected {
        found: token.data.clone(),
        span: token.span,
        expected: "end of input",
      }),
    }
  }

  /// Lexes and parses a string in one step.
  pub fn parse_str(&self, input: &str) -> Result<Expr, ParseError> {
    let tokenizer = ExprTokenizer::new(self.operator_table);
    let tokens = tokenizer.read_tokens(&mut TokenizerState::new(input))?;
    self.parse(&tokens)
  }
}

impl<'p, 't> Cursor<'p, 't> {
  fn peek(&self) -> Option<&'t Token> {
    self.tokens.get(self.pos)
  }

  fn advance(&mut self) -> Option<&'t Token> {
    let token = self.tokens.get(self.pos)?;
    self.pos += 1;
    Some(token)
  }

  fn peek_is(&self, data: &TokenData) -> bool {
    self.peek().is_some_and(|t| &t.data == data)
  }

  fn unexpected(&self, expected: &'static str) -> ParseError {
    match self.peek() {
      None => ParseError::UnexpectedEof { expected },
      Some(token) => ParseError::Unexpected { found: token.data.clone(), span: token.span, expected },
    }
  }

  /// The binary operator at the cursor, if any, and only if it sits at
  /// the given precedence.
  fn peek_binary_at(&self, precedence: Precedence) -> Option<&'p Operator> {
    let TokenData::Operator(symbol) = &self.peek()?.data else {
      return None;
    };
    self.parser.operator_table.get(symbol).filter(|op| op.precedence() == precedence)
  }

  fn peek_unary(&self) -> Option<UnaryOp> {
    match &self.peek()?.data {
      TokenData::Operator(symbol) => UnaryOp::from_symbol(symbol),
      _ => None,
    }
  }

  fn starts_factor(&self) -> bool {
    matches!(
      self.peek().map(|t| &t.data),
      Some(TokenData::Number(_) | TokenData::String(_) | TokenData::Boolean(_) |
           TokenData::Ident(_) | TokenData::LeftParen | TokenData::LeftBracket(_)),
    )
  }

  fn span_from(&self, start: usize) -> Span {
    let first = self.tokens[start].span;
    let last = self.tokens[self.pos.saturating_sub(1).max(start)].span;
    first.merge(last)
  }

  fn sequence(&mut self) -> Result<Expr, ParseError> {
    let mut elems = vec![self.assignment()?];
    while self.peek_is(&TokenData::Comma) || self.peek_is(&TokenData::Semicolon) {
      self.advance();
      elems.push(self.assignment()?);
    }
    if elems.len() == 1 {
      Ok(elems.swap_remove(0))
    } else {
      Ok(Expr::Sequence(elems))
    }
  }

  fn assignment(&mut self) -> Result<Expr, ParseError> {
    let start = self.pos;
    let lhs = self.binary_level(0)?;
    let Some(op) = self.peek_binary_at(ASSIGN_PRECEDENCE) else {
      return Ok(lhs);
    };
    debug_assert_eq!(op.op(), BinaryOp::Assign);
    let Expr::Ident(name) = lhs else {
      return Err(ParseError::InvalidAssignment { span: self.span_from(start) });
    };
    self.advance();
    let value = self.assignment()?;
    Ok(Expr::Assign { name, value: Box::new(value) })
  }

  /// Level `index` of the table's binary levels, which run from
  /// loosest to tightest. Operands are parsed at the next tighter
  /// level; a right-associative operator takes the rest of its own
  /// level as its right operand.
  fn binary_level(&mut self, index: usize) -> Result<Expr, ParseError> {
    let Some(&precedence) = self.parser.levels.get(index) else {
      return self.conversion();
    };
    let mut lhs = self.binary_level(index + 1)?;
    while let Some(op) = self.peek_binary_at(precedence) {
      self.advance();
      if op.associativity().is_right_assoc() {
        let rhs = self.binary_level(index)?;
        return Ok(Expr::binary(op.op(), lhs, rhs));
      }
      let rhs = self.binary_level(index + 1)?;
      lhs = Expr::binary(op.op(), lhs, rhs);
    }
    Ok(lhs)
  }

  fn conversion(&mut self) -> Result<Expr, ParseError> {
    let mut lhs = self.at()?;
    while let Some(op) = self.peek_binary_at(CONVERT_PRECEDENCE) {
      self.advance();
      let rhs = self.at()?;
      lhs = Expr::binary(op.op(), lhs, rhs);
    }
    Ok(lhs)
  }

  fn at(&mut self) -> Result<Expr, ParseError> {
    let mut lhs = self.unary()?;
    while let Some(op) = self.peek_binary_at(AT_PRECEDENCE) {
      self.advance();
      let rhs = self.unary()?;
      lhs = Expr::binary(op.op(), lhs, rhs);
    }
    Ok(lhs)
  }

  fn unary(&mut self) -> Result<Expr, ParseError> {
    if let Some(op) = self.peek_unary() {
      self.advance();
      let arg = self.unary()?;
      return Ok(Expr::unary(op, arg));
    }
    self.juxtaposition()
  }

  fn juxtaposition(&mut self) -> Result<Expr, ParseError> {
    let mut lhs = self.exponent()?;
    while self.starts_factor() {
      let rhs = self.exponent()?;
      lhs = Expr::juxtapose(lhs, rhs);
    }
    Ok(lhs)
  }

  fn exponent(&mut self) -> Result<Expr, ParseError> {
    let mut lhs = self.factor()?;
    while let Some(op) = self.peek_binary_at(EXPONENT_PRECEDENCE) {
      self.advance();
      let right_assoc = op.associativity().is_right_assoc();
      let rhs = self.exponent_operand(right_assoc)?;
      lhs = Expr::binary(op.op(), lhs, rhs);
      if right_assoc {
        break;
      }
    }
    Ok(lhs)
  }

  /// The right-hand side of an exponent-level operator. It may carry
  /// its own sign, as in `2^-1`.
  fn exponent_operand(&mut self, right_assoc: bool) -> Result<Expr, ParseError> {
    if let Some(op) = self.peek_unary() {
      self.advance();
      let arg = self.exponent_operand(right_assoc)?;
      return Ok(Expr::unary(op, arg));
    }
    if right_assoc { self.exponent() } else { self.factor() }
  }

  fn factor(&mut self) -> Result<Expr, ParseError> {
    let Some(token) = self.peek() else {
      return Err(ParseError::UnexpectedEof { expected: "an expression" });
    };
    let expr = match &token.data {
      TokenData::Number(n) => Expr::Number(*n),
      TokenData::String(s) => Expr::String(s.clone()),
      TokenData::Boolean(b) => Expr::Boolean(*b),
      TokenData::Ident(name) => Expr::Ident(name.clone()),
      TokenData::LeftParen => {
        self.advance();
        return self.parenthesized();
      }
      TokenData::LeftBracket(open) => {
        let close = if *open == '{' { '}' } else { ']' };
        self.advance();
        return self.list(close);
      }
      _ => return Err(self.unexpected("an expression")),
    };
    self.advance();
    Ok(expr)
  }

  fn parenthesized(&mut self) -> Result<Expr, ParseError> {
    if self.peek_is(&TokenData::RightParen) {
      self.advance();
      return Ok(Expr::Sequence(Vec::new()));
    }
    let inner = self.sequence()?;
    if !self.peek_is(&TokenData::RightParen) {
      return Err(self.unexpected("')'"));
    }
    self.advance();
    Ok(inner)
  }

  fn list(&mut self, close: char) -> Result<Expr, ParseError> {
    let close_token = TokenData::RightBracket(close);
    let mut rows = Vec::new();
    if self.peek_is(&close_token) {
      self.advance();
      return Ok(Expr::List(rows));
    }
    let mut row = vec![self.assignment()?];
    loop {
      match self.peek().map(|t| &t.data) {
        Some(TokenData::Comma) => {
          self.advance();
          row.push(self.assignment()?);
        }
        Some(TokenData::Semicolon) => {
          self.advance();
          rows.push(std::mem::take(&mut row));
          row.push(self.assignment()?);
        }
        Some(data) if *data == close_token => {
          self.advance();
          rows.push(row);
          return Ok(Expr::List(rows));
        }
        _ => {
          return Err(self.unexpected(if close == '}' { "',', ';' or '}'" } else { "',', ';' or ']'" }));
        }
      }
    }
  }
}
