
use super::operator::{OperatorTable, UnaryOp};
use crate::parsing::source::{Span, SourceOffset};
use crate::parsing::tokenizer::TokenizerState;
use crate::util::regex_opt_with;

use phf::phf_map;
use regex::Regex;
use once_cell::sync::Lazy;
use thiserror::Error;

use std::f64::consts::{PI, E};
use std::fmt::{self, Display, Formatter};

#[derive(Clone, Debug)]
pub struct ExprTokenizer<'a> {
  operator_table: &'a OperatorTable,
  operator_regex: Regex,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
  pub data: TokenData,
  pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenData {
  Number(f64),
  String(String),
  Boolean(bool),
  Ident(String),
  /// A binary or unary operator, by symbol. Word operators such as
  /// `to` are also reported here.
  Operator(String),
  LeftParen,
  RightParen,
  /// `[` or `{`.
  LeftBracket(char),
  /// `]` or `}`.
  RightBracket(char),
  Comma,
  Semicolon,
}

#[derive(Debug, Clone, Error, PartialEq)]
#[non_exhaustive]
pub enum TokenizerError {
  #[error("Unexpected '{0}' at {1}")]
  UnexpectedChar(char, SourceOffset),
  #[error("Unterminated string literal starting at {0}")]
  UnterminatedString(SourceOffset),
  #[error("Malformed number '{0}' at {1}")]
  BadNumber(String, SourceOffset),
}

#[derive(Debug, Clone, Copy)]
enum Reserved {
  Number(f64),
  Boolean(bool),
  Operator(&'static str),
}

static RESERVED_WORDS: phf::Map<&'static str, Reserved> = phf_map! {
  "inf" => Reserved::Number(f64::INFINITY),
  "nan" => Reserved::Number(f64::NAN),
  "pi" => Reserved::Number(PI),
  "π" => Reserved::Number(PI),
  "e" => Reserved::Number(E),
  "true" => Reserved::Boolean(true),
  "false" => Reserved::Boolean(false),
  "at" => Reserved::Operator("at"),
  "to" => Reserved::Operator("to"),
  "in" => Reserved::Operator("in"),
};

/// Lexes a whole string with the common operator table.
pub fn lex(input: &str) -> Result<Vec<Token>, TokenizerError> {
  let table = OperatorTable::common_operators();
  let tokenizer = ExprTokenizer::new(&table);
  tokenizer.read_tokens(&mut TokenizerState::new(input))
}

fn unescape(body: &str) -> String {
  let mut result = String::with_capacity(body.len());
  let mut chars = body.chars();
  while let Some(ch) = chars.next() {
    if ch != '\\' {
      result.push(ch);
      continue;
    }
    match chars.next() {
      Some('n') => result.push('\n'),
      Some('t') => result.push('\t'),
      Some('r') => result.push('\r'),
      Some('0') => result.push('\0'),
      Some(other) => result.push(other),
      None => result.push('\\'),
    }
  }
  result
}

impl<'a> ExprTokenizer<'a> {
  pub fn new(operator_table: &'a OperatorTable) -> Self {
    let operator_names = operator_table.iter()
      .filter(|op| !op.is_word())
      .map(|op| op.symbol())
      .chain(UnaryOp::SYMBOLS);
    let operator_regex = regex_opt_with(operator_names, |s| format!("^{s}"));
    Self { operator_table, operator_regex }
  }

  pub fn read_tokens(&self, state: &mut TokenizerState<'_>) -> Result<Vec<Token>, TokenizerError> {
    let start_pos = state.current_pos();
    let mut tokens = Vec::new();
    loop {
      state.consume_spaces();
      if state.is_eof() {
        return Ok(tokens);
      }
      match self.read_one_token(state) {
        Ok(token) => {
          tokens.push(token);
        }
        Err(err) => {
          state.seek(start_pos);
          return Err(err);
        }
      }
    }
  }

  pub fn read_one_token(&self, state: &mut TokenizerState<'_>) -> Result<Token, TokenizerError> {
    if let Some(tok) = self.read_char_token(state) {
      Ok(tok)
    } else if let Some(res) = self.read_string_literal(state) {
      res
    } else if let Some(res) = self.read_number_literal(state) {
      res
    } else if let Some(tok) = self.read_word(state) {
      Ok(tok)
    } else if let Some(tok) = self.read_operator(state) {
      Ok(tok)
    } else {
      let pos = state.current_pos();
      // An empty remainder never reaches here from `read_tokens`.
      let ch = state.peek().unwrap_or('\0');
      Err(TokenizerError::UnexpectedChar(ch, pos))
    }
  }

  fn read_char_token(&self, state: &mut TokenizerState<'_>) -> Option<Token> {
    let data = match state.peek()? {
      '(' => TokenData::LeftParen,
      ')' => TokenData::RightParen,
      '[' => TokenData::LeftBracket('['),
      '{' => TokenData::LeftBracket('{'),
      ']' => TokenData::RightBracket(']'),
      '}' => TokenData::RightBracket('}'),
      ',' => TokenData::Comma,
      ';' => TokenData::Semicolon,
      '∞' => TokenData::Number(f64::INFINITY),
      _ => return None,
    };
    let m = state.advance_char()?;
    Some(Token::new(data, m.span()))
  }

  fn read_string_literal(&self, state: &mut TokenizerState<'_>) -> Option<Result<Token, TokenizerError>> {
    static RE: Lazy<Regex> = Lazy::new(|| {
      Regex::new(r#"^(?:'((?:[^'\\]|\\.)*)'|"((?:[^"\\]|\\.)*)"|`((?:[^`\\]|\\.)*)`)"#).unwrap()
    });
    let quote = state.peek()?;
    if !matches!(quote, '\'' | '"' | '`') {
      return None;
    }
    let start = state.current_pos();
    let Some(m) = state.read_regex_with_captures(&RE) else {
      return Some(Err(TokenizerError::UnterminatedString(start)));
    };
    let body = m.get(1).or_else(|| m.get(2)).or_else(|| m.get(3)).unwrap_or_default();
    Some(Ok(Token::new(TokenData::String(unescape(body)), m.span())))
  }

  fn read_number_literal(&self, state: &mut TokenizerState<'_>) -> Option<Result<Token, TokenizerError>> {
    static RE: Lazy<Regex> = Lazy::new(|| {
      Regex::new(r"^(\d+(?:\.\d*)?|\.\d+)(?:[eE_]([-+]?\d+))?").unwrap()
    });
    let start = state.current_pos();
    let m = state.read_regex_with_captures(&RE)?;
    let mantissa = m.get(1).unwrap_or_default();
    let text = match m.get(2) {
      Some(exponent) => format!("{mantissa}e{exponent}"),
      None => mantissa.to_owned(),
    };
    match text.parse::<f64>() {
      Ok(n) => Some(Ok(Token::new(TokenData::Number(n), m.span()))),
      Err(_) => {
        state.seek(start);
        Some(Err(TokenizerError::BadNumber(m.as_str().to_owned(), start)))
      }
    }
  }

  /// Identifiers and reserved words. An identifier is a currency
  /// symbol optionally followed by letters, or a letter (or degree
  /// sign) followed by letters, digits and degree signs.
  fn read_word(&self, state: &mut TokenizerState<'_>) -> Option<Token> {
    static RE: Lazy<Regex> = Lazy::new(|| {
      Regex::new(r"^(?:\p{Sc}\p{L}*|[\p{L}°][\p{L}\p{N}°]*)").unwrap()
    });
    let m = state.read_regex(&RE)?;
    let data = match RESERVED_WORDS.get(m.as_str()) {
      Some(Reserved::Number(n)) => TokenData::Number(*n),
      Some(Reserved::Boolean(b)) => TokenData::Boolean(*b),
      Some(Reserved::Operator(op)) => TokenData::Operator((*op).to_owned()),
      None => TokenData::Ident(m.as_str().to_owned()),
    };
    Some(Token::new(data, m.span()))
  }

  fn read_operator(&self, state: &mut TokenizerState<'_>) -> Option<Token> {
    state.read_regex(&self.operator_regex).map(|m| {
      Token::new(TokenData::Operator(m.as_str().to_owned()), m.span())
    })
  }

  pub fn operator_table(&self) -> &'a OperatorTable {
    self.operator_table
  }
}

impl Token {
  pub fn new(data: TokenData, span: Span) -> Self {
    Self { data, span }
  }
}

impl Display for TokenData {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self {
      TokenData::Number(n) => write!(f, "{n}"),
      TokenData::String(s) => write!(f, "{s:?}"),
      TokenData::Boolean(b) => write!(f, "{b}"),
      TokenData::Ident(name) => write!(f, "{name}"),
      TokenData::Operator(op) => write!(f, "{op}"),
      TokenData::LeftParen => write!(f, "("),
      TokenData::RightParen => write!(f, ")"),
      TokenData::LeftBracket(ch) | TokenData::RightBracket(ch) => write!(f, "{ch}"),
      TokenData::Comma => write!(f, ","),
      TokenData::Semicolon => write!(f, ";"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn data(input: &str) -> Vec<TokenData> {
    lex(input).unwrap().into_iter().map(|t| t.data).collect()
  }

  fn op(s: &str) -> TokenData {
    TokenData::Operator(s.to_owned())
  }

  fn span(start: usize, end: usize) -> Span {
    Span::new(SourceOffset(start), SourceOffset(end))
  }

  #[test]
  fn test_numbers() {
    assert_eq!(data("12"), vec![TokenData::Number(12.0)]);
    assert_eq!(data("1.5e3"), vec![TokenData::Number(1500.0)]);
    assert_eq!(data("2E-2"), vec![TokenData::Number(0.02)]);
    assert_eq!(data("5_3"), vec![TokenData::Number(5000.0)]);
    assert_eq!(data(".25"), vec![TokenData::Number(0.25)]);
    assert_eq!(data("3."), vec![TokenData::Number(3.0)]);
  }

  #[test]
  fn test_number_without_exponent_digits() {
    assert_eq!(data("2e"), vec![TokenData::Number(2.0), TokenData::Number(E)]);
    assert_eq!(data("2 x"), vec![TokenData::Number(2.0), TokenData::Ident("x".to_owned())]);
  }

  #[test]
  fn test_strings() {
    assert_eq!(data(r#""a\tb""#), vec![TokenData::String("a\tb".to_owned())]);
    assert_eq!(data(r"'it\'s'"), vec![TokenData::String("it's".to_owned())]);
    assert_eq!(data("`x`"), vec![TokenData::String("x".to_owned())]);
    assert_eq!(lex("'abc"), Err(TokenizerError::UnterminatedString(SourceOffset(0))));
  }

  #[test]
  fn test_identifiers_and_reserved_words() {
    assert_eq!(data("meter"), vec![TokenData::Ident("meter".to_owned())]);
    assert_eq!(data("log10"), vec![TokenData::Ident("log10".to_owned())]);
    assert_eq!(data("°C"), vec![TokenData::Ident("°C".to_owned())]);
    assert_eq!(data("$"), vec![TokenData::Ident("$".to_owned())]);
    assert_eq!(data("true"), vec![TokenData::Boolean(true)]);
    assert_eq!(data("pi"), vec![TokenData::Number(PI)]);
    assert_eq!(data("to"), vec![op("to")]);
    assert_eq!(data("total"), vec![TokenData::Ident("total".to_owned())]);
    assert!(matches!(data("nan")[0], TokenData::Number(n) if n.is_nan()));
    assert_eq!(data("∞"), vec![TokenData::Number(f64::INFINITY)]);
  }

  #[test]
  fn test_operators_longest_match() {
    assert_eq!(data("2**3"), vec![TokenData::Number(2.0), op("**"), TokenData::Number(3.0)]);
    assert_eq!(data("a=>b"), vec![TokenData::Ident("a".to_owned()), op("=>"), TokenData::Ident("b".to_owned())]);
    assert_eq!(data("a ≤ b"), vec![TokenData::Ident("a".to_owned()), op("≤"), TokenData::Ident("b".to_owned())]);
    assert_eq!(data("x^^y"), vec![TokenData::Ident("x".to_owned()), op("^^"), TokenData::Ident("y".to_owned())]);
    assert_eq!(data("!x"), vec![op("!"), TokenData::Ident("x".to_owned())]);
    assert_eq!(data("a!=b")[1], op("!="));
    assert_eq!(data("√2")[0], op("√"));
  }

  #[test]
  fn test_punctuation_and_spans() {
    let tokens = lex("[1, 2; 3]").unwrap();
    let kinds: Vec<_> = tokens.iter().map(|t| t.data.clone()).collect();
    assert_eq!(kinds, vec![
      TokenData::LeftBracket('['),
      TokenData::Number(1.0),
      TokenData::Comma,
      TokenData::Number(2.0),
      TokenData::Semicolon,
      TokenData::Number(3.0),
      TokenData::RightBracket(']'),
    ]);
    assert_eq!(tokens[3].span, span(4, 5));
  }

  #[test]
  fn test_unexpected_char() {
    assert_eq!(lex("2 ? 3"), Err(TokenizerError::UnexpectedChar('?', SourceOffset(2))));
  }
}
