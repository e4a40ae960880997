
use super::source::{SourceOffset, Span};
use crate::util::clamp;

use regex::{Regex, Captures};
use once_cell::sync::Lazy;

/// A cursor over a string being tokenized. Both the unit expression
/// grammar and the general expression lexer read their input through
/// this type.
#[derive(Debug, Clone)]
pub struct TokenizerState<'a> {
  whole_input: &'a str,
  input: &'a str,
  position: SourceOffset,
}

#[derive(Debug, Clone)]
pub struct TokenizerMatch<'a> {
  matched_str: &'a str,
  start: SourceOffset,
  end: SourceOffset,
}

#[derive(Debug)]
pub struct TokenizerCaptures<'a> {
  captures: Captures<'a>,
  start: SourceOffset,
  end: SourceOffset,
}

impl<'a> TokenizerState<'a> {
  pub fn new(input: &'a str) -> Self {
    Self {
      whole_input: input,
      input,
      position: SourceOffset(0)
    }
  }

  /// Total length of the input, including the part already consumed.
  pub fn len(&self) -> usize {
    self.whole_input.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn remaining(&self) -> &'a str {
    self.input
  }

  pub fn is_eof(&self) -> bool {
    self.input.is_empty()
  }

  pub fn peek(&self) -> Option<char> {
    self.input.chars().next()
  }

  /// Rewinds (or skips) to a byte offset, clamped to the input. The
  /// lexers only seek back to offsets they saw earlier, which always
  /// fall on a character boundary.
  pub fn seek(&mut self, mut pos: SourceOffset) {
    pos = clamp(pos, SourceOffset(0), SourceOffset(self.len()));
    self.position = pos;
    self.input = &self.whole_input[pos.0..];
  }

  /// Consumes `amount` bytes, or whatever is left if that is less,
  /// and returns the consumed text with its span.
  pub fn advance(&mut self, mut amount: usize) -> TokenizerMatch<'a> {
    amount = amount.min(self.input.len());

    let match_pos = self.current_pos();
    let (prefix, suffix) = self.input.split_at(amount);
    self.position.0 += amount;
    self.input = suffix;
    TokenizerMatch {
      matched_str: prefix,
      start: match_pos,
      end: match_pos + amount,
    }
  }

  /// Advances past exactly one character, if there is one.
  pub fn advance_char(&mut self) -> Option<TokenizerMatch<'a>> {
    let ch = self.peek()?;
    Some(self.advance(ch.len_utf8()))
  }

  pub fn current_pos(&self) -> SourceOffset {
    self.position
  }

  pub fn read_literal(&mut self, literal: &str) -> Option<TokenizerMatch<'a>> {
    self.input.starts_with(literal).then(|| {
      self.advance(literal.len())
    })
  }

  /// Consumes a non-empty match of `regex` at the cursor. Every
  /// token regex in this crate starts with `^`; an unanchored one is
  /// a bug and trips the assertion.
  pub fn read_regex(&mut self, regex: &Regex) -> Option<TokenizerMatch<'a>> {
    let m = regex.find(self.input)?;
    assert_eq!(m.start(), 0, "Regex must be anchored at the start of the input");
    if m.is_empty() {
      return None;
    }
    Some(self.advance(m.len()))
  }

  pub fn read_regex_with_captures(&mut self, regex: &Regex) -> Option<TokenizerCaptures<'a>> {
    let c = regex.captures(self.input)?;
    let whole = c.get(0).map_or(0, |m| m.len());
    let m = self.advance(whole);
    Some(TokenizerCaptures {
      captures: c,
      start: m.start(),
      end: m.end(),
    })
  }

  pub fn consume_spaces(&mut self) {
    static RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s+").unwrap());
    self.read_regex(&RE);
  }
}

impl<'h> TokenizerMatch<'h> {
  pub fn as_str(&self) -> &'h str {
    self.matched_str
  }
  pub fn start(&self) -> SourceOffset {
    self.start
  }
  pub fn end(&self) -> SourceOffset {
    self.end
  }
  pub fn span(&self) -> Span {
    Span::new(self.start, self.end)
  }
}

impl<'h> TokenizerCaptures<'h> {
  pub fn as_str(&self) -> &'h str {
    self.captures.get(0).map_or("", |m| m.as_str())
  }
  pub fn get(&self, i: usize) -> Option<&'h str> {
    self.captures.get(i).map(|m| m.as_str())
  }
  pub fn span(&self) -> Span {
    Span::new(self.start, self.end)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_seek_and_remaining() {
    let mut state = TokenizerState::new("abcd");
    assert_eq!(state.current_pos(), SourceOffset(0));
    assert_eq!(state.remaining(), "abcd");

    state.seek(SourceOffset(3));
    assert_eq!(state.remaining(), "d");
    assert_eq!(state.peek(), Some('d'));

    state.seek(SourceOffset(999));
    assert_eq!(state.current_pos(), SourceOffset(4));
    assert!(state.is_eof());
    assert_eq!(state.peek(), None);
  }

  #[test]
  fn test_advance() {
    let mut state = TokenizerState::new("abcdefg");
    let m = state.advance(3);
    assert_eq!(m.as_str(), "abc");
    assert_eq!(m.span(), Span::new(SourceOffset(0), SourceOffset(3)));
    assert_eq!(state.advance(99).as_str(), "defg");
    assert_eq!(state.advance(99).as_str(), "");
    assert_eq!(state.len(), 7);
  }

  #[test]
  fn test_advance_char_multibyte() {
    let mut state = TokenizerState::new("→x");
    let m = state.advance_char().unwrap();
    assert_eq!(m.as_str(), "→");
    assert_eq!(state.current_pos(), SourceOffset(3));
    assert_eq!(state.remaining(), "x");
  }

  #[test]
  fn test_read_literal() {
    let mut state = TokenizerState::new("abcdef");
    assert!(state.read_literal("abX").is_none());
    assert_eq!(state.current_pos(), SourceOffset(0));
    assert_eq!(state.read_literal("abc").unwrap().as_str(), "abc");
    assert_eq!(state.current_pos(), SourceOffset(3));
  }

  #[test]
  fn test_read_regex() {
    let mut state = TokenizerState::new("abcd efgh");
    assert!(state.read_regex(&Regex::new(r"^\d+").unwrap()).is_none());
    let m = state.read_regex(&Regex::new(r"^\w+").unwrap()).unwrap();
    assert_eq!(m.as_str(), "abcd");
    assert_eq!(state.current_pos(), SourceOffset(4));
  }

  #[test]
  fn test_read_regex_with_captures() {
    let re = Regex::new(r"^([a-z]+)([0-9]+)").unwrap();
    let mut state = TokenizerState::new("abc0 XXX");
    let m = state.read_regex_with_captures(&re).unwrap();
    assert_eq!(m.as_str(), "abc0");
    assert_eq!(m.get(1), Some("abc"));
    assert_eq!(m.get(2), Some("0"));
    assert_eq!(m.get(3), None);
    assert_eq!(state.current_pos(), SourceOffset(4));
  }

  #[test]
  fn test_consume_spaces() {
    let mut state = TokenizerState::new("  abc  def");
    state.consume_spaces();
    assert_eq!(state.current_pos(), SourceOffset(2));
    state.consume_spaces();
    assert_eq!(state.current_pos(), SourceOffset(2));
  }
}
