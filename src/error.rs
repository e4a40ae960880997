
use crate::config::ConfigError;
use crate::eval::EvalError;
use crate::expr::{ParseError, TokenizerError};

use thiserror::Error;

/// Any failure of a session: reading settings, or lexing, parsing or
/// evaluating one statement.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
  #[error("{0}")]
  Tokenizer(#[from] TokenizerError),
  #[error("{0}")]
  Parse(#[from] ParseError),
  #[error("{0}")]
  Eval(#[from] EvalError),
  #[error("{0}")]
  Config(#[from] ConfigError),
}

impl Error {
  /// Whether the statement itself was malformed, as opposed to
  /// failing during evaluation.
  pub fn is_syntax_error(&self) -> bool {
    matches!(self, Error::Tokenizer(_) | Error::Parse(_))
  }
}
