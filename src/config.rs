
//! Session settings, read from a JSON file.

use crate::catalog::search::{normalize, SearchHit};
use crate::catalog::language::DEFAULT_LANGUAGE;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use std::fs;
use std::io;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// Language for unit names in output and messages.
  pub language: String,
  /// Report errors with their full detail.
  pub trace: bool,
  pub disambiguation: Vec<DisambiguationRule>,
}

/// Picks one candidate out of an ambiguous catalog search. A rule
/// applies to lookups of `term` and matches a hit whose kind and key
/// agree with the fields that are given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisambiguationRule {
  pub term: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub kind: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub key: Option<String>,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
  #[error("Could not read configuration file: {0}")]
  Io(#[from] io::Error),
  #[error("Invalid configuration: {0}")]
  Json(#[from] serde_json::Error),
}

impl Settings {
  pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let text = fs::read_to_string(path)?;
    Self::from_json_str(&text)
  }

  pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
    Ok(serde_json::from_str(text)?)
  }
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      language: DEFAULT_LANGUAGE.to_owned(),
      trace: false,
      disambiguation: Vec::new(),
    }
  }
}

impl DisambiguationRule {
  pub fn new(term: impl Into<String>) -> Self {
    Self { term: term.into(), kind: None, key: None }
  }

  pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
    self.kind = Some(kind.into());
    self
  }

  pub fn with_key(mut self, key: impl Into<String>) -> Self {
    self.key = Some(key.into());
    self
  }

  /// Whether the rule is about lookups of this term. Terms compare
  /// after search normalization.
  pub fn applies_to(&self, term: &str) -> bool {
    normalize(&self.term) == normalize(term)
  }

  pub fn matches(&self, hit: &SearchHit) -> bool {
    self.kind.as_deref().map_or(true, |kind| kind == hit.kind.name()) &&
      self.key.as_deref().map_or(true, |key| key == hit.key)
  }
}
