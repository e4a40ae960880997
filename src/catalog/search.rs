
//! Lookup of catalog entries by free-form term.

use once_cell::sync::Lazy;
use regex::Regex;

use std::collections::HashMap;
use std::fmt::{self, Debug, Display, Formatter};

/// The kind of catalog entry a search hit refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SearchKind {
  Unit,
  UnitType,
  Function,
  Include,
  Element,
  Solver,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SearchHit {
  pub kind: SearchKind,
  pub key: String,
}

pub trait SearchIndex: Debug + Send + Sync {
  /// All entries indexed under the normalized term. The result is
  /// free of duplicates.
  fn lookup(&self, normalized: &str) -> Vec<SearchHit>;
}

/// In-memory index from normalized term to hits.
#[derive(Debug, Clone, Default)]
pub struct MemoryIndex {
  table: HashMap<String, Vec<SearchHit>>,
}

static SPACES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Normalizes a search term: trimmed, lowercased, and with internal
/// runs of whitespace collapsed to a single space.
pub fn normalize(term: &str) -> String {
  SPACES_RE.replace_all(term.trim(), " ").to_lowercase()
}

impl SearchKind {
  pub fn from_name(name: &str) -> Option<SearchKind> {
    match name {
      "unit" => Some(SearchKind::Unit),
      "unittype" | "unit-type" | "unit_type" => Some(SearchKind::UnitType),
      "function" => Some(SearchKind::Function),
      "include" => Some(SearchKind::Include),
      "element" => Some(SearchKind::Element),
      "solver" => Some(SearchKind::Solver),
      _ => None,
    }
  }

  pub fn name(self) -> &'static str {
    match self {
      SearchKind::Unit => "unit",
      SearchKind::UnitType => "unittype",
      SearchKind::Function => "function",
      SearchKind::Include => "include",
      SearchKind::Element => "element",
      SearchKind::Solver => "solver",
    }
  }
}

impl SearchHit {
  pub fn new(kind: SearchKind, key: impl Into<String>) -> Self {
    Self { kind, key: key.into() }
  }
}

impl MemoryIndex {
  pub fn new() -> Self {
    Self::default()
  }

  /// Indexes `hit` under the normalized form of `term`. Blank terms
  /// are ignored.
  pub fn insert(&mut self, term: &str, hit: SearchHit) {
    let term = normalize(term);
    if term.is_empty() {
      return;
    }
    let hits = self.table.entry(term).or_default();
    if !hits.contains(&hit) {
      hits.push(hit);
    }
  }

  pub fn len(&self) -> usize {
    self.table.len()
  }

  pub fn is_empty(&self) -> bool {
    self.table.is_empty()
  }
}

impl SearchIndex for MemoryIndex {
  fn lookup(&self, normalized: &str) -> Vec<SearchHit> {
    self.table.get(normalized).cloned().unwrap_or_default()
  }
}

impl<S: AsRef<str>> FromIterator<(S, SearchHit)> for MemoryIndex {
  fn from_iter<I>(iter: I) -> Self
  where I: IntoIterator<Item = (S, SearchHit)> {
    let mut index = MemoryIndex::new();
    for (term, hit) in iter {
      index.insert(term.as_ref(), hit);
    }
    index
  }
}

impl Display for SearchKind {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.name())
  }
}
