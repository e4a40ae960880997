
//! The unit catalog: dimensions, prefixes, degrees, units and the
//! other lookup tables the composition engine and the evaluator
//! consult. A catalog is read-only once built, apart from the
//! compile-on-first-use cache inside [`Instructions`] handles.

pub mod defaults;
pub mod instructions;
pub mod language;
pub mod search;

pub use instructions::{Instructions, InstructionCompiler, LinearCompiler, CompiledInstructions};
pub use language::{LangString, LanguageService, TemplateLanguage, Plural, DEFAULT_LANGUAGE};
pub use search::{SearchIndex, SearchHit, SearchKind, MemoryIndex, normalize};

use crate::units::dimension::Dimension;
use crate::units::unit::Unit;

use num::rational::Rational64;
use once_cell::sync::OnceCell;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct DimensionInfo {
  /// Whether units in this dimension may be multiplied, divided,
  /// raised to powers and prefixed. Currency-like dimensions are not.
  pub composable: bool,
  pub name: LangString,
}

/// Symbol and name template of a prefix such as kilo or kibi. The
/// name template has a single `{0}` placeholder for the unit name.
#[derive(Debug, Clone)]
pub struct PrefixDescriptor {
  pub symbol: String,
  pub name: LangString,
}

/// Symbol suffix and name template for raising a unit to a power.
#[derive(Debug, Clone)]
pub struct DegreeDescriptor {
  pub symbol: String,
  pub name: LangString,
}

/// Joiner text and ordering template for one kind of composition.
#[derive(Debug, Clone, Default)]
pub struct Joiner {
  pub symbol: LangString,
  pub name: LangString,
  pub order: LangString,
}

#[derive(Debug, Clone, Default)]
pub struct Joiners {
  pub product: Joiner,
  pub quotient: Joiner,
  pub hierarchical: Joiner,
}

/// A catalog record that the evaluator only looks up and prints: unit
/// types, function aliases, includes, elements and solvers.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
  pub name: LangString,
  pub symbol: Option<String>,
}

#[derive(Debug)]
pub struct Catalog {
  dimensions: BTreeMap<String, DimensionInfo>,
  prefixes: HashMap<(u32, i32), PrefixDescriptor>,
  degrees: HashMap<Rational64, DegreeDescriptor>,
  units: BTreeMap<String, Unit>,
  entries: BTreeMap<(SearchKind, String), CatalogEntry>,
  joiners: Joiners,
  language_service: Arc<dyn LanguageService>,
  compiler: Arc<dyn InstructionCompiler>,
  external_index: Option<Arc<dyn SearchIndex>>,
  index: OnceCell<MemoryIndex>,
  language: String,
}

impl Catalog {
  pub fn new() -> Self {
    Self {
      dimensions: BTreeMap::new(),
      prefixes: HashMap::new(),
      degrees: HashMap::new(),
      units: BTreeMap::new(),
      entries: BTreeMap::new(),
      joiners: Joiners::default(),
      language_service: Arc::new(TemplateLanguage),
      compiler: Arc::new(LinearCompiler),
      external_index: None,
      index: OnceCell::new(),
      language: DEFAULT_LANGUAGE.to_owned(),
    }
  }

  pub fn with_language_service(mut self, service: Arc<dyn LanguageService>) -> Self {
    self.language_service = service;
    self
  }

  pub fn with_compiler(mut self, compiler: Arc<dyn InstructionCompiler>) -> Self {
    self.compiler = compiler;
    self
  }

  /// Replaces the built-in index with an externally maintained one.
  pub fn with_index(mut self, index: Arc<dyn SearchIndex>) -> Self {
    self.external_index = Some(index);
    self
  }

  pub fn with_joiners(mut self, joiners: Joiners) -> Self {
    self.joiners = joiners;
    self
  }

  /// Sets the language used for display names.
  pub fn with_language(mut self, language: impl Into<String>) -> Self {
    self.language = language.into();
    self
  }

  pub fn add_dimension(&mut self, key: impl Into<String>, info: DimensionInfo) {
    self.dimensions.insert(key.into(), info);
  }

  pub fn add_prefix(&mut self, base: u32, exponent: i32, prefix: PrefixDescriptor) {
    self.prefixes.insert((base, exponent), prefix);
  }

  pub fn add_degree(&mut self, exponent: Rational64, degree: DegreeDescriptor) {
    self.degrees.insert(exponent, degree);
  }

  /// Registers a unit under `key`, which also becomes its id.
  pub fn add_unit(&mut self, key: impl Into<String>, unit: Unit) {
    let key = key.into();
    self.units.insert(key.clone(), unit.with_id(key));
    self.index = OnceCell::new();
  }

  pub fn add_entry(&mut self, kind: SearchKind, key: impl Into<String>, entry: CatalogEntry) {
    self.entries.insert((kind, key.into()), entry);
    self.index = OnceCell::new();
  }

  pub fn language(&self) -> &str {
    &self.language
  }

  pub fn language_service(&self) -> &dyn LanguageService {
    self.language_service.as_ref()
  }

  pub fn joiners(&self) -> &Joiners {
    &self.joiners
  }

  /// A handle to instructions compiled by this catalog's compiler.
  pub fn instructions(&self, source: impl Into<String>) -> Instructions {
    Instructions::new(source, Arc::clone(&self.compiler))
  }

  pub fn dimension(&self, key: &str) -> Option<&DimensionInfo> {
    self.dimensions.get(key)
  }

  /// The first base dimension of `dimension` that the catalog marks as
  /// non-composable. Unknown base dimensions count as composable.
  pub fn non_composable_base<'a>(&self, dimension: &'a Dimension) -> Option<&'a str> {
    dimension.bases().find(|base| {
      self.dimensions.get(*base).is_some_and(|info| !info.composable)
    })
  }

  pub fn prefix(&self, base: u32, exponent: i32) -> Option<&PrefixDescriptor> {
    self.prefixes.get(&(base, exponent))
  }

  pub fn degree(&self, exponent: Rational64) -> Option<&DegreeDescriptor> {
    self.degrees.get(&exponent)
  }

  pub fn unit(&self, key: &str) -> Option<&Unit> {
    self.units.get(key)
  }

  pub fn units(&self) -> impl Iterator<Item = (&str, &Unit)> + '_ {
    self.units.iter().map(|(k, u)| (k.as_str(), u))
  }

  /// Finds a unit by catalog key, falling back to an exact symbol
  /// match.
  pub fn find_unit(&self, term: &str) -> Option<&Unit> {
    self.units.get(term).or_else(|| {
      self.units.values().find(|u| u.symbol_text().as_deref() == Some(term))
    })
  }

  pub fn entry(&self, kind: SearchKind, key: &str) -> Option<&CatalogEntry> {
    self.entries.get(&(kind, key.to_owned()))
  }

  /// Every catalog entry indexed under the term, after normalization.
  pub fn search(&self, term: &str) -> Vec<SearchHit> {
    let normalized = normalize(term);
    match &self.external_index {
      Some(index) => index.lookup(&normalized),
      None => self.index.get_or_init(|| self.build_index()).lookup(&normalized),
    }
  }

  fn build_index(&self) -> MemoryIndex {
    let mut index = MemoryIndex::new();
    for (key, unit) in &self.units {
      let hit = SearchHit::new(SearchKind::Unit, key.clone());
      index.insert(key, hit.clone());
      if let Some(symbol) = unit.symbol_text() {
        index.insert(&symbol, hit.clone());
      }
      if let Some(name) = &unit.name {
        for (_, _, text) in name.entries() {
          index.insert(text, hit.clone());
        }
      }
    }
    for ((kind, key), entry) in &self.entries {
      let hit = SearchHit::new(*kind, key.clone());
      index.insert(key, hit.clone());
      if let Some(symbol) = &entry.symbol {
        index.insert(symbol, hit.clone());
      }
      for (_, _, text) in entry.name.entries() {
        index.insert(text, hit.clone());
      }
    }
    index
  }
}

impl Default for Catalog {
  fn default() -> Self {
    Self::new()
  }
}

impl CatalogEntry {
  pub fn new(name: LangString) -> Self {
    Self { name, symbol: None }
  }

  pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
    self.symbol = Some(symbol.into());
    self
  }
}
