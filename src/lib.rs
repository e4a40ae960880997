
// The #[non_exhaustive] attribute applies at the crate-level, and I
// want module-level restrictions, which are far stricter.
#![allow(clippy::manual_non_exhaustive)]

pub mod catalog;
pub mod config;
pub mod error;
pub mod eval;
pub mod expr;
pub mod parsing;
pub mod units;
pub mod util;

pub use error::Error;

use catalog::Catalog;
use config::{DisambiguationRule, Settings};
use eval::{Context, Evaluator, Value};
use expr::{lex, parse_expression};

/// One calculator session: a catalog, the settings it was opened
/// with, and the variables assigned so far.
#[derive(Debug)]
pub struct Session {
  catalog: Catalog,
  settings: Settings,
  context: Context,
}

impl Session {
  pub fn new(catalog: Catalog) -> Self {
    Self::with_settings(catalog, Settings::default())
  }

  pub fn with_settings(catalog: Catalog, settings: Settings) -> Self {
    let catalog = catalog.with_language(settings.language.clone());
    for rule in &settings.disambiguation {
      warn_if_unused(&catalog, rule);
    }
    Self { catalog, settings, context: Context::new() }
  }

  pub fn catalog(&self) -> &Catalog {
    &self.catalog
  }

  pub fn settings(&self) -> &Settings {
    &self.settings
  }

  pub fn context(&self) -> &Context {
    &self.context
  }

  pub fn add_disambiguation(&mut self, rule: DisambiguationRule) {
    warn_if_unused(&self.catalog, &rule);
    self.settings.disambiguation.push(rule);
  }

  /// Lexes, parses and evaluates one statement. Assignments persist
  /// into later statements.
  pub fn run(&mut self, line: &str) -> Result<Value, Error> {
    tracing::debug!(statement = %line, "evaluating statement");
    let tokens = lex(line)?;
    let expr = parse_expression(&tokens)?;
    let evaluator = Evaluator::new(&self.catalog).with_disambiguation(&self.settings.disambiguation);
    Ok(evaluator.evaluate(&expr, &mut self.context)?)
  }

  /// Renders a value in the session language.
  pub fn render(&self, value: &Value) -> String {
    value.render(self.catalog.language())
  }
}

fn warn_if_unused(catalog: &Catalog, rule: &DisambiguationRule) {
  if !catalog.search(&rule.term).iter().any(|hit| rule.matches(hit)) {
    tracing::warn!(term = %rule.term, "disambiguation rule matches no catalog entry");
  }
}
