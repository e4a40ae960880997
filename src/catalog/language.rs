
//! Multi-language, pluralization-aware strings and the service that
//! formats and joins them into composite unit names.

use serde::{Serialize, Deserialize};
use once_cell::sync::Lazy;
use regex::{Regex, Captures};

use std::collections::BTreeMap;
use std::fmt::Debug;

pub const DEFAULT_LANGUAGE: &str = "en";

/// Plural category of a language string entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Plural {
  One,
  Other,
}

/// A string available in several languages, and in each language in
/// one or more plural forms. Entries are templates: they may contain
/// positional `{0}`, `{1}`, ... placeholders filled in by
/// [`LanguageService::format`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LangString {
  texts: BTreeMap<String, BTreeMap<String, String>>,
}

/// Formatting and joining of language strings. The catalog loader
/// supplies the templates; this trait only defines how they combine.
pub trait LanguageService: Debug + Send + Sync {
  /// The text of `ls` in the given language and plural form, falling
  /// back to the `"other"` form and then to English.
  fn get(&self, ls: &LangString, lang: &str, plural: Plural) -> Option<String> {
    ls.lookup(lang, plural)
  }

  /// Substitutes `args` into the placeholders of `template`, form by
  /// form. Argument `i` is taken in the same language and plural form
  /// as the template entry it is substituted into.
  fn format(&self, template: &LangString, args: &[&LangString]) -> LangString;

  /// Folds `parts` together with `joiner`. The `order` template for a
  /// language decides where the accumulated text (`{0}`), the joiner
  /// (`{1}`) and the next part (`{2}`) go.
  fn join(&self, joiner: &LangString, order: &LangString, parts: &[&LangString]) -> LangString;
}

/// The default [`LanguageService`], doing plain textual substitution.
#[derive(Debug, Clone, Default)]
pub struct TemplateLanguage;

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{(\d+)\}").unwrap());

const DEFAULT_ORDER: &str = "{0}{1}{2}";

impl Plural {
  pub fn as_str(self) -> &'static str {
    match self {
      Plural::One => "one",
      Plural::Other => "other",
    }
  }

  pub fn from_key(key: &str) -> Option<Plural> {
    match key {
      "one" => Some(Plural::One),
      "other" => Some(Plural::Other),
      _ => None,
    }
  }

  /// The plural form used when talking about `amount` of something.
  pub fn for_amount(amount: f64) -> Plural {
    if amount == 1.0 { Plural::One } else { Plural::Other }
  }
}

impl LangString {
  pub fn new() -> Self {
    Self::default()
  }

  /// A string with a single English, plural-agnostic entry.
  pub fn plain(text: impl Into<String>) -> Self {
    Self::new().with(DEFAULT_LANGUAGE, Plural::Other, text)
  }

  /// An English string with distinct singular and plural forms.
  pub fn english(one: impl Into<String>, other: impl Into<String>) -> Self {
    Self::new()
      .with(DEFAULT_LANGUAGE, Plural::One, one)
      .with(DEFAULT_LANGUAGE, Plural::Other, other)
  }

  pub fn with(mut self, lang: impl Into<String>, plural: Plural, text: impl Into<String>) -> Self {
    self.insert(lang, plural, text);
    self
  }

  pub fn insert(&mut self, lang: impl Into<String>, plural: Plural, text: impl Into<String>) {
    self.texts
      .entry(lang.into())
      .or_default()
      .insert(plural.as_str().to_owned(), text.into());
  }

  pub fn is_empty(&self) -> bool {
    self.texts.values().all(|forms| forms.is_empty())
  }

  /// Every `(language, plural, text)` entry.
  pub fn entries(&self) -> impl Iterator<Item = (&str, Plural, &str)> + '_ {
    self.texts.iter().flat_map(|(lang, forms)| {
      forms.iter().filter_map(move |(plural, text)| {
        Plural::from_key(plural).map(|plural| (lang.as_str(), plural, text.as_str()))
      })
    })
  }

  fn exact(&self, lang: &str, plural: Plural) -> Option<&str> {
    self.texts.get(lang)?.get(plural.as_str()).map(String::as_str)
  }

  fn lookup_in(&self, lang: &str, plural: Plural) -> Option<&str> {
    self.exact(lang, plural).or_else(|| self.exact(lang, Plural::Other))
  }

  /// Text in the given language and plural form, with fallback to the
  /// `"other"` form and then to the default language.
  pub fn lookup(&self, lang: &str, plural: Plural) -> Option<String> {
    self.lookup_in(lang, plural)
      .or_else(|| self.lookup_in(DEFAULT_LANGUAGE, plural))
      .map(str::to_owned)
  }

  /// The same string with every language's singular form promoted to
  /// all plural forms. Used for the denominator of "X per Y" names.
  pub fn singular(&self) -> LangString {
    let mut result = LangString::new();
    for (lang, forms) in &self.texts {
      let one = forms.get(Plural::One.as_str()).or_else(|| forms.get(Plural::Other.as_str()));
      if let Some(one) = one {
        result.insert(lang.clone(), Plural::One, one.clone());
        result.insert(lang.clone(), Plural::Other, one.clone());
      }
    }
    result
  }

  fn keys(&self) -> Vec<(String, Plural)> {
    self.entries().map(|(lang, plural, _)| (lang.to_owned(), plural)).collect()
  }
}

fn fill_placeholders(template: &str, args: &[String]) -> String {
  PLACEHOLDER_RE.replace_all(template, |caps: &Captures| {
    caps[1].parse::<usize>().ok()
      .and_then(|i| args.get(i))
      .cloned()
      .unwrap_or_else(|| caps[0].to_owned())
  }).into_owned()
}

impl LanguageService for TemplateLanguage {
  fn format(&self, template: &LangString, args: &[&LangString]) -> LangString {
    let mut result = LangString::new();
    for (lang, plural, text) in template.entries() {
      let filled: Vec<String> = args.iter()
        .map(|arg| self.get(arg, lang, plural).unwrap_or_default())
        .collect();
      result.insert(lang, plural, fill_placeholders(text, &filled));
    }
    result
  }

  fn join(&self, joiner: &LangString, order: &LangString, parts: &[&LangString]) -> LangString {
    let mut keys: Vec<(String, Plural)> = parts.iter().flat_map(|p| p.keys()).collect();
    keys.sort();
    keys.dedup();

    let mut result = LangString::new();
    for (lang, plural) in keys {
      let order_text = self.get(order, &lang, plural).unwrap_or_else(|| DEFAULT_ORDER.to_owned());
      let joiner_text = self.get(joiner, &lang, plural).unwrap_or_default();
      let mut texts = parts.iter().map(|p| self.get(p, &lang, plural).unwrap_or_default());
      let Some(mut acc) = texts.next() else { continue };
      for next in texts {
        acc = fill_placeholders(&order_text, &[acc, joiner_text.clone(), next]);
      }
      result.insert(lang, plural, acc);
    }
    result
  }
}
