//! Naming conventions and the field-name → config-key mapping.
//!
//! A [`NamingConvention`] splits a name into lowercase words and renders a
//! word sequence back. A [`ConfigFieldMapping`] composes two conventions
//! (source side, config side) into a key function, optionally with per-field
//! overrides or an arbitrary custom function.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// How multi-word names are spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamingConvention {
    /// `myFieldName`
    CamelCase,
    /// `MyFieldName`
    PascalCase,
    /// `my-field-name`
    KebabCase,
    /// `my_field_name`
    SnakeCase,
    /// `MY_FIELD_NAME`
    ScreamingSnakeCase,
}

impl NamingConvention {
    /// Split `name` into lowercase words.
    pub fn to_tokens(self, name: &str) -> Vec<String> {
        match self {
            NamingConvention::CamelCase | NamingConvention::PascalCase => {
                capitalized_words(name)
            }
            NamingConvention::KebabCase => delimited_words(name, '-'),
            NamingConvention::SnakeCase | NamingConvention::ScreamingSnakeCase => {
                delimited_words(name, '_')
            }
        }
    }

    /// Render a word sequence in this convention.
    pub fn from_tokens<S: AsRef<str>>(self, tokens: &[S]) -> String {
        let words = tokens.iter().map(|t| t.as_ref().to_lowercase());
        match self {
            NamingConvention::CamelCase => words
                .enumerate()
                .map(|(i, w)| if i == 0 { w } else { capitalize(&w) })
                .collect(),
            NamingConvention::PascalCase => words.map(|w| capitalize(&w)).collect(),
            NamingConvention::KebabCase => words.collect::<Vec<_>>().join("-"),
            NamingConvention::SnakeCase => words.collect::<Vec<_>>().join("_"),
            NamingConvention::ScreamingSnakeCase => words
                .map(|w| w.to_uppercase())
                .collect::<Vec<_>>()
                .join("_"),
        }
    }

    /// Re-spell `name` from `self` into `target`.
    pub fn convert(self, name: &str, target: NamingConvention) -> String {
        target.from_tokens(&self.to_tokens(name))
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn delimited_words(name: &str, delimiter: char) -> Vec<String> {
    name.split(delimiter)
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Word breaks for capitalized conventions:
/// - between an uppercase run and a capitalized word (`HTTPServer` → `http`, `server`)
/// - before an uppercase letter that follows a non-uppercase char (`myField`)
/// - between a letter and a following non-letter (`field1` → `field`, `1`)
fn capitalized_words(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if i > 0 {
            let prev = chars[i - 1];
            let next = chars.get(i + 1).copied();
            let acronym_end =
                prev.is_uppercase() && c.is_uppercase() && next.is_some_and(char::is_lowercase);
            let lower_to_upper = !prev.is_uppercase() && c.is_uppercase();
            let letter_to_other = prev.is_alphabetic() && !c.is_alphabetic();
            if (acronym_end || lower_to_upper || letter_to_other) && !current.is_empty() {
                words.push(std::mem::take(&mut current).to_lowercase());
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current.to_lowercase());
    }
    words
}

#[derive(Clone)]
enum MappingKind {
    Identity,
    Conventions {
        from: NamingConvention,
        to: NamingConvention,
    },
    Custom(Arc<dyn Fn(&str) -> String + Send + Sync>),
}

/// Maps a declared field name to the config key it is read from and written to.
#[derive(Clone)]
pub struct ConfigFieldMapping {
    kind: MappingKind,
    overrides: BTreeMap<String, String>,
}

impl ConfigFieldMapping {
    /// Convert names from the `from` convention to the `to` convention.
    /// Identical conventions leave names untouched.
    pub fn new(from: NamingConvention, to: NamingConvention) -> Self {
        let kind = if from == to {
            MappingKind::Identity
        } else {
            MappingKind::Conventions { from, to }
        };
        Self {
            kind,
            overrides: BTreeMap::new(),
        }
    }

    /// Field names are used as keys verbatim.
    pub fn identity() -> Self {
        Self {
            kind: MappingKind::Identity,
            overrides: BTreeMap::new(),
        }
    }

    /// An arbitrary mapping function.
    pub fn custom(f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self {
            kind: MappingKind::Custom(Arc::new(f)),
            overrides: BTreeMap::new(),
        }
    }

    /// Pin `field` to `key`, bypassing the base mapping.
    pub fn with_override(mut self, field: impl Into<String>, key: impl Into<String>) -> Self {
        self.overrides.insert(field.into(), key.into());
        self
    }

    pub fn apply(&self, field: &str) -> String {
        if let Some(key) = self.overrides.get(field) {
            return key.clone();
        }
        match &self.kind {
            MappingKind::Identity => field.to_string(),
            MappingKind::Conventions { from, to } => from.convert(field, *to),
            MappingKind::Custom(f) => f(field),
        }
    }
}

impl Default for ConfigFieldMapping {
    /// Rust field names (`snake_case`) to `kebab-case` keys.
    fn default() -> Self {
        Self::new(NamingConvention::SnakeCase, NamingConvention::KebabCase)
    }
}

impl fmt::Debug for ConfigFieldMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("ConfigFieldMapping");
        match &self.kind {
            MappingKind::Identity => s.field("kind", &"identity"),
            MappingKind::Conventions { from, to } => s.field("from", from).field("to", to),
            MappingKind::Custom(_) => s.field("kind", &"custom"),
        };
        s.field("overrides", &self.overrides).finish()
    }
}

/// Letters and digits only, lowercased. Two keys with the same normalized form
/// spell the same words in different conventions.
pub(crate) fn normalized(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use NamingConvention::*;

    #[test]
    fn camel_case_tokens() {
        assert_eq!(CamelCase.to_tokens("myField"), vec!["my", "field"]);
        assert_eq!(CamelCase.to_tokens("howLong"), vec!["how", "long"]);
        assert_eq!(CamelCase.to_tokens("where"), vec!["where"]);
        assert!(CamelCase.to_tokens("").is_empty());
    }

    #[test]
    fn acronyms_and_digits() {
        assert_eq!(PascalCase.to_tokens("HTTPServer"), vec!["http", "server"]);
        assert_eq!(CamelCase.to_tokens("field1Name"), vec!["field", "1", "name"]);
        assert_eq!(CamelCase.to_tokens("useIPv6"), vec!["use", "i", "pv", "6"]);
    }

    #[test]
    fn delimited_tokens() {
        assert_eq!(KebabCase.to_tokens("how-long"), vec!["how", "long"]);
        assert_eq!(SnakeCase.to_tokens("pool__size"), vec!["pool", "size"]);
        assert_eq!(ScreamingSnakeCase.to_tokens("POOL_SIZE"), vec!["pool", "size"]);
    }

    #[test]
    fn renders_each_convention() {
        let words = ["my", "field", "name"];
        assert_eq!(CamelCase.from_tokens(&words), "myFieldName");
        assert_eq!(PascalCase.from_tokens(&words), "MyFieldName");
        assert_eq!(KebabCase.from_tokens(&words), "my-field-name");
        assert_eq!(SnakeCase.from_tokens(&words), "my_field_name");
        assert_eq!(ScreamingSnakeCase.from_tokens(&words), "MY_FIELD_NAME");
    }

    #[test]
    fn round_trip_is_same_convention_rendering() {
        for name in ["myField", "aBC", "x"] {
            let again = CamelCase.from_tokens(&CamelCase.to_tokens(name));
            assert_eq!(CamelCase.to_tokens(&again), CamelCase.to_tokens(name));
        }
    }

    #[test]
    fn default_mapping_is_snake_to_kebab() {
        let mapping = ConfigFieldMapping::default();
        assert_eq!(mapping.apply("my_field"), "my-field");
        assert_eq!(mapping.apply("where"), "where");
    }

    #[test]
    fn camel_to_kebab_mapping() {
        let mapping = ConfigFieldMapping::new(CamelCase, KebabCase);
        assert_eq!(mapping.apply("myField"), "my-field");
    }

    #[test]
    fn same_convention_is_identity() {
        let mapping = ConfigFieldMapping::new(CamelCase, CamelCase);
        assert_eq!(mapping.apply("HTTPServer"), "HTTPServer");
    }

    #[test]
    fn overrides_win_over_base_mapping() {
        let mapping = ConfigFieldMapping::default().with_override("how_long", "duration");
        assert_eq!(mapping.apply("how_long"), "duration");
        assert_eq!(mapping.apply("other_field"), "other-field");
    }

    #[test]
    fn custom_mapping() {
        let mapping = ConfigFieldMapping::custom(|f| format!("app.{f}"));
        assert_eq!(mapping.apply("port"), "app.port");
    }

    #[test]
    fn normalized_ignores_convention() {
        assert_eq!(normalized("how-long"), normalized("howLong"));
        assert_eq!(normalized("HOW_LONG"), "howlong");
    }
}
