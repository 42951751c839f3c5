//! Failure model: path-annotated reasons and the accumulating failure set.
//!
//! A single leaf conversion fails with exactly one [`ConfigReaderFailure`].
//! Aggregation points (record fields, container elements, unknown-key checks)
//! concatenate every failure they observe into a [`ConfigReaderFailures`],
//! so one read pass reports every independent problem.

use std::fmt;

use thiserror::Error;

use crate::cursor::ConfigPath;
use crate::value::{Origin, ValueType};

/// Result of reading a typed value from a cursor.
pub type ReadResult<T> = Result<T, ConfigReaderFailures>;

/// Why a conversion failed, independent of where.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FailureReason {
    #[error("Key not found: '{key}'.{}", candidates_hint(.candidates))]
    KeyNotFound { key: String, candidates: Vec<String> },

    #[error("Unknown key '{key}'.")]
    UnknownKey { key: String },

    #[error("Expected type {}. Found {found} instead.", join_types(.expected))]
    WrongType {
        expected: Vec<ValueType>,
        found: ValueType,
    },

    #[error("Cannot convert '{value}' to {to_type}: {because}")]
    CannotConvert {
        value: String,
        to_type: String,
        because: String,
    },

    #[error("Empty string found when trying to convert to {to_type}.")]
    EmptyString { to_type: String },

    #[error("No valid alternative found; attempted {}.", attempt_names(.attempts))]
    NoValidCoproductOption {
        attempts: Vec<(String, ConfigReaderFailures)>,
    },

    #[error("Unexpected value '{value}' for the type discriminator; expected one of: {}.", join_names(.expected))]
    UnexpectedDiscriminator { value: String, expected: Vec<String> },

    /// A user-supplied conversion function reported an error of its own.
    #[error("{message}")]
    ExternalError { message: String },
}

fn candidates_hint(candidates: &[String]) -> String {
    if candidates.is_empty() {
        return String::new();
    }
    let quoted: Vec<String> = candidates.iter().map(|c| format!("'{c}'")).collect();
    format!(
        " You might have a misspelling in your config or a different naming convention: {}",
        quoted.join(", ")
    )
}

fn join_types(types: &[ValueType]) -> String {
    let names: Vec<String> = types.iter().map(ToString::to_string).collect();
    names.join(" or ")
}

fn join_names(names: &[String]) -> String {
    names.join(", ")
}

fn attempt_names(attempts: &[(String, ConfigReaderFailures)]) -> String {
    if attempts.is_empty() {
        return "no alternatives".to_string();
    }
    let names: Vec<&str> = attempts.iter().map(|(name, _)| name.as_str()).collect();
    names.join(", ")
}

impl FailureReason {
    /// Shorthand for `CannotConvert`.
    pub fn cannot_convert(
        value: impl Into<String>,
        to_type: impl Into<String>,
        because: impl Into<String>,
    ) -> Self {
        FailureReason::CannotConvert {
            value: value.into(),
            to_type: to_type.into(),
            because: because.into(),
        }
    }

    pub fn wrong_type(expected: ValueType, found: ValueType) -> Self {
        FailureReason::WrongType {
            expected: vec![expected],
            found,
        }
    }
}

/// A [`FailureReason`] located at a path, with the origin of the offending node.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigReaderFailure {
    reason: FailureReason,
    path: ConfigPath,
    origin: Option<Origin>,
}

impl ConfigReaderFailure {
    pub fn new(reason: FailureReason, path: ConfigPath, origin: Option<Origin>) -> Self {
        Self {
            reason,
            path,
            origin,
        }
    }

    pub fn reason(&self) -> &FailureReason {
        &self.reason
    }

    pub fn path(&self) -> &ConfigPath {
        &self.path
    }

    pub fn origin(&self) -> Option<&Origin> {
        self.origin.as_ref()
    }
}

impl fmt::Display for ConfigReaderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_root() {
            write!(f, "at the root")?;
        } else {
            write!(f, "at '{}'", self.path)?;
        }
        if let Some(origin) = &self.origin {
            write!(f, " ({origin})")?;
        }
        write!(f, ": {}", self.reason)
    }
}

/// A non-empty, ordered sequence of failures.
///
/// Concatenation preserves order and never de-duplicates.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigReaderFailures {
    failures: Vec<ConfigReaderFailure>,
}

impl ConfigReaderFailures {
    pub fn new(first: ConfigReaderFailure) -> Self {
        Self {
            failures: vec![first],
        }
    }

    /// `None` when `failures` is empty.
    pub fn from_vec(failures: Vec<ConfigReaderFailure>) -> Option<Self> {
        (!failures.is_empty()).then_some(Self { failures })
    }

    pub fn push(&mut self, failure: ConfigReaderFailure) {
        self.failures.push(failure);
    }

    pub fn append(&mut self, other: ConfigReaderFailures) {
        self.failures.extend(other.failures);
    }

    /// Order-preserving concatenation.
    pub fn concat(mut self, other: ConfigReaderFailures) -> Self {
        self.append(other);
        self
    }

    pub fn first(&self) -> &ConfigReaderFailure {
        &self.failures[0]
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ConfigReaderFailure> {
        self.failures.iter()
    }

    pub fn into_vec(self) -> Vec<ConfigReaderFailure> {
        self.failures
    }
}

impl From<ConfigReaderFailure> for ConfigReaderFailures {
    fn from(failure: ConfigReaderFailure) -> Self {
        Self::new(failure)
    }
}

impl IntoIterator for ConfigReaderFailures {
    type Item = ConfigReaderFailure;
    type IntoIter = std::vec::IntoIter<ConfigReaderFailure>;

    fn into_iter(self) -> Self::IntoIter {
        self.failures.into_iter()
    }
}

impl<'a> IntoIterator for &'a ConfigReaderFailures {
    type Item = &'a ConfigReaderFailure;
    type IntoIter = std::slice::Iter<'a, ConfigReaderFailure>;

    fn into_iter(self) -> Self::IntoIter {
        self.failures.iter()
    }
}

impl fmt::Display for ConfigReaderFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.failures.len();
        let noun = if count == 1 { "failure" } else { "failures" };
        write!(f, "Configuration could not be read ({count} {noun}):")?;
        for failure in &self.failures {
            write!(f, "\n  - {failure}")?;
            if let FailureReason::NoValidCoproductOption { attempts } = &failure.reason {
                for (name, nested) in attempts {
                    write!(f, "\n      {name}:")?;
                    for inner in nested {
                        write!(f, "\n        - {inner}")?;
                    }
                }
            }
        }
        Ok(())
    }
}

impl std::error::Error for ConfigReaderFailures {}

/// Accumulates failures from independent reads.
///
/// Used by every aggregation point: each `take` records a failed result and
/// keeps going; `finish` reports all of them at once.
#[derive(Debug, Default)]
pub struct Accumulator {
    failures: Vec<ConfigReaderFailure>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the success value, or record the failures and return `None`.
    pub fn take<T>(&mut self, result: ReadResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(failures) => {
                self.failures.extend(failures);
                None
            }
        }
    }

    pub fn push(&mut self, failure: ConfigReaderFailure) {
        self.failures.push(failure);
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// `Ok(value)` when nothing failed, every recorded failure otherwise.
    pub fn finish<T>(self, value: T) -> ReadResult<T> {
        match ConfigReaderFailures::from_vec(self.failures) {
            Some(failures) => Err(failures),
            None => Ok(value),
        }
    }
}

/// Read every item, accumulating all failures rather than stopping at the first.
pub fn collect_all<T, I>(results: I) -> ReadResult<Vec<T>>
where
    I: IntoIterator<Item = ReadResult<T>>,
{
    let mut acc = Accumulator::new();
    let mut values = Vec::new();
    for result in results {
        if let Some(value) = acc.take(result) {
            values.push(value);
        }
    }
    acc.finish(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure_at(key: &str) -> ConfigReaderFailure {
        ConfigReaderFailure::new(
            FailureReason::KeyNotFound {
                key: key.into(),
                candidates: vec![],
            },
            ConfigPath::root().key(key),
            None,
        )
    }

    #[test]
    fn concat_preserves_order_without_dedup() {
        let a = ConfigReaderFailures::new(failure_at("a"));
        let b = ConfigReaderFailures::new(failure_at("b"));
        let all = a.clone().concat(b).concat(a);
        let paths: Vec<String> = all.iter().map(|f| f.path().to_string()).collect();
        assert_eq!(paths, vec!["a", "b", "a"]);
    }

    #[test]
    fn collect_all_reports_every_failure() {
        let results: Vec<ReadResult<i32>> = vec![
            Ok(1),
            Err(failure_at("x").into()),
            Ok(2),
            Err(failure_at("y").into()),
        ];
        let failures = collect_all(results).unwrap_err();
        assert_eq!(failures.len(), 2);
    }

    #[test]
    fn collect_all_succeeds_when_nothing_fails() {
        let results: Vec<ReadResult<i32>> = vec![Ok(1), Ok(2)];
        assert_eq!(collect_all(results).unwrap(), vec![1, 2]);
    }

    #[test]
    fn key_not_found_mentions_candidates() {
        let reason = FailureReason::KeyNotFound {
            key: "how-long".into(),
            candidates: vec!["howLong".into()],
        };
        let msg = reason.to_string();
        assert!(msg.contains("how-long"));
        assert!(msg.contains("'howLong'"));
    }

    #[test]
    fn wrong_type_lists_expected_types() {
        let reason = FailureReason::WrongType {
            expected: vec![ValueType::Number, ValueType::String],
            found: ValueType::Boolean,
        };
        assert_eq!(
            reason.to_string(),
            "Expected type number or string. Found boolean instead."
        );
    }

    #[test]
    fn report_lists_each_failure_with_path() {
        let failures =
            ConfigReaderFailures::new(failure_at("host")).concat(failure_at("port").into());
        let report = failures.to_string();
        assert!(report.contains("2 failures"));
        assert!(report.contains("at 'host'"));
        assert!(report.contains("at 'port'"));
    }
}
