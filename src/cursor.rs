//! Path-tracking, read-only view over one node of a configuration tree.
//!
//! A cursor is either *defined* (it points at a [`ConfigValue`], possibly
//! `null`) or *undefined* (the key it was navigated to does not exist). Keeping
//! the two apart is what lets a record reader tell "missing key" from "present
//! null" and lets `Option` fields supply their own absence semantics.
//!
//! Cursors also carry the [`ConverterRegistry`] in effect, so every nested read
//! can consult the caller's overrides before the type's own implementation.

use std::collections::BTreeMap;
use std::fmt;

use crate::convert::ReadConfig;
use crate::failure::{ConfigReaderFailure, FailureReason, ReadResult};
use crate::registry::ConverterRegistry;
use crate::value::{ConfigValue, Number, Origin, ValueKind, ValueType};

/// One step of a [`ConfigPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Location of a node relative to the document root.
///
/// Displays in dot/bracket notation: `servers[0].host`. Keys that are not plain
/// identifiers are quoted: `headers."x-forwarded.for"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ConfigPath {
    segments: Vec<PathSegment>,
}

impl ConfigPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a dotted path (`"app.server"`). Empty input is the root.
    pub fn parse(dotted: &str) -> Self {
        let segments = dotted
            .split('.')
            .filter(|s| !s.is_empty())
            .map(|s| PathSegment::Key(s.to_string()))
            .collect();
        Self { segments }
    }

    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut path = self.clone();
        path.segments.push(PathSegment::Key(key.into()));
        path
    }

    pub fn index(&self, index: usize) -> Self {
        let mut path = self.clone();
        path.segments.push(PathSegment::Index(index));
        path
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// The last segment, rendered as a key.
    pub fn last_key(&self) -> Option<String> {
        self.segments.last().map(|segment| match segment {
            PathSegment::Key(key) => key.clone(),
            PathSegment::Index(i) => i.to_string(),
        })
    }
}

fn is_plain_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl fmt::Display for ConfigPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(key) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    if is_plain_key(key) {
                        f.write_str(key)?;
                    } else {
                        write!(f, "{key:?}")?;
                    }
                }
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// A navigable view over a configuration node.
#[derive(Debug, Clone)]
pub struct ConfigCursor<'a> {
    value: Option<&'a ConfigValue>,
    path: ConfigPath,
    registry: Option<&'a ConverterRegistry>,
}

impl<'a> ConfigCursor<'a> {
    /// A cursor at the root of `value`.
    pub fn new(value: &'a ConfigValue) -> Self {
        Self {
            value: Some(value),
            path: ConfigPath::root(),
            registry: None,
        }
    }

    /// A cursor pointing at nothing, at `path`.
    pub fn undefined(path: ConfigPath) -> Self {
        Self {
            value: None,
            path,
            registry: None,
        }
    }

    pub fn with_registry(mut self, registry: &'a ConverterRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Same path and registry, different node. Used to read a rewritten copy of
    /// the current node (e.g. an object with its discriminator removed).
    pub fn with_value<'b>(&self, value: &'b ConfigValue) -> ConfigCursor<'b>
    where
        'a: 'b,
    {
        ConfigCursor {
            value: Some(value),
            path: self.path.clone(),
            registry: self.registry,
        }
    }

    pub fn value(&self) -> Option<&'a ConfigValue> {
        self.value
    }

    pub fn path(&self) -> &ConfigPath {
        &self.path
    }

    pub fn origin(&self) -> Option<&'a Origin> {
        self.value.and_then(ConfigValue::origin)
    }

    pub fn registry(&self) -> Option<&'a ConverterRegistry> {
        self.registry
    }

    /// The key is absent. Distinct from a present `null`.
    pub fn is_undefined(&self) -> bool {
        self.value.is_none()
    }

    pub fn is_null(&self) -> bool {
        self.value.is_some_and(ConfigValue::is_null)
    }

    /// A failure at this cursor's path and origin.
    pub fn failed(&self, reason: FailureReason) -> ConfigReaderFailure {
        ConfigReaderFailure::new(reason, self.path.clone(), self.origin().cloned())
    }

    pub fn fail<T>(&self, reason: FailureReason) -> ReadResult<T> {
        Err(self.failed(reason).into())
    }

    fn child(&self, path: ConfigPath, value: Option<&'a ConfigValue>) -> ConfigCursor<'a> {
        ConfigCursor {
            value,
            path,
            registry: self.registry,
        }
    }

    /// The node, or `KeyNotFound` for the last key when undefined.
    pub fn defined(&self) -> Result<&'a ConfigValue, ConfigReaderFailure> {
        self.value.ok_or_else(|| {
            self.failed(FailureReason::KeyNotFound {
                key: self.path.last_key().unwrap_or_default(),
                candidates: Vec::new(),
            })
        })
    }

    fn wrong_type(&self, expected: &[ValueType], value: &ConfigValue) -> ConfigReaderFailure {
        self.failed(FailureReason::WrongType {
            expected: expected.to_vec(),
            found: value.value_type(),
        })
    }

    /// Navigate into an object member. A missing member is an undefined cursor;
    /// navigating below an undefined cursor stays undefined.
    pub fn at_key(&self, key: &str) -> Result<ConfigCursor<'a>, ConfigReaderFailure> {
        let path = self.path.key(key);
        let Some(value) = self.value else {
            return Ok(self.child(path, None));
        };
        match value.kind() {
            ValueKind::Object(map) => Ok(self.child(path, map.get(key))),
            _ => Err(self.wrong_type(&[ValueType::Object], value)),
        }
    }

    /// Navigate into a list element. Out-of-range indices are undefined.
    pub fn at_index(&self, index: usize) -> Result<ConfigCursor<'a>, ConfigReaderFailure> {
        let path = self.path.index(index);
        let Some(value) = self.value else {
            return Ok(self.child(path, None));
        };
        match value.kind() {
            ValueKind::List(items) => Ok(self.child(path, items.get(index))),
            _ => Err(self.wrong_type(&[ValueType::List], value)),
        }
    }

    /// Index into a list, or look up the numeric key in an object.
    pub fn at_index_or_key(&self, index: usize) -> Result<ConfigCursor<'a>, ConfigReaderFailure> {
        let Some(value) = self.value else {
            return self.at_index(index);
        };
        match value.kind() {
            ValueKind::Object(_) => self.at_key(&index.to_string()),
            ValueKind::List(_) => self.at_index(index),
            _ => Err(self.wrong_type(&[ValueType::List, ValueType::Object], value)),
        }
    }

    /// Navigate a dotted path (`"app.server"`) one key at a time.
    pub fn at_path(&self, dotted: &str) -> Result<ConfigCursor<'a>, ConfigReaderFailure> {
        dotted
            .split('.')
            .filter(|s| !s.is_empty())
            .try_fold(self.clone(), |cursor, segment| cursor.at_key(segment))
    }

    /// String projection. Numbers and booleans are accepted and rendered, as
    /// HOCON does for unquoted scalars.
    pub fn as_string(&self) -> Result<String, ConfigReaderFailure> {
        let value = self.defined()?;
        match value.kind() {
            ValueKind::String(s) => Ok(s.clone()),
            ValueKind::Number(n) => Ok(n.to_string()),
            ValueKind::Boolean(b) => Ok(b.to_string()),
            _ => Err(self.wrong_type(&[ValueType::String], value)),
        }
    }

    /// Number projection. Numeric strings are parsed.
    pub fn as_number(&self) -> Result<Number, ConfigReaderFailure> {
        let value = self.defined()?;
        match value.kind() {
            ValueKind::Number(n) => Ok(*n),
            ValueKind::String(s) => parse_number(s.trim()).ok_or_else(|| {
                self.failed(FailureReason::cannot_convert(
                    s.clone(),
                    "number",
                    "not a numeric literal",
                ))
            }),
            _ => Err(self.wrong_type(&[ValueType::Number], value)),
        }
    }

    /// Boolean projection. `true/false/yes/no/on/off` strings are accepted.
    pub fn as_boolean(&self) -> Result<bool, ConfigReaderFailure> {
        let value = self.defined()?;
        match value.kind() {
            ValueKind::Boolean(b) => Ok(*b),
            ValueKind::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" => Ok(true),
                "false" | "no" | "off" => Ok(false),
                _ => Err(self.failed(FailureReason::cannot_convert(
                    s.clone(),
                    "boolean",
                    "expected true/false, yes/no or on/off",
                ))),
            },
            _ => Err(self.wrong_type(&[ValueType::Boolean], value)),
        }
    }

    /// Element cursors of a list. An object whose keys are all non-negative
    /// integers is read as a list ordered by index.
    pub fn as_list(&self) -> Result<Vec<ConfigCursor<'a>>, ConfigReaderFailure> {
        let value = self.defined()?;
        match value.kind() {
            ValueKind::List(items) => Ok(items
                .iter()
                .enumerate()
                .map(|(i, item)| self.child(self.path.index(i), Some(item)))
                .collect()),
            ValueKind::Object(map) => {
                let mut indexed = Vec::with_capacity(map.len());
                for (key, item) in map {
                    let Ok(index) = key.parse::<usize>() else {
                        return Err(self.wrong_type(&[ValueType::List], value));
                    };
                    indexed.push((index, key, item));
                }
                indexed.sort_by_key(|(index, _, _)| *index);
                Ok(indexed
                    .into_iter()
                    .map(|(_, key, item)| self.child(self.path.key(key.as_str()), Some(item)))
                    .collect())
            }
            _ => Err(self.wrong_type(&[ValueType::List], value)),
        }
    }

    /// The underlying object map.
    pub fn as_object(&self) -> Result<&'a BTreeMap<String, ConfigValue>, ConfigReaderFailure> {
        let value = self.defined()?;
        value
            .as_object()
            .ok_or_else(|| self.wrong_type(&[ValueType::Object], value))
    }

    /// `(key, cursor)` pairs of an object, in key order.
    pub fn entries(&self) -> Result<Vec<(&'a str, ConfigCursor<'a>)>, ConfigReaderFailure> {
        let map = self.as_object()?;
        Ok(map
            .iter()
            .map(|(key, value)| (key.as_str(), self.child(self.path.key(key.as_str()), Some(value))))
            .collect())
    }

    /// Read a `T` here, preferring a reader registered for `T` over `T`'s own
    /// implementation.
    pub fn read<T: ReadConfig>(&self) -> ReadResult<T> {
        if let Some(reader) = self.registry.and_then(ConverterRegistry::reader::<T>) {
            tracing::trace!(path = %self.path, ty = std::any::type_name::<T>(), "using registered reader");
            return reader.read(self);
        }
        T::read_config(self)
    }

    /// Whether the reader that [`read`](Self::read) would use accepts an
    /// undefined cursor.
    pub fn allows_missing<T: ReadConfig>(&self) -> bool {
        match self.registry.and_then(ConverterRegistry::reader::<T>) {
            Some(reader) => reader.allows_missing_key(),
            None => T::allows_missing_key(),
        }
    }
}

fn parse_number(s: &str) -> Option<Number> {
    if let Ok(i) = s.parse::<i128>() {
        return Some(Number::Integer(i));
    }
    // Reject "inf"/"NaN" spellings that `f64::from_str` accepts.
    if !s.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<f64>().ok().filter(|x| x.is_finite()).map(Number::Float)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ConfigValue {
        ConfigValue::object([
            ("name", ConfigValue::from("svc")),
            ("port", ConfigValue::from(8080)),
            ("nothing", ConfigValue::null()),
            (
                "servers",
                ConfigValue::list([ConfigValue::object([("host", ConfigValue::from("a"))])]),
            ),
        ])
    }

    #[test]
    fn missing_key_is_undefined_not_error() {
        let value = sample();
        let cursor = ConfigCursor::new(&value);
        let missing = cursor.at_key("absent").unwrap();
        assert!(missing.is_undefined());
        assert_eq!(missing.path().to_string(), "absent");
    }

    #[test]
    fn null_is_defined() {
        let value = sample();
        let cursor = ConfigCursor::new(&value).at_key("nothing").unwrap();
        assert!(!cursor.is_undefined());
        assert!(cursor.is_null());
    }

    #[test]
    fn key_access_on_scalar_is_wrong_type() {
        let value = sample();
        let port = ConfigCursor::new(&value).at_key("port").unwrap();
        let err = port.at_key("deeper").unwrap_err();
        assert!(matches!(
            err.reason(),
            FailureReason::WrongType { found: ValueType::Number, .. }
        ));
        assert_eq!(err.path().to_string(), "port");
    }

    #[test]
    fn paths_use_dot_and_bracket_notation() {
        let value = sample();
        let host = ConfigCursor::new(&value)
            .at_key("servers")
            .and_then(|c| c.at_index(0))
            .and_then(|c| c.at_key("host"))
            .unwrap();
        assert_eq!(host.path().to_string(), "servers[0].host");
        assert_eq!(host.as_string().unwrap(), "a");
    }

    #[test]
    fn quoted_keys_in_paths() {
        let path = ConfigPath::root().key("headers").key("x.forwarded");
        assert_eq!(path.to_string(), r#"headers."x.forwarded""#);
    }

    #[test]
    fn projections_report_wrong_type() {
        let value = sample();
        let name = ConfigCursor::new(&value).at_key("name").unwrap();
        assert!(name.as_list().is_err());
        let err = name.as_boolean().unwrap_err();
        assert!(matches!(err.reason(), FailureReason::CannotConvert { .. }));
    }

    #[test]
    fn loose_scalar_projections() {
        let s = ConfigValue::from("42");
        assert_eq!(ConfigCursor::new(&s).as_number().unwrap(), Number::Integer(42));
        let b = ConfigValue::from("on");
        assert!(ConfigCursor::new(&b).as_boolean().unwrap());
        let n = ConfigValue::from(7);
        assert_eq!(ConfigCursor::new(&n).as_string().unwrap(), "7");
        let inf = ConfigValue::from("inf");
        assert!(ConfigCursor::new(&inf).as_number().is_err());
    }

    #[test]
    fn undefined_projection_is_key_not_found() {
        let cursor = ConfigCursor::undefined(ConfigPath::parse("app.port"));
        let err = cursor.as_number().unwrap_err();
        match err.reason() {
            FailureReason::KeyNotFound { key, .. } => assert_eq!(key, "port"),
            other => panic!("Expected KeyNotFound, got: {other:?}"),
        }
    }

    #[test]
    fn numeric_keyed_object_reads_as_list() {
        let value = ConfigValue::object([
            ("1", ConfigValue::from("b")),
            ("0", ConfigValue::from("a")),
            ("10", ConfigValue::from("c")),
        ]);
        let cursor = ConfigCursor::new(&value);
        let items: Vec<String> = cursor
            .as_list()
            .unwrap()
            .iter()
            .map(|c| c.as_string().unwrap())
            .collect();
        assert_eq!(items, vec!["a", "b", "c"]);
        assert_eq!(cursor.at_index_or_key(1).unwrap().as_string().unwrap(), "b");
    }

    #[test]
    fn at_path_walks_nested_keys() {
        let value = ConfigValue::object([(
            "app",
            ConfigValue::object([("server", ConfigValue::object([("port", ConfigValue::from(1))]))]),
        )]);
        let cursor = ConfigCursor::new(&value).at_path("app.server").unwrap();
        assert_eq!(cursor.path().to_string(), "app.server");
        assert!(!cursor.is_undefined());
        let missing = ConfigCursor::new(&value).at_path("app.client.port").unwrap();
        assert!(missing.is_undefined());
    }
}
