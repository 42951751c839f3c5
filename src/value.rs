//! The generic configuration tree.
//!
//! A [`ConfigValue`] is what an external parser hands to the conversion engine
//! and what the writer direction hands back. Values are immutable once built
//! and may carry an [`Origin`] describing where they were read from. Origins are
//! diagnostics only: two values compare equal regardless of where they came from.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A parsed configuration node.
#[derive(Debug, Clone)]
pub struct ConfigValue {
    kind: ValueKind,
    origin: Option<Origin>,
}

/// The tagged payload of a [`ConfigValue`].
#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
    Null,
    Boolean(bool),
    Number(Number),
    String(String),
    List(Vec<ConfigValue>),
    Object(BTreeMap<String, ConfigValue>),
}

/// A numeric literal. Integers are kept wide enough for both `i64` and `u64`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Integer(i128),
    Float(f64),
}

/// The node kind, used in `WrongType` diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Null,
    Boolean,
    Number,
    String,
    List,
    Object,
}

/// Where a value came from: a source description (file path, `"<string>"`, ...)
/// and, when known, the 1-indexed line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    description: Arc<str>,
    line: Option<usize>,
}

impl Origin {
    pub fn new(description: impl Into<Arc<str>>) -> Self {
        Self {
            description: description.into(),
            line: None,
        }
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = (line > 0).then_some(line);
        self
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn line(&self) -> Option<usize> {
        self.line
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{} (line {line})", self.description),
            None => write!(f, "{}", self.description),
        }
    }
}

impl ConfigValue {
    pub fn new(kind: ValueKind) -> Self {
        Self { kind, origin: None }
    }

    pub fn null() -> Self {
        Self::new(ValueKind::Null)
    }

    pub fn string(s: impl Into<String>) -> Self {
        Self::new(ValueKind::String(s.into()))
    }

    pub fn list(items: impl IntoIterator<Item = ConfigValue>) -> Self {
        Self::new(ValueKind::List(items.into_iter().collect()))
    }

    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, ConfigValue)>) -> Self {
        Self::new(ValueKind::Object(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// An object with no keys.
    pub fn empty_object() -> Self {
        Self::new(ValueKind::Object(BTreeMap::new()))
    }

    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut ValueKind {
        &mut self.kind
    }

    pub fn into_kind(self) -> ValueKind {
        self.kind
    }

    pub fn origin(&self) -> Option<&Origin> {
        self.origin.as_ref()
    }

    pub fn value_type(&self) -> ValueType {
        match &self.kind {
            ValueKind::Null => ValueType::Null,
            ValueKind::Boolean(_) => ValueType::Boolean,
            ValueKind::Number(_) => ValueType::Number,
            ValueKind::String(_) => ValueType::String,
            ValueKind::List(_) => ValueType::List,
            ValueKind::Object(_) => ValueType::Object,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.kind, ValueKind::Null)
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, ConfigValue>> {
        match &self.kind {
            ValueKind::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ConfigValue]> {
        match &self.kind {
            ValueKind::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            ValueKind::String(s) => Some(s),
            _ => None,
        }
    }

    /// Navigate by dotted key (`"database.url"`). Only objects are traversed.
    pub fn get_path(&self, dotted_key: &str) -> Option<&ConfigValue> {
        dotted_key
            .split('.')
            .try_fold(self, |current, segment| current.as_object()?.get(segment))
    }

    /// A copy of this object without `key`, keeping the origin. Non-objects are
    /// returned unchanged.
    pub fn without_key(&self, key: &str) -> ConfigValue {
        match &self.kind {
            ValueKind::Object(map) => {
                let mut map = map.clone();
                map.remove(key);
                ConfigValue {
                    kind: ValueKind::Object(map),
                    origin: self.origin.clone(),
                }
            }
            _ => self.clone(),
        }
    }

    /// Render scalars as their raw text (no quotes), containers as
    /// [`Display`](fmt::Display) does. Used when quoting a value in a diagnostic.
    pub fn render(&self) -> String {
        match &self.kind {
            ValueKind::String(s) => s.clone(),
            _ => self.to_string(),
        }
    }
}

impl PartialEq for ConfigValue {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ValueKind::Null => write!(f, "null"),
            ValueKind::Boolean(b) => write!(f, "{b}"),
            ValueKind::Number(n) => write!(f, "{n}"),
            ValueKind::String(s) => write!(f, "{s:?}"),
            ValueKind::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            ValueKind::Object(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key} = {value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(i) => write!(f, "{i}"),
            Number::Float(x) => write!(f, "{x}"),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Null => "null",
            ValueType::Boolean => "boolean",
            ValueType::Number => "number",
            ValueType::String => "string",
            ValueType::List => "list",
            ValueType::Object => "object",
        };
        f.write_str(name)
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        Self::new(ValueKind::Boolean(b))
    }
}

macro_rules! from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for ConfigValue {
                fn from(n: $t) -> Self {
                    Self::new(ValueKind::Number(Number::Integer(i128::from(n))))
                }
            }
        )*
    };
}

from_integer!(i8, i16, i32, i64, u8, u16, u32, u64);

impl From<f64> for ConfigValue {
    fn from(x: f64) -> Self {
        Self::new(ValueKind::Number(Number::Float(x)))
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        Self::string(s)
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        Self::string(s)
    }
}

impl From<Vec<ConfigValue>> for ConfigValue {
    fn from(items: Vec<ConfigValue>) -> Self {
        Self::new(ValueKind::List(items))
    }
}

impl From<BTreeMap<String, ConfigValue>> for ConfigValue {
    fn from(map: BTreeMap<String, ConfigValue>) -> Self {
        Self::new(ValueKind::Object(map))
    }
}
