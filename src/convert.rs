//! The converter contract: typed value ⇄ configuration tree.
//!
//! Two layers:
//!
//! - [`ReadConfig`] / [`WriteConfig`] are the type-directed instances: one per
//!   type, found by the compiler. Built-ins live in `primitives` and
//!   `containers`; records and sum types get theirs from the derivation macros.
//! - [`Reader`] / [`Writer`] are first-class converter values with combinators
//!   (`map`, `emap`, `or_else`, `and_then`, `contramap`, ...). They are what
//!   callers register in a [`ConverterRegistry`] to override a type's instance.
//!
//! Both are pure: no shared mutable state, safe to reuse and to call from
//! several threads at once.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::cursor::ConfigCursor;
use crate::failure::{FailureReason, ReadResult};
use crate::registry::ConverterRegistry;
use crate::shape::Shape;
use crate::value::ConfigValue;

/// Types that can be read from a configuration cursor.
pub trait ReadConfig: Sized + 'static {
    fn read_config(cursor: &ConfigCursor<'_>) -> ReadResult<Self>;

    /// Whether this reader decides for itself what an undefined cursor means.
    /// When `false`, a record reports `KeyNotFound` for a missing key without
    /// calling the reader.
    fn allows_missing_key() -> bool {
        false
    }

    /// Structural description, used to reject cyclic shapes before reading.
    fn shape() -> Shape {
        Shape::leaf::<Self>()
    }
}

/// Settings in effect while writing: the registry consulted for field writers
/// and hints.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteContext<'a> {
    registry: Option<&'a ConverterRegistry>,
}

impl<'a> WriteContext<'a> {
    pub fn new(registry: &'a ConverterRegistry) -> Self {
        Self {
            registry: Some(registry),
        }
    }

    pub fn registry(&self) -> Option<&'a ConverterRegistry> {
        self.registry
    }

    /// Write a `T`, preferring a writer registered for `T`.
    pub fn write<T: WriteConfig + 'static>(&self, value: &T) -> ConfigValue {
        match self.registry.and_then(ConverterRegistry::writer::<T>) {
            Some(writer) => writer.write_with(value, self),
            None => value.write_with(self),
        }
    }
}

/// Types that can be written as a configuration tree.
pub trait WriteConfig {
    fn write_with(&self, ctx: &WriteContext<'_>) -> ConfigValue;

    /// `true` when a record should omit the key entirely (e.g. `None`).
    fn is_absent(&self) -> bool {
        false
    }

    fn write_config(&self) -> ConfigValue {
        self.write_with(&WriteContext::default())
    }
}

type ReadFn<T> = dyn Fn(&ConfigCursor<'_>) -> ReadResult<T> + Send + Sync;
type WriteFn<T> = dyn Fn(&T, &WriteContext<'_>) -> ConfigValue + Send + Sync;

/// A first-class reader for `T`.
pub struct Reader<T> {
    read: Arc<ReadFn<T>>,
    allow_missing_key: bool,
}

impl<T> Clone for Reader<T> {
    fn clone(&self) -> Self {
        Self {
            read: Arc::clone(&self.read),
            allow_missing_key: self.allow_missing_key,
        }
    }
}

impl<T> fmt::Debug for Reader<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reader")
            .field("type", &std::any::type_name::<T>())
            .field("allow_missing_key", &self.allow_missing_key)
            .finish()
    }
}

impl<T: 'static> Reader<T> {
    pub fn from_fn(f: impl Fn(&ConfigCursor<'_>) -> ReadResult<T> + Send + Sync + 'static) -> Self {
        Self {
            read: Arc::new(f),
            allow_missing_key: false,
        }
    }

    /// The type's own instance. Does not consult a registry for `T` itself.
    pub fn of() -> Self
    where
        T: ReadConfig,
    {
        Self {
            read: Arc::new(T::read_config),
            allow_missing_key: T::allows_missing_key(),
        }
    }

    /// Parse from the string projection of the node.
    pub fn from_string(
        parse: impl Fn(&str) -> Result<T, FailureReason> + Send + Sync + 'static,
    ) -> Self {
        Self::from_fn(move |cursor| {
            let s = cursor.as_string()?;
            parse(&s).map_err(|reason| cursor.failed(reason).into())
        })
    }

    /// Like [`from_string`](Self::from_string), but an empty string is an
    /// `EmptyString` failure.
    pub fn from_non_empty_string(
        parse: impl Fn(&str) -> Result<T, FailureReason> + Send + Sync + 'static,
    ) -> Self {
        Self::from_string(move |s| {
            if s.is_empty() {
                return Err(FailureReason::EmptyString {
                    to_type: short_type_name::<T>().to_string(),
                });
            }
            parse(s)
        })
    }

    /// Parse with `T`'s [`FromStr`]; the parse error becomes `CannotConvert`.
    pub fn from_str() -> Self
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        Self::from_string(|s| {
            s.parse::<T>().map_err(|e| {
                FailureReason::cannot_convert(s, short_type_name::<T>(), e.to_string())
            })
        })
    }

    pub fn read(&self, cursor: &ConfigCursor<'_>) -> ReadResult<T> {
        (self.read)(cursor)
    }

    pub fn allows_missing_key(&self) -> bool {
        self.allow_missing_key
    }

    /// Invoke this reader on undefined cursors instead of reporting `KeyNotFound`.
    pub fn allowing_missing_key(mut self) -> Self {
        self.allow_missing_key = true;
        self
    }

    /// Transform the success value. Failures pass through unchanged.
    pub fn map<U: 'static>(self, f: impl Fn(T) -> U + Send + Sync + 'static) -> Reader<U> {
        let allow = self.allow_missing_key;
        Reader {
            read: Arc::new(move |cursor| self.read(cursor).map(&f)),
            allow_missing_key: allow,
        }
    }

    /// Transform with a fallible function; its failure is located at the
    /// cursor being read.
    pub fn emap<U: 'static>(
        self,
        f: impl Fn(T) -> Result<U, FailureReason> + Send + Sync + 'static,
    ) -> Reader<U> {
        let allow = self.allow_missing_key;
        Reader {
            read: Arc::new(move |cursor| {
                let value = self.read(cursor)?;
                f(value).map_err(|reason| cursor.failed(reason).into())
            }),
            allow_missing_key: allow,
        }
    }

    /// Transform with a function returning its own error type. The error
    /// becomes an `ExternalError` at the cursor's path.
    pub fn try_map<U: 'static, E: fmt::Display>(
        self,
        f: impl Fn(T) -> Result<U, E> + Send + Sync + 'static,
    ) -> Reader<U> {
        self.emap(move |value| {
            f(value).map_err(|e| FailureReason::ExternalError {
                message: e.to_string(),
            })
        })
    }

    /// Reject values failing `predicate` with a `CannotConvert` carrying `message`.
    pub fn ensure(
        self,
        predicate: impl Fn(&T) -> bool + Send + Sync + 'static,
        message: impl Fn(&T) -> String + Send + Sync + 'static,
    ) -> Reader<T> {
        let allow = self.allow_missing_key;
        Reader {
            read: Arc::new(move |cursor| {
                let value = self.read(cursor)?;
                if predicate(&value) {
                    Ok(value)
                } else {
                    let raw = cursor.value().map(ConfigValue::render).unwrap_or_default();
                    cursor.fail(FailureReason::cannot_convert(
                        raw,
                        short_type_name::<T>(),
                        message(&value),
                    ))
                }
            }),
            allow_missing_key: allow,
        }
    }

    /// Try `self`; on failure, discard its failures and try `other`.
    /// First success wins; when both fail, `other`'s failures are returned.
    pub fn or_else(self, other: Reader<T>) -> Reader<T> {
        let allow = self.allow_missing_key || other.allow_missing_key;
        Reader {
            read: Arc::new(move |cursor| self.read(cursor).or_else(|_| other.read(cursor))),
            allow_missing_key: allow,
        }
    }

    /// Read a `T`, then read the same node with the reader `f` picks for it.
    pub fn and_then<U: 'static>(
        self,
        f: impl Fn(T) -> Reader<U> + Send + Sync + 'static,
    ) -> Reader<U> {
        let allow = self.allow_missing_key;
        Reader {
            read: Arc::new(move |cursor| {
                let value = self.read(cursor)?;
                f(value).read(cursor)
            }),
            allow_missing_key: allow,
        }
    }

    /// Read both from the same node, accumulating the failures of both.
    pub fn zip<U: 'static>(self, other: Reader<U>) -> Reader<(T, U)> {
        let allow = self.allow_missing_key && other.allow_missing_key;
        Reader {
            read: Arc::new(move |cursor| match (self.read(cursor), other.read(cursor)) {
                (Ok(a), Ok(b)) => Ok((a, b)),
                (Err(failures), Ok(_)) | (Ok(_), Err(failures)) => Err(failures),
                (Err(first), Err(second)) => Err(first.concat(second)),
            }),
            allow_missing_key: allow,
        }
    }
}

/// A first-class writer for `T`.
pub struct Writer<T> {
    write: Arc<WriteFn<T>>,
}

impl<T> Clone for Writer<T> {
    fn clone(&self) -> Self {
        Self {
            write: Arc::clone(&self.write),
        }
    }
}

impl<T> fmt::Debug for Writer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Writer")
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T: 'static> Writer<T> {
    pub fn from_fn(f: impl Fn(&T) -> ConfigValue + Send + Sync + 'static) -> Self {
        Self {
            write: Arc::new(move |value, _| f(value)),
        }
    }

    pub fn of() -> Self
    where
        T: WriteConfig,
    {
        Self {
            write: Arc::new(|value, ctx| value.write_with(ctx)),
        }
    }

    /// Write as the string produced by `T`'s `Display`.
    pub fn display() -> Self
    where
        T: fmt::Display,
    {
        Self::from_fn(|value| ConfigValue::string(value.to_string()))
    }

    pub fn write(&self, value: &T) -> ConfigValue {
        self.write_with(value, &WriteContext::default())
    }

    pub fn write_with(&self, value: &T, ctx: &WriteContext<'_>) -> ConfigValue {
        (self.write)(value, ctx)
    }

    /// Write a `U` by first projecting it to a `T`.
    pub fn contramap<U: 'static>(self, f: impl Fn(&U) -> T + Send + Sync + 'static) -> Writer<U> {
        Writer {
            write: Arc::new(move |value, ctx| self.write_with(&f(value), ctx)),
        }
    }

    /// Post-process the written tree.
    pub fn map_output(
        self,
        f: impl Fn(ConfigValue) -> ConfigValue + Send + Sync + 'static,
    ) -> Writer<T> {
        Writer {
            write: Arc::new(move |value, ctx| f(self.write_with(value, ctx))),
        }
    }
}

/// The last path component of a type name: `alloc::string::String` → `String`,
/// `Vec<std::time::Duration>` → `Vec<Duration>`.
pub(crate) fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    match full.find('<') {
        Some(_) => full,
        None => full.rsplit("::").next().unwrap_or(full),
    }
}
