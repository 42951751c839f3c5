//! Runtime of the derivation engine.
//!
//! The `config_record!`, `config_enum!` and `config_enumeration!` macros expand
//! to calls into this module; hand-written [`ReadConfig`] / [`WriteConfig`]
//! impls can use it the same way:
//!
//! ```ignore
//! impl ReadConfig for Endpoint {
//!     fn read_config(cursor: &ConfigCursor<'_>) -> ReadResult<Self> {
//!         let mut record = RecordReader::new::<Self>(cursor)?;
//!         let host = record.field::<String>("host", None);
//!         let port = record.field::<u16>("port", Some(&|| 80));
//!         record.finish()?;
//!         match (host, port) {
//!             (Some(host), Some(port)) => Ok(Endpoint { host, port }),
//!             _ => Err(incomplete_record(cursor)),
//!         }
//!     }
//! }
//! ```
//!
//! # Record reading
//!
//! For each declared field, in order:
//!
//! 1. The field name is mapped to a key by the [`ProductHint`] in effect.
//! 2. If the key is absent and the hint uses default args and the field has a
//!    default, the default is used.
//! 3. Otherwise, if the key is absent and the field's reader does not accept
//!    missing keys, the field fails with `KeyNotFound` (listing keys that spell
//!    the same words in another convention).
//! 4. Otherwise the field's reader runs on the child cursor.
//!
//! Failures are recorded and reading continues. [`RecordReader::finish`]
//! reports field failures in field order, then one `UnknownKey` per unmatched
//! key when the hint disallows unknown keys.

use std::collections::{BTreeMap, BTreeSet};

use crate::convert::{ReadConfig, Reader, WriteConfig, WriteContext, short_type_name};
use crate::cursor::ConfigCursor;
use crate::error::DerivationError;
use crate::failure::{Accumulator, ConfigReaderFailure, ConfigReaderFailures, FailureReason, ReadResult};
use crate::hint::{CoproductHint, ProductHint};
use crate::naming::normalized;
use crate::registry::{resolve_coproduct_hint, resolve_product_hint};
use crate::value::{ConfigValue, ValueKind};

fn bare(name: &str) -> &str {
    name.strip_prefix("r#").unwrap_or(name)
}

/// Reads the fields of one record from an object node.
pub struct RecordReader<'c, 'a> {
    cursor: &'c ConfigCursor<'a>,
    object: &'a BTreeMap<String, ConfigValue>,
    hint: ProductHint,
    used: BTreeSet<String>,
    failures: Accumulator,
}

impl<'c, 'a> RecordReader<'c, 'a> {
    /// Start reading a record of shape `T`, with the product hint registered
    /// for `T` (or the default). Fails if the node is not an object.
    pub fn new<T: 'static>(cursor: &'c ConfigCursor<'a>) -> ReadResult<Self> {
        Self::with_hint(cursor, resolve_product_hint::<T>(cursor.registry()))
    }

    pub fn with_hint(cursor: &'c ConfigCursor<'a>, hint: ProductHint) -> ReadResult<Self> {
        let object = cursor.as_object()?;
        Ok(Self {
            cursor,
            object,
            hint,
            used: BTreeSet::new(),
            failures: Accumulator::new(),
        })
    }

    /// Read one field. `None` means the field failed; its failures are kept
    /// for [`finish`](Self::finish).
    pub fn field<F: ReadConfig>(&mut self, name: &str, default: Option<&dyn Fn() -> F>) -> Option<F> {
        let key = self.hint.config_key(bare(name));
        self.used.insert(key.clone());
        let child = match self.cursor.at_key(&key) {
            Ok(child) => child,
            Err(failure) => {
                self.failures.push(failure);
                return None;
            }
        };

        if child.is_undefined() {
            if self.hint.uses_default_args()
                && let Some(default) = default
            {
                return Some(default());
            }
            if !child.allows_missing::<F>() {
                let candidates = self.candidates(&key);
                self.failures.push(ConfigReaderFailure::new(
                    FailureReason::KeyNotFound { key, candidates },
                    child.path().clone(),
                    self.cursor.origin().cloned(),
                ));
                return None;
            }
        }
        self.failures.take(child.read::<F>())
    }

    fn candidates(&self, key: &str) -> Vec<String> {
        let wanted = normalized(key);
        self.object
            .keys()
            .filter(|k| k.as_str() != key && normalized(k) == wanted)
            .cloned()
            .collect()
    }

    /// All field failures in field order, then unknown keys.
    pub fn finish(self) -> ReadResult<()> {
        let mut failures = self.failures;
        if !self.hint.allows_unknown_keys() {
            for (key, value) in self.object {
                if !self.used.contains(key) {
                    failures.push(ConfigReaderFailure::new(
                        FailureReason::UnknownKey { key: key.clone() },
                        self.cursor.path().key(key.as_str()),
                        value.origin().cloned(),
                    ));
                }
            }
        }
        if failures.has_failures() {
            tracing::trace!(path = %self.cursor.path(), "record read failed");
        }
        failures.finish(())
    }
}

/// Failure for a record whose fields reported success but could not be
/// assembled. Generated code needs a fallback arm; it is never reached when
/// every failed field recorded a failure.
pub fn incomplete_record(cursor: &ConfigCursor<'_>) -> ConfigReaderFailures {
    cursor
        .failed(FailureReason::ExternalError {
            message: "record could not be assembled from its fields".to_string(),
        })
        .into()
}

/// Writes the fields of one record as an object node.
pub struct RecordWriter<'a> {
    ctx: WriteContext<'a>,
    hint: ProductHint,
    entries: BTreeMap<String, ConfigValue>,
}

impl<'a> RecordWriter<'a> {
    pub fn new<T: 'static>(ctx: &WriteContext<'a>) -> Self {
        Self {
            ctx: *ctx,
            hint: resolve_product_hint::<T>(ctx.registry()),
            entries: BTreeMap::new(),
        }
    }

    /// Write one field under its mapped key. Absent values (`None`) are omitted.
    pub fn field<F: WriteConfig + 'static>(&mut self, name: &str, value: &F) {
        if value.is_absent() {
            return;
        }
        let key = self.hint.config_key(bare(name));
        self.entries.insert(key, self.ctx.write(value));
    }

    pub fn finish(self) -> ConfigValue {
        ConfigValue::from(self.entries)
    }
}

/// Reads one variant of a sum type from the node the cursor points at.
pub type VariantReadFn<T> = for<'c, 'a> fn(&'c ConfigCursor<'a>) -> ReadResult<T>;

/// Read a sum type whose variants are listed in declaration order.
///
/// With [`CoproductHint::Field`], the discriminator picks the variant and is
/// removed before the variant is read. With [`CoproductHint::FirstSuccess`],
/// variants are tried in order and the first success wins.
pub fn read_sum<T: 'static>(
    cursor: &ConfigCursor<'_>,
    variants: &[(&'static str, VariantReadFn<T>)],
) -> ReadResult<T> {
    match resolve_coproduct_hint::<T>(cursor.registry()) {
        CoproductHint::Field { key, mapping } => {
            cursor.as_object()?;
            let discriminator = cursor.at_key(&key)?;
            if discriminator.is_undefined() {
                return Err(ConfigReaderFailure::new(
                    FailureReason::KeyNotFound {
                        key,
                        candidates: Vec::new(),
                    },
                    discriminator.path().clone(),
                    cursor.origin().cloned(),
                )
                .into());
            }
            let value = discriminator.as_string()?;
            let Some((_, read)) = variants.iter().find(|(name, _)| mapping.apply(name) == value)
            else {
                let expected = variants.iter().map(|(name, _)| mapping.apply(name)).collect();
                return discriminator.fail(FailureReason::UnexpectedDiscriminator { value, expected });
            };
            let stripped = cursor.defined()?.without_key(&key);
            read(&cursor.with_value(&stripped))
        }
        CoproductHint::FirstSuccess => {
            let mut attempts = Vec::with_capacity(variants.len());
            for (name, read) in variants {
                match read(cursor) {
                    Ok(value) => return Ok(value),
                    Err(failures) => attempts.push((name.to_string(), failures)),
                }
            }
            cursor.fail(FailureReason::NoValidCoproductOption { attempts })
        }
    }
}

/// Mark a written variant body the way the coproduct hint for `T` reads it.
pub fn write_variant<T: 'static>(ctx: &WriteContext<'_>, variant: &str, body: ConfigValue) -> ConfigValue {
    match resolve_coproduct_hint::<T>(ctx.registry()) {
        CoproductHint::Field { key, mapping } => match body.into_kind() {
            ValueKind::Object(mut map) => {
                map.insert(key, ConfigValue::string(mapping.apply(variant)));
                ConfigValue::from(map)
            }
            other => ConfigValue::new(other),
        },
        CoproductHint::FirstSuccess => body,
    }
}

/// Read a unit-only enum from its variant name, spelled through the
/// coproduct hint's variant mapping.
pub fn read_enumeration<T: 'static>(
    cursor: &ConfigCursor<'_>,
    options: &[(&'static str, fn() -> T)],
) -> ReadResult<T> {
    let hint = resolve_coproduct_hint::<T>(cursor.registry());
    let value = cursor.as_string()?;
    match options.iter().find(|(name, _)| hint.variant_key(name) == value) {
        Some((_, make)) => Ok(make()),
        None => {
            let expected: Vec<String> = options.iter().map(|(name, _)| hint.variant_key(name)).collect();
            cursor.fail(FailureReason::cannot_convert(
                value,
                short_type_name::<T>(),
                format!("expected one of: {}", expected.join(", ")),
            ))
        }
    }
}

pub fn write_enumeration<T: 'static>(ctx: &WriteContext<'_>, variant: &str) -> ConfigValue {
    ConfigValue::string(resolve_coproduct_hint::<T>(ctx.registry()).variant_key(variant))
}

/// Reject a cyclic shape for `T`.
pub fn check_shape<T: ReadConfig>() -> Result<(), DerivationError> {
    let result = T::shape().check();
    if let Err(err) = &result {
        tracing::debug!(ty = short_type_name::<T>(), error = %err, "shape rejected");
    }
    result
}

/// A reader for `T`, after checking that its shape can be derived.
pub fn reader<T: ReadConfig>() -> Result<Reader<T>, DerivationError> {
    check_shape::<T>()?;
    Ok(Reader::of())
}
