//! Explicit override table for converters and hints, keyed by type.
//!
//! Every read goes through [`ConfigCursor::read`](crate::ConfigCursor::read)
//! and every record/sum-type write through [`WriteContext`](crate::WriteContext);
//! both check the registry before falling back to the type's own
//! [`ReadConfig`](crate::ReadConfig) / [`WriteConfig`](crate::WriteConfig)
//! implementation. Hints registered for a shape replace the process-wide
//! defaults for that shape only.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::convert::{Reader, Writer};
use crate::hint::{CoproductHint, ProductHint};

/// Registered readers, writers and hints.
///
/// Immutable once built and cheap to share; converters hold no mutable state,
/// so one registry can serve concurrent reads.
#[derive(Clone, Default)]
pub struct ConverterRegistry {
    readers: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    writers: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    product_hints: HashMap<TypeId, ProductHint>,
    coproduct_hints: HashMap<TypeId, CoproductHint>,
    default_product_hint: ProductHint,
    default_coproduct_hint: CoproductHint,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `T` with `reader` wherever a `T` is read.
    pub fn with_reader<T: 'static>(mut self, reader: Reader<T>) -> Self {
        self.readers.insert(TypeId::of::<T>(), Arc::new(reader));
        self
    }

    /// Write `T` with `writer` wherever a `T` is written as a field or element.
    pub fn with_writer<T: 'static>(mut self, writer: Writer<T>) -> Self {
        self.writers.insert(TypeId::of::<T>(), Arc::new(writer));
        self
    }

    /// Use `hint` for the record shape `T` (and for every variant of sum type `T`).
    pub fn with_product_hint<T: 'static>(mut self, hint: ProductHint) -> Self {
        self.product_hints.insert(TypeId::of::<T>(), hint);
        self
    }

    /// Use `hint` to pick variants of the sum type `T`.
    pub fn with_coproduct_hint<T: 'static>(mut self, hint: CoproductHint) -> Self {
        self.coproduct_hints.insert(TypeId::of::<T>(), hint);
        self
    }

    /// Replace the fallback product hint for shapes without their own.
    pub fn with_default_product_hint(mut self, hint: ProductHint) -> Self {
        self.default_product_hint = hint;
        self
    }

    /// Replace the fallback coproduct hint for sum types without their own.
    pub fn with_default_coproduct_hint(mut self, hint: CoproductHint) -> Self {
        self.default_coproduct_hint = hint;
        self
    }

    pub fn reader<T: 'static>(&self) -> Option<&Reader<T>> {
        self.readers
            .get(&TypeId::of::<T>())
            .and_then(|r| r.downcast_ref::<Reader<T>>())
    }

    pub fn writer<T: 'static>(&self) -> Option<&Writer<T>> {
        self.writers
            .get(&TypeId::of::<T>())
            .and_then(|w| w.downcast_ref::<Writer<T>>())
    }

    /// The product hint for `T`: registered, else this registry's default.
    pub fn product_hint<T: 'static>(&self) -> &ProductHint {
        self.product_hints
            .get(&TypeId::of::<T>())
            .unwrap_or(&self.default_product_hint)
    }

    /// The coproduct hint for `T`: registered, else this registry's default.
    pub fn coproduct_hint<T: 'static>(&self) -> &CoproductHint {
        self.coproduct_hints
            .get(&TypeId::of::<T>())
            .unwrap_or(&self.default_coproduct_hint)
    }
}

/// Product hint in effect for `T`, with or without a registry.
pub(crate) fn resolve_product_hint<T: 'static>(registry: Option<&ConverterRegistry>) -> ProductHint {
    registry
        .map(|r| r.product_hint::<T>().clone())
        .unwrap_or_default()
}

/// Coproduct hint in effect for `T`, with or without a registry.
pub(crate) fn resolve_coproduct_hint<T: 'static>(
    registry: Option<&ConverterRegistry>,
) -> CoproductHint {
    registry
        .map(|r| r.coproduct_hint::<T>().clone())
        .unwrap_or_default()
}

impl std::fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("readers", &self.readers.len())
            .field("writers", &self.writers.len())
            .field("product_hints", &self.product_hints.len())
            .field("coproduct_hints", &self.coproduct_hints.len())
            .field("default_product_hint", &self.default_product_hint)
            .field("default_coproduct_hint", &self.default_coproduct_hint)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::ConfigCursor;
    use crate::value::ConfigValue;

    #[test]
    fn registered_reader_is_found_by_type() {
        let registry = ConverterRegistry::new().with_reader(Reader::<u16>::from_fn(|_| Ok(7)));
        assert!(registry.reader::<u16>().is_some());
        assert!(registry.reader::<u32>().is_none());
    }

    #[test]
    fn registered_reader_overrides_builtin() {
        let registry = ConverterRegistry::new().with_reader(Reader::<u16>::from_fn(|_| Ok(7)));
        let value = ConfigValue::from(9000);
        let cursor = ConfigCursor::new(&value).with_registry(&registry);
        assert_eq!(cursor.read::<u16>().unwrap(), 7);
        assert_eq!(ConfigCursor::new(&value).read::<u16>().unwrap(), 9000);
    }

    #[test]
    fn product_hint_falls_back_to_default() {
        struct Shape;
        struct Other;
        let registry = ConverterRegistry::new()
            .with_product_hint::<Shape>(ProductHint::default().allow_unknown_keys(false));
        assert!(!registry.product_hint::<Shape>().allows_unknown_keys());
        assert!(registry.product_hint::<Other>().allows_unknown_keys());
        assert!(resolve_product_hint::<Other>(None).allows_unknown_keys());
    }

    #[test]
    fn default_hint_can_be_replaced() {
        struct Shape;
        let registry = ConverterRegistry::new()
            .with_default_product_hint(ProductHint::default().use_default_args(false));
        assert!(!resolve_product_hint::<Shape>(Some(&registry)).uses_default_args());
    }
}
