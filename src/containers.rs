//! Converters for `Option`, `Box` and collections.
//!
//! Collections read every element and accumulate every element failure, each
//! located at its own index or key.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;

use crate::convert::{ReadConfig, WriteConfig, WriteContext};
use crate::cursor::ConfigCursor;
use crate::failure::{ReadResult, collect_all};
use crate::shape::Shape;
use crate::value::ConfigValue;

/// Absent keys and `null` read as `None`.
impl<T: ReadConfig> ReadConfig for Option<T> {
    fn read_config(cursor: &ConfigCursor<'_>) -> ReadResult<Self> {
        if cursor.is_undefined() || cursor.is_null() {
            return Ok(None);
        }
        cursor.read::<T>().map(Some)
    }

    fn allows_missing_key() -> bool {
        true
    }

    fn shape() -> Shape {
        Shape::wrapper::<Self>(vec![T::shape])
    }
}

impl<T: WriteConfig + 'static> WriteConfig for Option<T> {
    fn write_with(&self, ctx: &WriteContext<'_>) -> ConfigValue {
        match self {
            Some(value) => ctx.write(value),
            None => ConfigValue::null(),
        }
    }

    fn is_absent(&self) -> bool {
        self.is_none()
    }
}

impl<T: ReadConfig> ReadConfig for Box<T> {
    fn read_config(cursor: &ConfigCursor<'_>) -> ReadResult<Self> {
        cursor.read::<T>().map(Box::new)
    }

    fn allows_missing_key() -> bool {
        T::allows_missing_key()
    }

    fn shape() -> Shape {
        Shape::wrapper::<Self>(vec![T::shape])
    }
}

impl<T: WriteConfig + 'static> WriteConfig for Box<T> {
    fn write_with(&self, ctx: &WriteContext<'_>) -> ConfigValue {
        ctx.write::<T>(self)
    }

    fn is_absent(&self) -> bool {
        T::is_absent(self)
    }
}

fn read_elements<T: ReadConfig>(cursor: &ConfigCursor<'_>) -> ReadResult<Vec<T>> {
    let items = cursor.as_list()?;
    collect_all(items.iter().map(|item| item.read::<T>()))
}

fn write_elements<'v, T: WriteConfig + 'static>(
    items: impl IntoIterator<Item = &'v T>,
    ctx: &WriteContext<'_>,
) -> ConfigValue {
    ConfigValue::list(items.into_iter().map(|item| ctx.write(item)))
}

fn read_entries<T: ReadConfig>(cursor: &ConfigCursor<'_>) -> ReadResult<Vec<(String, T)>> {
    let entries = cursor.entries()?;
    collect_all(
        entries
            .iter()
            .map(|(key, child)| child.read::<T>().map(|value| (key.to_string(), value))),
    )
}

fn write_entries<'v, T: WriteConfig + 'static>(
    entries: impl IntoIterator<Item = (&'v String, &'v T)>,
    ctx: &WriteContext<'_>,
) -> ConfigValue {
    ConfigValue::object(
        entries
            .into_iter()
            .map(|(key, value)| (key.clone(), ctx.write(value))),
    )
}

impl<T: ReadConfig> ReadConfig for Vec<T> {
    fn read_config(cursor: &ConfigCursor<'_>) -> ReadResult<Self> {
        read_elements(cursor)
    }

    fn shape() -> Shape {
        Shape::wrapper::<Self>(vec![T::shape])
    }
}

impl<T: WriteConfig + 'static> WriteConfig for Vec<T> {
    fn write_with(&self, ctx: &WriteContext<'_>) -> ConfigValue {
        write_elements(self, ctx)
    }
}

impl<T: ReadConfig + Eq + Hash> ReadConfig for HashSet<T> {
    fn read_config(cursor: &ConfigCursor<'_>) -> ReadResult<Self> {
        read_elements::<T>(cursor).map(|items| items.into_iter().collect())
    }

    fn shape() -> Shape {
        Shape::wrapper::<Self>(vec![T::shape])
    }
}

/// Elements are sorted by their rendered form, so equal sets always write
/// the same list. `BTreeSet` keeps the elements' own order instead.
impl<T: WriteConfig + 'static> WriteConfig for HashSet<T> {
    fn write_with(&self, ctx: &WriteContext<'_>) -> ConfigValue {
        let mut items: Vec<ConfigValue> = self.iter().map(|item| ctx.write(item)).collect();
        items.sort_by_cached_key(ConfigValue::to_string);
        ConfigValue::list(items)
    }
}

impl<T: ReadConfig + Ord> ReadConfig for BTreeSet<T> {
    fn read_config(cursor: &ConfigCursor<'_>) -> ReadResult<Self> {
        read_elements::<T>(cursor).map(|items| items.into_iter().collect())
    }

    fn shape() -> Shape {
        Shape::wrapper::<Self>(vec![T::shape])
    }
}

impl<T: WriteConfig + 'static> WriteConfig for BTreeSet<T> {
    fn write_with(&self, ctx: &WriteContext<'_>) -> ConfigValue {
        write_elements(self, ctx)
    }
}

macro_rules! map_converters {
    ($($map:ident),*) => {
        $(
            impl<T: ReadConfig> ReadConfig for $map<String, T> {
                fn read_config(cursor: &ConfigCursor<'_>) -> ReadResult<Self> {
                    read_entries::<T>(cursor).map(|entries| entries.into_iter().collect())
                }

                fn shape() -> Shape {
                    Shape::wrapper::<Self>(vec![T::shape])
                }
            }

            impl<T: WriteConfig + 'static> WriteConfig for $map<String, T> {
                fn write_with(&self, ctx: &WriteContext<'_>) -> ConfigValue {
                    write_entries(self, ctx)
                }
            }
        )*
    };
}

map_converters!(HashMap, BTreeMap);
