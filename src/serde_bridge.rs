//! Converters for types that already implement serde's traits.
//!
//! The node is bridged through `serde_json::Value`, so anything serde can
//! deserialize from JSON can be read here. These readers are leaves: failures
//! inside the value surface as a single `CannotConvert` at the cursor, except
//! for unknown keys in [`strict_serde_reader`], which are reported one by one.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::convert::{Reader, Writer, short_type_name};
use crate::cursor::{ConfigCursor, ConfigPath};
use crate::failure::{ConfigReaderFailure, ConfigReaderFailures, FailureReason, ReadResult};
use crate::parse::{from_json_value, to_json_value};
use crate::value::ConfigValue;

/// Read `T` with its `Deserialize` impl. Keys `T` ignores are ignored here too.
pub fn serde_reader<T: DeserializeOwned + 'static>() -> Reader<T> {
    Reader::from_fn(|cursor| {
        let (value, json) = bridge::<T>(cursor)?;
        serde_json::from_value(json).map_err(|e| cannot_convert::<T>(cursor, value, e))
    })
}

/// Like [`serde_reader`], but every key `T` does not consume is an
/// `UnknownKey` failure at its own path.
pub fn strict_serde_reader<T: DeserializeOwned + 'static>() -> Reader<T> {
    Reader::from_fn(|cursor| {
        let (value, json) = bridge::<T>(cursor)?;
        let mut unknown: Vec<ConfigPath> = Vec::new();
        let parsed: T = serde_ignored::deserialize(json, |ignored| {
            unknown.push(ignored_path(cursor.path(), &ignored));
        })
        .map_err(|e| cannot_convert::<T>(cursor, value, e))?;

        let failures: Vec<ConfigReaderFailure> = unknown
            .into_iter()
            .map(|path| {
                let key = path.last_key().unwrap_or_default();
                let origin = node_at(value, cursor.path(), &path)
                    .and_then(ConfigValue::origin)
                    .or_else(|| cursor.origin())
                    .cloned();
                ConfigReaderFailure::new(FailureReason::UnknownKey { key }, path, origin)
            })
            .collect();
        match ConfigReaderFailures::from_vec(failures) {
            Some(failures) => Err(failures),
            None => Ok(parsed),
        }
    })
}

/// Write `T` with its `Serialize` impl. Values JSON cannot represent are
/// logged and written as `null`.
pub fn serde_writer<T: Serialize + 'static>() -> Writer<T> {
    Writer::from_fn(|value: &T| match serde_json::to_value(value) {
        Ok(json) => from_json_value(json, None),
        Err(e) => {
            tracing::warn!(ty = short_type_name::<T>(), error = %e, "cannot serialize value; writing null");
            ConfigValue::null()
        }
    })
}

fn bridge<'a, T>(
    cursor: &ConfigCursor<'a>,
) -> ReadResult<(&'a ConfigValue, serde_json::Value)> {
    let value = cursor.defined()?;
    let json = to_json_value(value).map_err(|reason| {
        cursor.failed(FailureReason::cannot_convert(
            value.render(),
            short_type_name::<T>(),
            reason,
        ))
    })?;
    Ok((value, json))
}

fn cannot_convert<T>(
    cursor: &ConfigCursor<'_>,
    value: &ConfigValue,
    error: serde_json::Error,
) -> ConfigReaderFailures {
    cursor
        .failed(FailureReason::cannot_convert(
            value.render(),
            short_type_name::<T>(),
            error.to_string(),
        ))
        .into()
}

fn ignored_path(base: &ConfigPath, ignored: &serde_ignored::Path<'_>) -> ConfigPath {
    match ignored {
        serde_ignored::Path::Seq { parent, index } => ignored_path(base, parent).index(*index),
        serde_ignored::Path::Map { parent, key } => ignored_path(base, parent).key(key.to_string()),
        serde_ignored::Path::Some { parent }
        | serde_ignored::Path::NewtypeStruct { parent }
        | serde_ignored::Path::NewtypeVariant { parent } => ignored_path(base, parent),
        _ => base.clone(),
    }
}

/// The node at `path`, where `root` sits at `base`.
fn node_at<'a>(root: &'a ConfigValue, base: &ConfigPath, path: &ConfigPath) -> Option<&'a ConfigValue> {
    use crate::cursor::PathSegment;
    use crate::value::ValueKind;

    let relative = path.segments().get(base.segments().len()..)?;
    relative.iter().try_fold(root, |node, segment| match (segment, node.kind()) {
        (PathSegment::Key(key), ValueKind::Object(map)) => map.get(key),
        (PathSegment::Index(i), ValueKind::List(items)) => items.get(*i),
        _ => None,
    })
}
