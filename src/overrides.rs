//! Convert dotted-key overrides into a nested object.
//!
//! Each `("database.url", value)` pair is expanded into the nested object
//! structure needed for deep-merge with other config layers.

use std::collections::BTreeMap;

use crate::error::ShapefigError;
use crate::value::{ConfigValue, Origin, ValueKind};

/// Convert dotted-key overrides into a nested object.
///
/// `("database.url", "pg://")` becomes `{database = {url = "pg://"}}`
///
/// If multiple entries target the same key, the last one wins. An entry that
/// descends through a key another entry set to a scalar is an
/// [`InvalidOverride`](ShapefigError::InvalidOverride).
pub fn overrides_to_object(entries: &[(String, ConfigValue)]) -> Result<ConfigValue, ShapefigError> {
    let mut root = BTreeMap::new();
    for (dotted_key, value) in entries {
        let origin = Origin::new(format!("override '{dotted_key}'"));
        set_nested(&mut root, dotted_key, value.clone().with_origin(origin))?;
    }
    Ok(ConfigValue::from(root))
}

fn set_nested(
    root: &mut BTreeMap<String, ConfigValue>,
    dotted_key: &str,
    value: ConfigValue,
) -> Result<(), ShapefigError> {
    let segments: Vec<&str> = dotted_key.split('.').collect();
    let Some((leaf, parents)) = segments.split_last() else {
        return Err(invalid(dotted_key, "empty key"));
    };
    if segments.iter().any(|s| s.is_empty()) {
        return Err(invalid(dotted_key, "empty path segment"));
    }

    let mut current = root;
    for segment in parents {
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(ConfigValue::empty_object);
        current = match entry.kind_mut() {
            ValueKind::Object(map) => map,
            _ => return Err(invalid(dotted_key, &format!("'{segment}' is not a table"))),
        };
    }
    current.insert(leaf.to_string(), value);
    Ok(())
}

fn invalid(key: &str, reason: &str) -> ShapefigError {
    ShapefigError::InvalidOverride {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
