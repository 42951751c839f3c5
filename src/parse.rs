//! TOML and JSON text ⇄ [`ConfigValue`].
//!
//! Parsed values carry an [`Origin`] naming their source. TOML values also get
//! a best-effort line number, found by scanning the source text.

use std::collections::BTreeMap;

use crate::error::ShapefigError;
use crate::value::{ConfigValue, Number, Origin, ValueKind};

/// Parse a TOML document. `origin` names the source in diagnostics.
pub fn parse_toml(content: &str, origin: &str) -> Result<ConfigValue, ShapefigError> {
    let table: toml::Table = content.parse().map_err(|e| ShapefigError::TomlParse {
        origin: origin.to_string(),
        source: e,
    })?;
    let source = Origin::new(origin);
    let mut path = Vec::new();
    Ok(from_toml_table(table, content, &source, &mut path))
}

fn from_toml_table(
    table: toml::Table,
    content: &str,
    source: &Origin,
    path: &mut Vec<String>,
) -> ConfigValue {
    let line = if path.is_empty() {
        None
    } else {
        Some(find_key_line(content, &path.join(".")))
    };
    let map: BTreeMap<String, ConfigValue> = table
        .into_iter()
        .map(|(key, value)| {
            path.push(key.clone());
            let converted = from_toml_value(value, content, source, path);
            path.pop();
            (key, converted)
        })
        .collect();
    located(ConfigValue::from(map), source, line)
}

fn from_toml_value(
    value: toml::Value,
    content: &str,
    source: &Origin,
    path: &mut Vec<String>,
) -> ConfigValue {
    let kind = match value {
        toml::Value::Table(table) => return from_toml_table(table, content, source, path),
        toml::Value::String(s) => ValueKind::String(s),
        toml::Value::Integer(i) => ValueKind::Number(Number::Integer(i128::from(i))),
        toml::Value::Float(x) => ValueKind::Number(Number::Float(x)),
        toml::Value::Boolean(b) => ValueKind::Boolean(b),
        toml::Value::Datetime(dt) => ValueKind::String(dt.to_string()),
        toml::Value::Array(items) => {
            // Elements share the line of the array's key.
            let origin = located_origin(source, find_key_line(content, &path.join(".")));
            let items = items
                .into_iter()
                .map(|item| from_toml_value(item, "", &origin, &mut Vec::new()))
                .collect();
            return ConfigValue::new(ValueKind::List(items)).with_origin(origin);
        }
    };
    let line = find_key_line(content, &path.join("."));
    located(ConfigValue::new(kind), source, Some(line))
}

fn located(value: ConfigValue, source: &Origin, line: Option<usize>) -> ConfigValue {
    let origin = match line {
        Some(line) => located_origin(source, line),
        None => source.clone(),
    };
    value.with_origin(origin)
}

/// `source` at `line`, or `source` unchanged when the line is unknown (0).
fn located_origin(source: &Origin, line: usize) -> Origin {
    if line == 0 {
        source.clone()
    } else {
        source.clone().with_line(line)
    }
}

/// Find the 1-indexed line number for a key in TOML content.
///
/// For a dotted key like `"database.typo"`, tracks the current `[section]` header
/// while scanning and only matches the leaf key when inside the correct section.
/// A key naming a section itself matches its header line.
///
/// This is a best-effort heuristic. It handles standard `[section]` headers and
/// bare key assignments but does not handle quoted keys or inline tables.
/// Returns 0 if the key cannot be located.
fn find_key_line(content: &str, dotted_key: &str) -> usize {
    let segments: Vec<&str> = dotted_key.split('.').collect();
    let leaf = segments.last().copied().unwrap_or(dotted_key);
    let expected_section = &segments[..segments.len().saturating_sub(1)]; // empty for top-level

    let mut current_section: Vec<String> = Vec::new();

    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();

        // Track [section] headers
        if trimmed.starts_with('[') && !trimmed.starts_with("[[") {
            let header = trimmed.trim_start_matches('[').trim_end_matches(']').trim();
            current_section = header.split('.').map(|s| s.trim().to_string()).collect();
            if current_section.iter().map(String::as_str).eq(segments.iter().copied()) {
                return i + 1;
            }
            continue;
        }

        let in_right_section = expected_section.len() == current_section.len()
            && expected_section
                .iter()
                .zip(&current_section)
                .all(|(a, b)| *a == b);

        if in_right_section
            && let Some(after_key) = trimmed.strip_prefix(leaf)
            && after_key.trim_start().starts_with('=')
        {
            return i + 1;
        }
    }
    0
}

/// Parse a JSON document. The root may be any JSON value.
pub fn parse_json(content: &str, origin: &str) -> Result<ConfigValue, ShapefigError> {
    let value: serde_json::Value =
        serde_json::from_str(content).map_err(|e| ShapefigError::JsonParse {
            origin: origin.to_string(),
            source: e,
        })?;
    Ok(from_json_value(value, Some(&Origin::new(origin))))
}

/// Convert a JSON value, tagging every node with `origin` when given.
pub fn from_json_value(value: serde_json::Value, origin: Option<&Origin>) -> ConfigValue {
    let kind = match value {
        serde_json::Value::Null => ValueKind::Null,
        serde_json::Value::Bool(b) => ValueKind::Boolean(b),
        serde_json::Value::Number(n) => ValueKind::Number(json_number(&n)),
        serde_json::Value::String(s) => ValueKind::String(s),
        serde_json::Value::Array(items) => ValueKind::List(
            items
                .into_iter()
                .map(|item| from_json_value(item, origin))
                .collect(),
        ),
        serde_json::Value::Object(map) => ValueKind::Object(
            map.into_iter()
                .map(|(key, item)| (key, from_json_value(item, origin)))
                .collect(),
        ),
    };
    let value = ConfigValue::new(kind);
    match origin {
        Some(origin) => value.with_origin(origin.clone()),
        None => value,
    }
}

fn json_number(n: &serde_json::Number) -> Number {
    if let Some(i) = n.as_i64() {
        Number::Integer(i128::from(i))
    } else if let Some(u) = n.as_u64() {
        Number::Integer(i128::from(u))
    } else {
        Number::Float(n.as_f64().unwrap_or(f64::NAN))
    }
}

/// Convert to a JSON value. Integers must fit `i64` or `u64`; floats must be
/// finite.
pub fn to_json_value(value: &ConfigValue) -> Result<serde_json::Value, String> {
    Ok(match value.kind() {
        ValueKind::Null => serde_json::Value::Null,
        ValueKind::Boolean(b) => serde_json::Value::Bool(*b),
        ValueKind::Number(Number::Integer(i)) => {
            if let Ok(signed) = i64::try_from(*i) {
                serde_json::Value::from(signed)
            } else if let Ok(unsigned) = u64::try_from(*i) {
                serde_json::Value::from(unsigned)
            } else {
                return Err(format!("integer {i} does not fit in 64 bits"));
            }
        }
        ValueKind::Number(Number::Float(x)) => serde_json::Number::from_f64(*x)
            .map(serde_json::Value::Number)
            .ok_or_else(|| format!("{x} is not a finite number"))?,
        ValueKind::String(s) => serde_json::Value::String(s.clone()),
        ValueKind::List(items) => serde_json::Value::Array(
            items.iter().map(to_json_value).collect::<Result<_, _>>()?,
        ),
        ValueKind::Object(map) => serde_json::Value::Object(
            map.iter()
                .map(|(key, item)| Ok((key.clone(), to_json_value(item)?)))
                .collect::<Result<_, String>>()?,
        ),
    })
}

/// Render as pretty-printed JSON.
pub fn to_json_string(value: &ConfigValue) -> Result<String, ShapefigError> {
    let json = to_json_value(value).map_err(|reason| ShapefigError::Render { reason })?;
    serde_json::to_string_pretty(&json).map_err(|e| ShapefigError::Render {
        reason: e.to_string(),
    })
}

/// Render as a TOML document. The root must be an object; `null` object
/// members are omitted since TOML has no null.
pub fn to_toml_string(value: &ConfigValue) -> Result<String, ShapefigError> {
    let render = |reason: String| ShapefigError::Render { reason };
    let Some(map) = value.as_object() else {
        return Err(render(format!(
            "a TOML document must be a table, found {}",
            value.value_type()
        )));
    };
    let table = to_toml_table(map).map_err(render)?;
    toml::to_string(&table).map_err(|e| render(e.to_string()))
}

fn to_toml_table(map: &BTreeMap<String, ConfigValue>) -> Result<toml::Table, String> {
    let mut table = toml::Table::new();
    for (key, item) in map {
        if item.is_null() {
            continue;
        }
        table.insert(key.clone(), to_toml_value(item)?);
    }
    Ok(table)
}

fn to_toml_value(value: &ConfigValue) -> Result<toml::Value, String> {
    Ok(match value.kind() {
        ValueKind::Null => return Err("TOML cannot represent null inside an array".to_string()),
        ValueKind::Boolean(b) => toml::Value::Boolean(*b),
        ValueKind::Number(Number::Integer(i)) => toml::Value::Integer(
            i64::try_from(*i).map_err(|_| format!("integer {i} does not fit in i64"))?,
        ),
        ValueKind::Number(Number::Float(x)) => toml::Value::Float(*x),
        ValueKind::String(s) => toml::Value::String(s.clone()),
        ValueKind::List(items) => {
            toml::Value::Array(items.iter().map(to_toml_value).collect::<Result<_, _>>()?)
        }
        ValueKind::Object(map) => toml::Value::Table(to_toml_table(map)?),
    })
}
