//! Layered loading: merge sources, apply overrides, read a typed value.
//!
//! No layer is required. Steps, in order:
//!
//! 1. Parse each layer (files are read from disk here, not when added)
//! 2. Deep-merge layers (later overrides earlier)
//! 3. Deep-merge dotted-key overrides on top (highest priority)
//! 4. Check that the target type's shape is derivable
//! 5. Move to the namespace, if any, and read the target type

use std::path::{Path, PathBuf};

use crate::convert::{ReadConfig, WriteConfig, WriteContext};
use crate::cursor::ConfigCursor;
use crate::derive::check_shape;
use crate::error::ShapefigError;
use crate::failure::ConfigReaderFailures;
use crate::merge::deep_merge;
use crate::overrides::overrides_to_object;
use crate::parse;
use crate::registry::ConverterRegistry;
use crate::value::ConfigValue;

/// Entry point for building a layered configuration.
pub struct Shapefig;

impl Shapefig {
    pub fn builder() -> ShapefigBuilder {
        ShapefigBuilder::default()
    }
}

#[derive(Debug, Clone)]
enum Layer {
    Value(ConfigValue),
    Toml { origin: String, content: String },
    Json { origin: String, content: String },
    File { path: PathBuf, required: bool },
}

/// Builder for layered configuration.
///
/// Layers are listed in **priority-ascending** order: the last one added has
/// the highest priority. Overrides sit above every layer.
#[derive(Debug, Clone, Default)]
pub struct ShapefigBuilder {
    layers: Vec<Layer>,
    overrides: Vec<(String, ConfigValue)>,
    namespace: Option<String>,
    registry: ConverterRegistry,
}

impl ShapefigBuilder {
    /// Add an in-memory tree as a layer.
    pub fn value(mut self, value: ConfigValue) -> Self {
        self.layers.push(Layer::Value(value));
        self
    }

    /// Add TOML text as a layer. `origin` names it in diagnostics.
    pub fn toml_str(mut self, origin: &str, content: &str) -> Self {
        self.layers.push(Layer::Toml {
            origin: origin.to_string(),
            content: content.to_string(),
        });
        self
    }

    /// Add JSON text as a layer. `origin` names it in diagnostics.
    pub fn json_str(mut self, origin: &str, content: &str) -> Self {
        self.layers.push(Layer::Json {
            origin: origin.to_string(),
            content: content.to_string(),
        });
        self
    }

    /// Add a `.toml` or `.json` file as a layer. A missing file is an error.
    pub fn file(mut self, path: impl AsRef<Path>) -> Self {
        self.layers.push(Layer::File {
            path: path.as_ref().to_path_buf(),
            required: true,
        });
        self
    }

    /// Like [`file`](Self::file), but a missing file is skipped.
    pub fn optional_file(mut self, path: impl AsRef<Path>) -> Self {
        self.layers.push(Layer::File {
            path: path.as_ref().to_path_buf(),
            required: false,
        });
        self
    }

    /// Add an override at a dotted key. `None` values are ignored (useful for
    /// optional CLI args).
    pub fn override_value<V: Into<ConfigValue>>(mut self, key: &str, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.overrides.push((key.to_string(), v.into()));
        }
        self
    }

    /// Read the target type from a dotted sub-path (`"app.server"`) of the
    /// merged tree.
    pub fn at(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    /// Converters and hints consulted before the types' own implementations.
    pub fn registry(mut self, registry: ConverterRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Merge every layer and the overrides into one tree.
    pub fn resolve(&self) -> Result<ConfigValue, ShapefigError> {
        let mut merged = ConfigValue::empty_object();
        for layer in &self.layers {
            if let Some(value) = load_layer(layer)? {
                merged = deep_merge(merged, value);
            }
        }

        if !self.overrides.is_empty() {
            let overrides = overrides_to_object(&self.overrides)?;
            merged = deep_merge(merged, overrides);
        }

        tracing::debug!(
            layers = self.layers.len(),
            overrides = self.overrides.len(),
            "resolved configuration tree"
        );
        Ok(merged)
    }

    /// Resolve and read a `T`, reporting every failure found.
    pub fn load<T: ReadConfig>(&self) -> Result<T, ShapefigError> {
        check_shape::<T>()?;
        let merged = self.resolve()?;
        let root = ConfigCursor::new(&merged).with_registry(&self.registry);
        let cursor = match &self.namespace {
            Some(namespace) => root.at_path(namespace).map_err(ConfigReaderFailures::from)?,
            None => root,
        };
        cursor.read::<T>().map_err(|failures| {
            tracing::debug!(failures = failures.len(), "configuration read failed");
            ShapefigError::from(failures)
        })
    }
}

fn load_layer(layer: &Layer) -> Result<Option<ConfigValue>, ShapefigError> {
    match layer {
        Layer::Value(value) => Ok(Some(value.clone())),
        Layer::Toml { origin, content } => parse::parse_toml(content, origin).map(Some),
        Layer::Json { origin, content } => parse::parse_json(content, origin).map(Some),
        Layer::File { path, required } => {
            let content = match std::fs::read_to_string(path) {
                Ok(content) => content,
                Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::debug!(path = %path.display(), "optional config file not found");
                    return Ok(None);
                }
                Err(e) => {
                    return Err(ShapefigError::IoError {
                        path: path.clone(),
                        source: e,
                    });
                }
            };
            tracing::debug!(path = %path.display(), "loaded config file");
            let origin = path.display().to_string();
            match path.extension().and_then(|e| e.to_str()) {
                Some("toml") => parse::parse_toml(&content, &origin).map(Some),
                Some("json") => parse::parse_json(&content, &origin).map(Some),
                _ => Err(ShapefigError::UnsupportedFormat { path: path.clone() }),
            }
        }
    }
}

/// Read a `T` from a tree.
pub fn from_value<T: ReadConfig>(value: &ConfigValue) -> Result<T, ShapefigError> {
    check_shape::<T>()?;
    Ok(ConfigCursor::new(value).read::<T>()?)
}

/// Write a `T` as a tree.
pub fn to_value<T: WriteConfig + 'static>(value: &T) -> ConfigValue {
    WriteContext::default().write(value)
}

/// Read a `T` from a TOML document.
pub fn from_toml_str<T: ReadConfig>(content: &str) -> Result<T, ShapefigError> {
    from_value(&parse::parse_toml(content, "TOML string")?)
}

/// Write a `T` as a TOML document.
pub fn to_toml_string<T: WriteConfig + 'static>(value: &T) -> Result<String, ShapefigError> {
    parse::to_toml_string(&to_value(value))
}
