use std::path::PathBuf;
use thiserror::Error;

use crate::failure::ConfigReaderFailures;

#[derive(Debug, Error)]
pub enum ShapefigError {
    #[error("Failed to parse TOML from {origin}: {source}")]
    TomlParse {
        origin: String,
        source: toml::de::Error,
    },

    #[error("Failed to parse JSON from {origin}: {source}")]
    JsonParse {
        origin: String,
        source: serde_json::Error,
    },

    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Unsupported config format for {path} (expected .toml or .json)")]
    UnsupportedFormat { path: PathBuf },

    #[error("Invalid override for '{key}': {reason}")]
    InvalidOverride { key: String, reason: String },

    #[error("Cannot render configuration: {reason}")]
    Render { reason: String },

    #[error("{0}")]
    Read(#[from] ConfigReaderFailures),

    #[error(transparent)]
    Derivation(#[from] DerivationError),
}

/// A shape that no converter can be derived for.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DerivationError {
    #[error("Cannot derive a converter for '{root}': the shape is cyclic ({cycle})")]
    CyclicShape { root: &'static str, cycle: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::ConfigPath;
    use crate::failure::{ConfigReaderFailure, FailureReason};
    use crate::value::Origin;

    #[test]
    fn read_error_lists_failures_with_origin() {
        let failure = ConfigReaderFailure::new(
            FailureReason::UnknownKey {
                key: "typo_key".into(),
            },
            ConfigPath::parse("server.typo_key"),
            Some(Origin::new("/home/user/.config/myapp/config.toml").with_line(42)),
        );
        let err = ShapefigError::from(ConfigReaderFailures::new(failure));
        let msg = err.to_string();
        assert!(msg.contains("typo_key"));
        assert!(msg.contains("config.toml"));
        assert!(msg.contains("42"));
    }

    #[test]
    fn invalid_override_formats() {
        let err = ShapefigError::InvalidOverride {
            key: "database.url".into(),
            reason: "'database' is not a table".into(),
        };
        assert!(err.to_string().contains("database.url"));
    }

    #[test]
    fn cyclic_shape_names_the_cycle() {
        let err = ShapefigError::from(DerivationError::CyclicShape {
            root: "Node",
            cycle: "Node -> next -> Node".into(),
        });
        assert!(err.to_string().contains("Node -> next -> Node"));
    }
}
