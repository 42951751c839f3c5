//! Per-shape policy: how records map field names and treat missing/unknown
//! keys, and how sum types pick their variant.

use crate::naming::{ConfigFieldMapping, NamingConvention};

/// Policy for reading and writing one record shape.
///
/// Three independent axes:
///
/// - **Field mapping**: declared field name → config key (default
///   `snake_case` → `kebab-case`).
/// - **Unknown keys**: allowed (default) or reported, one `UnknownKey` failure
///   per unmatched key.
/// - **Default args**: when a key is absent and the field declares a default,
///   use it (default). When disabled, absence is `KeyNotFound` unless the field
///   reader itself accepts missing keys.
///
/// Writing applies only the field mapping.
#[derive(Debug, Clone)]
pub struct ProductHint {
    field_mapping: ConfigFieldMapping,
    allow_unknown_keys: bool,
    use_default_args: bool,
}

impl ProductHint {
    pub fn new(field_mapping: ConfigFieldMapping) -> Self {
        Self {
            field_mapping,
            ..Self::default()
        }
    }

    pub fn field_mapping(mut self, mapping: ConfigFieldMapping) -> Self {
        self.field_mapping = mapping;
        self
    }

    pub fn allow_unknown_keys(mut self, allow: bool) -> Self {
        self.allow_unknown_keys = allow;
        self
    }

    pub fn use_default_args(mut self, use_defaults: bool) -> Self {
        self.use_default_args = use_defaults;
        self
    }

    pub fn allows_unknown_keys(&self) -> bool {
        self.allow_unknown_keys
    }

    pub fn uses_default_args(&self) -> bool {
        self.use_default_args
    }

    pub fn mapping(&self) -> &ConfigFieldMapping {
        &self.field_mapping
    }

    /// The config key for a declared field name.
    pub fn config_key(&self, field: &str) -> String {
        self.field_mapping.apply(field)
    }
}

impl Default for ProductHint {
    fn default() -> Self {
        Self {
            field_mapping: ConfigFieldMapping::default(),
            allow_unknown_keys: true,
            use_default_args: true,
        }
    }
}

/// Strategy for reading and writing a sum type.
#[derive(Debug, Clone)]
pub enum CoproductHint {
    /// A discriminator field names the variant. The discriminator key is
    /// removed before the variant is read, and added back when writing.
    Field {
        key: String,
        mapping: ConfigFieldMapping,
    },
    /// Try every variant in declaration order; the first that reads wins.
    /// Writing emits the variant's own value with no marker.
    FirstSuccess,
}

impl CoproductHint {
    /// Discriminate on `key`, with variant names mapped `PascalCase` →
    /// `kebab-case`.
    pub fn field(key: impl Into<String>) -> Self {
        CoproductHint::Field {
            key: key.into(),
            mapping: ConfigFieldMapping::new(
                NamingConvention::PascalCase,
                NamingConvention::KebabCase,
            ),
        }
    }

    /// How a variant name is spelled in configuration. Under `FirstSuccess`
    /// (which has no marker) the default `kebab-case` spelling is used, for
    /// enumerations and diagnostics.
    pub fn variant_key(&self, variant: &str) -> String {
        match self {
            CoproductHint::Field { mapping, .. } => mapping.apply(variant),
            CoproductHint::FirstSuccess => {
                NamingConvention::PascalCase.convert(variant, NamingConvention::KebabCase)
            }
        }
    }
}

impl Default for CoproductHint {
    fn default() -> Self {
        Self::field("type")
    }
}
