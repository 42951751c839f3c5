//! Typed configuration from loosely-typed trees. Define a type, derive its
//! converter, and read it with every problem reported at once.
//!
//! Shapefig reads configuration documents (TOML, JSON, or trees you build in
//! code) into your own types through converters, and writes those types back
//! out. Converters for records and sum types are derived from the type's
//! declaration; converters for primitives, collections, durations, and
//! addresses come built in.
//!
//! ```ignore
//! shapefig::config_record! {
//!     pub struct Server {
//!         pub host: String,
//!         pub port: u16 = 8080,
//!         pub idle_timeout: Duration = Duration::from_secs(30),
//!     }
//! }
//!
//! let server: Server = Shapefig::builder()
//!     .file("/etc/myapp/server.toml")
//!     .optional_file("server.local.toml")
//!     .override_value("port", cli.port)
//!     .load()?;
//! ```
//!
//! # Why shapefig
//!
//! Reading configuration by hand means the same plumbing over and over: look
//! up a key, check its type, convert it, and bail out on the first problem.
//! The user fixes one typo, reruns, and hits the next one.
//!
//! Shapefig replaces that plumbing with the type declaration. The struct says
//! which keys exist, what type each one has, and what the defaults are. A read
//! pass visits every field and collects every failure, each annotated with the
//! path in the document and the file and line the value came from:
//!
//! ```text
//! at 'servers[1].port' (prod.toml, line 9): Cannot convert '70000' to u16: out of range
//! at 'servers[1].host' (prod.toml): Key not found: 'host'.
//! ```
//!
//! # The tree
//!
//! Every source is parsed into a [`ConfigValue`]: null, boolean, number,
//! string, list, or object, each node tagged with an optional [`Origin`].
//! Converters never see TOML or JSON directly. They navigate the tree through
//! a [`ConfigCursor`], which tracks the [`ConfigPath`] from the root and the
//! [`ConverterRegistry`] in effect.
//!
//! Scalars are loosely typed, the way hand-written config files are: a number
//! can be read from `"8080"`, a boolean from `"yes"` or `"off"`, a string from
//! `42`. An object whose keys are all indices (`{"0" = .., "1" = ..}`) reads as
//! a list.
//!
//! # Converters
//!
//! Reading is the [`ReadConfig`] trait; writing is [`WriteConfig`]. For
//! one-off conversions that should not be tied to a type's trait impl, use
//! the first-class [`Reader`] and [`Writer`] values and their combinators
//! (`map`, `emap`, `try_map`, `ensure`, `or_else`, `zip`, `contramap`).
//!
//! A registry overrides the trait impls per type. Registered readers, writers,
//! and hints are consulted first at every field, element, and top-level read:
//!
//! ```ignore
//! let registry = ConverterRegistry::new()
//!     .with_reader(Reader::<Port>::from_str())
//!     .with_product_hint::<Server>(ProductHint::default().allow_unknown_keys(false));
//! ```
//!
//! # Derivation
//!
//! [`config_record!`], [`config_enum!`], and [`config_enumeration!`] declare a
//! type and derive its converters:
//!
//! - **Records** map each field to a key through the record's
//!   [`ProductHint`] (default: `snake_case` fields, `kebab-case` keys).
//!   Fields may declare a default with `= expr`, used when the key is absent.
//!   `Option` fields may always be absent; absent `Option` fields are omitted
//!   when writing.
//! - **Sum types** are selected through the type's [`CoproductHint`]: by
//!   default a `type` discriminator holding the `kebab-case` variant name, or
//!   first-success across the variants in order.
//! - **Enumerations** are unit-only enums read from their variant name.
//!
//! A type that contains itself (through `Option`, `Box`, or a collection) has
//! no finite shape. Loading such a type fails up front with
//! [`DerivationError::CyclicShape`] instead of at some depth of the document.
//!
//! # Failures
//!
//! A read returns a [`ReadResult`]: the value, or a non-empty
//! [`ConfigReaderFailures`] list. Each [`ConfigReaderFailure`] carries a
//! [`FailureReason`], the path, and the origin. Independent fields and list
//! elements are all visited, so one run reports everything.
//!
//! # Layered loading
//!
//! [`Shapefig::builder()`] merges sources in **priority-ascending** order
//! (last = highest): in-memory trees, TOML or JSON text, and files chosen by
//! extension. Dotted-key overrides sit above every layer. Every layer is
//! **sparse**: objects merge key by key, anything else is replaced.
//!
//! ```text
//! Field defaults        pub port: u16 = 8080
//!        ↑ overridden by
//! Layers                .toml_str() / .json_str() / .file(), later wins
//!        ↑ overridden by
//! Overrides             .override_value("port", ..)
//! ```
//!
//! # Types that already speak serde
//!
//! [`serde_reader`], [`strict_serde_reader`], and [`serde_writer`] bridge any
//! `Deserialize`/`Serialize` type into the converter world, so it can be a
//! field of a derived record or be registered in a registry.
//!
//! # Error handling
//!
//! Front-door operations return [`ShapefigError`]. Parse errors name their
//! source, read errors list every failure, and derivation errors spell out the
//! cycle. See the [`error`] module for the full set.

pub mod derive;
pub mod error;
pub mod parse;

mod containers;
mod convert;
mod cursor;
mod duration;
mod failure;
mod hint;
mod macros;
mod merge;
mod naming;
mod overrides;
mod primitives;
mod registry;
mod serde_bridge;
mod shape;
mod source;
mod value;

#[cfg(test)]
mod fixtures;

pub use convert::{ReadConfig, Reader, WriteConfig, WriteContext, Writer};
pub use cursor::{ConfigCursor, ConfigPath, PathSegment};
pub use duration::{format_duration, parse_duration};
pub use error::{DerivationError, ShapefigError};
pub use failure::{
    Accumulator, ConfigReaderFailure, ConfigReaderFailures, FailureReason, ReadResult, collect_all,
};
pub use hint::{CoproductHint, ProductHint};
pub use merge::deep_merge;
pub use naming::{ConfigFieldMapping, NamingConvention};
pub use overrides::overrides_to_object;
pub use registry::ConverterRegistry;
pub use serde_bridge::{serde_reader, serde_writer, strict_serde_reader};
pub use shape::{FieldShape, Shape, ShapeFn, ShapeKind, VariantShape};
pub use source::{Shapefig, ShapefigBuilder, from_toml_str, from_value, to_toml_string, to_value};
pub use value::{ConfigValue, Number, Origin, ValueKind, ValueType};
