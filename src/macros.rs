//! Declarative derivation of converters.
//!
//! Each macro emits the type definition unchanged (minus field defaults) plus
//! [`ReadConfig`](crate::ReadConfig) and [`WriteConfig`](crate::WriteConfig)
//! impls built on the [`derive`](crate::derive) runtime, and a
//! [`Shape`](crate::Shape) description for cycle checks.

/// Define a record type with a derived converter.
///
/// A field may declare a default with `= expr`; it is used when the key is
/// absent and the record's [`ProductHint`](crate::ProductHint) uses default
/// args. The expression must have the field's exact type.
///
/// ```ignore
/// shapefig::config_record! {
///     #[derive(Debug, PartialEq)]
///     pub struct Holiday {
///         pub r#where: String = "last resort".to_string(),
///         pub how_long: Duration = Duration::from_secs(7 * 86_400),
///     }
/// }
/// ```
#[macro_export]
macro_rules! config_record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $ty:ty $(= $default:expr)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field : $ty,
            )*
        }

        impl $crate::ReadConfig for $name {
            fn read_config(cursor: &$crate::ConfigCursor<'_>) -> $crate::ReadResult<Self> {
                #[allow(unused_mut)]
                let mut record = $crate::derive::RecordReader::new::<Self>(cursor)?;
                $(
                    let $field = record.field::<$ty>(
                        stringify!($field),
                        $crate::__default_value!($ty $(, $default)?),
                    );
                )*
                record.finish()?;
                match ($($field,)*) {
                    ($(Some($field),)*) => Ok(Self { $($field),* }),
                    #[allow(unreachable_patterns)]
                    _ => Err($crate::derive::incomplete_record(cursor)),
                }
            }

            fn shape() -> $crate::Shape {
                $crate::Shape::record::<Self>(vec![
                    $(
                        $crate::FieldShape::new::<$ty>(
                            stringify!($field),
                            $crate::__has_default!($($default)?),
                        ),
                    )*
                ])
            }
        }

        impl $crate::WriteConfig for $name {
            fn write_with(&self, ctx: &$crate::WriteContext<'_>) -> $crate::ConfigValue {
                #[allow(unused_mut)]
                let mut record = $crate::derive::RecordWriter::new::<Self>(ctx);
                $( record.field(stringify!($field), &self.$field); )*
                record.finish()
            }
        }
    };
}

/// Define a sum type with a derived converter. Variants are units or have
/// named fields (with optional defaults, as in [`config_record!`]).
///
/// The variant is chosen by the type's [`CoproductHint`](crate::CoproductHint),
/// by default a `type` discriminator holding the kebab-case variant name.
///
/// ```ignore
/// shapefig::config_enum! {
///     #[derive(Debug, PartialEq)]
///     pub enum Figure {
///         Circle { radius: f64 },
///         RoundedRect { width: f64, height: f64, corner: f64 = 0.5 },
///         Point,
///     }
/// }
/// ```
#[macro_export]
macro_rules! config_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $({
                    $(
                        $(#[$field_meta:meta])*
                        $field:ident : $ty:ty $(= $default:expr)?
                    ),* $(,)?
                })?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant $({
                    $(
                        $(#[$field_meta])*
                        $field : $ty,
                    )*
                })?,
            )*
        }

        impl $crate::ReadConfig for $name {
            fn read_config(cursor: &$crate::ConfigCursor<'_>) -> $crate::ReadResult<Self> {
                $crate::derive::read_sum::<Self>(cursor, &[
                    $(
                        (stringify!($variant), {
                            fn read_variant(
                                cursor: &$crate::ConfigCursor<'_>,
                            ) -> $crate::ReadResult<$name> {
                                #[allow(unused_mut)]
                                let mut record = $crate::derive::RecordReader::new::<$name>(cursor)?;
                                $($(
                                    let $field = record.field::<$ty>(
                                        stringify!($field),
                                        $crate::__default_value!($ty $(, $default)?),
                                    );
                                )*)?
                                record.finish()?;
                                match ($($($field,)*)?) {
                                    ($($(Some($field),)*)?) => Ok($name::$variant $({ $($field),* })?),
                                    #[allow(unreachable_patterns)]
                                    _ => Err($crate::derive::incomplete_record(cursor)),
                                }
                            }
                            read_variant as $crate::derive::VariantReadFn<$name>
                        }),
                    )*
                ])
            }

            fn shape() -> $crate::Shape {
                $crate::Shape::sum::<Self>(vec![
                    $(
                        $crate::VariantShape::new(stringify!($variant), vec![
                            $($(
                                $crate::FieldShape::new::<$ty>(
                                    stringify!($field),
                                    $crate::__has_default!($($default)?),
                                ),
                            )*)?
                        ]),
                    )*
                ])
            }
        }

        impl $crate::WriteConfig for $name {
            fn write_with(&self, ctx: &$crate::WriteContext<'_>) -> $crate::ConfigValue {
                match self {
                    $(
                        $name::$variant $({ $($field),* })? => {
                            #[allow(unused_mut)]
                            let mut record = $crate::derive::RecordWriter::new::<$name>(ctx);
                            $($( record.field(stringify!($field), $field); )*)?
                            $crate::derive::write_variant::<$name>(
                                ctx,
                                stringify!($variant),
                                record.finish(),
                            )
                        }
                    )*
                }
            }
        }
    };
}

/// Define a unit-only enum read from and written as its variant name.
///
/// ```ignore
/// shapefig::config_enumeration! {
///     #[derive(Debug, Clone, Copy, PartialEq)]
///     pub enum LogLevel { Debug, Info, Warn }
/// }
/// ```
#[macro_export]
macro_rules! config_enumeration {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant,
            )*
        }

        impl $crate::ReadConfig for $name {
            fn read_config(cursor: &$crate::ConfigCursor<'_>) -> $crate::ReadResult<Self> {
                $crate::derive::read_enumeration::<Self>(cursor, &[
                    $( (stringify!($variant), (|| $name::$variant) as fn() -> $name), )*
                ])
            }
        }

        impl $crate::WriteConfig for $name {
            fn write_with(&self, ctx: &$crate::WriteContext<'_>) -> $crate::ConfigValue {
                match self {
                    $( $name::$variant => $crate::derive::write_enumeration::<$name>(ctx, stringify!($variant)), )*
                }
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __default_value {
    ($ty:ty) => {
        ::core::option::Option::None::<&dyn ::core::ops::Fn() -> $ty>
    };
    ($ty:ty, $default:expr) => {
        ::core::option::Option::Some::<&dyn ::core::ops::Fn() -> $ty>(&|| -> $ty { $default })
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __has_default {
    () => {
        false
    };
    ($default:expr) => {
        true
    };
}
