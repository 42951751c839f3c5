//! Converters for scalar types.
//!
//! Reading follows HOCON's loose typing: numeric strings read as numbers,
//! `yes`/`on` as booleans, and numbers or booleans as strings. Integer readers
//! accept integral floats (`3.0`) and report values outside the target range as
//! `CannotConvert`.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use crate::convert::{ReadConfig, WriteConfig, WriteContext, short_type_name};
use crate::cursor::ConfigCursor;
use crate::failure::{FailureReason, ReadResult};
use crate::value::{ConfigValue, Number, ValueKind};

// Below i128::MAX, so the cast never saturates.
const MAX_INTEGRAL_FLOAT: f64 = 1.0e38;

fn read_integer<T: TryFrom<i128> + 'static>(cursor: &ConfigCursor<'_>) -> ReadResult<T> {
    let wide = match cursor.as_number()? {
        Number::Integer(i) => i,
        Number::Float(x) if x.fract() == 0.0 && x.abs() < MAX_INTEGRAL_FLOAT => x as i128,
        Number::Float(x) => {
            return cursor.fail(FailureReason::cannot_convert(
                x.to_string(),
                short_type_name::<T>(),
                "not an integer",
            ));
        }
    };
    T::try_from(wide).map_err(|_| {
        cursor
            .failed(FailureReason::cannot_convert(
                wide.to_string(),
                short_type_name::<T>(),
                "out of range",
            ))
            .into()
    })
}

macro_rules! integer_converters {
    ($($t:ty),*) => {
        $(
            impl ReadConfig for $t {
                fn read_config(cursor: &ConfigCursor<'_>) -> ReadResult<Self> {
                    read_integer(cursor)
                }
            }

            impl WriteConfig for $t {
                fn write_with(&self, _ctx: &WriteContext<'_>) -> ConfigValue {
                    ConfigValue::new(ValueKind::Number(Number::Integer(*self as i128)))
                }
            }
        )*
    };
}

integer_converters!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl ReadConfig for f64 {
    fn read_config(cursor: &ConfigCursor<'_>) -> ReadResult<Self> {
        Ok(match cursor.as_number()? {
            Number::Integer(i) => i as f64,
            Number::Float(x) => x,
        })
    }
}

impl WriteConfig for f64 {
    fn write_with(&self, _ctx: &WriteContext<'_>) -> ConfigValue {
        ConfigValue::from(*self)
    }
}

impl ReadConfig for f32 {
    fn read_config(cursor: &ConfigCursor<'_>) -> ReadResult<Self> {
        let wide = f64::read_config(cursor)?;
        let narrow = wide as f32;
        if narrow.is_finite() {
            Ok(narrow)
        } else {
            cursor.fail(FailureReason::cannot_convert(
                wide.to_string(),
                "f32",
                "out of range",
            ))
        }
    }
}

impl WriteConfig for f32 {
    fn write_with(&self, _ctx: &WriteContext<'_>) -> ConfigValue {
        ConfigValue::from(f64::from(*self))
    }
}

impl ReadConfig for bool {
    fn read_config(cursor: &ConfigCursor<'_>) -> ReadResult<Self> {
        Ok(cursor.as_boolean()?)
    }
}

impl WriteConfig for bool {
    fn write_with(&self, _ctx: &WriteContext<'_>) -> ConfigValue {
        ConfigValue::from(*self)
    }
}

impl ReadConfig for String {
    fn read_config(cursor: &ConfigCursor<'_>) -> ReadResult<Self> {
        Ok(cursor.as_string()?)
    }
}

impl WriteConfig for String {
    fn write_with(&self, _ctx: &WriteContext<'_>) -> ConfigValue {
        ConfigValue::string(self.as_str())
    }
}

impl ReadConfig for char {
    fn read_config(cursor: &ConfigCursor<'_>) -> ReadResult<Self> {
        let s = cursor.as_string()?;
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            (None, _) => cursor.fail(FailureReason::EmptyString {
                to_type: "char".to_string(),
            }),
            (Some(_), Some(_)) => cursor.fail(FailureReason::cannot_convert(
                s.as_str(),
                "char",
                "expected a single character",
            )),
        }
    }
}

impl WriteConfig for char {
    fn write_with(&self, _ctx: &WriteContext<'_>) -> ConfigValue {
        ConfigValue::string(self.to_string())
    }
}

/// Any string, including `""` (the empty path). Use
/// [`Reader::from_non_empty_string`](crate::Reader::from_non_empty_string) to
/// reject empty paths.
impl ReadConfig for PathBuf {
    fn read_config(cursor: &ConfigCursor<'_>) -> ReadResult<Self> {
        cursor.as_string().map(PathBuf::from).map_err(Into::into)
    }
}

impl WriteConfig for PathBuf {
    fn write_with(&self, _ctx: &WriteContext<'_>) -> ConfigValue {
        ConfigValue::string(self.to_string_lossy())
    }
}

/// Read through `T`'s [`FromStr`], reporting its error as `CannotConvert`.
fn read_parsed<T>(cursor: &ConfigCursor<'_>) -> ReadResult<T>
where
    T: FromStr + 'static,
    T::Err: std::fmt::Display,
{
    let s = cursor.as_string()?;
    s.trim().parse::<T>().map_err(|e| {
        cursor
            .failed(FailureReason::cannot_convert(
                s.as_str(),
                short_type_name::<T>(),
                e.to_string(),
            ))
            .into()
    })
}

macro_rules! parsed_converters {
    ($($t:ty),*) => {
        $(
            impl ReadConfig for $t {
                fn read_config(cursor: &ConfigCursor<'_>) -> ReadResult<Self> {
                    read_parsed(cursor)
                }
            }

            impl WriteConfig for $t {
                fn write_with(&self, _ctx: &WriteContext<'_>) -> ConfigValue {
                    ConfigValue::string(self.to_string())
                }
            }
        )*
    };
}

parsed_converters!(IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr);

/// The subtree itself, for fields whose structure is interpreted later.
impl ReadConfig for ConfigValue {
    fn read_config(cursor: &ConfigCursor<'_>) -> ReadResult<Self> {
        Ok(cursor.defined()?.clone())
    }
}

impl WriteConfig for ConfigValue {
    fn write_with(&self, _ctx: &WriteContext<'_>) -> ConfigValue {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueType;

    fn read<T: ReadConfig>(value: ConfigValue) -> ReadResult<T> {
        ConfigCursor::new(&value).read::<T>()
    }

    fn reason<T: ReadConfig + std::fmt::Debug>(value: ConfigValue) -> FailureReason {
        let failures = read::<T>(value).unwrap_err();
        assert_eq!(failures.len(), 1);
        failures.first().reason().clone()
    }

    #[test]
    fn integers_read_from_numbers_and_strings() {
        assert_eq!(read::<i32>(ConfigValue::from(42)).unwrap(), 42);
        assert_eq!(read::<u8>(ConfigValue::from("7")).unwrap(), 7);
        assert_eq!(read::<i64>(ConfigValue::from(3.0)).unwrap(), 3);
    }

    #[test]
    fn integer_overflow_is_cannot_convert() {
        match reason::<u8>(ConfigValue::from(300)) {
            FailureReason::CannotConvert { value, to_type, because } => {
                assert_eq!(value, "300");
                assert_eq!(to_type, "u8");
                assert_eq!(because, "out of range");
            }
            other => panic!("Expected CannotConvert, got: {other:?}"),
        }
        assert!(matches!(
            reason::<u32>(ConfigValue::from(-1)),
            FailureReason::CannotConvert { .. }
        ));
    }

    #[test]
    fn fractional_number_is_not_an_integer() {
        assert!(matches!(
            reason::<i32>(ConfigValue::from(1.5)),
            FailureReason::CannotConvert { .. }
        ));
    }

    #[test]
    fn null_is_wrong_type_for_scalars() {
        assert!(matches!(
            reason::<i32>(ConfigValue::null()),
            FailureReason::WrongType { found: ValueType::Null, .. }
        ));
        assert!(matches!(
            reason::<String>(ConfigValue::null()),
            FailureReason::WrongType { found: ValueType::Null, .. }
        ));
    }

    #[test]
    fn floats_accept_integers() {
        assert_eq!(read::<f64>(ConfigValue::from(2)).unwrap(), 2.0);
        assert_eq!(read::<f32>(ConfigValue::from("0.5")).unwrap(), 0.5);
        assert!(read::<f32>(ConfigValue::from(1.0e300)).is_err());
    }

    #[test]
    fn strings_accept_scalars() {
        assert_eq!(read::<String>(ConfigValue::from(8080)).unwrap(), "8080");
        assert_eq!(read::<String>(ConfigValue::from(true)).unwrap(), "true");
        assert!(read::<String>(ConfigValue::list([])).is_err());
    }

    #[test]
    fn char_needs_exactly_one_character() {
        assert_eq!(read::<char>(ConfigValue::from("x")).unwrap(), 'x');
        assert!(matches!(
            reason::<char>(ConfigValue::from("")),
            FailureReason::EmptyString { .. }
        ));
        assert!(matches!(
            reason::<char>(ConfigValue::from("xy")),
            FailureReason::CannotConvert { .. }
        ));
    }

    #[test]
    fn addresses_parse_from_strings() {
        let addr = read::<SocketAddr>(ConfigValue::from("127.0.0.1:8080")).unwrap();
        assert_eq!(addr.port(), 8080);
        assert!(read::<IpAddr>(ConfigValue::from("::1")).is_ok());
        match reason::<Ipv4Addr>(ConfigValue::from("localhost")) {
            FailureReason::CannotConvert { to_type, .. } => assert_eq!(to_type, "Ipv4Addr"),
            other => panic!("Expected CannotConvert, got: {other:?}"),
        }
    }

    #[test]
    fn empty_path_reads_back() {
        let written = PathBuf::new().write_config();
        assert_eq!(written, ConfigValue::from(""));
        assert_eq!(read::<PathBuf>(written).unwrap(), PathBuf::new());
    }

    #[test]
    fn empty_path_can_be_rejected_explicitly() {
        let reader = crate::Reader::<PathBuf>::from_non_empty_string(|s| Ok(PathBuf::from(s)));
        let failures = reader.read(&ConfigCursor::new(&ConfigValue::from(""))).unwrap_err();
        assert!(matches!(
            failures.first().reason(),
            FailureReason::EmptyString { .. }
        ));
    }

    #[test]
    fn writers_produce_matching_nodes() {
        assert_eq!(42u16.write_config(), ConfigValue::from(42));
        assert_eq!(usize::MAX.write_config(), ConfigValue::from(usize::MAX as u64));
        assert_eq!(true.write_config(), ConfigValue::from(true));
        assert_eq!('z'.write_config(), ConfigValue::from("z"));
        assert_eq!(
            PathBuf::from("/etc/app").write_config(),
            ConfigValue::from("/etc/app")
        );
    }

    #[test]
    fn config_value_reads_subtree_verbatim() {
        let tree = ConfigValue::object([("a", ConfigValue::from(1))]);
        assert_eq!(read::<ConfigValue>(tree.clone()).unwrap(), tree);
    }
}
