//! Dynamically typed decoded values.
//!
//! [`Value`] is what the untyped decode path produces when the caller does
//! not name a static Rust type, and what chunk builders consume. Every
//! variant owns its data: strings and lists are copied out of the chunk, so a
//! `Value` outlives the chunk it came from.

use arcstr::ArcStr;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::{Date, Interval, Time, Timestamp};

/// A decoded cell of any supported type.
///
/// Integer variants mirror the engine's widths one to one, so a value read
/// from a `smallint` column is a [`Value::SmallInt`] and writes back into a
/// `smallint` column unchanged.
///
/// # Examples
///
/// ```
/// use quiver_common::types::Value;
///
/// let tags = Value::from(vec!["a", "b"]);
/// assert_eq!(tags.as_list().map(<[Value]>::len), Some(2));
/// assert_eq!(Value::from(7i16).as_i64(), Some(7));
/// assert!(Value::from(None::<i32>).is_null());
/// ```
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// SQL `NULL`.
    Null,
    /// `boolean`
    Bool(bool),
    /// `tinyint`
    TinyInt(i8),
    /// `smallint`
    SmallInt(i16),
    /// `integer`
    Integer(i32),
    /// `bigint`
    BigInt(i64),
    /// `utinyint`
    UTinyInt(u8),
    /// `usmallint`
    USmallInt(u16),
    /// `uinteger`
    UInteger(u32),
    /// `ubigint`
    UBigInt(u64),
    /// `float`
    Float(f32),
    /// `double`
    Double(f64),
    /// `hugeint`
    HugeInt(i128),
    /// `uhugeint`
    UHugeInt(u128),
    /// `date`
    Date(Date),
    /// `time`
    Time(Time),
    /// `timestamp`
    Timestamp(Timestamp),
    /// `interval`
    Interval(Interval),
    /// `varchar` (ArcStr keeps clones cheap)
    String(ArcStr),
    /// List or array elements in order.
    List(Arc<[Value]>),
    /// Struct fields in declaration order.
    Struct(Arc<[(ArcStr, Value)]>),
    /// Map entries in storage order. Keys are never `Null`.
    Map(Arc<[(Value, Value)]>),
}

impl Value {
    /// Returns `true` if this value is null.
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the boolean value if this is a Bool, otherwise None.
    #[inline]
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns any integer variant widened to `i64`, if it fits.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::TinyInt(v) => Some(i64::from(v)),
            Value::SmallInt(v) => Some(i64::from(v)),
            Value::Integer(v) => Some(i64::from(v)),
            Value::BigInt(v) => Some(v),
            Value::UTinyInt(v) => Some(i64::from(v)),
            Value::USmallInt(v) => Some(i64::from(v)),
            Value::UInteger(v) => Some(i64::from(v)),
            Value::UBigInt(v) => i64::try_from(v).ok(),
            Value::HugeInt(v) => i64::try_from(v).ok(),
            Value::UHugeInt(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    /// Returns a float variant widened to `f64`.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Float(v) => Some(f64::from(v)),
            Value::Double(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the string value if this is a String, otherwise None.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the elements if this is a List, otherwise None.
    #[inline]
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Returns the fields if this is a Struct, otherwise None.
    #[inline]
    #[must_use]
    pub fn as_struct(&self) -> Option<&[(ArcStr, Value)]> {
        match self {
            Value::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the entries if this is a Map, otherwise None.
    #[inline]
    #[must_use]
    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Looks up a struct field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.as_struct()?
            .iter()
            .find(|(n, _)| n.as_str() == name)
            .map(|(_, v)| v)
    }

    /// Looks up the first map entry whose key equals `key`.
    #[must_use]
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.as_map()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Builds a struct value from `(name, value)` pairs.
    #[must_use]
    pub fn struct_of<N, I>(fields: I) -> Self
    where
        N: Into<ArcStr>,
        I: IntoIterator<Item = (N, Value)>,
    {
        Value::Struct(
            fields
                .into_iter()
                .map(|(n, v)| (n.into(), v))
                .collect(),
        )
    }

    /// Builds a map value from `(key, value)` pairs.
    #[must_use]
    pub fn map_of<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        Value::Map(entries.into_iter().collect())
    }

    /// Returns the engine name of this value's kind.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::TinyInt(_) => "tinyint",
            Value::SmallInt(_) => "smallint",
            Value::Integer(_) => "integer",
            Value::BigInt(_) => "bigint",
            Value::UTinyInt(_) => "utinyint",
            Value::USmallInt(_) => "usmallint",
            Value::UInteger(_) => "uinteger",
            Value::UBigInt(_) => "ubigint",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::HugeInt(_) => "hugeint",
            Value::UHugeInt(_) => "uhugeint",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::Timestamp(_) => "timestamp",
            Value::Interval(_) => "interval",
            Value::String(_) => "varchar",
            Value::List(_) => "list",
            Value::Struct(_) => "struct",
            Value::Map(_) => "map",
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::List(l) => write!(f, "List({l:?})"),
            Value::Struct(s) => write!(f, "Struct({s:?})"),
            Value::Map(m) => write!(f, "Map({m:?})"),
            other => write!(f, "{}({other})", other.type_name()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::TinyInt(v) => write!(f, "{v}"),
            Value::SmallInt(v) => write!(f, "{v}"),
            Value::Integer(v) => write!(f, "{v}"),
            Value::BigInt(v) => write!(f, "{v}"),
            Value::UTinyInt(v) => write!(f, "{v}"),
            Value::USmallInt(v) => write!(f, "{v}"),
            Value::UInteger(v) => write!(f, "{v}"),
            Value::UBigInt(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::HugeInt(v) => write!(f, "{v}"),
            Value::UHugeInt(v) => write!(f, "{v}"),
            Value::Date(d) => write!(f, "{d}"),
            Value::Time(t) => write!(f, "{t}"),
            Value::Timestamp(t) => write!(f, "{t}"),
            Value::Interval(i) => write!(f, "{i}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::List(l) => {
                write!(f, "[")?;
                for (i, v) in l.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Value::Struct(fields) => {
                write!(f, "{{")?;
                for (i, (name, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "'{name}': {v}")?;
                }
                write!(f, "}}")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}={v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

macro_rules! impl_from_native {
    ($($native:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$native> for Value {
                fn from(v: $native) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from_native! {
    bool => Bool,
    i8 => TinyInt,
    i16 => SmallInt,
    i32 => Integer,
    i64 => BigInt,
    u8 => UTinyInt,
    u16 => USmallInt,
    u32 => UInteger,
    u64 => UBigInt,
    f32 => Float,
    f64 => Double,
    i128 => HugeInt,
    u128 => UHugeInt,
    Date => Date,
    Time => Time,
    Timestamp => Timestamp,
    Interval => Interval,
    ArcStr => String,
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_keeps_engine_width() {
        assert_eq!(Value::from(1i8), Value::TinyInt(1));
        assert_eq!(Value::from(1u16), Value::USmallInt(1));
        assert_eq!(Value::from(1i128), Value::HugeInt(1));
        assert_ne!(Value::from(1i32), Value::from(1i64));
    }

    #[test]
    fn test_as_i64_widens_only_when_lossless() {
        assert_eq!(Value::UInteger(u32::MAX).as_i64(), Some(i64::from(u32::MAX)));
        assert_eq!(Value::UBigInt(u64::MAX).as_i64(), None);
        assert_eq!(Value::HugeInt(-5).as_i64(), Some(-5));
        assert_eq!(Value::Double(1.0).as_i64(), None);
    }

    #[test]
    fn test_struct_and_map_lookup() {
        let s = Value::struct_of([("id", Value::from(1i32)), ("name", Value::from("x"))]);
        assert_eq!(s.field("name").and_then(Value::as_str), Some("x"));
        assert_eq!(s.field("missing"), None);

        let m = Value::map_of([(Value::from("k"), Value::from(2i64))]);
        assert_eq!(m.get(&Value::from("k")), Some(&Value::BigInt(2)));
        assert_eq!(m.get(&Value::from("z")), None);
    }

    #[test]
    fn test_display_nested() {
        let v = Value::from(vec![Some(1i32), None, Some(3)]);
        assert_eq!(v.to_string(), "[1, NULL, 3]");
        let s = Value::struct_of([("a", Value::from("x"))]);
        assert_eq!(s.to_string(), "{'a': \"x\"}");
    }
}
