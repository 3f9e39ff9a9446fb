//! Numeric logical type codes shared with the engine.
//!
//! The engine reports column types as plain integers. These discriminants
//! must stay bit-identical to the engine's enumeration; do not renumber.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::Error;

/// The engine's logical type tag.
///
/// Nested tags ([`List`](Self::List), [`Struct`](Self::Struct),
/// [`Map`](Self::Map), [`Array`](Self::Array), [`Union`](Self::Union)) only
/// name the shape; their children live in [`LogicalType`](super::LogicalType).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum TypeId {
    /// Placeholder for a type the engine could not resolve.
    Invalid = 0,
    /// `bool`, one byte per row.
    Boolean = 1,
    /// `i8`
    TinyInt = 2,
    /// `i16`
    SmallInt = 3,
    /// `i32`
    Integer = 4,
    /// `i64`
    BigInt = 5,
    /// `u8`
    UTinyInt = 6,
    /// `u16`
    USmallInt = 7,
    /// `u32`
    UInteger = 8,
    /// `u64`
    UBigInt = 9,
    /// `f32`
    Float = 10,
    /// `f64`
    Double = 11,
    /// Microseconds since the Unix epoch.
    Timestamp = 12,
    /// Days since the Unix epoch.
    Date = 13,
    /// Microseconds since midnight.
    Time = 14,
    /// Months, days and microseconds.
    Interval = 15,
    /// 128-bit signed integer.
    HugeInt = 16,
    /// UTF-8 text in short-string records.
    Varchar = 17,
    /// Raw bytes in short-string records.
    Blob = 18,
    /// Fixed-point decimal; width depends on precision.
    Decimal = 19,
    /// Seconds since the Unix epoch.
    TimestampS = 20,
    /// Milliseconds since the Unix epoch.
    TimestampMs = 21,
    /// Nanoseconds since the Unix epoch.
    TimestampNs = 22,
    /// Dictionary-encoded enum; width depends on dictionary size.
    Enum = 23,
    /// Variable-length list.
    List = 24,
    /// Named fields.
    Struct = 25,
    /// List of key/value entries.
    Map = 26,
    /// 128-bit UUID.
    Uuid = 27,
    /// Tagged union.
    Union = 28,
    /// Bit string.
    Bit = 29,
    /// Time with time zone offset.
    TimeTz = 30,
    /// Timestamp with time zone.
    TimestampTz = 31,
    /// 128-bit unsigned integer.
    UHugeInt = 32,
    /// Fixed-size list.
    Array = 33,
    /// Wildcard used in function signatures.
    Any = 34,
    /// Arbitrary-precision integer.
    Varint = 35,
    /// The type of a bare `NULL` literal.
    SqlNull = 36,
}

impl TypeId {
    const ALL: [TypeId; 37] = [
        TypeId::Invalid,
        TypeId::Boolean,
        TypeId::TinyInt,
        TypeId::SmallInt,
        TypeId::Integer,
        TypeId::BigInt,
        TypeId::UTinyInt,
        TypeId::USmallInt,
        TypeId::UInteger,
        TypeId::UBigInt,
        TypeId::Float,
        TypeId::Double,
        TypeId::Timestamp,
        TypeId::Date,
        TypeId::Time,
        TypeId::Interval,
        TypeId::HugeInt,
        TypeId::Varchar,
        TypeId::Blob,
        TypeId::Decimal,
        TypeId::TimestampS,
        TypeId::TimestampMs,
        TypeId::TimestampNs,
        TypeId::Enum,
        TypeId::List,
        TypeId::Struct,
        TypeId::Map,
        TypeId::Uuid,
        TypeId::Union,
        TypeId::Bit,
        TypeId::TimeTz,
        TypeId::TimestampTz,
        TypeId::UHugeInt,
        TypeId::Array,
        TypeId::Any,
        TypeId::Varint,
        TypeId::SqlNull,
    ];

    /// Maps a raw engine code back to a tag.
    #[must_use]
    pub fn from_raw(raw: u32) -> Option<Self> {
        // Codes are dense from 0, so the table index is the code.
        Self::ALL.get(raw as usize).copied()
    }

    /// Returns the raw engine code.
    #[inline]
    #[must_use]
    pub const fn as_raw(self) -> u32 {
        self as u32
    }

    /// Returns true for tags whose values are made of child vectors.
    #[inline]
    #[must_use]
    pub const fn is_nested(self) -> bool {
        matches!(
            self,
            TypeId::List | TypeId::Struct | TypeId::Map | TypeId::Array | TypeId::Union
        )
    }

    /// Returns true for tags stored as short-string records.
    #[inline]
    #[must_use]
    pub const fn is_string_like(self) -> bool {
        matches!(
            self,
            TypeId::Varchar | TypeId::Blob | TypeId::Bit | TypeId::Varint
        )
    }

    /// Bytes one row occupies in the vector's data buffer.
    ///
    /// `None` when the width depends on type parameters (decimal, enum) or
    /// when the vector keeps no per-row record of its own (struct, array).
    #[must_use]
    pub const fn record_width(self) -> Option<usize> {
        match self {
            TypeId::Boolean | TypeId::TinyInt | TypeId::UTinyInt => Some(1),
            TypeId::SmallInt | TypeId::USmallInt => Some(2),
            TypeId::Integer | TypeId::UInteger | TypeId::Float | TypeId::Date => Some(4),
            TypeId::BigInt
            | TypeId::UBigInt
            | TypeId::Double
            | TypeId::Time
            | TypeId::TimeTz
            | TypeId::Timestamp
            | TypeId::TimestampS
            | TypeId::TimestampMs
            | TypeId::TimestampNs
            | TypeId::TimestampTz => Some(8),
            TypeId::Interval | TypeId::HugeInt | TypeId::UHugeInt | TypeId::Uuid => Some(16),
            // Short-string records and list entries are both 16 bytes.
            TypeId::Varchar | TypeId::Blob | TypeId::Bit | TypeId::Varint => Some(16),
            TypeId::List | TypeId::Map => Some(16),
            TypeId::Decimal
            | TypeId::Enum
            | TypeId::Struct
            | TypeId::Array
            | TypeId::Union
            | TypeId::Invalid
            | TypeId::Any
            | TypeId::SqlNull => None,
        }
    }

    /// Returns true when every value of this tag has the same statically
    /// known byte width.
    #[must_use]
    pub const fn is_fixed_size(self) -> bool {
        !self.is_nested() && !self.is_string_like() && self.record_width().is_some()
    }

    /// Returns true when the decoder knows how to read this tag.
    ///
    /// Tags the engine can produce but that are not decoded yet report
    /// [`Error::Unsupported`] instead of a type mismatch.
    #[must_use]
    pub const fn is_decodable(self) -> bool {
        matches!(
            self,
            TypeId::Boolean
                | TypeId::TinyInt
                | TypeId::SmallInt
                | TypeId::Integer
                | TypeId::BigInt
                | TypeId::UTinyInt
                | TypeId::USmallInt
                | TypeId::UInteger
                | TypeId::UBigInt
                | TypeId::Float
                | TypeId::Double
                | TypeId::Timestamp
                | TypeId::Date
                | TypeId::Time
                | TypeId::Interval
                | TypeId::HugeInt
                | TypeId::UHugeInt
                | TypeId::Varchar
                | TypeId::List
                | TypeId::Struct
                | TypeId::Map
                | TypeId::Array
        )
    }

    /// The engine's lower-case type name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            TypeId::Invalid => "invalid",
            TypeId::Boolean => "boolean",
            TypeId::TinyInt => "tinyint",
            TypeId::SmallInt => "smallint",
            TypeId::Integer => "integer",
            TypeId::BigInt => "bigint",
            TypeId::UTinyInt => "utinyint",
            TypeId::USmallInt => "usmallint",
            TypeId::UInteger => "uinteger",
            TypeId::UBigInt => "ubigint",
            TypeId::Float => "float",
            TypeId::Double => "double",
            TypeId::Timestamp => "timestamp",
            TypeId::Date => "date",
            TypeId::Time => "time",
            TypeId::Interval => "interval",
            TypeId::HugeInt => "hugeint",
            TypeId::Varchar => "varchar",
            TypeId::Blob => "blob",
            TypeId::Decimal => "decimal",
            TypeId::TimestampS => "timestamp_s",
            TypeId::TimestampMs => "timestamp_ms",
            TypeId::TimestampNs => "timestamp_ns",
            TypeId::Enum => "enum",
            TypeId::List => "list",
            TypeId::Struct => "struct",
            TypeId::Map => "map",
            TypeId::Uuid => "uuid",
            TypeId::Union => "union",
            TypeId::Bit => "bit",
            TypeId::TimeTz => "time with time zone",
            TypeId::TimestampTz => "timestamp with time zone",
            TypeId::UHugeInt => "uhugeint",
            TypeId::Array => "array",
            TypeId::Any => "any",
            TypeId::Varint => "varint",
            TypeId::SqlNull => "null",
        }
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u32> for TypeId {
    type Error = Error;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        Self::from_raw(raw).ok_or(Error::UnknownTypeId(raw))
    }
}

impl From<TypeId> for u32 {
    fn from(id: TypeId) -> Self {
        id.as_raw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_match_engine_numbering() {
        assert_eq!(TypeId::Boolean.as_raw(), 1);
        assert_eq!(TypeId::BigInt.as_raw(), 5);
        assert_eq!(TypeId::Varchar.as_raw(), 17);
        assert_eq!(TypeId::List.as_raw(), 24);
        assert_eq!(TypeId::Map.as_raw(), 26);
        assert_eq!(TypeId::UHugeInt.as_raw(), 32);
        assert_eq!(TypeId::Array.as_raw(), 33);
        assert_eq!(TypeId::SqlNull.as_raw(), 36);
    }

    #[test]
    fn test_from_raw_round_trips_every_code() {
        for raw in 0..=36u32 {
            let id = TypeId::from_raw(raw).unwrap();
            assert_eq!(id.as_raw(), raw);
        }
        assert_eq!(TypeId::from_raw(37), None);
        assert_eq!(TypeId::try_from(99), Err(Error::UnknownTypeId(99)));
    }

    #[test]
    fn test_widths() {
        assert_eq!(TypeId::Boolean.record_width(), Some(1));
        assert_eq!(TypeId::Date.record_width(), Some(4));
        assert_eq!(TypeId::Interval.record_width(), Some(16));
        assert_eq!(TypeId::Decimal.record_width(), None);
        assert!(TypeId::Double.is_fixed_size());
        assert!(!TypeId::Varchar.is_fixed_size());
        assert!(!TypeId::List.is_fixed_size());
    }

    #[test]
    fn test_unsupported_tags_are_recognized_but_not_decodable() {
        for id in [
            TypeId::Blob,
            TypeId::Decimal,
            TypeId::Enum,
            TypeId::TimestampS,
            TypeId::TimestampMs,
            TypeId::TimestampNs,
        ] {
            assert!(!id.is_decodable(), "{id} should not be decodable");
        }
        assert!(TypeId::Varchar.is_decodable());
    }
}
