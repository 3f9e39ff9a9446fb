//! Recursive column type descriptors.
//!
//! A [`LogicalType`] is either a primitive tag or a nested shape whose
//! children are themselves logical types. Equality is structural all the way
//! down, field names included, which is exactly the check the decoder needs
//! before it trusts a buffer's layout.

use arcstr::ArcStr;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::TypeId;

/// One named field of a struct type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructField {
    name: ArcStr,
    logical_type: LogicalType,
}

impl StructField {
    /// Creates a field.
    #[must_use]
    pub fn new(name: impl Into<ArcStr>, logical_type: LogicalType) -> Self {
        Self {
            name: name.into(),
            logical_type,
        }
    }

    /// Returns the field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the field name as a cheaply clonable string.
    #[must_use]
    pub fn name_arc(&self) -> &ArcStr {
        &self.name
    }

    /// Returns the field type.
    #[must_use]
    pub fn logical_type(&self) -> &LogicalType {
        &self.logical_type
    }
}

/// The type of a column, possibly nested.
///
/// # Examples
///
/// ```
/// use quiver_common::types::{LogicalType, TypeId};
///
/// let nested = LogicalType::list_of(LogicalType::list_of(LogicalType::INTEGER));
/// assert_eq!(nested.kind_id(), TypeId::List);
/// assert_eq!(nested.to_string(), "integer[][]");
/// assert!(nested.equals(&LogicalType::list_of(LogicalType::list_of(LogicalType::INTEGER))));
/// assert!(!nested.equals(&LogicalType::list_of(LogicalType::INTEGER)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalType {
    /// A non-nested tag such as `integer` or `varchar`.
    Primitive(TypeId),
    /// Variable-length list; rows index a shared child vector.
    List(Box<LogicalType>),
    /// Fixed-length list of `size` elements per row.
    Array {
        /// Element type.
        child: Box<LogicalType>,
        /// Elements per row.
        size: usize,
    },
    /// Key/value entries, stored as a list of `struct(key, value)`.
    Map {
        /// Key type.
        key: Box<LogicalType>,
        /// Value type.
        value: Box<LogicalType>,
    },
    /// Ordered, named fields.
    Struct(Vec<StructField>),
}

impl LogicalType {
    /// `boolean`
    pub const BOOLEAN: Self = Self::Primitive(TypeId::Boolean);
    /// `tinyint`
    pub const TINYINT: Self = Self::Primitive(TypeId::TinyInt);
    /// `smallint`
    pub const SMALLINT: Self = Self::Primitive(TypeId::SmallInt);
    /// `integer`
    pub const INTEGER: Self = Self::Primitive(TypeId::Integer);
    /// `bigint`
    pub const BIGINT: Self = Self::Primitive(TypeId::BigInt);
    /// `utinyint`
    pub const UTINYINT: Self = Self::Primitive(TypeId::UTinyInt);
    /// `usmallint`
    pub const USMALLINT: Self = Self::Primitive(TypeId::USmallInt);
    /// `uinteger`
    pub const UINTEGER: Self = Self::Primitive(TypeId::UInteger);
    /// `ubigint`
    pub const UBIGINT: Self = Self::Primitive(TypeId::UBigInt);
    /// `float`
    pub const FLOAT: Self = Self::Primitive(TypeId::Float);
    /// `double`
    pub const DOUBLE: Self = Self::Primitive(TypeId::Double);
    /// `timestamp`
    pub const TIMESTAMP: Self = Self::Primitive(TypeId::Timestamp);
    /// `date`
    pub const DATE: Self = Self::Primitive(TypeId::Date);
    /// `time`
    pub const TIME: Self = Self::Primitive(TypeId::Time);
    /// `interval`
    pub const INTERVAL: Self = Self::Primitive(TypeId::Interval);
    /// `hugeint`
    pub const HUGEINT: Self = Self::Primitive(TypeId::HugeInt);
    /// `uhugeint`
    pub const UHUGEINT: Self = Self::Primitive(TypeId::UHugeInt);
    /// `varchar`
    pub const VARCHAR: Self = Self::Primitive(TypeId::Varchar);
    /// `blob`
    pub const BLOB: Self = Self::Primitive(TypeId::Blob);

    /// Creates a primitive type.
    ///
    /// Nested tags need children; use the matching combinator for those.
    /// Passing a nested tag trips a debug assertion. Release builds return
    /// the malformed type, which `Chunk::from_raw` later rejects as a layout
    /// error.
    #[must_use]
    pub fn primitive(kind: TypeId) -> Self {
        debug_assert!(
            !kind.is_nested(),
            "{kind} is nested and needs a combinator, not primitive()"
        );
        Self::Primitive(kind)
    }

    /// Creates `child[]`.
    #[must_use]
    pub fn list_of(child: LogicalType) -> Self {
        Self::List(Box::new(child))
    }

    /// Creates `child[size]`.
    #[must_use]
    pub fn array_of(child: LogicalType, size: usize) -> Self {
        Self::Array {
            child: Box::new(child),
            size,
        }
    }

    /// Creates `map(key, value)`.
    #[must_use]
    pub fn map_of(key: LogicalType, value: LogicalType) -> Self {
        Self::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    /// Creates a struct from `(name, type)` pairs, keeping their order.
    #[must_use]
    pub fn struct_of<N, I>(fields: I) -> Self
    where
        N: Into<ArcStr>,
        I: IntoIterator<Item = (N, LogicalType)>,
    {
        Self::Struct(
            fields
                .into_iter()
                .map(|(name, ty)| StructField::new(name, ty))
                .collect(),
        )
    }

    /// Structural, recursive equality.
    #[inline]
    #[must_use]
    pub fn equals(&self, other: &LogicalType) -> bool {
        self == other
    }

    /// Returns the engine tag for this type.
    #[must_use]
    pub fn kind_id(&self) -> TypeId {
        match self {
            Self::Primitive(id) => *id,
            Self::List(_) => TypeId::List,
            Self::Array { .. } => TypeId::Array,
            Self::Map { .. } => TypeId::Map,
            Self::Struct(_) => TypeId::Struct,
        }
    }

    /// Returns true for list, array, map and struct types.
    #[must_use]
    pub fn is_nested(&self) -> bool {
        !matches!(self, Self::Primitive(_))
    }

    /// Returns true when every value has the same statically known width.
    #[must_use]
    pub fn is_fixed_size(&self) -> bool {
        match self {
            Self::Primitive(id) => id.is_fixed_size(),
            _ => false,
        }
    }

    /// Bytes per row in this vector's own data buffer, if it has one.
    #[must_use]
    pub fn record_width(&self) -> Option<usize> {
        self.kind_id().record_width()
    }

    /// Element type of a list or array.
    #[must_use]
    pub fn list_child(&self) -> Option<&LogicalType> {
        match self {
            Self::List(child) | Self::Array { child, .. } => Some(child),
            _ => None,
        }
    }

    /// Fields of a struct.
    #[must_use]
    pub fn struct_fields(&self) -> Option<&[StructField]> {
        match self {
            Self::Struct(fields) => Some(fields),
            _ => None,
        }
    }

    /// Key and value types of a map.
    #[must_use]
    pub fn map_key_value(&self) -> Option<(&LogicalType, &LogicalType)> {
        match self {
            Self::Map { key, value } => Some((key, value)),
            _ => None,
        }
    }

    /// The `struct(key, value)` type of a map's entries vector.
    #[must_use]
    pub fn map_entry_type(key: &LogicalType, value: &LogicalType) -> LogicalType {
        Self::struct_of([("key", key.clone()), ("value", value.clone())])
    }

    /// Type of the single child vector backing a list, array or map.
    #[must_use]
    pub fn child_vector_type(&self) -> Option<LogicalType> {
        match self {
            Self::List(child) | Self::Array { child, .. } => Some((**child).clone()),
            Self::Map { key, value } => Some(Self::map_entry_type(key, value)),
            _ => None,
        }
    }

    /// Returns the first tag in this tree that cannot be decoded, if any.
    #[must_use]
    pub fn first_undecodable(&self) -> Option<&LogicalType> {
        match self {
            Self::Primitive(id) => (!id.is_decodable()).then_some(self),
            Self::List(child) | Self::Array { child, .. } => child.first_undecodable(),
            Self::Map { key, value } => key
                .first_undecodable()
                .or_else(|| value.first_undecodable()),
            Self::Struct(fields) => fields
                .iter()
                .find_map(|f| f.logical_type.first_undecodable()),
        }
    }
}

impl From<TypeId> for LogicalType {
    fn from(kind: TypeId) -> Self {
        Self::primitive(kind)
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(id) => write!(f, "{id}"),
            Self::List(child) => write!(f, "{child}[]"),
            Self::Array { child, size } => write!(f, "{child}[{size}]"),
            Self::Map { key, value } => write!(f, "map({key}, {value})"),
            Self::Struct(fields) => {
                f.write_str("struct(")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} {}", field.name, field.logical_type)?;
                }
                f.write_str(")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_equality_is_recursive() {
        let a = LogicalType::list_of(LogicalType::list_of(LogicalType::INTEGER));
        let b = LogicalType::list_of(LogicalType::list_of(LogicalType::INTEGER));
        let c = LogicalType::list_of(LogicalType::list_of(LogicalType::BIGINT));
        assert!(a.equals(&b));
        assert!(!a.equals(&c));

        let m1 = LogicalType::map_of(LogicalType::VARCHAR, LogicalType::INTEGER);
        let m2 = LogicalType::map_of(LogicalType::VARCHAR, LogicalType::DOUBLE);
        assert!(!m1.equals(&m2));
    }

    #[test]
    fn test_struct_equality_includes_field_names() {
        let a = LogicalType::struct_of([("a", LogicalType::INTEGER)]);
        let b = LogicalType::struct_of([("b", LogicalType::INTEGER)]);
        assert!(!a.equals(&b));
    }

    #[test]
    fn test_display_uses_engine_spelling() {
        assert_eq!(LogicalType::TINYINT.to_string(), "tinyint");
        assert_eq!(LogicalType::list_of(LogicalType::VARCHAR).to_string(), "varchar[]");
        assert_eq!(
            LogicalType::array_of(LogicalType::INTEGER, 3).to_string(),
            "integer[3]"
        );
        assert_eq!(
            LogicalType::map_of(LogicalType::VARCHAR, LogicalType::INTEGER).to_string(),
            "map(varchar, integer)"
        );
        assert_eq!(
            LogicalType::struct_of([("a", LogicalType::INTEGER), ("b", LogicalType::VARCHAR)])
                .to_string(),
            "struct(a integer, b varchar)"
        );
    }

    #[test]
    fn test_nested_types_are_never_fixed_size() {
        assert!(LogicalType::INTEGER.is_fixed_size());
        assert!(!LogicalType::VARCHAR.is_fixed_size());
        assert!(!LogicalType::list_of(LogicalType::INTEGER).is_fixed_size());
        assert!(!LogicalType::array_of(LogicalType::INTEGER, 2).is_fixed_size());
        assert!(!LogicalType::struct_of([("a", LogicalType::INTEGER)]).is_fixed_size());
    }

    #[test]
    fn test_map_child_vector_is_key_value_struct() {
        let map = LogicalType::map_of(LogicalType::VARCHAR, LogicalType::BIGINT);
        let entry = map.child_vector_type().unwrap();
        let fields = entry.struct_fields().unwrap();
        assert_eq!(fields[0].name(), "key");
        assert_eq!(fields[1].name(), "value");
        assert_eq!(fields[1].logical_type(), &LogicalType::BIGINT);
    }

    #[test]
    fn test_first_undecodable_finds_nested_blob() {
        let ty = LogicalType::struct_of([
            ("ok", LogicalType::INTEGER),
            ("raw", LogicalType::list_of(LogicalType::BLOB)),
        ]);
        assert_eq!(ty.first_undecodable(), Some(&LogicalType::BLOB));
        assert_eq!(LogicalType::list_of(LogicalType::VARCHAR).first_undecodable(), None);
    }

    #[test]
    fn test_serde_round_trip() {
        let ty = LogicalType::map_of(
            LogicalType::VARCHAR,
            LogicalType::list_of(LogicalType::struct_of([("x", LogicalType::DOUBLE)])),
        );
        let json = serde_json::to_string(&ty).unwrap();
        let back: LogicalType = serde_json::from_str(&json).unwrap();
        assert_eq!(ty, back);
    }
}
