//! Container decoders: lists, arrays, maps and structs.

use std::borrow::Borrow;

use arcstr::ArcStr;
use quiver_common::types::LogicalType;
use quiver_common::utils::{Error, Result};

use super::{Decodable, DecodePath, PathSegment, mismatch, read_optional, read_range};
use crate::vector::Vector;

/// `T[]` and `T[n]` both decode to a vector of optional elements.
impl<T: Decodable> Decodable for Vec<Option<T>> {
    fn logical_type() -> LogicalType {
        LogicalType::list_of(T::logical_type())
    }

    fn check_type(actual: &LogicalType, path: &mut DecodePath) -> Result<()> {
        match actual {
            LogicalType::List(child) | LogicalType::Array { child, .. } => {
                path.within(PathSegment::Element, |p| T::check_type(child, p))
            }
            other => Err(mismatch(Self::logical_type(), other, path)),
        }
    }

    fn read(vector: Vector<'_>, row: usize) -> Result<Self> {
        let range = vector.list_range(row)?;
        let child = vector
            .list_child()
            .ok_or_else(|| Error::layout("list vector has no child"))?;
        read_range(child, range)
    }
}

/// Entries of one map row, in storage order.
///
/// Keys are never NULL; values may be.
///
/// # Examples
///
/// ```
/// use quiver_common::types::{LogicalType, Value};
/// use quiver_core::{ChunkBuilder, MapEntries};
///
/// let ty = LogicalType::map_of(LogicalType::VARCHAR, LogicalType::INTEGER);
/// let mut builder = ChunkBuilder::new(&[ty]);
/// builder
///     .append_row(&[Value::map_of([(Value::from("a"), Value::from(1i32))])])
///     .unwrap();
/// let chunk = builder.finish().unwrap();
///
/// let row: MapEntries<String, i32> = chunk.get(0, 0).unwrap().unwrap();
/// assert_eq!(row.get("a"), Some(&Some(1)));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MapEntries<K, V>(pub Vec<(K, Option<V>)>);

impl<K, V> MapEntries<K, V> {
    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The value of the first entry whose key equals `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&Option<V>>
    where
        K: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        self.0
            .iter()
            .find(|(k, _)| <K as Borrow<Q>>::borrow(k) == key)
            .map(|(_, v)| v)
    }

    /// Iterates the entries.
    pub fn iter(&self) -> impl Iterator<Item = &(K, Option<V>)> {
        self.0.iter()
    }

    /// Unwraps into the entry list.
    #[must_use]
    pub fn into_inner(self) -> Vec<(K, Option<V>)> {
        self.0
    }
}

impl<K, V> IntoIterator for MapEntries<K, V> {
    type Item = (K, Option<V>);
    type IntoIter = std::vec::IntoIter<(K, Option<V>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<K: Decodable, V: Decodable> Decodable for MapEntries<K, V> {
    fn logical_type() -> LogicalType {
        LogicalType::map_of(K::logical_type(), V::logical_type())
    }

    fn check_type(actual: &LogicalType, path: &mut DecodePath) -> Result<()> {
        match actual {
            LogicalType::Map { key, value } => {
                path.within(PathSegment::Key, |p| K::check_type(key, p))?;
                path.within(PathSegment::Value, |p| V::check_type(value, p))
            }
            other => Err(mismatch(Self::logical_type(), other, path)),
        }
    }

    fn read(vector: Vector<'_>, row: usize) -> Result<Self> {
        let range = vector.list_range(row)?;
        let entries = vector
            .list_child()
            .ok_or_else(|| Error::layout("map vector has no entries child"))?;
        let keys = entries.struct_child(0)?;
        let values = entries.struct_child(1)?;

        range
            .map(|r| {
                if keys.is_null(r) {
                    return Err(Error::layout(format!("map entry {r} has a NULL key")));
                }
                Ok((K::read(keys, r)?, read_optional(values, r)?))
            })
            .collect::<Result<_>>()
            .map(MapEntries)
    }
}

fn check_struct_arity(
    expected: LogicalType,
    actual: &LogicalType,
    arity: usize,
    path: &DecodePath,
) -> Result<Vec<(ArcStr, LogicalType)>> {
    match actual.struct_fields() {
        Some(fields) if fields.len() == arity => Ok(fields
            .iter()
            .map(|f| (f.name_arc().clone(), f.logical_type().clone()))
            .collect()),
        _ => Err(mismatch(expected, actual, path)),
    }
}

/// Positional struct decoding: field `i` of the struct goes to tuple slot
/// `i`, whatever its name. The expected type names fields `v1`, `v2`, ...
macro_rules! struct_tuple {
    ($arity:literal; $($name:ident : $idx:tt => $field:literal),+) => {
        impl<$($name: Decodable),+> Decodable for ($(Option<$name>,)+) {
            fn logical_type() -> LogicalType {
                LogicalType::struct_of([
                    $(($field, $name::logical_type())),+
                ])
            }

            fn check_type(actual: &LogicalType, path: &mut DecodePath) -> Result<()> {
                let fields = check_struct_arity(Self::logical_type(), actual, $arity, path)?;
                $(
                    let (field_name, field_type) = &fields[$idx];
                    path.within(PathSegment::Field(field_name.clone()), |p| {
                        $name::check_type(field_type, p)
                    })?;
                )+
                Ok(())
            }

            fn read(vector: Vector<'_>, row: usize) -> Result<Self> {
                Ok(($(read_optional::<$name>(vector.struct_child($idx)?, row)?,)+))
            }
        }
    };
}

struct_tuple!(1; A: 0 => "v1");
struct_tuple!(2; A: 0 => "v1", B: 1 => "v2");
struct_tuple!(3; A: 0 => "v1", B: 1 => "v2", C: 2 => "v3");
struct_tuple!(4; A: 0 => "v1", B: 1 => "v2", C: 2 => "v3", D: 3 => "v4");
