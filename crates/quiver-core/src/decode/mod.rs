//! Typed and dynamic decoding of chunk columns.
//!
//! Decoding is depth-first over the column's [`LogicalType`]:
//!
//! 1. The requested Rust type describes the logical type it expects
//!    ([`Decodable::check_type`]); the whole tree is compared before any row
//!    is read, and a disagreement names the pair and where it sits
//!    (`column 0 > element > field b`).
//! 2. Each row's validity is consulted first. A NULL row decodes to `None`
//!    and nothing else is read for it.
//! 3. Valid rows are read by [`Decodable::read`]; nested types recurse into
//!    their child vectors.
//!
//! Strings, lists and maps are always copied into owned values.
//!
//! | Rust type | Column type |
//! | --------- | ----------- |
//! | `bool`, `i8`..`i64`, `u8`..`u64`, `f32`, `f64` | the matching primitive |
//! | `i128`, `u128` | `hugeint`, `uhugeint` |
//! | [`Date`], [`Time`], [`Timestamp`], [`Interval`] | the matching temporal type |
//! | `String` | `varchar` |
//! | `Vec<Option<T>>` | `T[]` or `T[n]` |
//! | [`MapEntries<K, V>`] | `map(K, V)` |
//! | `(Option<A>, ..)` up to four fields | `struct(..)`, matched by position |
//! | [`Value`] (via [`decode_column_as`]) | anything decodable |
//!
//! [`Date`]: quiver_common::types::Date
//! [`Time`]: quiver_common::types::Time
//! [`Timestamp`]: quiver_common::types::Timestamp
//! [`Interval`]: quiver_common::types::Interval

pub mod dynamic;
mod nested;
mod primitive;

use std::fmt;
use std::marker::PhantomData;

use arcstr::ArcStr;
use quiver_common::types::LogicalType;
use quiver_common::utils::{Error, Result};
use smallvec::SmallVec;

use crate::chunk::Chunk;
use crate::vector::Vector;

pub use dynamic::{decode_column_as, decode_row_as, read_value};
pub use nested::MapEntries;

/// One step in a [`DecodePath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A top-level column.
    Column(usize),
    /// The elements of a list or array.
    Element,
    /// The keys of a map.
    Key,
    /// The values of a map.
    Value,
    /// A named struct field.
    Field(ArcStr),
}

/// Where in a nested type the decoder currently is. Used for error
/// messages only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodePath {
    segments: SmallVec<[PathSegment; 4]>,
}

impl DecodePath {
    /// A path rooted at `column`.
    #[must_use]
    pub fn column(column: usize) -> Self {
        let mut segments = SmallVec::new();
        segments.push(PathSegment::Column(column));
        Self { segments }
    }

    /// Descends one level.
    pub fn push(&mut self, segment: PathSegment) {
        self.segments.push(segment);
    }

    /// Returns to the parent level.
    pub fn pop(&mut self) {
        self.segments.pop();
    }

    /// Runs `f` one level deeper, restoring the path afterwards.
    ///
    /// # Errors
    ///
    /// Whatever `f` returns.
    pub fn within<R>(
        &mut self,
        segment: PathSegment,
        f: impl FnOnce(&mut Self) -> Result<R>,
    ) -> Result<R> {
        self.push(segment);
        let out = f(self);
        self.pop();
        out
    }
}

impl fmt::Display for DecodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(" > ")?;
            }
            match seg {
                PathSegment::Column(c) => write!(f, "column {c}")?,
                PathSegment::Element => f.write_str("element")?,
                PathSegment::Key => f.write_str("key")?,
                PathSegment::Value => f.write_str("value")?,
                PathSegment::Field(name) => write!(f, "field {name}")?,
            }
        }
        Ok(())
    }
}

/// Builds the error for `actual` not matching `expected`.
///
/// A type the decoder cannot handle at all is reported as
/// [`Error::Unsupported`] rather than a mismatch.
pub(crate) fn mismatch(expected: LogicalType, actual: &LogicalType, path: &DecodePath) -> Error {
    match actual.first_undecodable() {
        Some(unsupported) => Error::Unsupported(unsupported.clone()),
        None => Error::type_mismatch(expected, actual.clone(), path),
    }
}

/// A Rust type that can be decoded from a vector.
///
/// Implementors state the logical type they expect and read one valid row.
/// Validity is handled by the caller: `read` is only invoked for rows whose
/// validity bit is set.
pub trait Decodable: Sized {
    /// The logical type this Rust type decodes from.
    fn logical_type() -> LogicalType;

    /// Checks a vector's runtime type against [`logical_type`](Self::logical_type).
    ///
    /// The default is structural equality. Container types override it to
    /// accept several layouts and to extend `path` as they recurse.
    ///
    /// # Errors
    ///
    /// [`Error::TypeMismatch`] or [`Error::Unsupported`].
    fn check_type(actual: &LogicalType, path: &mut DecodePath) -> Result<()> {
        let expected = Self::logical_type();
        if expected == *actual {
            Ok(())
        } else {
            Err(mismatch(expected, actual, path))
        }
    }

    /// Reads the valid row `row`.
    ///
    /// # Errors
    ///
    /// [`Error::Layout`] or [`Error::InvalidUtf8`] for malformed buffers.
    fn read(vector: Vector<'_>, row: usize) -> Result<Self>;
}

/// Reads `row`, returning `None` if it is NULL.
///
/// # Errors
///
/// As [`Decodable::read`].
#[inline]
pub fn read_optional<T: Decodable>(vector: Vector<'_>, row: usize) -> Result<Option<T>> {
    if vector.is_null(row) {
        Ok(None)
    } else {
        T::read(vector, row).map(Some)
    }
}

/// A column whose type has been checked against `T` once.
///
/// # Examples
///
/// ```
/// use quiver_common::types::{LogicalType, Value};
/// use quiver_core::ChunkBuilder;
///
/// let mut builder = ChunkBuilder::new(&[LogicalType::DOUBLE]);
/// for v in [1.5, 2.5] {
///     builder.append_row(&[Value::from(v)]).unwrap();
/// }
/// let chunk = builder.finish().unwrap();
///
/// let col = chunk.typed::<f64>(0).unwrap();
/// let sum: f64 = col.iter().map(|v| v.unwrap().unwrap_or(0.0)).sum();
/// assert_eq!(sum, 4.0);
/// ```
pub struct TypedColumn<'c, T> {
    vector: Vector<'c>,
    _marker: PhantomData<fn() -> T>,
}

impl<'c, T: Decodable> TypedColumn<'c, T> {
    /// Type-checks column `column` of `chunk` against `T`.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] for a bad column,
    /// [`Error::TypeMismatch`] or [`Error::Unsupported`] for a bad type.
    pub fn new(chunk: &'c Chunk, column: usize) -> Result<Self> {
        let vector = chunk.vector(column)?;
        let mut path = DecodePath::column(column);
        T::check_type(vector.logical_type(), &mut path)?;
        Ok(Self {
            vector,
            _marker: PhantomData,
        })
    }

    /// The underlying vector.
    #[must_use]
    pub fn vector(&self) -> Vector<'c> {
        self.vector
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vector.len()
    }

    /// Returns true if the column has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vector.is_empty()
    }

    /// Decodes `row`.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] for a bad row, or a layout error.
    pub fn get(&self, row: usize) -> Result<Option<T>> {
        self.vector.check_row(row)?;
        read_optional(self.vector, row)
    }

    /// Decodes every row in order.
    pub fn iter(&self) -> impl Iterator<Item = Result<Option<T>>> + '_ {
        (0..self.len()).map(move |row| read_optional(self.vector, row))
    }

    /// Decodes every row into a vector.
    ///
    /// # Errors
    ///
    /// The first layout error encountered.
    pub fn to_vec(&self) -> Result<Vec<Option<T>>> {
        self.iter().collect()
    }
}

impl<T> fmt::Debug for TypedColumn<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedColumn")
            .field("vector", &self.vector)
            .field("rust_type", &std::any::type_name::<T>())
            .finish()
    }
}

/// Decodes a whole column as `T`.
///
/// # Errors
///
/// [`Error::OutOfBounds`], [`Error::TypeMismatch`], [`Error::Unsupported`],
/// or a layout error.
pub fn decode_column<T: Decodable>(chunk: &Chunk, column: usize) -> Result<Vec<Option<T>>> {
    TypedColumn::<T>::new(chunk, column)?.to_vec()
}

/// Decodes a single cell as `T`.
///
/// # Errors
///
/// As [`decode_column`], plus [`Error::OutOfBounds`] for a bad row.
pub fn decode_row<T: Decodable>(chunk: &Chunk, column: usize, row: usize) -> Result<Option<T>> {
    TypedColumn::<T>::new(chunk, column)?.get(row)
}

/// Helper for containers: decodes rows `range` of `vector` as options.
pub(crate) fn read_range<T: Decodable>(
    vector: Vector<'_>,
    range: std::ops::Range<usize>,
) -> Result<Vec<Option<T>>> {
    range.map(|row| read_optional(vector, row)).collect()
}
