//! Column vectors.
//!
//! A chunk stores its vectors in an arena ([`VectorSlot`]s addressed by
//! [`VectorId`]). Callers see them through [`Vector`], a small `Copy` handle
//! that borrows the chunk, so a vector can never outlive the buffers it
//! points into.
//!
//! [`RawVector`] is the owned, tree-shaped form a chunk source hands over
//! before [`Chunk::from_raw`](crate::Chunk::from_raw) validates and flattens
//! it.

use std::fmt;
use std::ops::Range;

use arcstr::ArcStr;
use quiver_common::types::{LogicalType, TypeId};
use quiver_common::utils::strings::suggest;
use quiver_common::utils::{Error, IndexKind, Result};
use smallvec::SmallVec;

use crate::chunk::Chunk;
use crate::memory::layout::{self, ListEntry};
use crate::memory::ValidityMask;

/// One vector's buffers as produced by the engine, children included.
///
/// Out-of-line string records hold absolute addresses into `heap`, so a
/// clone patches them to point into its own copy of the heap. There is no
/// `PartialEq`: record bytes are address-bearing.
#[derive(Debug)]
pub struct RawVector {
    /// Column type.
    pub logical_type: LogicalType,
    /// Rows in this vector. For children of lists this is the child's own
    /// row count, not the parent's.
    pub len: usize,
    /// Per-row records laid out by `logical_type`.
    pub data: Box<[u8]>,
    /// Validity words, or `None` when every row is valid.
    pub validity: Option<Box<[u64]>>,
    /// Out-of-line string bytes referenced from `data`.
    pub heap: Box<[u8]>,
    /// Child vectors: one for list/array/map, one per field for struct.
    pub children: Vec<RawVector>,
}

impl RawVector {
    /// A vector with no rows and no children.
    #[must_use]
    pub fn empty(logical_type: LogicalType) -> Self {
        Self {
            logical_type,
            len: 0,
            data: Box::default(),
            validity: None,
            heap: Box::default(),
            children: Vec::new(),
        }
    }
}

impl Clone for RawVector {
    fn clone(&self) -> Self {
        let heap = self.heap.clone();
        let mut data = self.data.clone();
        if self.logical_type.kind_id().is_string_like() && !heap.is_empty() {
            let from = self.heap.as_ptr() as usize as u64;
            let to = heap.as_ptr() as usize as u64;
            for record in data.chunks_exact_mut(layout::STRING_RECORD_WIDTH) {
                layout::relocate_string_record(record, from, to);
            }
        }
        Self {
            logical_type: self.logical_type.clone(),
            len: self.len,
            data,
            validity: self.validity.clone(),
            heap,
            children: self.children.clone(),
        }
    }
}

/// Index of a vector inside its chunk's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VectorId(pub(crate) usize);

/// Arena storage for one vector.
#[derive(Debug)]
pub(crate) struct VectorSlot {
    pub(crate) logical_type: LogicalType,
    pub(crate) len: usize,
    pub(crate) data: Box<[u8]>,
    pub(crate) validity: Option<Box<[u64]>>,
    pub(crate) heap: Box<[u8]>,
    pub(crate) children: SmallVec<[VectorId; 2]>,
}

/// A borrowed view of one vector in a chunk.
///
/// # Examples
///
/// ```
/// use quiver_common::types::{LogicalType, Value};
/// use quiver_core::ChunkBuilder;
///
/// let mut builder = ChunkBuilder::new(&[LogicalType::list_of(LogicalType::INTEGER)]);
/// builder.append_row(&[Value::from(vec![1i32, 2, 3])]).unwrap();
/// let chunk = builder.finish().unwrap();
///
/// let list = chunk.vector(0).unwrap();
/// let entry = list.list_entry(0).unwrap();
/// assert_eq!((entry.offset, entry.length), (0, 3));
/// assert_eq!(list.list_child().unwrap().len(), 3);
/// ```
#[derive(Clone, Copy)]
pub struct Vector<'c> {
    chunk: &'c Chunk,
    id: VectorId,
}

impl<'c> Vector<'c> {
    pub(crate) fn new(chunk: &'c Chunk, id: VectorId) -> Self {
        Self { chunk, id }
    }

    fn slot(&self) -> &'c VectorSlot {
        self.chunk.slot(self.id)
    }

    /// The vector's logical type.
    #[must_use]
    pub fn logical_type(&self) -> &'c LogicalType {
        &self.slot().logical_type
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slot().len
    }

    /// Returns true if the vector has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw data buffer.
    #[must_use]
    pub fn data(&self) -> &'c [u8] {
        &self.slot().data
    }

    /// Out-of-line string bytes.
    #[must_use]
    pub fn heap(&self) -> &'c [u8] {
        &self.slot().heap
    }

    /// Validity of this vector's rows.
    #[must_use]
    pub fn validity(&self) -> ValidityMask<'c> {
        let slot = self.slot();
        ValidityMask::new(slot.validity.as_deref(), slot.len)
    }

    /// Returns true if `row` holds a value.
    #[inline]
    #[must_use]
    pub fn is_valid(&self, row: usize) -> bool {
        self.validity().is_valid(row)
    }

    /// Returns true if `row` is NULL.
    #[inline]
    #[must_use]
    pub fn is_null(&self, row: usize) -> bool {
        !self.is_valid(row)
    }

    /// Returns true if the vector has rows and every one of them is NULL.
    #[must_use]
    pub fn is_all_null(&self) -> bool {
        self.validity().is_all_null()
    }

    /// Number of child vectors.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.slot().children.len()
    }

    /// Fails with [`Error::OutOfBounds`] unless `row < len()`.
    ///
    /// # Errors
    ///
    /// See above.
    pub fn check_row(&self, row: usize) -> Result<()> {
        let len = self.len();
        if row < len {
            Ok(())
        } else {
            Err(Error::out_of_bounds(IndexKind::Row, row, len))
        }
    }

    /// The element vector of a list or array, or the `struct(key, value)`
    /// entries vector of a map.
    #[must_use]
    pub fn list_child(&self) -> Option<Vector<'c>> {
        match self.logical_type().kind_id() {
            TypeId::List | TypeId::Array | TypeId::Map => self
                .slot()
                .children
                .first()
                .map(|&id| Vector::new(self.chunk, id)),
            _ => None,
        }
    }

    /// The child vector of struct field `index`.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] past the last field, [`Error::InvalidArgument`]
    /// if this is not a struct vector.
    pub fn struct_child(&self, index: usize) -> Result<Vector<'c>> {
        let fields = self.struct_fields()?;
        if index >= fields.len() {
            return Err(Error::out_of_bounds(
                IndexKind::StructField,
                index,
                fields.len(),
            ));
        }
        self.slot()
            .children
            .get(index)
            .map(|&id| Vector::new(self.chunk, id))
            .ok_or_else(|| Error::layout(format!("struct vector is missing child {index}")))
    }

    /// The child vector of the struct field called `name`.
    ///
    /// # Errors
    ///
    /// [`Error::ColumnNotFound`] with a suggestion when no field matches.
    pub fn struct_child_by_name(&self, name: &str) -> Result<Vector<'c>> {
        let fields = self.struct_fields()?;
        match fields.iter().position(|f| f.name() == name) {
            Some(i) => self.struct_child(i),
            None => {
                let names: Vec<&str> = fields.iter().map(|f| f.name()).collect();
                Err(Error::ColumnNotFound {
                    name: name.to_string(),
                    hint: suggest(name, &names),
                })
            }
        }
    }

    /// Names of the struct fields, in order.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if this is not a struct vector.
    pub fn struct_field_names(&self) -> Result<Vec<ArcStr>> {
        Ok(self
            .struct_fields()?
            .iter()
            .map(|f| f.name_arc().clone())
            .collect())
    }

    fn struct_fields(&self) -> Result<&'c [quiver_common::types::StructField]> {
        self.logical_type().struct_fields().ok_or_else(|| {
            Error::InvalidArgument(format!(
                "vector of type {} has no struct fields",
                self.logical_type()
            ))
        })
    }

    /// The list entry for `row`.
    ///
    /// Array vectors have no stored entries; theirs is computed as
    /// `(row * size, size)`.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] for a bad row, [`Error::InvalidArgument`] for a
    /// vector that is not a list, array or map.
    pub fn list_entry(&self, row: usize) -> Result<ListEntry> {
        self.check_row(row)?;
        match self.logical_type() {
            LogicalType::List(_) | LogicalType::Map { .. } => ListEntry::read(self.data(), row),
            LogicalType::Array { size, .. } => row
                .checked_mul(*size)
                .map(|start| ListEntry::new(start as u64, *size as u64))
                .ok_or_else(|| Error::layout(format!("array row {row} overflows"))),
            other => Err(Error::InvalidArgument(format!(
                "vector of type {other} has no list entries"
            ))),
        }
    }

    /// Child rows covered by `row`, checked against the child's length.
    ///
    /// # Errors
    ///
    /// As [`list_entry`](Self::list_entry), plus [`Error::Layout`] when the
    /// entry runs past the child vector.
    pub fn list_range(&self, row: usize) -> Result<Range<usize>> {
        let entry = self.list_entry(row)?;
        let child = self
            .list_child()
            .ok_or_else(|| Error::layout("nested vector has no child"))?;
        entry.child_range(child.len())
    }

    /// Bytes of the string at `row`, borrowed from the chunk.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] for a bad row, [`Error::Layout`] for a
    /// malformed record.
    pub fn string_bytes(&self, row: usize) -> Result<&'c [u8]> {
        self.check_row(row)?;
        layout::string_bytes(self.data(), self.heap(), row)
    }

    /// The string at `row` as UTF-8.
    ///
    /// # Errors
    ///
    /// As [`string_bytes`](Self::string_bytes), plus
    /// [`Error::InvalidUtf8`].
    pub fn string(&self, row: usize) -> Result<&'c str> {
        std::str::from_utf8(self.string_bytes(row)?).map_err(|_| Error::InvalidUtf8 { row })
    }
}

impl fmt::Debug for Vector<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vector")
            .field("logical_type", self.logical_type())
            .field("len", &self.len())
            .field("children", &self.child_count())
            .finish()
    }
}
