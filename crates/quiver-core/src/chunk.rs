//! Chunk: one batch of result rows in column form.

use quiver_common::types::{LogicalType, Value};
use quiver_common::utils::{Error, IndexKind, Result};
use smallvec::SmallVec;

use crate::decode::{self, Decodable, TypedColumn};
use crate::vector::{RawVector, Vector, VectorId, VectorSlot};

/// The engine's default vector size: rows per chunk.
pub const STANDARD_VECTOR_SIZE: usize = 2048;

/// An immutable batch of columns sharing one row count.
///
/// Vectors and their children live in a flat arena; parents refer to
/// children by [`VectorId`]. Dropping the chunk frees every buffer at once.
///
/// # Examples
///
/// ```
/// use quiver_common::types::{LogicalType, Value};
/// use quiver_core::ChunkBuilder;
///
/// let mut builder = ChunkBuilder::new(&[LogicalType::INTEGER, LogicalType::VARCHAR]);
/// builder.append_row(&[Value::from(1i32), Value::from("a")]).unwrap();
/// builder.append_row(&[Value::Null, Value::from("b")]).unwrap();
/// let chunk = builder.finish().unwrap();
///
/// assert_eq!(chunk.row_count(), 2);
/// assert_eq!(chunk.get::<i32>(0, 0).unwrap(), Some(1));
/// assert_eq!(chunk.get::<i32>(0, 1).unwrap(), None);
/// assert_eq!(chunk.column::<String>(1).unwrap(), vec![Some("a".into()), Some("b".into())]);
/// ```
#[derive(Debug)]
pub struct Chunk {
    slots: Vec<VectorSlot>,
    columns: Vec<VectorId>,
    row_count: usize,
    capacity: usize,
}

impl Chunk {
    /// Validates engine buffers and takes ownership of them.
    ///
    /// Checks, recursively: every column has `row_count` rows, data buffers
    /// hold a record per row, validity bitmaps have enough words, child
    /// vectors match the parent's type and shape.
    ///
    /// # Errors
    ///
    /// [`Error::Layout`] naming the first violation found.
    pub fn from_raw(row_count: usize, capacity: usize, columns: Vec<RawVector>) -> Result<Self> {
        if row_count > capacity {
            return Err(Error::layout(format!(
                "chunk holds {row_count} rows but its capacity is {capacity}"
            )));
        }
        for (i, col) in columns.iter().enumerate() {
            if col.len != row_count {
                return Err(Error::layout(format!(
                    "column {i} has {} rows, chunk has {row_count}",
                    col.len
                )));
            }
            validate(col, &format!("column {i}"))?;
        }

        let mut slots = Vec::with_capacity(columns.len());
        let columns = columns
            .into_iter()
            .map(|raw| flatten(&mut slots, raw))
            .collect();
        Ok(Self {
            slots,
            columns,
            row_count,
            capacity,
        })
    }

    pub(crate) fn slot(&self, id: VectorId) -> &VectorSlot {
        &self.slots[id.0]
    }

    /// Number of columns.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Maximum rows this chunk could hold.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns true if the chunk has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// The vector for column `index`.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] if `index >= column_count()`.
    pub fn vector(&self, index: usize) -> Result<Vector<'_>> {
        self.columns
            .get(index)
            .map(|&id| Vector::new(self, id))
            .ok_or_else(|| Error::out_of_bounds(IndexKind::Column, index, self.columns.len()))
    }

    /// Types of all columns, in order.
    pub fn column_types(&self) -> impl ExactSizeIterator<Item = &LogicalType> + '_ {
        self.columns.iter().map(|id| &self.slot(*id).logical_type)
    }

    /// Decodes one cell.
    ///
    /// # Errors
    ///
    /// Out-of-range indices, a type mismatch, or a layout violation.
    pub fn get<T: Decodable>(&self, column: usize, row: usize) -> Result<Option<T>> {
        decode::decode_row(self, column, row)
    }

    /// Decodes a whole column.
    ///
    /// # Errors
    ///
    /// As [`get`](Self::get).
    pub fn column<T: Decodable>(&self, column: usize) -> Result<Vec<Option<T>>> {
        decode::decode_column(self, column)
    }

    /// Type-checks a column once for repeated row access.
    ///
    /// # Errors
    ///
    /// As [`get`](Self::get).
    pub fn typed<T: Decodable>(&self, column: usize) -> Result<TypedColumn<'_, T>> {
        TypedColumn::new(self, column)
    }

    /// Decodes one cell using the column's own type.
    ///
    /// # Errors
    ///
    /// Out-of-range indices, an unsupported column type, or a layout
    /// violation.
    pub fn value(&self, column: usize, row: usize) -> Result<Value> {
        let vector = self.vector(column)?;
        vector.check_row(row)?;
        decode::dynamic::ensure_decodable(vector.logical_type())?;
        decode::dynamic::read_value(vector, row)
    }

    /// Returns true if the cell is NULL.
    ///
    /// # Errors
    ///
    /// Out-of-range indices.
    pub fn is_null(&self, column: usize, row: usize) -> Result<bool> {
        let vector = self.vector(column)?;
        vector.check_row(row)?;
        Ok(vector.is_null(row))
    }

    /// Returns true if the column has rows and all of them are NULL.
    ///
    /// # Errors
    ///
    /// Out-of-range column index.
    pub fn column_is_null(&self, column: usize) -> Result<bool> {
        Ok(self.vector(column)?.is_all_null())
    }
}

fn flatten(slots: &mut Vec<VectorSlot>, raw: RawVector) -> VectorId {
    let RawVector {
        logical_type,
        len,
        data,
        validity,
        heap,
        children,
    } = raw;
    let id = VectorId(slots.len());
    slots.push(VectorSlot {
        logical_type,
        len,
        data,
        validity,
        heap,
        children: SmallVec::new(),
    });
    let kids: SmallVec<[VectorId; 2]> = children
        .into_iter()
        .map(|child| flatten(slots, child))
        .collect();
    slots[id.0].children = kids;
    id
}

fn validate(raw: &RawVector, path: &str) -> Result<()> {
    let ty = &raw.logical_type;

    if let Some(words) = &raw.validity {
        let needed = raw.len.div_ceil(64);
        if words.len() < needed {
            return Err(Error::layout(format!(
                "{path}: validity has {} words, {} rows need {needed}",
                words.len(),
                raw.len
            )));
        }
    }

    if let Some(width) = ty.record_width() {
        let needed = raw.len.checked_mul(width);
        if needed.is_none_or(|n| raw.data.len() < n) {
            return Err(Error::layout(format!(
                "{path}: {} rows of {ty} need {width} bytes each, data has {}",
                raw.len,
                raw.data.len()
            )));
        }
    }

    match ty {
        LogicalType::Primitive(id) if id.is_nested() => Err(Error::layout(format!(
            "{path}: {id} is nested but carries no child types"
        ))),
        LogicalType::Primitive(_) => expect_children(raw, 0, path),
        LogicalType::List(_) | LogicalType::Map { .. } => {
            expect_children(raw, 1, path)?;
            validate_child_type(raw, path)
        }
        LogicalType::Array { size, .. } => {
            expect_children(raw, 1, path)?;
            let child = &raw.children[0];
            let needed = raw.len.checked_mul(*size);
            if needed.is_none_or(|n| child.len < n) {
                return Err(Error::layout(format!(
                    "{path}: array of {} rows x {size} needs more than {} child rows",
                    raw.len, child.len
                )));
            }
            validate_child_type(raw, path)
        }
        LogicalType::Struct(fields) => {
            expect_children(raw, fields.len(), path)?;
            for (field, child) in fields.iter().zip(&raw.children) {
                let child_path = format!("{path} > field {}", field.name());
                if child.logical_type != *field.logical_type() {
                    return Err(Error::layout(format!(
                        "{child_path}: child is {}, field is {}",
                        child.logical_type,
                        field.logical_type()
                    )));
                }
                if child.len != raw.len {
                    return Err(Error::layout(format!(
                        "{child_path}: child has {} rows, struct has {}",
                        child.len, raw.len
                    )));
                }
                validate(child, &child_path)?;
            }
            Ok(())
        }
    }
}

fn expect_children(raw: &RawVector, count: usize, path: &str) -> Result<()> {
    if raw.children.len() == count {
        Ok(())
    } else {
        Err(Error::layout(format!(
            "{path}: {} vector has {} children, expected {count}",
            raw.logical_type,
            raw.children.len()
        )))
    }
}

fn validate_child_type(raw: &RawVector, path: &str) -> Result<()> {
    let child = &raw.children[0];
    let child_path = format!("{path} > element");
    match raw.logical_type.child_vector_type() {
        Some(expected) if expected == child.logical_type => validate(child, &child_path),
        Some(expected) => Err(Error::layout(format!(
            "{child_path}: child is {}, expected {expected}",
            child.logical_type
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ChunkBuilder;

    fn ints(values: &[i32]) -> RawVector {
        RawVector {
            logical_type: LogicalType::INTEGER,
            len: values.len(),
            data: values
                .iter()
                .flat_map(|v| v.to_ne_bytes())
                .collect::<Vec<_>>()
                .into_boxed_slice(),
            validity: None,
            heap: Box::default(),
            children: Vec::new(),
        }
    }

    #[test]
    fn test_from_raw_accepts_engine_layout() {
        let chunk = Chunk::from_raw(3, STANDARD_VECTOR_SIZE, vec![ints(&[1, 2, 3])]).unwrap();
        assert_eq!(chunk.column_count(), 1);
        assert_eq!(chunk.row_count(), 3);
        assert_eq!(chunk.capacity(), 2048);
        assert_eq!(chunk.column::<i32>(0).unwrap(), vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn test_from_raw_rejects_short_data() {
        let mut col = ints(&[1, 2, 3]);
        col.data = col.data[..8].into();
        assert!(matches!(
            Chunk::from_raw(3, 2048, vec![col]),
            Err(Error::Layout(_))
        ));
    }

    #[test]
    fn test_from_raw_rejects_short_validity_and_mismatched_len() {
        let mut col = ints(&[0; 65]);
        col.validity = Some(vec![u64::MAX].into_boxed_slice());
        assert!(Chunk::from_raw(65, 2048, vec![col]).is_err());

        assert!(Chunk::from_raw(2, 2048, vec![ints(&[1, 2, 3])]).is_err());
        assert!(Chunk::from_raw(3, 2, vec![ints(&[1, 2, 3])]).is_err());
    }

    #[test]
    fn test_from_raw_rejects_wrong_child_type() {
        let list = RawVector {
            logical_type: LogicalType::list_of(LogicalType::BIGINT),
            len: 0,
            data: Box::default(),
            validity: None,
            heap: Box::default(),
            children: vec![ints(&[])],
        };
        assert!(matches!(
            Chunk::from_raw(0, 2048, vec![list]),
            Err(Error::Layout(_))
        ));
    }

    #[test]
    fn test_vector_out_of_bounds() {
        let chunk = Chunk::from_raw(1, 2048, vec![ints(&[7])]).unwrap();
        assert_eq!(
            chunk.vector(3).unwrap_err(),
            Error::out_of_bounds(IndexKind::Column, 3, 1)
        );
    }

    #[test]
    fn test_row_out_of_bounds_reports_index_and_bound() {
        let chunk = Chunk::from_raw(5, 2048, vec![ints(&[1, 2, 3, 4, 5])]).unwrap();
        let err = chunk.get::<i32>(0, 10).unwrap_err();
        assert_eq!(err, Error::out_of_bounds(IndexKind::Row, 10, 5));
        let msg = err.to_string();
        assert!(msg.contains("10") && msg.contains('5'), "{msg}");
    }

    #[test]
    fn test_arena_links_children() {
        let mut b = ChunkBuilder::new(&[LogicalType::struct_of([
            ("a", LogicalType::INTEGER),
            ("b", LogicalType::list_of(LogicalType::VARCHAR)),
        ])]);
        b.append_row(&[Value::struct_of([
            ("a", Value::from(1i32)),
            ("b", Value::from(vec!["x", "y"])),
        ])])
        .unwrap();
        let chunk = b.finish().unwrap();
        let s = chunk.vector(0).unwrap();
        assert_eq!(s.child_count(), 2);
        let b = s.struct_child_by_name("b").unwrap();
        assert_eq!(b.list_child().unwrap().len(), 2);
        assert!(s.struct_child(2).is_err());
    }

    #[test]
    fn test_chunk_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Chunk>();
    }
}
