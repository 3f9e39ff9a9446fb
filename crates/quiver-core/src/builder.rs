//! Writes chunks in the engine's memory layout.
//!
//! Chunk sources that do not sit on top of a live engine (the in-memory
//! source, tests, benchmarks) build their chunks here. The output is
//! byte-for-byte what the decoder expects from the engine: validity words,
//! 16-byte string records with a per-vector heap, list entries into a packed
//! child vector, and one child per struct field.

use quiver_common::types::{LogicalType, TypeId, Value};
use quiver_common::utils::{Error, Result};

use crate::chunk::{Chunk, STANDARD_VECTOR_SIZE};
use crate::memory::Validity;
use crate::memory::layout::{self, ListEntry, STRING_INLINE_LIMIT, STRING_RECORD_WIDTH};
use crate::vector::RawVector;

/// Builds one vector, children included, from [`Value`]s.
#[derive(Debug, Clone)]
pub struct VectorBuilder {
    logical_type: LogicalType,
    len: usize,
    data: Vec<u8>,
    validity: Validity,
    heap: Vec<u8>,
    children: Vec<VectorBuilder>,
}

impl VectorBuilder {
    /// Creates an empty builder for `logical_type`.
    #[must_use]
    pub fn new(logical_type: LogicalType) -> Self {
        let children = match &logical_type {
            LogicalType::Struct(fields) => fields
                .iter()
                .map(|f| VectorBuilder::new(f.logical_type().clone()))
                .collect(),
            other => other
                .child_vector_type()
                .map(VectorBuilder::new)
                .into_iter()
                .collect(),
        };
        Self {
            logical_type,
            len: 0,
            data: Vec::new(),
            validity: Validity::new(),
            heap: Vec::new(),
            children,
        }
    }

    /// The vector's type.
    #[must_use]
    pub fn logical_type(&self) -> &LogicalType {
        &self.logical_type
    }

    /// Rows written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no rows have been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends anything convertible into a [`Value`].
    ///
    /// # Errors
    ///
    /// As [`push_value`](Self::push_value).
    pub fn push(&mut self, value: impl Into<Value>) -> Result<()> {
        self.push_value(&value.into())
    }

    /// Appends one value. `Value::Null` appends a NULL row.
    ///
    /// The value's shape is checked in full before anything is written, so
    /// a rejected value leaves the builder unchanged.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidValue`] if the value does not fit the vector's type.
    pub fn push_value(&mut self, value: &Value) -> Result<()> {
        check_shape(&self.logical_type, value)?;
        self.write(value)
    }

    /// Appends a NULL row.
    pub fn push_null(&mut self) {
        let row = self.len;
        self.validity.ensure_writable();
        self.validity.set_invalid(row);
        self.len += 1;

        match &self.logical_type {
            LogicalType::List(_) | LogicalType::Map { .. } => {
                let offset = self.children[0].len as u64;
                self.data
                    .extend_from_slice(&ListEntry::new(offset, 0).to_bytes());
            }
            LogicalType::Array { size, .. } => {
                for _ in 0..*size {
                    self.children[0].push_null();
                }
            }
            LogicalType::Struct(_) => {
                for child in &mut self.children {
                    child.push_null();
                }
            }
            LogicalType::Primitive(id) => {
                if let Some(width) = id.record_width() {
                    self.data.resize(self.data.len() + width, 0);
                }
            }
        }
    }

    fn write(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Null => {
                self.push_null();
                return Ok(());
            }
            Value::Bool(v) => self.data.push(u8::from(*v)),
            Value::TinyInt(v) => self.data.extend_from_slice(&v.to_ne_bytes()),
            Value::SmallInt(v) => self.data.extend_from_slice(&v.to_ne_bytes()),
            Value::Integer(v) => self.data.extend_from_slice(&v.to_ne_bytes()),
            Value::BigInt(v) => self.data.extend_from_slice(&v.to_ne_bytes()),
            Value::UTinyInt(v) => self.data.extend_from_slice(&v.to_ne_bytes()),
            Value::USmallInt(v) => self.data.extend_from_slice(&v.to_ne_bytes()),
            Value::UInteger(v) => self.data.extend_from_slice(&v.to_ne_bytes()),
            Value::UBigInt(v) => self.data.extend_from_slice(&v.to_ne_bytes()),
            Value::Float(v) => self.data.extend_from_slice(&v.to_ne_bytes()),
            Value::Double(v) => self.data.extend_from_slice(&v.to_ne_bytes()),
            Value::HugeInt(v) => self.data.extend_from_slice(&layout::hugeint_bytes(*v)),
            Value::UHugeInt(v) => self.data.extend_from_slice(&layout::uhugeint_bytes(*v)),
            Value::Date(v) => self.data.extend_from_slice(&v.as_days().to_ne_bytes()),
            Value::Time(v) => self.data.extend_from_slice(&v.as_micros().to_ne_bytes()),
            Value::Timestamp(v) => self.data.extend_from_slice(&v.as_micros().to_ne_bytes()),
            Value::Interval(v) => self.data.extend_from_slice(&layout::interval_bytes(*v)),
            Value::String(s) => {
                let bytes = s.as_bytes();
                let record = layout::encode_string_record(bytes, self.heap.len())?;
                if bytes.len() > STRING_INLINE_LIMIT {
                    self.heap.extend_from_slice(bytes);
                }
                self.data.extend_from_slice(&record);
            }
            Value::List(items) => {
                let child = &mut self.children[0];
                let offset = child.len as u64;
                for item in items.iter() {
                    child.write(item)?;
                }
                if !matches!(self.logical_type, LogicalType::Array { .. }) {
                    self.data
                        .extend_from_slice(&ListEntry::new(offset, items.len() as u64).to_bytes());
                }
            }
            Value::Map(entries) => {
                let child = &mut self.children[0];
                let offset = child.len as u64;
                for (k, v) in entries.iter() {
                    child.write_struct_row(&[k, v])?;
                }
                self.data
                    .extend_from_slice(&ListEntry::new(offset, entries.len() as u64).to_bytes());
            }
            Value::Struct(fields) => {
                let values: Vec<&Value> = fields.iter().map(|(_, v)| v).collect();
                self.write_struct_fields(&values)?;
            }
        }

        self.validity.push(true);
        self.len += 1;
        Ok(())
    }

    fn write_struct_fields(&mut self, values: &[&Value]) -> Result<()> {
        for (child, value) in self.children.iter_mut().zip(values) {
            child.write(value)?;
        }
        Ok(())
    }

    fn write_struct_row(&mut self, values: &[&Value]) -> Result<()> {
        self.write_struct_fields(values)?;
        self.validity.push(true);
        self.len += 1;
        Ok(())
    }

    /// Freezes the buffers into engine form.
    ///
    /// Out-of-line string records get their final heap address here, after
    /// the heap can no longer move.
    #[must_use]
    pub fn finish(self) -> RawVector {
        let heap = self.heap.into_boxed_slice();
        let mut data = self.data.into_boxed_slice();
        if self.logical_type.kind_id().is_string_like() && !heap.is_empty() {
            let base = heap.as_ptr() as usize as u64;
            for record in data.chunks_exact_mut(STRING_RECORD_WIDTH) {
                layout::rebase_string_record(record, base);
            }
        }
        RawVector {
            logical_type: self.logical_type,
            len: self.len,
            data,
            validity: self.validity.into_words(),
            heap,
            children: self.children.into_iter().map(Self::finish).collect(),
        }
    }
}

/// Checks that `value` can be written to a vector of type `ty`.
fn check_shape(ty: &LogicalType, value: &Value) -> Result<()> {
    let reject = || Error::InvalidValue {
        expected: ty.clone(),
        found: value.type_name(),
    };

    match (ty, value) {
        (_, Value::Null) => Ok(()),
        (LogicalType::Primitive(id), v) => {
            let fits = matches!(
                (id, v),
                (TypeId::Boolean, Value::Bool(_))
                    | (TypeId::TinyInt, Value::TinyInt(_))
                    | (TypeId::SmallInt, Value::SmallInt(_))
                    | (TypeId::Integer, Value::Integer(_))
                    | (TypeId::BigInt, Value::BigInt(_))
                    | (TypeId::UTinyInt, Value::UTinyInt(_))
                    | (TypeId::USmallInt, Value::USmallInt(_))
                    | (TypeId::UInteger, Value::UInteger(_))
                    | (TypeId::UBigInt, Value::UBigInt(_))
                    | (TypeId::Float, Value::Float(_))
                    | (TypeId::Double, Value::Double(_))
                    | (TypeId::HugeInt, Value::HugeInt(_))
                    | (TypeId::UHugeInt, Value::UHugeInt(_))
                    | (TypeId::Date, Value::Date(_))
                    | (TypeId::Time, Value::Time(_))
                    | (TypeId::Timestamp, Value::Timestamp(_))
                    | (TypeId::Interval, Value::Interval(_))
            ) || (id.is_string_like() && matches!(v, Value::String(s) if u32::try_from(s.len()).is_ok()));
            if fits { Ok(()) } else { Err(reject()) }
        }
        (LogicalType::List(child), Value::List(items)) => {
            items.iter().try_for_each(|item| check_shape(child, item))
        }
        (LogicalType::Array { child, size }, Value::List(items)) => {
            if items.len() != *size {
                return Err(Error::InvalidValue {
                    expected: ty.clone(),
                    found: "list of the wrong length",
                });
            }
            items.iter().try_for_each(|item| check_shape(child, item))
        }
        (LogicalType::Map { key, value: val_ty }, Value::Map(entries)) => {
            entries.iter().try_for_each(|(k, v)| {
                if k.is_null() {
                    return Err(Error::InvalidValue {
                        expected: ty.clone(),
                        found: "null map key",
                    });
                }
                check_shape(key, k)?;
                check_shape(val_ty, v)
            })
        }
        (LogicalType::Struct(fields), Value::Struct(values)) => {
            let same_names = fields.len() == values.len()
                && fields
                    .iter()
                    .zip(values.iter())
                    .all(|(f, (name, _))| f.name() == name.as_str());
            if !same_names {
                return Err(reject());
            }
            fields
                .iter()
                .zip(values.iter())
                .try_for_each(|(f, (_, v))| check_shape(f.logical_type(), v))
        }
        _ => Err(reject()),
    }
}

/// Builds a whole chunk row by row.
///
/// # Examples
///
/// ```
/// use quiver_common::types::{LogicalType, Value};
/// use quiver_core::ChunkBuilder;
///
/// let mut builder = ChunkBuilder::with_capacity(&[LogicalType::BIGINT], 2);
/// builder.append_row(&[Value::from(1i64)]).unwrap();
/// builder.append_row(&[Value::from(2i64)]).unwrap();
/// assert!(builder.is_full());
/// assert!(builder.append_row(&[Value::from(3i64)]).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct ChunkBuilder {
    columns: Vec<VectorBuilder>,
    capacity: usize,
}

impl ChunkBuilder {
    /// Creates a builder with the engine's standard vector size.
    #[must_use]
    pub fn new(column_types: &[LogicalType]) -> Self {
        Self::with_capacity(column_types, STANDARD_VECTOR_SIZE)
    }

    /// Creates a builder holding at most `capacity` rows.
    #[must_use]
    pub fn with_capacity(column_types: &[LogicalType], capacity: usize) -> Self {
        Self {
            columns: column_types
                .iter()
                .map(|t| VectorBuilder::new(t.clone()))
                .collect(),
            capacity,
        }
    }

    /// Number of columns.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Rows appended so far.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, VectorBuilder::len)
    }

    /// Maximum rows.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns true once `capacity` rows have been appended.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.row_count() >= self.capacity
    }

    /// Direct access to one column's builder.
    ///
    /// Rows pushed this way must be matched in every other column before
    /// [`finish`](Self::finish), which rejects ragged columns.
    pub fn column_mut(&mut self, index: usize) -> Option<&mut VectorBuilder> {
        self.columns.get_mut(index)
    }

    /// Appends one row, one value per column.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for a wrong arity or a full builder,
    /// [`Error::InvalidValue`] for a value that does not fit its column. A
    /// rejected row writes nothing.
    pub fn append_row(&mut self, row: &[Value]) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::InvalidArgument(format!(
                "row has {} values, chunk has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        if self.is_full() {
            return Err(Error::InvalidArgument(format!(
                "chunk is full at {} rows",
                self.capacity
            )));
        }
        for (col, value) in self.columns.iter().zip(row) {
            check_shape(&col.logical_type, value)?;
        }
        for (col, value) in self.columns.iter_mut().zip(row) {
            col.write(value)?;
        }
        Ok(())
    }

    /// Freezes into a validated [`Chunk`].
    ///
    /// # Errors
    ///
    /// [`Error::Layout`] if columns were pushed to unevenly.
    pub fn finish(self) -> Result<Chunk> {
        let row_count = self.row_count();
        let columns = self.columns.into_iter().map(VectorBuilder::finish).collect();
        Chunk::from_raw(row_count, self.capacity, columns)
    }
}
