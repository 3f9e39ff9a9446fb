//! Where chunks come from.
//!
//! A [`ChunkSource`] is the narrow interface to whatever executes the query:
//! it reports the result's columns and hands over one chunk at a time until
//! the stream ends. [`MemorySource`] is a queue-backed implementation for
//! results that already sit in memory.

use std::collections::VecDeque;

use arcstr::ArcStr;
use quiver_common::types::{LogicalType, Value};
use quiver_common::utils::{Error, IndexKind, Result};
use quiver_core::{Chunk, ChunkBuilder, STANDARD_VECTOR_SIZE};

/// A producer of result chunks.
///
/// `fetch_next_chunk` returns `Ok(None)` at end of stream. A chunk with zero
/// rows also ends the stream.
pub trait ChunkSource {
    /// Hands over the next chunk, or `None` once the result is exhausted.
    ///
    /// # Errors
    ///
    /// [`Error::Source`] or any error the producer hits.
    fn fetch_next_chunk(&mut self) -> Result<Option<Chunk>>;

    /// Number of result columns.
    fn column_count(&self) -> usize;

    /// Type of column `column`.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] for a bad index.
    fn column_logical_type(&self, column: usize) -> Result<LogicalType>;

    /// Name of column `column`.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] for a bad index.
    fn column_name(&self, column: usize) -> Result<ArcStr>;

    /// Rows per full chunk.
    fn max_batch_capacity(&self) -> usize {
        STANDARD_VECTOR_SIZE
    }
}

impl<S: ChunkSource + ?Sized> ChunkSource for &mut S {
    fn fetch_next_chunk(&mut self) -> Result<Option<Chunk>> {
        (**self).fetch_next_chunk()
    }

    fn column_count(&self) -> usize {
        (**self).column_count()
    }

    fn column_logical_type(&self, column: usize) -> Result<LogicalType> {
        (**self).column_logical_type(column)
    }

    fn column_name(&self, column: usize) -> Result<ArcStr> {
        (**self).column_name(column)
    }

    fn max_batch_capacity(&self) -> usize {
        (**self).max_batch_capacity()
    }
}

impl<S: ChunkSource + ?Sized> ChunkSource for Box<S> {
    fn fetch_next_chunk(&mut self) -> Result<Option<Chunk>> {
        (**self).fetch_next_chunk()
    }

    fn column_count(&self) -> usize {
        (**self).column_count()
    }

    fn column_logical_type(&self, column: usize) -> Result<LogicalType> {
        (**self).column_logical_type(column)
    }

    fn column_name(&self, column: usize) -> Result<ArcStr> {
        (**self).column_name(column)
    }

    fn max_batch_capacity(&self) -> usize {
        (**self).max_batch_capacity()
    }
}

/// A result held in memory as a queue of chunks.
///
/// # Examples
///
/// ```
/// use quiver_common::types::{LogicalType, Value};
/// use quiver_engine::{ChunkSource, MemorySource};
///
/// let rows = vec![
///     vec![Value::from(1i32), Value::from("a")],
///     vec![Value::from(2i32), Value::Null],
/// ];
/// let mut source = MemorySource::from_rows(
///     vec![("id", LogicalType::INTEGER), ("tag", LogicalType::VARCHAR)],
///     &rows,
///     2048,
/// )
/// .unwrap();
///
/// assert_eq!(source.column_count(), 2);
/// assert_eq!(source.column_name(1).unwrap(), "tag");
/// let chunk = source.fetch_next_chunk().unwrap().unwrap();
/// assert_eq!(chunk.row_count(), 2);
/// assert!(source.fetch_next_chunk().unwrap().is_none());
/// ```
#[derive(Debug)]
pub struct MemorySource {
    columns: Vec<(ArcStr, LogicalType)>,
    chunks: VecDeque<Chunk>,
    capacity: usize,
}

impl MemorySource {
    /// An empty result with the given `(name, type)` columns.
    pub fn new<N, I>(columns: I) -> Self
    where
        N: Into<ArcStr>,
        I: IntoIterator<Item = (N, LogicalType)>,
    {
        Self {
            columns: columns.into_iter().map(|(n, t)| (n.into(), t)).collect(),
            chunks: VecDeque::new(),
            capacity: STANDARD_VECTOR_SIZE,
        }
    }

    /// Sets the batch capacity reported to readers.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Splits `rows` into chunks of `capacity` rows.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for a zero capacity or a row of the wrong
    /// width, [`Error::InvalidValue`] for a value that does not fit its
    /// column.
    pub fn from_rows<N, I>(columns: I, rows: &[Vec<Value>], capacity: usize) -> Result<Self>
    where
        N: Into<ArcStr>,
        I: IntoIterator<Item = (N, LogicalType)>,
    {
        if capacity == 0 {
            return Err(Error::InvalidArgument(
                "batch capacity must be greater than zero".into(),
            ));
        }
        let mut source = Self::new(columns).with_capacity(capacity);
        let types: Vec<LogicalType> = source.columns.iter().map(|(_, t)| t.clone()).collect();

        for batch in rows.chunks(capacity) {
            let mut builder = ChunkBuilder::with_capacity(&types, capacity);
            for row in batch {
                builder.append_row(row)?;
            }
            source.chunks.push_back(builder.finish()?);
        }
        Ok(source)
    }

    /// Queues a chunk.
    pub fn push_chunk(&mut self, chunk: Chunk) {
        self.chunks.push_back(chunk);
    }

    /// Chunks not yet fetched.
    #[must_use]
    pub fn remaining_chunks(&self) -> usize {
        self.chunks.len()
    }

    fn column(&self, column: usize) -> Result<&(ArcStr, LogicalType)> {
        self.columns
            .get(column)
            .ok_or_else(|| Error::out_of_bounds(IndexKind::Column, column, self.columns.len()))
    }
}

impl ChunkSource for MemorySource {
    fn fetch_next_chunk(&mut self) -> Result<Option<Chunk>> {
        Ok(self.chunks.pop_front())
    }

    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn column_logical_type(&self, column: usize) -> Result<LogicalType> {
        self.column(column).map(|(_, t)| t.clone())
    }

    fn column_name(&self, column: usize) -> Result<ArcStr> {
        self.column(column).map(|(n, _)| n.clone())
    }

    fn max_batch_capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_splits_at_capacity() {
        let rows: Vec<Vec<Value>> = (0..5i32).map(|i| vec![Value::from(i)]).collect();
        let mut source = MemorySource::from_rows(vec![("n", LogicalType::INTEGER)], &rows, 2).unwrap();
        assert_eq!(source.remaining_chunks(), 3);
        let sizes: Vec<usize> = std::iter::from_fn(|| source.fetch_next_chunk().unwrap())
            .map(|c| c.row_count())
            .collect();
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[test]
    fn test_from_rows_rejects_bad_input() {
        let rows = vec![vec![Value::from("x")]];
        assert!(matches!(
            MemorySource::from_rows(vec![("n", LogicalType::INTEGER)], &rows, 2),
            Err(Error::InvalidValue { .. })
        ));
        assert!(matches!(
            MemorySource::from_rows(vec![("n", LogicalType::INTEGER)], &[], 0),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_column_metadata_bounds() {
        let source = MemorySource::new(vec![("a", LogicalType::DOUBLE)]);
        assert_eq!(source.column_logical_type(0).unwrap(), LogicalType::DOUBLE);
        assert_eq!(
            source.column_name(1).unwrap_err(),
            Error::out_of_bounds(IndexKind::Column, 1, 1)
        );
    }

    #[test]
    fn test_boxed_and_borrowed_sources() {
        let mut source = MemorySource::new(vec![("a", LogicalType::DOUBLE)]).with_capacity(16);
        {
            let borrowed: &mut MemorySource = &mut source;
            let mut by_ref = borrowed;
            assert_eq!(ChunkSource::max_batch_capacity(&by_ref), 16);
            assert!(ChunkSource::fetch_next_chunk(&mut by_ref).unwrap().is_none());
        }
        let boxed: Box<dyn ChunkSource> = Box::new(source);
        assert_eq!(boxed.column_count(), 1);
    }
}
