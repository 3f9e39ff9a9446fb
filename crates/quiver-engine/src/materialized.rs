//! A fully drained result with random access by global row index.

use quiver_common::types::Value;
use quiver_common::utils::{Error, IndexKind, Result};
use quiver_core::Chunk;
use quiver_core::decode::{Decodable, DecodePath};
use rayon::prelude::*;

use crate::config::Config;
use crate::iterator::ChunkIterator;
use crate::schema::Schema;
use crate::source::ChunkSource;

/// Where a global row lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowLocation {
    /// Index of the chunk.
    pub chunk: usize,
    /// Row within that chunk.
    pub offset: usize,
}

/// Every chunk of a result, kept in source order.
///
/// Rows are addressed globally. When every chunk but the last is full and
/// the last is no larger than the batch capacity, the chunk for row `r` is
/// `r / batch_capacity`; otherwise lookups fall back to a binary search over
/// chunk start offsets.
#[derive(Debug)]
pub struct MaterializedResult {
    schema: Schema,
    chunks: Vec<Chunk>,
    /// Global index of each chunk's first row.
    starts: Vec<usize>,
    row_count: usize,
    batch_capacity: usize,
    uniform: bool,
}

impl MaterializedResult {
    /// Drains `source` with the default [`Config`].
    ///
    /// # Errors
    ///
    /// Any error from reading the stream.
    pub fn from_source<S: ChunkSource>(source: S) -> Result<Self> {
        Self::from_iterator(ChunkIterator::new(source)?)
    }

    /// Drains `source` under `config`.
    ///
    /// # Errors
    ///
    /// Any error from reading the stream, or [`Error::LimitExceeded`].
    pub fn with_config<S: ChunkSource>(source: S, config: Config) -> Result<Self> {
        Self::from_iterator(ChunkIterator::with_config(source, config)?)
    }

    /// Drains what is left of `iter`.
    ///
    /// # Errors
    ///
    /// Any error from reading the stream, or [`Error::LimitExceeded`] if the
    /// result grows past the configured `max_rows`.
    pub fn from_iterator<S: ChunkSource>(mut iter: ChunkIterator<S>) -> Result<Self> {
        let max_rows = iter.config().max_rows;
        let batch_capacity = iter.batch_capacity();
        let mut chunks = Vec::new();
        let mut starts = Vec::new();
        let mut row_count = 0usize;

        loop {
            let chunk = match iter.next_chunk() {
                Ok(chunk) => chunk,
                Err(Error::Exhausted) => break,
                Err(e) => return Err(e),
            };
            starts.push(row_count);
            row_count += chunk.row_count();
            if let Some(limit) = max_rows {
                if row_count > limit {
                    return Err(Error::LimitExceeded {
                        limit,
                        rows: row_count,
                    });
                }
            }
            chunks.push(chunk);
        }

        // Every chunk but the last is full and the last does not overflow.
        let uniform = chunks.split_last().is_none_or(|(last, full)| {
            last.row_count() <= batch_capacity
                && full.iter().all(|c| c.row_count() == batch_capacity)
        });
        if !uniform {
            tracing::warn!(
                "Result chunks are not all {batch_capacity} rows; row lookups will search"
            );
        }
        tracing::debug!(
            "Materialized {row_count} rows in {} chunks",
            chunks.len()
        );

        Ok(Self {
            schema: iter.schema().clone(),
            chunks,
            starts,
            row_count,
            batch_capacity,
            uniform,
        })
    }

    /// Total rows across all chunks.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Returns true for a result with no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// Number of chunks held.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// All chunks in source order.
    #[must_use]
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Chunk `index`.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] for a bad index.
    pub fn chunk(&self, index: usize) -> Result<&Chunk> {
        self.chunks
            .get(index)
            .ok_or_else(|| Error::out_of_bounds(IndexKind::Chunk, index, self.chunks.len()))
    }

    /// The columns of the result.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Rows per full chunk.
    #[must_use]
    pub fn batch_capacity(&self) -> usize {
        self.batch_capacity
    }

    /// Finds the chunk and offset holding global row `row`.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] if `row >= row_count()`.
    pub fn locate(&self, row: usize) -> Result<RowLocation> {
        if row >= self.row_count {
            return Err(Error::out_of_bounds(IndexKind::Row, row, self.row_count));
        }
        if self.uniform {
            return Ok(RowLocation {
                chunk: row / self.batch_capacity,
                offset: row % self.batch_capacity,
            });
        }
        // starts[0] == 0 and row < row_count, so at least one start is <= row.
        let chunk = self.starts.partition_point(|&s| s <= row) - 1;
        Ok(RowLocation {
            chunk,
            offset: row - self.starts[chunk],
        })
    }

    /// Decodes the cell at global `row` of `column`.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] for a bad column or row, or any decode error.
    pub fn get<T: Decodable>(&self, column: usize, row: usize) -> Result<Option<T>> {
        self.schema.column(column)?;
        let loc = self.locate(row)?;
        self.chunk(loc.chunk)?.get(column, loc.offset)
    }

    /// Decodes the cell at global `row` of the column called `name`.
    ///
    /// # Errors
    ///
    /// [`Error::ColumnNotFound`], plus everything [`get`](Self::get) reports.
    pub fn get_by_name<T: Decodable>(&self, name: &str, row: usize) -> Result<Option<T>> {
        self.get(self.schema.index_of(name)?, row)
    }

    /// Decodes the cell at global `row` using the column's own type.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`], [`Error::Unsupported`], or a layout error.
    pub fn value(&self, column: usize, row: usize) -> Result<Value> {
        self.schema.column(column)?;
        let loc = self.locate(row)?;
        self.chunk(loc.chunk)?.value(column, loc.offset)
    }

    /// Decodes a whole column across every chunk, in order.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] for a bad column, [`Error::TypeMismatch`], or
    /// any decode error.
    pub fn column<T: Decodable>(&self, column: usize) -> Result<Vec<Option<T>>> {
        self.check_column::<T>(column)?;
        let mut out = Vec::with_capacity(self.row_count);
        for chunk in &self.chunks {
            out.extend(chunk.column::<T>(column)?);
        }
        Ok(out)
    }

    /// Like [`column`](Self::column) but decodes chunks in parallel.
    ///
    /// # Errors
    ///
    /// As [`column`](Self::column).
    pub fn par_column<T: Decodable + Send>(&self, column: usize) -> Result<Vec<Option<T>>> {
        self.check_column::<T>(column)?;
        let parts: Vec<Vec<Option<T>>> = self
            .chunks
            .par_iter()
            .map(|chunk| chunk.column::<T>(column))
            .collect::<Result<_>>()?;
        let mut out = Vec::with_capacity(self.row_count);
        for part in parts {
            out.extend(part);
        }
        Ok(out)
    }

    /// Returns true if the result has rows and every one of them is NULL in
    /// `column`.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] for a bad column.
    pub fn column_is_null(&self, column: usize) -> Result<bool> {
        self.schema.column(column)?;
        if self.row_count == 0 {
            return Ok(false);
        }
        for chunk in &self.chunks {
            if !chunk.column_is_null(column)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Gives up the chunks.
    #[must_use]
    pub fn into_chunks(self) -> Vec<Chunk> {
        self.chunks
    }

    /// Type-checks `column` against `T` even when there are no chunks.
    fn check_column<T: Decodable>(&self, column: usize) -> Result<()> {
        let info = self.schema.column(column)?;
        T::check_type(&info.logical_type, &mut DecodePath::column(column))
    }
}
