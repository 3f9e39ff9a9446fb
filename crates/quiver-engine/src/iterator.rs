//! Forward-only cursor over a [`ChunkSource`].

use std::iter::FusedIterator;

use quiver_common::utils::{Error, Result};
use quiver_core::Chunk;

use crate::config::Config;
use crate::schema::Schema;
use crate::source::ChunkSource;

#[derive(Debug)]
enum State {
    /// Nothing held; the next call fetches.
    Ready,
    /// A peeked chunk waiting to be handed out.
    HasChunk(Chunk),
    /// End of stream or a failed fetch. Terminal.
    Exhausted,
}

/// Pulls chunks from a source one at a time.
///
/// Each call to [`next_chunk`](Self::next_chunk) transfers ownership of one
/// chunk to the caller. Once the source signals end of stream (no chunk, or
/// a chunk with zero rows) every further call fails with
/// [`Error::Exhausted`]. A source error also ends the stream.
///
/// # Examples
///
/// ```
/// use quiver_common::types::{LogicalType, Value};
/// use quiver_engine::{ChunkIterator, MemorySource};
///
/// let rows: Vec<Vec<Value>> = (0..5i32).map(|i| vec![Value::from(i)]).collect();
/// let source = MemorySource::from_rows(vec![("n", LogicalType::INTEGER)], &rows, 2).unwrap();
///
/// let mut iter = ChunkIterator::new(source).unwrap();
/// let mut seen = 0;
/// while let Ok(chunk) = iter.next_chunk() {
///     seen += chunk.row_count();
/// }
/// assert_eq!(seen, 5);
/// assert!(iter.is_exhausted());
/// ```
#[derive(Debug)]
pub struct ChunkIterator<S> {
    source: S,
    schema: Schema,
    config: Config,
    batch_capacity: usize,
    state: State,
    chunks_fetched: usize,
    rows_fetched: usize,
}

impl<S: ChunkSource> ChunkIterator<S> {
    /// Starts reading `source` with the default [`Config`].
    ///
    /// # Errors
    ///
    /// As [`with_config`](Self::with_config).
    pub fn new(source: S) -> Result<Self> {
        Self::with_config(source, Config::default())
    }

    /// Starts reading `source`.
    ///
    /// The schema is captured here and does not change afterwards.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for an invalid config or a zero batch
    /// capacity, or whatever the source reports for its column metadata.
    pub fn with_config(source: S, config: Config) -> Result<Self> {
        config.validate()?;
        let batch_capacity = config
            .batch_capacity
            .unwrap_or_else(|| source.max_batch_capacity());
        if batch_capacity == 0 {
            return Err(Error::InvalidArgument(
                "source reports a batch capacity of zero".into(),
            ));
        }
        let schema = Schema::from_source(&source)?;
        Ok(Self {
            source,
            schema,
            config,
            batch_capacity,
            state: State::Ready,
            chunks_fetched: 0,
            rows_fetched: 0,
        })
    }

    /// Takes the next chunk.
    ///
    /// # Errors
    ///
    /// [`Error::Exhausted`] at end of stream, a source error, or
    /// [`Error::Layout`] for a chunk that does not match the schema.
    pub fn next_chunk(&mut self) -> Result<Chunk> {
        match std::mem::replace(&mut self.state, State::Ready) {
            State::HasChunk(chunk) => Ok(chunk),
            State::Exhausted => {
                self.state = State::Exhausted;
                Err(Error::Exhausted)
            }
            State::Ready => self.fetch()?.ok_or(Error::Exhausted),
        }
    }

    /// Looks at the next chunk without taking it.
    ///
    /// # Errors
    ///
    /// As [`next_chunk`](Self::next_chunk).
    pub fn peek(&mut self) -> Result<&Chunk> {
        if matches!(self.state, State::Ready) {
            if let Some(chunk) = self.fetch()? {
                self.state = State::HasChunk(chunk);
            }
        }
        match &self.state {
            State::HasChunk(chunk) => Ok(chunk),
            _ => Err(Error::Exhausted),
        }
    }

    /// Returns true once the stream has ended.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        matches!(self.state, State::Exhausted)
    }

    /// The columns of the result.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The configuration in effect.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Rows per full chunk.
    #[must_use]
    pub fn batch_capacity(&self) -> usize {
        self.batch_capacity
    }

    /// Chunks pulled from the source so far, including a peeked one.
    #[must_use]
    pub fn chunks_fetched(&self) -> usize {
        self.chunks_fetched
    }

    /// Rows pulled from the source so far, including a peeked chunk.
    #[must_use]
    pub fn rows_fetched(&self) -> usize {
        self.rows_fetched
    }

    /// Pulls from the source. `Ok(None)` means the stream just ended.
    fn fetch(&mut self) -> Result<Option<Chunk>> {
        let fetched = match self.source.fetch_next_chunk() {
            Ok(fetched) => fetched,
            Err(e) => {
                tracing::warn!("Chunk source failed after {} chunks: {e}", self.chunks_fetched);
                self.state = State::Exhausted;
                return Err(e);
            }
        };

        let chunk = match fetched {
            Some(chunk) if chunk.row_count() > 0 => chunk,
            _ => {
                tracing::debug!(
                    "End of stream after {} chunks, {} rows",
                    self.chunks_fetched,
                    self.rows_fetched
                );
                self.state = State::Exhausted;
                return Ok(None);
            }
        };

        if self.config.validate_chunks {
            if let Err(e) = self.check_chunk(&chunk) {
                tracing::warn!("Rejected chunk {}: {e}", self.chunks_fetched);
                self.state = State::Exhausted;
                return Err(e);
            }
        }

        self.chunks_fetched += 1;
        self.rows_fetched += chunk.row_count();
        tracing::debug!(
            "Fetched chunk {} with {} rows",
            self.chunks_fetched - 1,
            chunk.row_count()
        );
        Ok(Some(chunk))
    }

    fn check_chunk(&self, chunk: &Chunk) -> Result<()> {
        if chunk.column_count() != self.schema.len() {
            return Err(Error::layout(format!(
                "chunk has {} columns, result declares {}",
                chunk.column_count(),
                self.schema.len()
            )));
        }
        for (i, (actual, declared)) in chunk.column_types().zip(self.schema.types()).enumerate() {
            if actual != declared {
                return Err(Error::layout(format!(
                    "chunk column {i} is {actual}, result declares {declared}"
                )));
            }
        }
        if chunk.row_count() > self.batch_capacity {
            return Err(Error::layout(format!(
                "chunk has {} rows, batch capacity is {}",
                chunk.row_count(),
                self.batch_capacity
            )));
        }
        Ok(())
    }
}

impl<S: ChunkSource> Iterator for ChunkIterator<S> {
    type Item = Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_chunk() {
            Ok(chunk) => Some(Ok(chunk)),
            Err(Error::Exhausted) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

impl<S: ChunkSource> FusedIterator for ChunkIterator<S> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use quiver_common::types::{LogicalType, Value};

    fn source(rows: i32, capacity: usize) -> MemorySource {
        let rows: Vec<Vec<Value>> = (0..rows).map(|i| vec![Value::from(i)]).collect();
        MemorySource::from_rows(vec![("n", LogicalType::INTEGER)], &rows, capacity).unwrap()
    }

    #[test]
    fn test_states_through_stream() {
        let mut iter = ChunkIterator::new(source(3, 2)).unwrap();
        assert_eq!(iter.batch_capacity(), 2);
        assert_eq!(iter.next_chunk().unwrap().row_count(), 2);
        assert_eq!(iter.peek().unwrap().row_count(), 1);
        assert_eq!(iter.chunks_fetched(), 2);
        assert_eq!(iter.next_chunk().unwrap().row_count(), 1);
        assert!(!iter.is_exhausted());
        assert_eq!(iter.next_chunk().unwrap_err(), Error::Exhausted);
        assert!(iter.is_exhausted());
        assert_eq!(iter.next_chunk().unwrap_err(), Error::Exhausted);
        assert_eq!(iter.peek().unwrap_err(), Error::Exhausted);
        assert_eq!(iter.rows_fetched(), 3);
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut iter = ChunkIterator::new(source(1, 4)).unwrap();
        assert_eq!(iter.peek().unwrap().get::<i32>(0, 0).unwrap(), Some(0));
        assert_eq!(iter.peek().unwrap().row_count(), 1);
        assert_eq!(iter.chunks_fetched(), 1);
        assert_eq!(iter.next_chunk().unwrap().row_count(), 1);
    }

    #[test]
    fn test_iterator_impl_ends_cleanly() {
        let sizes: Vec<usize> = ChunkIterator::new(source(5, 2))
            .unwrap()
            .map(|c| c.unwrap().row_count())
            .collect();
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[test]
    fn test_config_capacity_override_and_validation() {
        let iter =
            ChunkIterator::with_config(source(1, 2), Config::default().with_batch_capacity(8))
                .unwrap();
        assert_eq!(iter.batch_capacity(), 8);

        let err = ChunkIterator::with_config(source(1, 2), Config::default().with_batch_capacity(0))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}
