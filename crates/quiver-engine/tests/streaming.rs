//! Iterator behaviour against sources that misbehave.

use arcstr::ArcStr;
use quiver_common::types::{LogicalType, Value};
use quiver_common::utils::{Error, IndexKind, Result};
use quiver_core::{Chunk, ChunkBuilder};
use quiver_engine::{ChunkIterator, ChunkSource, Config, MemorySource};

/// Replays a script of fetch results, then reports end of stream.
struct ScriptedSource {
    types: Vec<LogicalType>,
    script: Vec<Result<Option<Chunk>>>,
    capacity: usize,
}

impl ScriptedSource {
    fn new(types: Vec<LogicalType>, mut script: Vec<Result<Option<Chunk>>>) -> Self {
        script.reverse();
        Self {
            types,
            script,
            capacity: 4,
        }
    }
}

impl ChunkSource for ScriptedSource {
    fn fetch_next_chunk(&mut self) -> Result<Option<Chunk>> {
        self.script.pop().unwrap_or(Ok(None))
    }

    fn column_count(&self) -> usize {
        self.types.len()
    }

    fn column_logical_type(&self, column: usize) -> Result<LogicalType> {
        self.types
            .get(column)
            .cloned()
            .ok_or(Error::out_of_bounds(IndexKind::Column, column, self.types.len()))
    }

    fn column_name(&self, column: usize) -> Result<ArcStr> {
        self.column_logical_type(column)
            .map(|_| arcstr::format!("c{column}"))
    }

    fn max_batch_capacity(&self) -> usize {
        self.capacity
    }
}

fn int_chunk(values: &[i32]) -> Chunk {
    let mut builder = ChunkBuilder::with_capacity(&[LogicalType::INTEGER], 4);
    for &v in values {
        builder.append_row(&[Value::from(v)]).unwrap();
    }
    builder.finish().unwrap()
}

#[test]
fn zero_row_chunk_ends_the_stream() {
    let source = ScriptedSource::new(
        vec![LogicalType::INTEGER],
        vec![
            Ok(Some(int_chunk(&[1, 2]))),
            Ok(Some(int_chunk(&[]))),
            Ok(Some(int_chunk(&[3]))),
        ],
    );
    let mut iter = ChunkIterator::new(source).unwrap();
    assert_eq!(iter.next_chunk().unwrap().row_count(), 2);
    assert_eq!(iter.next_chunk().unwrap_err(), Error::Exhausted);
    // The chunk after the empty one is never fetched.
    assert_eq!(iter.next_chunk().unwrap_err(), Error::Exhausted);
    assert_eq!(iter.rows_fetched(), 2);
}

#[test]
fn source_error_is_returned_then_stream_is_over() {
    let source = ScriptedSource::new(
        vec![LogicalType::INTEGER],
        vec![
            Ok(Some(int_chunk(&[1]))),
            Err(Error::Source("connection reset".into())),
            Ok(Some(int_chunk(&[2]))),
        ],
    );
    let mut iter = ChunkIterator::new(source).unwrap();
    assert!(iter.next_chunk().is_ok());
    assert_eq!(
        iter.next_chunk().unwrap_err(),
        Error::Source("connection reset".into())
    );
    assert!(iter.is_exhausted());
    assert_eq!(iter.next_chunk().unwrap_err(), Error::Exhausted);
}

#[test]
fn iterator_yields_error_once_then_ends() {
    let source = ScriptedSource::new(
        vec![LogicalType::INTEGER],
        vec![Err(Error::Source("boom".into()))],
    );
    let items: Vec<Result<Chunk>> = ChunkIterator::new(source).unwrap().collect();
    assert_eq!(items.len(), 1);
    assert!(matches!(items[0], Err(Error::Source(_))));
}

#[test]
fn chunk_with_wrong_types_is_rejected() {
    let mut builder = ChunkBuilder::with_capacity(&[LogicalType::VARCHAR], 4);
    builder.append_row(&[Value::from("x")]).unwrap();
    let source = ScriptedSource::new(
        vec![LogicalType::INTEGER],
        vec![Ok(Some(builder.finish().unwrap()))],
    );
    let mut iter = ChunkIterator::new(source).unwrap();
    assert!(matches!(iter.next_chunk(), Err(Error::Layout(_))));
    assert!(iter.is_exhausted());
}

#[test]
fn chunk_with_wrong_column_count_is_rejected() {
    let source = ScriptedSource::new(
        vec![LogicalType::INTEGER, LogicalType::INTEGER],
        vec![Ok(Some(int_chunk(&[1])))],
    );
    let mut iter = ChunkIterator::new(source).unwrap();
    assert!(matches!(iter.peek(), Err(Error::Layout(_))));
}

#[test]
fn oversized_chunk_is_rejected_unless_validation_is_off() {
    let big = || int_chunk(&[1, 2, 3, 4]);
    let config = Config::default().with_batch_capacity(2);

    let source = ScriptedSource::new(vec![LogicalType::INTEGER], vec![Ok(Some(big()))]);
    let mut iter = ChunkIterator::with_config(source, config.clone()).unwrap();
    assert!(matches!(iter.next_chunk(), Err(Error::Layout(_))));

    let source = ScriptedSource::new(vec![LogicalType::INTEGER], vec![Ok(Some(big()))]);
    let mut iter = ChunkIterator::with_config(source, config.with_validation(false)).unwrap();
    assert_eq!(iter.next_chunk().unwrap().row_count(), 4);
}

#[test]
fn borrowed_source_can_be_resumed_by_owner() {
    let rows: Vec<Vec<Value>> = (0..6i32).map(|i| vec![Value::from(i)]).collect();
    let mut source =
        MemorySource::from_rows(vec![("n", LogicalType::INTEGER)], &rows, 2).unwrap();
    {
        let mut iter = ChunkIterator::new(&mut source).unwrap();
        assert_eq!(iter.next_chunk().unwrap().get::<i32>(0, 0).unwrap(), Some(0));
    }
    assert_eq!(source.remaining_chunks(), 2);
}

#[test]
fn schema_is_captured_from_source() {
    let source = ScriptedSource::new(vec![LogicalType::INTEGER, LogicalType::VARCHAR], vec![]);
    let iter = ChunkIterator::new(source).unwrap();
    assert_eq!(iter.schema().len(), 2);
    assert_eq!(iter.schema().index_of("c1").unwrap(), 1);
    assert_eq!(iter.batch_capacity(), 4);
}
