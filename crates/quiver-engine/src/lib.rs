//! # quiver-engine
//!
//! Result-level access built on [`quiver_core`]: pull chunks from a
//! [`ChunkSource`] one at a time with a [`ChunkIterator`], or drain them all
//! into a [`MaterializedResult`] for random access by global row index.
//!
//! ```
//! use quiver_common::types::{LogicalType, Value};
//! use quiver_engine::{MaterializedResult, MemorySource};
//!
//! let rows: Vec<Vec<Value>> = (0..5000i64).map(|i| vec![Value::from(i)]).collect();
//! let source = MemorySource::from_rows(vec![("n", LogicalType::BIGINT)], &rows, 2048).unwrap();
//!
//! let result = MaterializedResult::from_source(source).unwrap();
//! assert_eq!(result.row_count(), 5000);
//! assert_eq!(result.chunk_count(), 3);
//! assert_eq!(result.get::<i64>(0, 4999).unwrap(), Some(4999));
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod iterator;
pub mod materialized;
pub mod schema;
pub mod source;

pub use config::{Config, ConfigError};
pub use iterator::ChunkIterator;
pub use materialized::{MaterializedResult, RowLocation};
pub use schema::{ColumnInfo, Schema};
pub use source::{ChunkSource, MemorySource};
