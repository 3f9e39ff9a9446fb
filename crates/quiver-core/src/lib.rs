//! # quiver-core
//!
//! The memory model and decoder for result chunks produced by a vectorized
//! analytical engine.
//!
//! A [`Chunk`] holds one batch of rows in column form. Each column is a
//! [`Vector`] whose bytes follow the engine's layout exactly; the decoder
//! validates a requested Rust type against the vector's [`LogicalType`] and
//! then copies values out.
//!
//! ## Modules
//!
//! - [`memory`] - Validity bitmaps and bounds-checked byte layout accessors
//! - [`vector`] - Column views borrowed from a chunk
//! - [`chunk`] - The batch container and its vector arena
//! - [`builder`] - Writes engine-layout chunks from [`Value`]s
//! - [`decode`] - The [`Decodable`] capability and typed/dynamic decoding
//!
//! [`LogicalType`]: quiver_common::types::LogicalType
//! [`Value`]: quiver_common::types::Value

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod builder;
pub mod chunk;
pub mod decode;
pub mod memory;
pub mod vector;

pub use builder::{ChunkBuilder, VectorBuilder};
pub use chunk::{Chunk, STANDARD_VECTOR_SIZE};
pub use decode::{Decodable, MapEntries, TypedColumn, decode_column, decode_row};
pub use vector::{RawVector, Vector};
