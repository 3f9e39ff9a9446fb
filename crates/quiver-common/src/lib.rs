//! Shared building blocks for Quiver.
//!
//! Everything that more than one Quiver crate needs lives here:
//!
//! - [`types`] - [`LogicalType`](types::LogicalType) descriptors, the engine's
//!   numeric [`TypeId`](types::TypeId) codes, temporal natives, and the
//!   dynamic [`Value`](types::Value)
//! - [`utils`] - the [`Error`](utils::Error) taxonomy and string helpers for
//!   "did you mean" hints
//! - [`collections`] - hash map aliases used for name lookups

pub mod collections;
pub mod types;
pub mod utils;

pub use types::{LogicalType, TypeId, Value};
pub use utils::{Error, Result};
