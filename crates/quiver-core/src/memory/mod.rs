//! Low-level buffer access.
//!
//! - [`layout`] - Every byte reinterpretation of engine buffers happens here
//! - [`validity`] - Per-row null tracking

pub mod layout;
pub mod validity;

pub use layout::{ListEntry, STRING_INLINE_LIMIT, STRING_RECORD_WIDTH};
pub use validity::{Validity, ValidityMask};
