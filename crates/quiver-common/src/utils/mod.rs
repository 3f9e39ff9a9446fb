//! Common utilities used throughout Quiver.
//!
//! - [`error`] - The [`Error`] taxonomy and the [`Result`] alias
//! - [`strings`] - Suggestions for misspelled column and field names

pub mod error;
pub mod strings;

pub use error::{Error, IndexKind, Result};
