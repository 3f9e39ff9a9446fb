//! The type system shared between the engine boundary and the decoder.
//!
//! | Type | What it describes |
//! | ---- | ----------------- |
//! | [`TypeId`] | The engine's numeric type code |
//! | [`LogicalType`] | A full, possibly nested column type |
//! | [`Date`], [`Time`], [`Timestamp`], [`Interval`] | Temporal values in storage units |
//! | [`Value`] | A dynamically typed decoded cell |

mod logical_type;
mod temporal;
mod type_id;
mod value;

pub use logical_type::{LogicalType, StructField};
pub use temporal::{Date, Interval, Time, Timestamp};
pub use type_id::TypeId;
pub use value::Value;
