//! Hash collection aliases for Quiver.
//!
//! Name lookups (result columns, struct fields) go through these aliases so
//! the hasher is chosen in one place.
//!
//! ```rust
//! use quiver_common::collections::{QuiverMap, quiver_map};
//!
//! let mut by_name: QuiverMap<&str, usize> = quiver_map();
//! by_name.insert("price", 3);
//! assert_eq!(by_name.get("price"), Some(&3));
//! ```

use rustc_hash::FxBuildHasher;

/// HashMap keyed with FxHash (fast, non-cryptographic).
///
/// Column and field names are short, trusted strings produced by the engine,
/// which is the case FxHash is tuned for.
pub type QuiverMap<K, V> = hashbrown::HashMap<K, V, FxBuildHasher>;

/// Create a new empty [`QuiverMap`].
#[inline]
#[must_use]
pub fn quiver_map<K, V>() -> QuiverMap<K, V> {
    QuiverMap::with_hasher(FxBuildHasher)
}

/// Create a new [`QuiverMap`] with room for `capacity` entries.
#[inline]
#[must_use]
pub fn quiver_map_with_capacity<K, V>(capacity: usize) -> QuiverMap<K, V> {
    QuiverMap::with_capacity_and_hasher(capacity, FxBuildHasher)
}
