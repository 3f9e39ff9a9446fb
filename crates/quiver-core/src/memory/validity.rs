//! Per-row null tracking.
//!
//! One bit per row in 64-bit words, least significant bit first: row `r` is
//! bit `r % 64` of word `r / 64`, and a set bit means the row is valid. An
//! absent bitmap means every row is valid, which is how the engine avoids
//! allocating one for columns without nulls.

/// Read-only view of a vector's validity.
#[derive(Debug, Clone, Copy)]
pub struct ValidityMask<'a> {
    words: Option<&'a [u64]>,
    len: usize,
}

impl<'a> ValidityMask<'a> {
    /// Creates a view over `len` rows.
    #[must_use]
    pub const fn new(words: Option<&'a [u64]>, len: usize) -> Self {
        Self { words, len }
    }

    /// A view in which all `len` rows are valid.
    #[must_use]
    pub const fn all_valid(len: usize) -> Self {
        Self { words: None, len }
    }

    /// Number of rows covered.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no rows are covered.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns true if a bitmap is present.
    #[must_use]
    pub const fn has_bitmap(&self) -> bool {
        self.words.is_some()
    }

    /// The raw words, if a bitmap is present.
    #[must_use]
    pub const fn words(&self) -> Option<&'a [u64]> {
        self.words
    }

    /// Returns true if `row` holds a value.
    #[inline]
    #[must_use]
    pub fn is_valid(&self, row: usize) -> bool {
        match self.words {
            None => true,
            Some(words) => words
                .get(row / 64)
                .is_some_and(|w| (w >> (row % 64)) & 1 == 1),
        }
    }

    /// Returns true if `row` is NULL.
    #[inline]
    #[must_use]
    pub fn is_null(&self, row: usize) -> bool {
        !self.is_valid(row)
    }

    /// Number of valid rows in `0..len`.
    #[must_use]
    pub fn valid_count(&self) -> usize {
        let Some(words) = self.words else {
            return self.len;
        };
        let full = self.len / 64;
        let tail = self.len % 64;
        let mut count: usize = words
            .iter()
            .take(full)
            .map(|w| w.count_ones() as usize)
            .sum();
        if tail > 0 {
            let mask = (1u64 << tail) - 1;
            count += words.get(full).map_or(0, |w| (w & mask).count_ones() as usize);
        }
        count
    }

    /// Number of NULL rows in `0..len`.
    #[must_use]
    pub fn null_count(&self) -> usize {
        self.len - self.valid_count()
    }

    /// Returns true if the vector has rows, carries a bitmap, and every row
    /// is NULL. An absent bitmap or zero rows never count as all-null.
    #[must_use]
    pub fn is_all_null(&self) -> bool {
        self.len > 0 && self.has_bitmap() && self.valid_count() == 0
    }

    /// Iterates the validity of rows `0..len`.
    pub fn iter(&self) -> impl Iterator<Item = bool> + 'a {
        let mask = *self;
        (0..self.len).map(move |row| mask.is_valid(row))
    }
}

/// Owned, growable validity used while building vectors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validity {
    words: Option<Vec<u64>>,
    len: usize,
}

const fn words_for(len: usize) -> usize {
    len.div_ceil(64)
}

impl Validity {
    /// Creates empty validity with no bitmap.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            words: None,
            len: 0,
        }
    }

    /// `len` valid rows, no bitmap.
    #[must_use]
    pub const fn all_valid(len: usize) -> Self {
        Self { words: None, len }
    }

    /// Wraps existing words.
    #[must_use]
    pub fn from_words(words: Vec<u64>, len: usize) -> Self {
        Self {
            words: Some(words),
            len,
        }
    }

    /// Number of rows covered.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no rows are covered.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Allocates an all-valid bitmap if none exists yet.
    ///
    /// After this call `set_invalid` and `set_valid` always have a bitmap to
    /// write to.
    pub fn ensure_writable(&mut self) -> &mut Vec<u64> {
        let needed = words_for(self.len);
        let words = self.words.get_or_insert_with(|| vec![u64::MAX; needed]);
        if words.len() < needed {
            words.resize(needed, u64::MAX);
        }
        words
    }

    /// Marks `row` as NULL. Rows past the current length extend it.
    pub fn set_invalid(&mut self, row: usize) {
        self.grow_to(row + 1);
        let words = self.ensure_writable();
        words[row / 64] &= !(1u64 << (row % 64));
    }

    /// Marks `row` as valid. Without a bitmap this only extends the length.
    pub fn set_valid(&mut self, row: usize) {
        self.grow_to(row + 1);
        if let Some(words) = self.words.as_mut() {
            words[row / 64] |= 1u64 << (row % 64);
        }
    }

    /// Appends one row.
    pub fn push(&mut self, valid: bool) {
        let row = self.len;
        if valid {
            self.set_valid(row);
        } else {
            self.set_invalid(row);
        }
    }

    fn grow_to(&mut self, len: usize) {
        if len <= self.len {
            return;
        }
        self.len = len;
        if let Some(words) = self.words.as_mut() {
            let needed = words_for(len);
            if words.len() < needed {
                words.resize(needed, u64::MAX);
            }
        }
    }

    /// Borrows as a read-only mask.
    #[must_use]
    pub fn as_mask(&self) -> ValidityMask<'_> {
        ValidityMask::new(self.words.as_deref(), self.len)
    }

    /// Consumes into the frozen word buffer, if any.
    #[must_use]
    pub fn into_words(self) -> Option<Box<[u64]>> {
        self.words.map(Vec::into_boxed_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_bitmap_is_all_valid() {
        let mask = ValidityMask::all_valid(100);
        assert!(mask.is_valid(0));
        assert!(mask.is_valid(99));
        assert_eq!(mask.null_count(), 0);
        assert!(!mask.is_all_null());
    }

    #[test]
    fn test_bit_positions_lsb_first() {
        // row 0 valid, row 1 null, row 65 null
        let words = [!0b10u64, !(1u64 << 1)];
        let mask = ValidityMask::new(Some(&words), 70);
        assert!(mask.is_valid(0));
        assert!(mask.is_null(1));
        assert!(mask.is_valid(64));
        assert!(mask.is_null(65));
        assert_eq!(mask.null_count(), 2);
        assert_eq!(mask.iter().filter(|v| !v).count(), 2);
    }

    #[test]
    fn test_all_null_needs_rows_and_bitmap() {
        let zeros = [0u64];
        assert!(ValidityMask::new(Some(&zeros), 3).is_all_null());
        assert!(!ValidityMask::new(Some(&zeros), 0).is_all_null());
        assert!(!ValidityMask::all_valid(3).is_all_null());

        // trailing bits beyond len are ignored
        let partial = [0b1000u64];
        assert!(ValidityMask::new(Some(&partial), 3).is_all_null());
    }

    #[test]
    fn test_owned_validity_lazy_bitmap() {
        let mut v = Validity::new();
        v.push(true);
        v.push(true);
        assert!(!v.as_mask().has_bitmap());

        v.push(false);
        let mask = v.as_mask();
        assert!(mask.has_bitmap());
        assert!(mask.is_valid(0));
        assert!(mask.is_valid(1));
        assert!(mask.is_null(2));

        for _ in 0..70 {
            v.push(true);
        }
        assert_eq!(v.len(), 73);
        assert_eq!(v.as_mask().null_count(), 1);
        assert_eq!(v.clone().into_words().map(|w| w.len()), Some(2));

        v.set_valid(2);
        assert_eq!(v.as_mask().null_count(), 0);
    }

    #[test]
    fn test_ensure_writable_then_set() {
        let mut v = Validity::all_valid(10);
        v.ensure_writable();
        v.set_invalid(9);
        assert!(v.as_mask().is_null(9));
        assert_eq!(v.as_mask().valid_count(), 9);
    }
}
