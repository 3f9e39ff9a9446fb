//! Byte layout of engine vectors.
//!
//! This is the only module that turns raw bytes into numbers. Every read is
//! bounds-checked against the buffer it reads from and fails with
//! [`Error::Layout`] instead of reading past the end.
//!
//! Layouts, all host-endian:
//!
//! | Record | Width | Fields |
//! | ------ | ----- | ------ |
//! | fixed primitive | 1, 2, 4, 8 or 16 | the value |
//! | hugeint / uhugeint | 16 | `lower: u64`, `upper: i64 / u64` |
//! | interval | 16 | `months: i32`, `days: i32`, `micros: i64` |
//! | short string | 16 | `len: u32`, then 12 inline bytes, or `prefix[4]` + `ptr: u64` |
//! | list entry | 16 | `offset: u64`, `length: u64` |

use std::ops::Range;

use quiver_common::types::Interval;
use quiver_common::utils::{Error, Result};

/// Bytes per short-string record.
pub const STRING_RECORD_WIDTH: usize = 16;

/// Longest string stored inline in its record.
pub const STRING_INLINE_LIMIT: usize = 12;

/// Bytes of string kept in a pointer record as a prefix.
pub const STRING_PREFIX_LEN: usize = 4;

/// Bytes per list entry.
pub const LIST_ENTRY_WIDTH: usize = 16;

/// Returns the `width`-byte record for `row`.
///
/// # Errors
///
/// [`Error::Layout`] if the record does not lie entirely inside `data`.
#[inline]
pub fn record(data: &[u8], row: usize, width: usize) -> Result<&[u8]> {
    let span = row
        .checked_mul(width)
        .and_then(|start| Some(start..start.checked_add(width)?));
    span.and_then(|r| data.get(r)).ok_or_else(|| {
        Error::layout(format!(
            "record {row} of width {width} lies outside a {} byte buffer",
            data.len()
        ))
    })
}

/// Copies the `N`-byte record for `row` into an array.
///
/// # Errors
///
/// [`Error::Layout`] as for [`record`].
#[inline]
pub fn read_array<const N: usize>(data: &[u8], row: usize) -> Result<[u8; N]> {
    let bytes = record(data, row, N)?;
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    Ok(out)
}

fn split_16(rec: [u8; 16]) -> ([u8; 8], [u8; 8]) {
    let mut lo = [0u8; 8];
    let mut hi = [0u8; 8];
    lo.copy_from_slice(&rec[..8]);
    hi.copy_from_slice(&rec[8..]);
    (lo, hi)
}

fn join_16(lo: [u8; 8], hi: [u8; 8]) -> [u8; 16] {
    let mut out = [0u8; 16];
    out[..8].copy_from_slice(&lo);
    out[8..].copy_from_slice(&hi);
    out
}

/// Reads a `hugeint` record.
///
/// # Errors
///
/// [`Error::Layout`] as for [`record`].
pub fn read_hugeint(data: &[u8], row: usize) -> Result<i128> {
    let (lo, hi) = split_16(read_array::<16>(data, row)?);
    let lower = u64::from_ne_bytes(lo);
    let upper = i64::from_ne_bytes(hi);
    Ok((i128::from(upper) << 64) | i128::from(lower))
}

/// Reads a `uhugeint` record.
///
/// # Errors
///
/// [`Error::Layout`] as for [`record`].
pub fn read_uhugeint(data: &[u8], row: usize) -> Result<u128> {
    let (lo, hi) = split_16(read_array::<16>(data, row)?);
    let lower = u64::from_ne_bytes(lo);
    let upper = u64::from_ne_bytes(hi);
    Ok((u128::from(upper) << 64) | u128::from(lower))
}

/// Encodes a `hugeint` record.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn hugeint_bytes(v: i128) -> [u8; 16] {
    // Truncation keeps exactly the low 64 bits.
    let lower = v as u64;
    let upper = (v >> 64) as i64;
    join_16(lower.to_ne_bytes(), upper.to_ne_bytes())
}

/// Encodes a `uhugeint` record.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn uhugeint_bytes(v: u128) -> [u8; 16] {
    let lower = v as u64;
    let upper = (v >> 64) as u64;
    join_16(lower.to_ne_bytes(), upper.to_ne_bytes())
}

/// Reads an `interval` record.
///
/// # Errors
///
/// [`Error::Layout`] as for [`record`].
pub fn read_interval(data: &[u8], row: usize) -> Result<Interval> {
    let rec = read_array::<16>(data, row)?;
    let mut months = [0u8; 4];
    let mut days = [0u8; 4];
    let mut micros = [0u8; 8];
    months.copy_from_slice(&rec[0..4]);
    days.copy_from_slice(&rec[4..8]);
    micros.copy_from_slice(&rec[8..16]);
    Ok(Interval::new(
        i32::from_ne_bytes(months),
        i32::from_ne_bytes(days),
        i64::from_ne_bytes(micros),
    ))
}

/// Encodes an `interval` record.
#[must_use]
pub fn interval_bytes(v: Interval) -> [u8; 16] {
    let mut out = [0u8; 16];
    out[0..4].copy_from_slice(&v.months.to_ne_bytes());
    out[4..8].copy_from_slice(&v.days.to_ne_bytes());
    out[8..16].copy_from_slice(&v.micros.to_ne_bytes());
    out
}

/// One row of a list or map vector: a window into the child vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListEntry {
    /// First child row.
    pub offset: u64,
    /// Number of child rows.
    pub length: u64,
}

impl ListEntry {
    /// Creates an entry.
    #[must_use]
    pub const fn new(offset: u64, length: u64) -> Self {
        Self { offset, length }
    }

    /// Reads the entry for `row`.
    ///
    /// # Errors
    ///
    /// [`Error::Layout`] as for [`record`].
    pub fn read(data: &[u8], row: usize) -> Result<Self> {
        let (lo, hi) = split_16(read_array::<LIST_ENTRY_WIDTH>(data, row)?);
        Ok(Self {
            offset: u64::from_ne_bytes(lo),
            length: u64::from_ne_bytes(hi),
        })
    }

    /// Encodes the entry.
    #[must_use]
    pub fn to_bytes(self) -> [u8; LIST_ENTRY_WIDTH] {
        join_16(self.offset.to_ne_bytes(), self.length.to_ne_bytes())
    }

    /// The child rows this entry covers, checked against the child's length.
    ///
    /// # Errors
    ///
    /// [`Error::Layout`] if the window overflows or ends past `child_len`.
    pub fn child_range(self, child_len: usize) -> Result<Range<usize>> {
        let start = usize::try_from(self.offset).ok();
        let len = usize::try_from(self.length).ok();
        match start.zip(len).and_then(|(s, l)| Some(s..s.checked_add(l)?)) {
            Some(range) if range.end <= child_len => Ok(range),
            _ => Err(Error::layout(format!(
                "list entry ({}, {}) exceeds child vector of {child_len} rows",
                self.offset, self.length
            ))),
        }
    }
}

fn record_len(rec: &[u8]) -> usize {
    let mut len = [0u8; 4];
    len.copy_from_slice(&rec[..4]);
    u32::from_ne_bytes(len) as usize
}

/// Returns the bytes of the short string at `row`.
///
/// Inline strings borrow from `data`. Out-of-line strings borrow from
/// `heap`: the record's pointer must address bytes inside `heap` and those
/// bytes must start with the record's prefix. Pointers that land anywhere
/// else are reported, never followed.
///
/// # Errors
///
/// [`Error::Layout`] for a short record, a pointer outside `heap`, or a
/// prefix that disagrees with the heap bytes.
pub fn string_bytes<'a>(data: &'a [u8], heap: &'a [u8], row: usize) -> Result<&'a [u8]> {
    let rec = record(data, row, STRING_RECORD_WIDTH)?;
    let len = record_len(rec);
    if len <= STRING_INLINE_LIMIT {
        return Ok(&rec[4..4 + len]);
    }

    let mut ptr = [0u8; 8];
    ptr.copy_from_slice(&rec[8..16]);
    let ptr = u64::from_ne_bytes(ptr);
    let base = heap.as_ptr() as usize as u64;

    let bytes = ptr
        .checked_sub(base)
        .and_then(|off| usize::try_from(off).ok())
        .and_then(|off| heap.get(off..off.checked_add(len)?))
        .ok_or_else(|| {
            Error::layout(format!(
                "string at row {row} ({len} bytes) points outside its vector's heap"
            ))
        })?;

    if bytes[..STRING_PREFIX_LEN] != rec[4..8] {
        return Err(Error::layout(format!(
            "string at row {row} disagrees with its inline prefix"
        )));
    }
    Ok(bytes)
}

/// Encodes a short-string record.
///
/// For strings longer than [`STRING_INLINE_LIMIT`] the pointer field holds
/// `heap_offset`, a position relative to the heap start. Call
/// [`rebase_string_record`] once the heap's final address is known.
///
/// # Errors
///
/// [`Error::Layout`] if the string is longer than `u32::MAX` bytes.
pub fn encode_string_record(bytes: &[u8], heap_offset: usize) -> Result<[u8; STRING_RECORD_WIDTH]> {
    let len = u32::try_from(bytes.len())
        .map_err(|_| Error::layout(format!("string of {} bytes is too long", bytes.len())))?;
    let mut out = [0u8; STRING_RECORD_WIDTH];
    out[..4].copy_from_slice(&len.to_ne_bytes());
    if bytes.len() <= STRING_INLINE_LIMIT {
        out[4..4 + bytes.len()].copy_from_slice(bytes);
    } else {
        out[4..8].copy_from_slice(&bytes[..STRING_PREFIX_LEN]);
        out[8..16].copy_from_slice(&(heap_offset as u64).to_ne_bytes());
    }
    Ok(out)
}

/// Turns the relative pointer of an out-of-line record into an absolute
/// one by adding `base`. Inline records are left untouched.
pub fn rebase_string_record(rec: &mut [u8], base: u64) {
    if rec.len() < STRING_RECORD_WIDTH || record_len(rec) <= STRING_INLINE_LIMIT {
        return;
    }
    let mut off = [0u8; 8];
    off.copy_from_slice(&rec[8..16]);
    let ptr = base.wrapping_add(u64::from_ne_bytes(off));
    rec[8..16].copy_from_slice(&ptr.to_ne_bytes());
}

/// Moves the pointer of an out-of-line record from a heap at `from` to an
/// identical copy of that heap at `to`. Inline records are left untouched.
///
/// A pointer outside the old heap stays outside the new one.
pub fn relocate_string_record(rec: &mut [u8], from: u64, to: u64) {
    if rec.len() < STRING_RECORD_WIDTH || record_len(rec) <= STRING_INLINE_LIMIT {
        return;
    }
    let mut ptr = [0u8; 8];
    ptr.copy_from_slice(&rec[8..16]);
    let moved = u64::from_ne_bytes(ptr).wrapping_sub(from).wrapping_add(to);
    rec[8..16].copy_from_slice(&moved.to_ne_bytes());
}
