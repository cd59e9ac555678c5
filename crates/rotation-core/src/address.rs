//! A1-style cell address resolution
//!
//! Converts `"G3:V"`-style ranges and `"E3"`-style cells into zero-based
//! numeric bounds. Columns are bijective base-26 (`A`=1 … `Z`=26, `AA`=27),
//! rows are 1-based in the text and zero-based in the result.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::AddressError;
use crate::types::{CellRange, CellRef};

/// Row used for an end cell without a row number ("to the end")
pub const OPEN_END_ROW: u32 = 1000;

static CELL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z]+)(\d*)$").expect("cell pattern is a valid regex"));

/// Resolve a `"<COL><ROW>:<COL><ROW>"` range.
///
/// A missing start row means row 0, a missing end row means [`OPEN_END_ROW`].
///
/// # Errors
/// `AddressError::MalformedRange` if the text is not exactly two cell
/// segments separated by `:` or either segment is not `LETTERS[DIGITS]`.
pub fn resolve_range(range: &str) -> Result<CellRange, AddressError> {
    let mut parts = range.split(':');
    let (Some(start), Some(end), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(AddressError::malformed(range));
    };

    let start = resolve_cell(start, 0).map_err(|_| AddressError::malformed(range))?;
    let end = resolve_cell(end, OPEN_END_ROW).map_err(|_| AddressError::malformed(range))?;

    Ok(CellRange {
        start_col: start.col,
        start_row: start.row,
        end_col: end.col,
        end_row: end.row,
    })
}

/// Resolve a single `"<COL><ROW>"` cell, using `default_row` when the row is
/// omitted. Letters are case-insensitive.
///
/// # Errors
/// `AddressError::MalformedRange` if the text is not `LETTERS[DIGITS]`, the
/// row is `0`, or either part overflows.
pub fn resolve_cell(cell: &str, default_row: u32) -> Result<CellRef, AddressError> {
    let upper = cell.trim().to_ascii_uppercase();
    let captures = CELL_PATTERN
        .captures(&upper)
        .ok_or_else(|| AddressError::malformed(cell))?;

    let col = column_index(&captures[1]).ok_or_else(|| AddressError::malformed(cell))?;
    let row = match &captures[2] {
        "" => default_row,
        digits => digits
            .parse::<u32>()
            .ok()
            .and_then(|row| row.checked_sub(1))
            .ok_or_else(|| AddressError::malformed(cell))?,
    };

    Ok(CellRef { col, row })
}

/// Zero-based index of a column name (`A` → 0, `AA` → 26).
///
/// Returns `None` for an empty name, non-letters, or overflow.
#[must_use]
pub fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    let mut total: u32 = 0;
    for byte in letters.bytes() {
        let byte = byte.to_ascii_uppercase();
        if !byte.is_ascii_uppercase() {
            return None;
        }
        let digit = u32::from(byte - b'A') + 1;
        total = total.checked_mul(26)?.checked_add(digit)?;
    }
    Some(total - 1)
}

/// Column name of a zero-based index (0 → `A`, 26 → `AA`)
#[must_use]
pub fn column_letters(index: u32) -> String {
    let mut n = u64::from(index) + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        // rem < 26
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}
