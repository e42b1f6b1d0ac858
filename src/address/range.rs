//! Cell References and Range Addresses
//!
//! Parses the address grammar used by spreadsheet services:
//!
//! ```text
//! Sheet1!A1:C10    rectangular range with sheet prefix
//! Sheet1!B5        single cell
//! A4:B5            range without sheet prefix
//! ```

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use super::column::{column_index, column_letter};
use super::AddressError;

static ROW_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

static CELL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\$?([A-Za-z]+)\$?([0-9]+)$").unwrap());

/// A single cell position. Both coordinates are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRef {
    pub column: u32,
    pub row: u32,
}

impl CellRef {
    pub fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letters = column_letter(self.column).map_err(|_| fmt::Error)?;
        write!(f, "{}{}", letters, self.row)
    }
}

impl FromStr for CellRef {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = CELL_PATTERN
            .captures(s.trim())
            .ok_or_else(|| AddressError::InvalidRow(s.to_string()))?;

        let column = column_index(&caps[1])?;
        let row: u32 = caps[2]
            .parse()
            .map_err(|_| AddressError::InvalidRow(s.to_string()))?;

        if row == 0 {
            return Err(AddressError::InvalidRow(s.to_string()));
        }

        Ok(Self { column, row })
    }
}

/// A rectangular region between two corner cells (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RangeAddress {
    pub start: CellRef,
    pub end: CellRef,
}

impl RangeAddress {
    pub fn new(start: CellRef, end: CellRef) -> Self {
        Self { start, end }
    }

    /// Parses an address, discarding any `Sheet!` prefix.
    ///
    /// A single-cell address yields a range whose corners coincide.
    pub fn parse(address: &str) -> Result<Self, AddressError> {
        let local = strip_sheet(address);

        match local.split_once(':') {
            Some((from, to)) => Ok(Self {
                start: from.parse()?,
                end: to.parse()?,
            }),
            None => {
                let cell: CellRef = local.parse()?;
                Ok(Self {
                    start: cell,
                    end: cell,
                })
            }
        }
    }

    /// Computes the block below the used range that a batch of rows lands in.
    ///
    /// The block starts at column `A`, row `last_used_row + 1`, and spans
    /// `column_count` columns and `row_count` rows.
    pub fn append_block(
        last_used_row: u32,
        column_count: u32,
        row_count: u32,
    ) -> Result<Self, AddressError> {
        if column_count == 0 || row_count == 0 {
            return Err(AddressError::EmptyBlock);
        }

        let first_row = last_used_row
            .checked_add(1)
            .ok_or_else(|| AddressError::InvalidRow(last_used_row.to_string()))?;
        let last_row = last_used_row
            .checked_add(row_count)
            .ok_or_else(|| AddressError::InvalidRow(last_used_row.to_string()))?;

        Ok(Self {
            start: CellRef::new(1, first_row),
            end: CellRef::new(column_count, last_row),
        })
    }

    /// Number of rows covered by the range.
    pub fn row_count(&self) -> u32 {
        self.end.row.abs_diff(self.start.row) + 1
    }

    /// Number of columns covered by the range.
    pub fn column_count(&self) -> u32 {
        self.end.column.abs_diff(self.start.column) + 1
    }

    /// Formats the range with a sheet prefix, e.g. `Sheet1!A4:B5`.
    pub fn qualified(&self, sheet: &str) -> String {
        format!("{}!{}", sheet, self)
    }
}

impl fmt::Display for RangeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

/// Extracts the last row number from a used-range address.
///
/// The sheet prefix is dropped, the second endpoint is taken when the
/// address is a range, and the first run of digits in that endpoint is
/// read as the row number.
///
/// # Example
///
/// ```
/// use sheetflow::address::used_range_last_row;
///
/// assert_eq!(used_range_last_row("Sheet1!A1:C10").unwrap(), 10);
/// assert_eq!(used_range_last_row("Sheet1!B5").unwrap(), 5);
/// assert!(used_range_last_row("Sheet1!A:C").is_err());
/// ```
pub fn used_range_last_row(address: &str) -> Result<u32, AddressError> {
    let local = strip_sheet(address);
    let last_cell = match local.split_once(':') {
        Some((_, to)) => to,
        None => local,
    };

    let digits = ROW_DIGITS
        .find(last_cell)
        .ok_or_else(|| AddressError::MissingRowNumber(address.to_string()))?;

    digits
        .as_str()
        .parse()
        .map_err(|_| AddressError::InvalidRow(address.to_string()))
}

/// Drops a `Sheet!` prefix. Sheet names may themselves contain `!`
/// when quoted, so the last separator wins.
fn strip_sheet(address: &str) -> &str {
    match address.rsplit_once('!') {
        Some((_, local)) => local,
        None => address,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_row_of_range() {
        assert_eq!(used_range_last_row("Sheet1!A1:C10").unwrap(), 10);
    }

    #[test]
    fn test_last_row_of_single_cell() {
        assert_eq!(used_range_last_row("Sheet1!B5").unwrap(), 5);
    }

    #[test]
    fn test_last_row_without_sheet_prefix() {
        assert_eq!(used_range_last_row("A1:AB250").unwrap(), 250);
    }

    #[test]
    fn test_last_row_quoted_sheet_name() {
        assert_eq!(used_range_last_row("'Q1!Sales'!A1:D42").unwrap(), 42);
    }

    #[test]
    fn test_last_row_missing_digits() {
        let err = used_range_last_row("Sheet1!A:C").unwrap_err();
        assert_eq!(err, AddressError::MissingRowNumber("Sheet1!A:C".to_string()));
        assert!(used_range_last_row("").is_err());
    }

    #[test]
    fn test_last_row_overflow() {
        let result = used_range_last_row("Sheet1!A1:A99999999999");
        assert!(matches!(result, Err(AddressError::InvalidRow(_))));
    }

    #[test]
    fn test_cell_ref_parse_and_display() {
        let cell: CellRef = "AB12".parse().unwrap();
        assert_eq!(cell, CellRef::new(28, 12));
        assert_eq!(cell.to_string(), "AB12");

        let absolute: CellRef = "$C$3".parse().unwrap();
        assert_eq!(absolute, CellRef::new(3, 3));
    }

    #[test]
    fn test_cell_ref_rejects_row_zero() {
        assert!("A0".parse::<CellRef>().is_err());
        assert!("12".parse::<CellRef>().is_err());
    }

    #[test]
    fn test_range_parse() {
        let range = RangeAddress::parse("Sheet1!A1:C10").unwrap();
        assert_eq!(range.start, CellRef::new(1, 1));
        assert_eq!(range.end, CellRef::new(3, 10));
        assert_eq!(range.row_count(), 10);
        assert_eq!(range.column_count(), 3);

        let single = RangeAddress::parse("Sheet1!B5").unwrap();
        assert_eq!(single.start, single.end);
        assert_eq!(single.row_count(), 1);
    }

    #[test]
    fn test_append_block() {
        let range = RangeAddress::append_block(3, 2, 2).unwrap();
        assert_eq!(range.to_string(), "A4:B5");
        assert_eq!(range.qualified("Sheet1"), "Sheet1!A4:B5");
    }

    #[test]
    fn test_append_block_wide() {
        let range = RangeAddress::append_block(1, 28, 1).unwrap();
        assert_eq!(range.to_string(), "A2:AB2");
    }

    #[test]
    fn test_append_block_empty() {
        assert_eq!(
            RangeAddress::append_block(3, 0, 2),
            Err(AddressError::EmptyBlock)
        );
        assert_eq!(
            RangeAddress::append_block(3, 2, 0),
            Err(AddressError::EmptyBlock)
        );
    }
}
