//! Spreadsheet Addressing
//!
//! Conversions between column numbers and column letters, and parsing of
//! range address strings such as `Sheet1!A1:C10`.
//!
//! # Structure
//!
//! - [`column`]: Bijective base-26 column labels (A..Z, AA..)
//! - [`range`]: Cell references, range addresses and used-range parsing

pub mod column;
pub mod range;

use thiserror::Error;

pub use column::{column_index, column_letter, MAX_COLUMNS};
pub use range::{used_range_last_row, CellRef, RangeAddress};

/// Errors raised while reading or building spreadsheet addresses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// Column numbers start at 1; there is no column zero.
    #[error("Column numbers start at 1, got 0")]
    ZeroColumn,

    #[error("Invalid column label: '{0}'")]
    InvalidColumn(String),

    /// The address carried no digits to read a row number from.
    #[error("Range address '{0}' has no row number")]
    MissingRowNumber(String),

    #[error("Invalid row number in '{0}'")]
    InvalidRow(String),

    #[error("A range must span at least one row and one column")]
    EmptyBlock,
}
