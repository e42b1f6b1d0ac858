//! Range-Write Composition
//!
//! Turns filtered rows into one rectangular block and the address it is
//! written to. Rows are always padded or truncated to the header width so
//! the block stays rectangular.

use serde_json::Value;

use crate::action::model::{CellValue, Row};
use crate::action::validator::ValidationError;
use crate::address::RangeAddress;
use crate::error::{ActionError, Result};

/// Per-cell echo fields dropped from write responses.
pub const ECHO_FIELDS: &[&str] = &[
    "numberFormat",
    "formulas",
    "formulasLocal",
    "formulasR1C1",
    "valueTypes",
    "values",
    "text",
];

/// A block of values and the range it is written to.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteBlock {
    pub range: RangeAddress,
    pub values: Vec<Vec<CellValue>>,
}

/// Lays every row out over exactly `column_count` cells.
///
/// Fails when there is nothing to write or the worksheet has no columns.
pub fn rectangular_values(rows: &[Row], column_count: usize) -> Result<Vec<Vec<CellValue>>> {
    if rows.is_empty() {
        return Err(ValidationError::NoRows.into());
    }

    if column_count == 0 {
        return Err(ActionError::configuration(
            "The worksheet has no header row to take the column count from.",
        ));
    }

    Ok(rows.iter().map(|row| row.to_cells(column_count)).collect())
}

/// Places a rectangular block directly below the used range.
pub fn compose_append(last_used_row: u32, values: Vec<Vec<CellValue>>) -> Result<WriteBlock> {
    let row_count = to_u32(values.len())?;
    let column_count = to_u32(values.first().map_or(0, Vec::len))?;

    let range = RangeAddress::append_block(last_used_row, column_count, row_count)?;

    Ok(WriteBlock { range, values })
}

/// Places a single row directly below the used range, as wide as its
/// highest populated column.
pub fn compose_single_row(last_used_row: u32, row: &Row) -> Result<WriteBlock> {
    if row.is_empty() {
        return Err(ValidationError::EmptyRow.into());
    }
    row.check_width()?;

    compose_append(last_used_row, vec![row.to_dense()])
}

/// Removes the per-cell echo fields from a write response.
pub fn reduce_write_response(response: Value) -> Value {
    match response {
        Value::Object(mut map) => {
            for field in ECHO_FIELDS {
                map.remove(*field);
            }
            Value::Object(map)
        }
        other => other,
    }
}

fn to_u32(n: usize) -> Result<u32> {
    u32::try_from(n)
        .map_err(|_| ActionError::configuration(format!("Too many rows or columns: {}", n)))
}
