//! Worksheet Grid
//!
//! Plain row-major cell storage shared by the local service backends,
//! answering used-range, header and write requests the way a remote
//! workbook API does.

use serde_json::{json, Value};

use super::ServiceError;
use crate::action::model::CellValue;
use crate::address::{CellRef, RangeAddress};

/// Row-major cells of one worksheet. Rows may have different lengths.
pub type Grid = Vec<Vec<CellValue>>;

/// Headers are read from `A1:ZZ1`.
pub const HEADER_PROBE_COLUMNS: usize = 702;

/// Returns true when the cell counts as used.
fn is_used(cell: &CellValue) -> bool {
    match cell {
        CellValue::Null => false,
        CellValue::Text(s) => !s.is_empty(),
        _ => true,
    }
}

/// Smallest rectangle containing every used cell, qualified with the
/// sheet name. An empty sheet reports `Sheet!A1`.
pub fn used_range_address(sheet_name: &str, grid: &Grid) -> String {
    let mut bounds: Option<(usize, usize, usize, usize)> = None;

    for (r, row) in grid.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            if !is_used(cell) {
                continue;
            }
            bounds = Some(match bounds {
                None => (r, c, r, c),
                Some((r0, c0, r1, c1)) => (r0.min(r), c0.min(c), r1.max(r), c1.max(c)),
            });
        }
    }

    let (r0, c0, r1, c1) = bounds.unwrap_or((0, 0, 0, 0));
    let start = CellRef::new(c0 as u32 + 1, r0 as u32 + 1);
    let end = CellRef::new(c1 as u32 + 1, r1 as u32 + 1);

    if start == end {
        format!("{}!{}", sheet_name, start)
    } else {
        RangeAddress::new(start, end).qualified(sheet_name)
    }
}

/// Cells of the first row up to the last used one, capped at column `ZZ`.
pub fn header_row(grid: &Grid) -> Vec<CellValue> {
    let Some(first) = grid.first() else {
        return Vec::new();
    };

    let probe = &first[..first.len().min(HEADER_PROBE_COLUMNS)];
    let width = probe.iter().rposition(is_used).map_or(0, |i| i + 1);
    probe[..width].to_vec()
}

/// Writes `values` into the grid at `range`, growing it as needed.
///
/// The block must match the range dimensions exactly.
pub fn apply_write(
    grid: &mut Grid,
    range: &RangeAddress,
    values: &[Vec<CellValue>],
) -> Result<(), ServiceError> {
    let rows = range.row_count() as usize;
    let columns = range.column_count() as usize;

    if values.len() != rows || values.iter().any(|row| row.len() != columns) {
        return Err(ServiceError::Rejected(format!(
            "values do not match range {} ({} rows x {} columns)",
            range, rows, columns
        )));
    }

    let top = (range.start.row.min(range.end.row) as usize).saturating_sub(1);
    let left = (range.start.column.min(range.end.column) as usize).saturating_sub(1);

    if grid.len() < top + rows {
        grid.resize_with(top + rows, Vec::new);
    }

    for (i, row_values) in values.iter().enumerate() {
        let row = &mut grid[top + i];
        if row.len() < left + columns {
            row.resize(left + columns, CellValue::Null);
        }
        for (j, value) in row_values.iter().enumerate() {
            row[left + j] = value.clone();
        }
    }

    Ok(())
}

/// Describes a written block the way workbook range responses do,
/// including the bulky per-cell echo arrays.
pub fn write_response(sheet_name: &str, range: &RangeAddress, values: &[Vec<CellValue>]) -> Value {
    let text: Vec<Vec<String>> = values
        .iter()
        .map(|row| row.iter().map(CellValue::as_text).collect())
        .collect();
    let value_types: Vec<Vec<&str>> = values
        .iter()
        .map(|row| row.iter().map(value_type).collect())
        .collect();
    let general: Vec<Vec<&str>> = values
        .iter()
        .map(|row| row.iter().map(|_| "General").collect())
        .collect();
    let address = range.qualified(sheet_name);

    json!({
        "@odata.type": "#microsoft.graph.workbookRange",
        "address": address,
        "addressLocal": address,
        "cellCount": range.row_count() * range.column_count(),
        "columnCount": range.column_count(),
        "columnIndex": range.start.column.saturating_sub(1),
        "columnHidden": false,
        "rowCount": range.row_count(),
        "rowIndex": range.start.row.saturating_sub(1),
        "rowHidden": false,
        "values": values,
        "text": text,
        "formulas": values,
        "formulasLocal": values,
        "formulasR1C1": values,
        "numberFormat": general,
        "valueTypes": value_types,
    })
}

fn value_type(cell: &CellValue) -> &'static str {
    match cell {
        CellValue::Null => "Empty",
        CellValue::Bool(_) => "Boolean",
        CellValue::Number(_) => "Double",
        CellValue::Text(s) if s.is_empty() => "Empty",
        CellValue::Text(_) => "String",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_row(cells: &[&str]) -> Vec<CellValue> {
        cells.iter().map(|c| CellValue::from(*c)).collect()
    }

    #[test]
    fn test_used_range_empty_sheet() {
        assert_eq!(used_range_address("Sheet1", &Vec::new()), "Sheet1!A1");
        assert_eq!(
            used_range_address("Sheet1", &vec![vec![CellValue::Null]]),
            "Sheet1!A1"
        );
    }

    #[test]
    fn test_used_range_bounds() {
        let grid = vec![
            text_row(&["Name", "Team", ""]),
            text_row(&["Ann", "", "x"]),
            vec![],
            vec![CellValue::Null, CellValue::Number(3.0)],
        ];
        assert_eq!(used_range_address("Data", &grid), "Data!A1:C4");
    }

    #[test]
    fn test_used_range_single_cell() {
        let grid = vec![vec![], vec![CellValue::Null, CellValue::from("x")]];
        assert_eq!(used_range_address("S", &grid), "S!B2");
    }

    #[test]
    fn test_header_row_trims_trailing_blanks() {
        let grid = vec![
            vec![
                CellValue::from("Name"),
                CellValue::Null,
                CellValue::from("Email"),
                CellValue::from(""),
            ],
            text_row(&["a", "b", "c", "d", "e"]),
        ];
        let headers = header_row(&grid);
        assert_eq!(headers.len(), 3);
        assert_eq!(headers[2], CellValue::from("Email"));
    }

    #[test]
    fn test_header_row_capped_at_zz() {
        let wide: Vec<CellValue> = (0..800).map(|i| CellValue::from(i as i64)).collect();
        assert_eq!(header_row(&vec![wide]).len(), HEADER_PROBE_COLUMNS);
        assert!(header_row(&Vec::new()).is_empty());
    }

    #[test]
    fn test_apply_write_grows_grid() {
        let mut grid = vec![text_row(&["h1", "h2"])];
        let range = RangeAddress::parse("A3:B4").unwrap();
        let values = vec![text_row(&["a", "b"]), vec![CellValue::from("c"), CellValue::Null]];

        apply_write(&mut grid, &range, &values).unwrap();

        assert_eq!(grid.len(), 4);
        assert!(grid[1].is_empty());
        assert_eq!(grid[2], text_row(&["a", "b"]));
        assert_eq!(used_range_address("S", &grid), "S!A1:B4");
    }

    #[test]
    fn test_apply_write_rejects_ragged_block() {
        let mut grid = Grid::new();
        let range = RangeAddress::parse("A1:B2").unwrap();
        let values = vec![text_row(&["a", "b"]), text_row(&["c"])];

        let err = apply_write(&mut grid, &range, &values).unwrap_err();
        assert!(matches!(err, ServiceError::Rejected(_)));
        assert!(grid.is_empty());
    }

    #[test]
    fn test_write_response_shape() {
        let range = RangeAddress::parse("A4:B5").unwrap();
        let values = vec![
            vec![CellValue::from("a"), CellValue::Number(1.0)],
            vec![CellValue::Bool(true), CellValue::Null],
        ];
        let response = write_response("Sheet1", &range, &values);

        assert_eq!(response["address"], "Sheet1!A4:B5");
        assert_eq!(response["rowCount"], 2);
        assert_eq!(response["cellCount"], 4);
        assert_eq!(response["rowIndex"], 3);
        assert_eq!(response["valueTypes"][1][1], "Empty");
        assert_eq!(response["text"][0][1], "1");
    }
}
