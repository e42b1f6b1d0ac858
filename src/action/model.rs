//! Action Data Model
//!
//! Request-scoped values describing one action run: what to append,
//! where the workbook lives, and which rows to keep.
//!
//! # Example YAML Format
//!
//! ```yaml
//! action: append_multiple_rows
//! storage:
//!   source: onedrive
//! workbook_id: 01ABCDEF
//! worksheet_id: Sheet1
//! values:
//!   - ["Alice", 30, true]
//!   - { "0": "Bob", "2": false }
//! filter:
//!   column: 0
//!   operator: matches_any_of
//!   value: ["alice", "bob"]
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::filter::FilterOperator;
use super::validator::ValidationError;
use crate::address::MAX_COLUMNS;
use crate::error::{ActionError, Result};

/// A single cell value as exchanged with the spreadsheet service.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Returns true for null cells and cells holding only whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Text used when comparing the cell against a filter value.
    /// Null becomes the empty string.
    pub fn as_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Number(n) => f.write_str(&number_text(*n)),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Formats a number the way the flow runtime stringifies it: shortest
/// round-trip digits, no negative zero, and exponent notation outside
/// `1e-6..1e21`.
fn number_text(n: f64) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let magnitude = n.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return n.to_string();
    }

    let text = format!("{:e}", n);
    match text.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{}e+{}", mantissa, exponent)
        }
        _ => text,
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// A candidate row, keyed by 0-based column index.
///
/// Rows arrive either as a positional list or as a mapping from column
/// index to value (the shape header-driven forms produce). Both forms
/// deserialize into the same sparse representation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    cells: BTreeMap<usize, CellValue>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a row from positional cells.
    pub fn from_cells<I, V>(cells: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        Self {
            cells: cells.into_iter().map(Into::into).enumerate().collect(),
        }
    }

    /// Sets the value of one column.
    pub fn with(mut self, column: usize, value: impl Into<CellValue>) -> Self {
        self.cells.insert(column, value.into());
        self
    }

    pub fn get(&self, column: usize) -> Option<&CellValue> {
        self.cells.get(&column)
    }

    /// One past the highest populated column index.
    pub fn width(&self) -> usize {
        self.cells
            .keys()
            .next_back()
            .map_or(0, |last| last.saturating_add(1))
    }

    /// Fails when the row reaches past the last column a worksheet has.
    pub fn check_width(&self) -> Result<()> {
        let width = self.width();
        if width > MAX_COLUMNS as usize {
            return Err(ActionError::configuration(format!(
                "Row has a value in column {}, but worksheets end at column {}.",
                width, MAX_COLUMNS
            )));
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Lays the row out over exactly `width` columns.
    ///
    /// Missing cells become `Null`; cells past `width` are dropped.
    pub fn to_cells(&self, width: usize) -> Vec<CellValue> {
        (0..width)
            .map(|i| self.cells.get(&i).cloned().unwrap_or(CellValue::Null))
            .collect()
    }

    /// Positional cells up to the highest populated column.
    pub fn to_dense(&self) -> Vec<CellValue> {
        self.to_cells(self.width())
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let val = Value::deserialize(deserializer)?;
        let to_cell =
            |v: Value| CellValue::deserialize(v).map_err(|e| de::Error::custom(e.to_string()));

        match val {
            Value::Null => Ok(Row::new()),
            Value::Array(items) => {
                let mut cells = BTreeMap::new();
                for (i, item) in items.into_iter().enumerate() {
                    cells.insert(i, to_cell(item)?);
                }
                Ok(Row { cells })
            }
            Value::Object(map) => {
                let mut cells = BTreeMap::new();
                for (key, item) in map {
                    let column: usize = key.trim().parse().map_err(|_| {
                        de::Error::custom(format!("Row key '{}' is not a column index", key))
                    })?;
                    cells.insert(column, to_cell(item)?);
                }
                Ok(Row { cells })
            }
            _ => Err(de::Error::custom(
                "Expected a list of cells or a mapping of column index to cell",
            )),
        }
    }
}

impl Serialize for Row {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_dense().serialize(serializer)
    }
}

/// Which action to run.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Append one row below the used range.
    AppendRow,
    /// Filter a batch of rows and append the survivors in one write.
    AppendMultipleRows,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AppendRow => write!(f, "append_row"),
            Self::AppendMultipleRows => write!(f, "append_multiple_rows"),
        }
    }
}

/// Where the workbook file is stored.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(tag = "source")]
pub enum StorageSource {
    /// The signed-in user's personal drive.
    #[default]
    #[serde(rename = "onedrive")]
    OneDrive,

    /// A document library on a SharePoint site. Both ids are required
    /// at run time but may be unset while the form is being filled in.
    #[serde(rename = "sharepoint")]
    SharePoint {
        #[serde(default)]
        site_id: Option<String>,
        #[serde(default)]
        document_id: Option<String>,
    },
}

impl StorageSource {
    pub fn sharepoint(site_id: impl Into<String>, document_id: impl Into<String>) -> Self {
        Self::SharePoint {
            site_id: Some(site_id.into()),
            document_id: Some(document_id.into()),
        }
    }

    /// Resolves the drive path that workbook item paths hang off.
    pub fn drive_path(&self) -> Result<String> {
        match self {
            Self::OneDrive => Ok("/me/drive".to_string()),
            Self::SharePoint {
                site_id,
                document_id,
            } => match (non_blank(site_id), non_blank(document_id)) {
                (Some(site), Some(document)) => {
                    Ok(format!("/sites/{}/drives/{}", site, document))
                }
                _ => Err(ValidationError::MissingStorageSelection.into()),
            },
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Identifies one worksheet of one workbook.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SheetRef {
    pub drive_path: String,
    pub workbook_id: String,
    pub worksheet_id: String,
}

impl SheetRef {
    pub fn new(
        drive_path: impl Into<String>,
        workbook_id: impl Into<String>,
        worksheet_id: impl Into<String>,
    ) -> Self {
        Self {
            drive_path: drive_path.into(),
            workbook_id: workbook_id.into(),
            worksheet_id: worksheet_id.into(),
        }
    }
}

impl fmt::Display for SheetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/items/{}/workbook/worksheets/{}",
            self.drive_path, self.workbook_id, self.worksheet_id
        )
    }
}

/// Comparison value of a row filter.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum FilterValue {
    List(Vec<CellValue>),
    Single(CellValue),
}

impl FilterValue {
    /// Returns true when the value counts as not provided.
    ///
    /// Null, `false`, zero and the empty text are missing; any list,
    /// even an empty one, is a real value.
    pub fn is_missing(&self) -> bool {
        match self {
            Self::Single(CellValue::Null) => true,
            Self::Single(CellValue::Bool(b)) => !b,
            Self::Single(CellValue::Number(n)) => *n == 0.0 || n.is_nan(),
            Self::Single(CellValue::Text(s)) => s.is_empty(),
            Self::List(_) => false,
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        Self::Single(CellValue::from(s))
    }
}

impl From<Vec<&str>> for FilterValue {
    fn from(items: Vec<&str>) -> Self {
        Self::List(items.into_iter().map(CellValue::from).collect())
    }
}

/// Filter settings as entered by the user. Every part is optional so that
/// incomplete settings can be reported instead of silently ignored.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct FilterSpec {
    /// 0-based index of the column to test.
    #[serde(default)]
    pub column: Option<usize>,

    #[serde(default, alias = "type")]
    pub operator: Option<FilterOperator>,

    #[serde(default)]
    pub value: Option<FilterValue>,
}

impl FilterSpec {
    pub fn new(column: usize, operator: FilterOperator, value: impl Into<FilterValue>) -> Self {
        Self {
            column: Some(column),
            operator: Some(operator),
            value: Some(value.into()),
        }
    }

    /// Returns true when no filter column is selected.
    pub fn is_disabled(&self) -> bool {
        self.column.is_none()
    }
}

/// A complete action definition, typically loaded from YAML.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ActionDefinition {
    pub action: ActionKind,

    #[serde(default)]
    pub storage: StorageSource,

    #[serde(default)]
    pub workbook_id: String,

    #[serde(default)]
    pub worksheet_id: String,

    /// Whether the value form was built from the worksheet's header row.
    #[serde(default)]
    pub first_row_headers: bool,

    /// Rows for `append_multiple_rows`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<Row>,

    /// The single row for `append_row`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<Row>,

    #[serde(default)]
    pub filter: FilterSpec,
}

impl ActionDefinition {
    /// Creates a definition for the given action on a OneDrive workbook.
    ///
    /// # Example
    ///
    /// ```
    /// use sheetflow::action::{ActionDefinition, ActionKind, Row};
    ///
    /// let def = ActionDefinition::new(ActionKind::AppendMultipleRows, "book-1", "Sheet1")
    ///     .with_row(Row::from_cells(["Alice", "Engineering"]))
    ///     .with_row(Row::from_cells(["Bob", "Sales"]));
    /// assert_eq!(def.values.len(), 2);
    /// ```
    pub fn new(
        action: ActionKind,
        workbook_id: impl Into<String>,
        worksheet_id: impl Into<String>,
    ) -> Self {
        Self {
            action,
            storage: StorageSource::OneDrive,
            workbook_id: workbook_id.into().trim().to_string(),
            worksheet_id: worksheet_id.into().trim().to_string(),
            first_row_headers: false,
            values: Vec::new(),
            row: None,
            filter: FilterSpec::default(),
        }
    }

    pub fn with_storage(mut self, storage: StorageSource) -> Self {
        self.storage = storage;
        self
    }

    /// Adds a row to the batch appended by `append_multiple_rows`.
    pub fn with_row(mut self, row: Row) -> Self {
        self.values.push(row);
        self
    }

    pub fn with_rows(mut self, rows: Vec<Row>) -> Self {
        self.values = rows;
        self
    }

    /// Sets the row appended by `append_row`.
    pub fn with_single_row(mut self, row: Row) -> Self {
        self.row = Some(row);
        self
    }

    pub fn with_filter(mut self, filter: FilterSpec) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_first_row_headers(mut self, enabled: bool) -> Self {
        self.first_row_headers = enabled;
        self
    }

    /// Resolves the worksheet this definition targets.
    pub fn sheet_ref(&self) -> Result<SheetRef> {
        let drive_path = self.storage.drive_path()?;
        Ok(SheetRef::new(
            drive_path,
            self.workbook_id.clone(),
            self.worksheet_id.clone(),
        ))
    }
}
