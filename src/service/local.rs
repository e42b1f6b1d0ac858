//! Local Workbook File
//!
//! A [`SpreadsheetService`] backed by a JSON file:
//!
//! ```json
//! { "worksheets": { "Sheet1": [["Name", "Team"], ["Ann", "Ops"]] } }
//! ```
//!
//! The file is read on every call and rewritten after each write.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::grid::{self, Grid};
use super::{ServiceError, SpreadsheetService};
use crate::action::model::{CellValue, SheetRef};
use crate::address::RangeAddress;

/// On-disk layout of a workbook.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct WorkbookFile {
    #[serde(default)]
    pub worksheets: BTreeMap<String, Grid>,
}

impl WorkbookFile {
    pub fn with_sheet(mut self, name: impl Into<String>, rows: Grid) -> Self {
        self.worksheets.insert(name.into(), rows);
        self
    }

    fn sheet(&self, name: &str) -> Result<&Grid, ServiceError> {
        self.worksheets
            .get(name)
            .ok_or_else(|| ServiceError::WorksheetNotFound(name.to_string()))
    }
}

/// Workbook stored as a JSON file on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalWorkbook {
    path: PathBuf,
}

impl LocalWorkbook {
    /// Opens a workbook file. Nothing is read until the first call.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Writes a new workbook file, replacing any existing one.
    pub async fn create(
        path: impl Into<PathBuf>,
        contents: &WorkbookFile,
    ) -> Result<Self, ServiceError> {
        let book = Self::open(path);
        book.save(contents).await?;
        Ok(book)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the workbook file.
    pub async fn load(&self) -> Result<WorkbookFile, ServiceError> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let file: WorkbookFile = serde_json::from_str(&content)?;
        debug!(
            "Loaded workbook {} ({} worksheets)",
            self.path.display(),
            file.worksheets.len()
        );
        Ok(file)
    }

    async fn save(&self, contents: &WorkbookFile) -> Result<(), ServiceError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(contents)?;
        tokio::fs::write(&self.path, json).await?;

        info!("Saved workbook to {}", self.path.display());
        Ok(())
    }
}

#[async_trait]
impl SpreadsheetService for LocalWorkbook {
    async fn used_range(&self, sheet: &SheetRef) -> Result<String, ServiceError> {
        let file = self.load().await?;
        let rows = file.sheet(&sheet.worksheet_id)?;
        Ok(grid::used_range_address(&sheet.worksheet_id, rows))
    }

    async fn header_row(&self, sheet: &SheetRef) -> Result<Vec<CellValue>, ServiceError> {
        let file = self.load().await?;
        let rows = file.sheet(&sheet.worksheet_id)?;
        Ok(grid::header_row(rows))
    }

    async fn write_range(
        &self,
        sheet: &SheetRef,
        range: &RangeAddress,
        values: Vec<Vec<CellValue>>,
    ) -> Result<Value, ServiceError> {
        let mut file = self.load().await?;
        let rows = file
            .worksheets
            .get_mut(&sheet.worksheet_id)
            .ok_or_else(|| ServiceError::WorksheetNotFound(sheet.worksheet_id.clone()))?;

        grid::apply_write(rows, range, &values)?;
        self.save(&file).await?;

        Ok(grid::write_response(&sheet.worksheet_id, range, &values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sheet() -> SheetRef {
        SheetRef::new("/me/drive", "local", "Sheet1")
    }

    fn headers() -> Grid {
        vec![vec![CellValue::from("Name"), CellValue::from("Team")]]
    }

    #[tokio::test]
    async fn test_missing_file() {
        let book = LocalWorkbook::open("/nonexistent/path/book.json");
        let err = book.used_range(&sheet()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Io(_)));
    }

    #[tokio::test]
    async fn test_invalid_json() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("book.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = LocalWorkbook::open(&path).header_row(&sheet()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Json(_)));
    }

    #[tokio::test]
    async fn test_create_and_read() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("book.json");

        let contents = WorkbookFile::default().with_sheet("Sheet1", headers());
        let book = LocalWorkbook::create(&path, &contents).await.unwrap();

        assert!(path.exists());
        assert_eq!(book.header_row(&sheet()).await.unwrap().len(), 2);
        assert_eq!(book.used_range(&sheet()).await.unwrap(), "Sheet1!A1:B1");
    }

    #[tokio::test]
    async fn test_write_persists() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("book.json");
        let contents = WorkbookFile::default().with_sheet("Sheet1", headers());
        let book = LocalWorkbook::create(&path, &contents).await.unwrap();

        let range = RangeAddress::parse("A2:B2").unwrap();
        let response = book
            .write_range(&sheet(), &range, vec![vec![CellValue::from("Ann"), CellValue::Null]])
            .await
            .unwrap();
        assert_eq!(response["address"], "Sheet1!A2:B2");

        let reopened = LocalWorkbook::open(&path);
        let file = reopened.load().await.unwrap();
        assert_eq!(file.worksheets["Sheet1"].len(), 2);
        assert_eq!(reopened.used_range(&sheet()).await.unwrap(), "Sheet1!A1:B2");
    }

    #[tokio::test]
    async fn test_unknown_worksheet() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("book.json");
        let book = LocalWorkbook::create(&path, &WorkbookFile::default()).await.unwrap();

        let err = book.header_row(&sheet()).await.unwrap_err();
        assert!(matches!(err, ServiceError::WorksheetNotFound(_)));
    }
}
