//! Spreadsheet Service
//!
//! The remote collaborator the actions talk to. Only three operations are
//! needed: read the used range, read the header row, and write a block.
//!
//! # Implementations
//!
//! - [`memory::MemoryWorkbook`]: in-memory workbook with call counters
//! - [`local::LocalWorkbook`]: workbook stored in a JSON file

pub mod grid;
pub mod local;
pub mod memory;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::action::model::{CellValue, SheetRef};
use crate::address::RangeAddress;

pub use local::LocalWorkbook;
pub use memory::MemoryWorkbook;

/// Failure reported by a spreadsheet service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Worksheet '{0}' not found")]
    WorksheetNotFound(String),

    #[error("Workbook I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Workbook data is invalid: {0}")]
    Json(#[from] serde_json::Error),

    /// The service refused the request.
    #[error("Request rejected: {0}")]
    Rejected(String),
}

/// Operations a spreadsheet backend provides to the append actions.
#[async_trait]
pub trait SpreadsheetService: Send + Sync {
    /// Returns the used-range address of a worksheet, e.g. `Sheet1!A1:C10`.
    async fn used_range(&self, sheet: &SheetRef) -> Result<String, ServiceError>;

    /// Returns the cells of the worksheet's first row.
    async fn header_row(&self, sheet: &SheetRef) -> Result<Vec<CellValue>, ServiceError>;

    /// Writes a rectangular block of values and returns the service's
    /// description of the written range.
    async fn write_range(
        &self,
        sheet: &SheetRef,
        range: &RangeAddress,
        values: Vec<Vec<CellValue>>,
    ) -> Result<Value, ServiceError>;
}
