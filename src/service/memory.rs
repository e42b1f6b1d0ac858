//! In-Memory Workbook
//!
//! A [`SpreadsheetService`] holding its worksheets in memory. Every
//! operation is counted so callers can assert exactly which remote calls
//! a pipeline made.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use log::debug;
use serde_json::Value;

use super::grid::{self, Grid};
use super::{ServiceError, SpreadsheetService};
use crate::action::model::{CellValue, SheetRef};
use crate::address::RangeAddress;

/// Workbook kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryWorkbook {
    sheets: Mutex<HashMap<String, Grid>>,
    used_range_override: Mutex<Option<String>>,
    failure: Mutex<Option<String>>,
    used_range_calls: AtomicUsize,
    header_calls: AtomicUsize,
    write_calls: AtomicUsize,
}

impl MemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a worksheet.
    pub fn insert_sheet(&self, name: impl Into<String>, rows: Grid) {
        lock(&self.sheets).insert(name.into(), rows);
    }

    /// Returns a copy of a worksheet's cells.
    pub fn sheet(&self, name: &str) -> Option<Grid> {
        lock(&self.sheets).get(name).cloned()
    }

    /// Makes `used_range` answer with a fixed address.
    pub fn set_used_range(&self, address: impl Into<String>) {
        *lock(&self.used_range_override) = Some(address.into());
    }

    /// Makes every following call fail with the given message.
    pub fn fail_with(&self, message: impl Into<String>) {
        *lock(&self.failure) = Some(message.into());
    }

    pub fn used_range_calls(&self) -> usize {
        self.used_range_calls.load(Ordering::SeqCst)
    }

    pub fn header_calls(&self) -> usize {
        self.header_calls.load(Ordering::SeqCst)
    }

    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> Result<(), ServiceError> {
        match lock(&self.failure).as_ref() {
            Some(message) => Err(ServiceError::Rejected(message.clone())),
            None => Ok(()),
        }
    }
}

/// Locks a mutex, recovering the data if a previous holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl SpreadsheetService for MemoryWorkbook {
    async fn used_range(&self, sheet: &SheetRef) -> Result<String, ServiceError> {
        self.used_range_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;

        if let Some(address) = lock(&self.used_range_override).clone() {
            return Ok(address);
        }

        let sheets = lock(&self.sheets);
        let rows = sheets
            .get(&sheet.worksheet_id)
            .ok_or_else(|| ServiceError::WorksheetNotFound(sheet.worksheet_id.clone()))?;

        Ok(grid::used_range_address(&sheet.worksheet_id, rows))
    }

    async fn header_row(&self, sheet: &SheetRef) -> Result<Vec<CellValue>, ServiceError> {
        self.header_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;

        let sheets = lock(&self.sheets);
        let rows = sheets
            .get(&sheet.worksheet_id)
            .ok_or_else(|| ServiceError::WorksheetNotFound(sheet.worksheet_id.clone()))?;

        Ok(grid::header_row(rows))
    }

    async fn write_range(
        &self,
        sheet: &SheetRef,
        range: &RangeAddress,
        values: Vec<Vec<CellValue>>,
    ) -> Result<Value, ServiceError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;

        let mut sheets = lock(&self.sheets);
        let rows = sheets
            .get_mut(&sheet.worksheet_id)
            .ok_or_else(|| ServiceError::WorksheetNotFound(sheet.worksheet_id.clone()))?;

        grid::apply_write(rows, range, &values)?;
        debug!("Wrote {} rows to {}", values.len(), range.qualified(&sheet.worksheet_id));

        Ok(grid::write_response(&sheet.worksheet_id, range, &values))
    }
}
