//! Action Validation
//!
//! Checks an action definition before any remote call is made:
//! - Workbook and worksheet are selected
//! - SharePoint sources carry both site and document library
//! - A selected filter column comes with an operator and value
//! - There is something to append

use std::fmt;

use log::{debug, info, warn};

use super::model::{ActionDefinition, ActionKind, StorageSource};
use crate::error::ActionError;

/// Validation error types for user-friendly error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyWorkbookId,
    EmptyWorksheetId,
    MissingStorageSelection,
    IncompleteFilter,
    NoRows,
    EmptyRow,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyWorkbookId => write!(f, "please select a workbook."),
            Self::EmptyWorksheetId => write!(f, "please select a worksheet."),
            Self::MissingStorageSelection => {
                write!(f, "please select SharePoint site and document library.")
            }
            Self::IncompleteFilter => write!(
                f,
                "When a filter column is selected, filter condition and value are required."
            ),
            Self::NoRows => write!(
                f,
                "No rows to insert. The provided/filtered rows did not contain any values."
            ),
            Self::EmptyRow => write!(f, "No values to append. The row is empty."),
        }
    }
}

impl From<ValidationError> for ActionError {
    fn from(err: ValidationError) -> Self {
        ActionError::Configuration(err.to_string())
    }
}

/// Collects every problem with a definition.
fn collect_errors(def: &ActionDefinition) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if def.storage.drive_path().is_err() {
        errors.push(ValidationError::MissingStorageSelection);
    }

    if def.workbook_id.trim().is_empty() {
        errors.push(ValidationError::EmptyWorkbookId);
    }

    if def.worksheet_id.trim().is_empty() {
        errors.push(ValidationError::EmptyWorksheetId);
    }

    match def.action {
        ActionKind::AppendMultipleRows => {
            let filter = &def.filter;
            if filter.column.is_some() {
                let value_missing = filter.value.as_ref().map_or(true, |v| v.is_missing());
                if filter.operator.is_none() || value_missing {
                    errors.push(ValidationError::IncompleteFilter);
                }
            }

            if def.values.is_empty() {
                errors.push(ValidationError::NoRows);
            }
        }
        ActionKind::AppendRow => {
            if def.row.as_ref().map_or(true, |row| row.is_empty()) {
                errors.push(ValidationError::EmptyRow);
            }
        }
    }

    errors
}

/// Validates an action definition.
///
/// Returns the first problem found as a configuration error. Settings that
/// have no effect are reported as warnings only.
pub fn validate_action(def: &ActionDefinition) -> Result<(), ActionError> {
    info!("Validating {} on worksheet '{}'", def.action, def.worksheet_id);

    if let Some(first) = collect_errors(def).into_iter().next() {
        return Err(first.into());
    }

    let filter = &def.filter;
    if filter.column.is_none() && (filter.operator.is_some() || filter.value.is_some()) {
        warn!("Filter condition is set but no filter column is selected; all rows will be kept");
    }

    if def.action == ActionKind::AppendRow && !filter.is_disabled() {
        warn!("append_row does not filter; filter settings are ignored");
    }

    if let StorageSource::SharePoint { .. } = def.storage {
        debug!("Workbook stored in SharePoint library");
    }

    Ok(())
}

/// Quick validation that returns a list of error messages.
///
/// Useful for form validation feedback.
pub fn quick_validate(def: &ActionDefinition) -> Vec<String> {
    collect_errors(def).iter().map(ToString::to_string).collect()
}
