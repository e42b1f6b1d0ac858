//! Dynamic Form Options
//!
//! Form fields whose choices depend on other fields. Each [`Property`]
//! declares which upstream properties it is refreshed by, and the
//! functions here compute the next available options from the currently
//! selected upstream values. When to call them is up to the host.

use log::debug;
use serde::Serialize;

use super::filter::FilterOperator;
use super::model::{ActionDefinition, ActionKind, CellValue, SheetRef, StorageSource};
use crate::error::Result;
use crate::service::SpreadsheetService;

/// A form field of the append actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Property {
    StorageSource,
    Site,
    DocumentLibrary,
    Workbook,
    Worksheet,
    FirstRowHeaders,
    Values,
    FilterColumn,
    FilterType,
    FilterValue,
}

impl Property {
    pub const ALL: [Property; 10] = [
        Self::StorageSource,
        Self::Site,
        Self::DocumentLibrary,
        Self::Workbook,
        Self::Worksheet,
        Self::FirstRowHeaders,
        Self::Values,
        Self::FilterColumn,
        Self::FilterType,
        Self::FilterValue,
    ];

    /// Upstream properties whose change invalidates this one's options.
    pub fn refreshers(&self) -> &'static [Property] {
        use Property::*;
        match self {
            StorageSource | FirstRowHeaders | FilterType => &[],
            Site => &[StorageSource],
            DocumentLibrary => &[StorageSource, Site],
            Workbook => &[StorageSource, Site, DocumentLibrary],
            Worksheet => &[StorageSource, Site, DocumentLibrary, Workbook],
            Values => &[
                StorageSource,
                Site,
                DocumentLibrary,
                Workbook,
                Worksheet,
                FirstRowHeaders,
            ],
            FilterColumn => &[StorageSource, Site, DocumentLibrary, Workbook, Worksheet],
            FilterValue => &[FilterType],
        }
    }

    /// Properties to recompute after `changed` was edited, in form order.
    pub fn to_refresh(changed: Property) -> Vec<Property> {
        Self::ALL
            .iter()
            .copied()
            .filter(|p| p.refreshers().contains(&changed))
            .collect()
    }
}

/// Currently selected upstream values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub storage: StorageSource,
    pub workbook_id: Option<String>,
    pub worksheet_id: Option<String>,
    pub first_row_headers: bool,
    pub filter_operator: Option<FilterOperator>,
}

impl Selection {
    pub fn from_definition(def: &ActionDefinition) -> Self {
        let non_empty = |s: &str| Some(s.trim().to_string()).filter(|s| !s.is_empty());
        Self {
            storage: def.storage.clone(),
            workbook_id: non_empty(&def.workbook_id),
            worksheet_id: non_empty(&def.worksheet_id),
            first_row_headers: def.first_row_headers,
            filter_operator: def.filter.operator,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DropdownOption {
    pub label: String,
    pub value: String,
}

/// Options of a dropdown, or a disabled dropdown with a hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DropdownState {
    pub disabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    pub options: Vec<DropdownOption>,
}

impl DropdownState {
    /// A disabled dropdown telling the user what to select first.
    pub fn empty(message: impl Into<String>) -> Self {
        Self {
            disabled: true,
            placeholder: Some(message.into()),
            options: Vec::new(),
        }
    }

    pub fn ready(options: Vec<DropdownOption>) -> Self {
        Self {
            disabled: false,
            placeholder: None,
            options,
        }
    }
}

/// Checks that site choices can be listed.
pub fn site_prerequisites(selection: &Selection) -> std::result::Result<(), DropdownState> {
    match selection.storage {
        StorageSource::SharePoint { .. } => Ok(()),
        StorageSource::OneDrive => Err(DropdownState::empty(
            "please select sharepoint as file source.",
        )),
    }
}

/// Checks that document library choices can be listed for the selected site.
pub fn document_library_prerequisites(
    selection: &Selection,
) -> std::result::Result<String, DropdownState> {
    site_prerequisites(selection)?;
    match &selection.storage {
        StorageSource::SharePoint {
            site_id: Some(site),
            ..
        } if !site.trim().is_empty() => Ok(site.trim().to_string()),
        _ => Err(DropdownState::empty("please select sharepoint site first.")),
    }
}

/// Resolves the drive path workbooks are listed from.
pub fn workbook_prerequisites(selection: &Selection) -> std::result::Result<String, DropdownState> {
    selection.storage.drive_path().map_err(|_| {
        DropdownState::empty("please select SharePoint site and document library first.")
    })
}

/// Resolves the worksheet header-driven fields are built from.
pub fn sheet_ref(selection: &Selection) -> std::result::Result<SheetRef, DropdownState> {
    let Some(workbook_id) = &selection.workbook_id else {
        return Err(DropdownState::empty("please select a workbook first."));
    };
    let Some(worksheet_id) = &selection.worksheet_id else {
        return Err(DropdownState::empty("please select a worksheet first."));
    };
    let drive_path = workbook_prerequisites(selection)?;

    Ok(SheetRef::new(drive_path, workbook_id.clone(), worksheet_id.clone()))
}

/// Filter column choices built from the header row.
///
/// Blank headers are skipped; the option value is the column index.
pub fn filter_column_options(headers: &[CellValue]) -> DropdownState {
    let options = headers
        .iter()
        .enumerate()
        .filter(|(_, header)| !header.is_blank())
        .map(|(index, header)| DropdownOption {
            label: header.to_string(),
            value: index.to_string(),
        })
        .collect();

    DropdownState::ready(options)
}

/// Fetches headers and computes the filter column choices.
pub async fn load_filter_column_options(
    service: &dyn SpreadsheetService,
    selection: &Selection,
) -> Result<DropdownState> {
    let sheet = match sheet_ref(selection) {
        Ok(sheet) => sheet,
        Err(state) => return Ok(state),
    };

    let headers = service.header_row(&sheet).await?;
    debug!("Loaded {} headers for filter column options", headers.len());

    Ok(filter_column_options(&headers))
}

/// Kind of input used for the filter comparison value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    ShortText,
    List,
}

/// The comparison value input for the selected operator.
pub fn filter_value_input(operator: Option<FilterOperator>) -> Option<InputKind> {
    operator.map(|op| {
        if op.takes_list() {
            InputKind::List
        } else {
            InputKind::ShortText
        }
    })
}

/// Operator choices for the filter type dropdown.
pub fn filter_type_options() -> DropdownState {
    DropdownState::ready(
        FilterOperator::ALL
            .iter()
            .map(|op| DropdownOption {
                label: op.label().to_string(),
                value: op.to_string(),
            })
            .collect(),
    )
}

/// A text input for one worksheet column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnField {
    /// Column index the entered value lands in.
    pub key: String,
    pub label: String,
}

/// Shape of the value form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "columns", rename_all = "snake_case")]
pub enum ValueFields {
    /// Not enough is selected yet to build the form.
    Unavailable,
    /// A free list of values (no header row).
    List,
    /// One input per header column.
    Columns(Vec<ColumnField>),
    /// A list of rows, each with one input per header column.
    RowsOfColumns(Vec<ColumnField>),
}

/// Computes the value form for an action.
///
/// `headers` is only consulted when the first row holds headers.
pub fn value_fields(
    selection: &Selection,
    action: ActionKind,
    headers: Option<&[CellValue]>,
) -> ValueFields {
    if sheet_ref(selection).is_err() {
        return ValueFields::Unavailable;
    }

    if !selection.first_row_headers {
        return ValueFields::List;
    }

    let Some(headers) = headers else {
        return ValueFields::Unavailable;
    };

    let columns: Vec<ColumnField> = headers
        .iter()
        .enumerate()
        .map(|(index, header)| ColumnField {
            key: index.to_string(),
            label: header.to_string(),
        })
        .collect();

    match action {
        ActionKind::AppendRow => ValueFields::Columns(columns),
        ActionKind::AppendMultipleRows => ValueFields::RowsOfColumns(columns),
    }
}
