//! Sheetflow - Spreadsheet Append Actions
//!
//! Appends rows below the used range of a worksheet in a cloud-hosted
//! workbook. Rows can be filtered on one column before they are written,
//! and the whole batch always goes out in a single range write.
//!
//! # Architecture
//!
//! The library is organized into five main modules:
//!
//! - [`address`]: Column letters and range address parsing
//! - [`action`]: Action definitions, validation, row filter and form options
//! - [`execution`]: Append pipeline and range-write composition
//! - [`service`]: Spreadsheet service trait with in-memory and file backends
//! - [`monitoring`]: Stage timeline of a run
//!
//! # Example
//!
//! ```rust,no_run
//! use sheetflow::execution::Engine;
//! use sheetflow::load_action;
//! use sheetflow::service::LocalWorkbook;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Load an action from YAML
//!     let action = load_action("append.yaml")?;
//!
//!     // Point it at a workbook
//!     let workbook = LocalWorkbook::open("workbook.json");
//!
//!     // Run it
//!     let mut engine = Engine::new(action);
//!     let outcome = engine.run(&workbook).await?;
//!     println!("{}", outcome.output);
//!     Ok(())
//! }
//! ```

pub mod action;
pub mod address;
pub mod error;
pub mod execution;
pub mod monitoring;
pub mod service;

// Re-export commonly used types
pub use action::model::{ActionDefinition, ActionKind, CellValue, Row};
pub use action::parser::load_action;
pub use error::{ActionError, Result};
pub use execution::engine::{ActionOutcome, Engine};
pub use service::SpreadsheetService;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "Sheetflow";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_app_name() {
        assert_eq!(APP_NAME, "Sheetflow");
    }

    #[test]
    fn test_module_exports_definition() {
        let def = ActionDefinition::new(ActionKind::AppendRow, "book", "Sheet1")
            .with_single_row(Row::from_cells(["x"]));
        assert_eq!(def.worksheet_id, "Sheet1");
        assert_eq!(def.row.unwrap().get(0), Some(&CellValue::from("x")));
    }

    #[test]
    fn test_version_format() {
        let parts: Vec<&str> = VERSION.split('.').collect();
        assert!(parts.len() >= 2, "Version should have at least major.minor");
        for part in parts {
            assert!(part.parse::<u32>().is_ok(), "Version components should be numeric");
        }
    }
}
