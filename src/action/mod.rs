//! Action Definition Module
//!
//! Provides the data structures, loading, validation and row filtering
//! for the append actions, plus the dependency graph of their dynamic
//! form options.
//!
//! # Structure
//!
//! - [`model`]: Core data structures (ActionDefinition, Row, CellValue)
//! - [`parser`]: YAML parsing and loading
//! - [`validator`]: Checks run before any remote call
//! - [`filter`]: Row filter operators
//! - [`options`]: Dynamic option dependencies and resolution

pub mod filter;
pub mod model;
pub mod options;
pub mod parser;
pub mod validator;

pub use filter::{filter_rows, FilterOperator, RowFilter};
pub use model::{
    ActionDefinition, ActionKind, CellValue, FilterSpec, FilterValue, Row, SheetRef,
    StorageSource,
};
pub use parser::{load_action, parse_action, save_action};
pub use validator::{quick_validate, validate_action, ValidationError};
