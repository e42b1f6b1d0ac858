//! Action Execution Module
//!
//! Provides the engine that runs an append action against a spreadsheet
//! service, and the composition of the single range write it issues.
//!
//! # Architecture
//!
//! - [`engine`]: Pipeline orchestrating one action run
//! - [`compose`]: Rectangular value blocks and their target range

pub mod compose;
pub mod engine;

pub use compose::{compose_append, reduce_write_response, WriteBlock};
pub use engine::{ActionOutcome, Engine};
