//! Run Monitoring
//!
//! Timing of the pipeline stages of an action run.
//!
//! # Components
//!
//! - [`ExecutionTimeline`]: Stage start/end timing and ASCII chart

pub mod timeline;

pub use timeline::{EventType, ExecutionTimeline, Stage, TimelineEvent};
