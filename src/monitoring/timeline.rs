//! Execution Timeline
//!
//! Tracks when each pipeline stage of an action run starts and ends,
//! for timing reports and a compact ASCII chart.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

/// A stage of the append pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Validate,
    ReadHeaders,
    Filter,
    ReadUsedRange,
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validate => "validate",
            Self::ReadHeaders => "read_headers",
            Self::Filter => "filter",
            Self::ReadUsedRange => "read_used_range",
            Self::Write => "write",
        };
        f.write_str(name)
    }
}

/// Type of timeline event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Started,
    Completed,
    Failed,
}

/// A single event in the execution timeline.
#[derive(Debug, Clone)]
pub struct TimelineEvent {
    pub stage: Stage,
    pub event_type: EventType,
    pub timestamp: Instant,
}

/// Records the stages of one action run in order.
#[derive(Debug, Clone)]
pub struct ExecutionTimeline {
    events: Vec<TimelineEvent>,
    start_time: Instant,
}

impl ExecutionTimeline {
    /// Creates a new timeline starting now.
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            start_time: Instant::now(),
        }
    }

    /// Records an event for a stage.
    pub fn add_event(&mut self, stage: Stage, event_type: EventType) {
        self.events.push(TimelineEvent {
            stage,
            event_type,
            timestamp: Instant::now(),
        });
    }

    /// Records the end of a stage from its result.
    pub fn finish<T, E>(&mut self, stage: Stage, result: &Result<T, E>) {
        let event_type = if result.is_ok() {
            EventType::Completed
        } else {
            EventType::Failed
        };
        self.add_event(stage, event_type);
    }

    pub fn get_events(&self) -> &[TimelineEvent] {
        &self.events
    }

    /// Returns the total elapsed time since timeline creation.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Stages that completed, in completion order.
    pub fn completed_stages(&self) -> Vec<Stage> {
        self.events
            .iter()
            .filter(|e| e.event_type == EventType::Completed)
            .map(|e| e.stage)
            .collect()
    }

    /// The stage that failed, if any.
    pub fn failed_stage(&self) -> Option<Stage> {
        self.events
            .iter()
            .find(|e| e.event_type == EventType::Failed)
            .map(|e| e.stage)
    }

    /// Returns stage durations.
    pub fn get_durations(&self) -> HashMap<Stage, Duration> {
        let mut starts: HashMap<Stage, Instant> = HashMap::new();
        let mut durations = HashMap::new();

        for event in &self.events {
            match event.event_type {
                EventType::Started => {
                    starts.insert(event.stage, event.timestamp);
                }
                EventType::Completed | EventType::Failed => {
                    if let Some(start) = starts.get(&event.stage) {
                        durations.insert(event.stage, event.timestamp.duration_since(*start));
                    }
                }
            }
        }

        durations
    }

    /// Generates an ASCII chart with one bar per finished stage, scaled
    /// to 40 characters of total run time.
    pub fn chart(&self) -> String {
        let mut output = String::from("\nExecution Timeline:\n\n");

        let total = self.elapsed().as_micros().max(1);
        let scale = 40.0 / total as f64;

        let mut starts: HashMap<Stage, u128> = HashMap::new();
        for event in &self.events {
            let at = event.timestamp.duration_since(self.start_time).as_micros();
            match event.event_type {
                EventType::Started => {
                    starts.insert(event.stage, at);
                }
                EventType::Completed | EventType::Failed => {
                    let Some(start) = starts.remove(&event.stage) else {
                        continue;
                    };
                    let offset = (start as f64 * scale) as usize;
                    let width = ((at - start) as f64 * scale).max(1.0) as usize;
                    let marker = if event.event_type == EventType::Failed {
                        "FAILED"
                    } else {
                        ""
                    };
                    output.push_str(&format!(
                        "{:16} |{}{}| {} us {}\n",
                        event.stage.to_string(),
                        " ".repeat(offset),
                        "#".repeat(width),
                        at - start,
                        marker
                    ));
                }
            }
        }

        output.push_str(&format!("\nTotal: {} us\n", total));
        output
    }
}

impl Default for ExecutionTimeline {
    fn default() -> Self {
        Self::new()
    }
}
