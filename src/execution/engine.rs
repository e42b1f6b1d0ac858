//! Action Execution Engine
//!
//! Runs an action definition against a spreadsheet service as one linear
//! pipeline:
//! - Validate the definition and resolve the worksheet
//! - Read the header row (multi-row action only)
//! - Filter and lay out the rows
//! - Read the used range to find the first free row
//! - Issue exactly one write for the whole block
//!
//! Calls run strictly in sequence. A failed remote call fails the run
//! immediately; nothing is retried.

use std::future::Future;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde_json::{json, Value};

use super::compose::{
    compose_append, compose_single_row, rectangular_values, reduce_write_response, WriteBlock,
};
use crate::action::filter::filter_rows;
use crate::action::model::{ActionDefinition, ActionKind, SheetRef};
use crate::action::validator::{validate_action, ValidationError};
use crate::address::{used_range_last_row, RangeAddress};
use crate::error::Result;
use crate::monitoring::{EventType, ExecutionTimeline, Stage};
use crate::service::SpreadsheetService;

/// Result of a successful action run.
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    pub action: ActionKind,
    /// Range the rows were (or in a dry run, would be) written to.
    pub range: RangeAddress,
    pub rows_written: usize,
    /// What the action returns to the flow.
    pub output: Value,
    pub dry_run: bool,
    pub finished_at: DateTime<Utc>,
}

/// Action execution engine.
///
/// # Example
///
/// ```rust,no_run
/// use sheetflow::action::load_action;
/// use sheetflow::execution::Engine;
/// use sheetflow::service::LocalWorkbook;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let def = load_action("append.yaml")?;
///     let book = LocalWorkbook::open("workbook.json");
///
///     let mut engine = Engine::new(def);
///     let outcome = engine.run(&book).await?;
///     println!("Wrote {} rows to {}", outcome.rows_written, outcome.range);
///     Ok(())
/// }
/// ```
pub struct Engine {
    definition: ActionDefinition,
    dry_run: bool,
    timeline: Option<ExecutionTimeline>,
}

impl Engine {
    /// Creates a new engine for an action definition.
    pub fn new(definition: ActionDefinition) -> Self {
        Self {
            definition,
            dry_run: false,
            timeline: None,
        }
    }

    /// Enables or disables dry run mode.
    ///
    /// A dry run performs the reads and composes the block but skips the write.
    pub fn set_dry_run(&mut self, dry_run: bool) {
        self.dry_run = dry_run;
    }

    pub fn definition(&self) -> &ActionDefinition {
        &self.definition
    }

    /// Stage timeline of the most recent run, successful or not.
    pub fn timeline(&self) -> Option<&ExecutionTimeline> {
        self.timeline.as_ref()
    }

    /// Executes the action.
    pub async fn run(&mut self, service: &dyn SpreadsheetService) -> Result<ActionOutcome> {
        let mut timeline = ExecutionTimeline::new();

        info!(
            "Running {} (dry run: {})",
            self.definition.action, self.dry_run
        );

        let result = match self.definition.action {
            ActionKind::AppendMultipleRows => {
                self.append_multiple_rows(service, &mut timeline).await
            }
            ActionKind::AppendRow => self.append_row(service, &mut timeline).await,
        };

        if let Some(stage) = timeline.failed_stage() {
            warn!("{} failed at stage '{}'", self.definition.action, stage);
        }
        debug!("Run took {:.2?}", timeline.elapsed());

        self.timeline = Some(timeline);
        result
    }

    async fn append_multiple_rows(
        &self,
        service: &dyn SpreadsheetService,
        timeline: &mut ExecutionTimeline,
    ) -> Result<ActionOutcome> {
        let def = &self.definition;

        let sheet = track(timeline, Stage::Validate, async { self.validated_sheet() }).await?;

        let headers = track(timeline, Stage::ReadHeaders, async {
            Ok(service.header_row(&sheet).await?)
        })
        .await?;
        let column_count = headers.len();
        info!("Worksheet '{}' has {} columns", sheet.worksheet_id, column_count);

        let values = track(timeline, Stage::Filter, async {
            let rows = filter_rows(def.values.clone(), &def.filter)?;
            rectangular_values(&rows, column_count)
        })
        .await?;
        info!("{} of {} rows selected", values.len(), def.values.len());

        let last_used_row = self.last_used_row(service, &sheet, timeline).await?;
        let block = compose_append(last_used_row, values)?;

        let response = self.write(service, &sheet, &block, timeline).await?;
        let rows_written = block.values.len();

        // The dry run preview carries the payload itself.
        let output = if self.dry_run {
            response
        } else {
            reduce_write_response(response)
        };

        Ok(self.outcome(block.range, rows_written, output))
    }

    async fn append_row(
        &self,
        service: &dyn SpreadsheetService,
        timeline: &mut ExecutionTimeline,
    ) -> Result<ActionOutcome> {
        let sheet = track(timeline, Stage::Validate, async { self.validated_sheet() }).await?;

        let row = self
            .definition
            .row
            .as_ref()
            .ok_or(ValidationError::EmptyRow)?;

        let last_used_row = self.last_used_row(service, &sheet, timeline).await?;
        let block = compose_single_row(last_used_row, row)?;
        let inserted_row = block.range.start.row;

        let mut response = self.write(service, &sheet, &block, timeline).await?;
        match response.as_object_mut() {
            Some(map) => {
                map.insert("row".to_string(), json!(inserted_row));
            }
            None => response = json!({ "row": inserted_row, "response": response }),
        }

        Ok(self.outcome(block.range, 1, response))
    }

    fn validated_sheet(&self) -> Result<SheetRef> {
        validate_action(&self.definition)?;
        self.definition.sheet_ref()
    }

    async fn last_used_row(
        &self,
        service: &dyn SpreadsheetService,
        sheet: &SheetRef,
        timeline: &mut ExecutionTimeline,
    ) -> Result<u32> {
        track(timeline, Stage::ReadUsedRange, async {
            let address = service.used_range(sheet).await?;
            let last_row = used_range_last_row(&address)?;
            debug!("Used range {} ends at row {}", address, last_row);
            Ok(last_row)
        })
        .await
    }

    async fn write(
        &self,
        service: &dyn SpreadsheetService,
        sheet: &SheetRef,
        block: &WriteBlock,
        timeline: &mut ExecutionTimeline,
    ) -> Result<Value> {
        if self.dry_run {
            info!("[DRY RUN] Would write {} rows to {}", block.values.len(), block.range);
            return Ok(json!({
                "address": block.range.qualified(&sheet.worksheet_id),
                "rowCount": block.range.row_count(),
                "columnCount": block.range.column_count(),
                "values": block.values,
            }));
        }

        info!("Writing {} rows to {}", block.values.len(), block.range);

        track(timeline, Stage::Write, async {
            Ok(service
                .write_range(sheet, &block.range, block.values.clone())
                .await?)
        })
        .await
    }

    fn outcome(&self, range: RangeAddress, rows_written: usize, output: Value) -> ActionOutcome {
        ActionOutcome {
            action: self.definition.action,
            range,
            rows_written,
            output,
            dry_run: self.dry_run,
            finished_at: Utc::now(),
        }
    }
}

/// Awaits one stage and records its start and end on the timeline.
async fn track<T, F>(timeline: &mut ExecutionTimeline, stage: Stage, stage_future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    timeline.add_event(stage, EventType::Started);
    let result = stage_future.await;
    timeline.finish(stage, &result);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::filter::FilterOperator;
    use crate::action::model::{CellValue, FilterSpec, Row, StorageSource};
    use crate::error::ActionError;
    use crate::service::MemoryWorkbook;

    fn workbook() -> MemoryWorkbook {
        let book = MemoryWorkbook::new();
        book.insert_sheet(
            "Sheet1",
            vec![
                vec![CellValue::from("Name"), CellValue::from("Team")],
                vec![CellValue::from("Ann"), CellValue::from("Ops")],
                vec![CellValue::from("Ben"), CellValue::from("Dev")],
            ],
        );
        book
    }

    fn multi(rows: Vec<Row>) -> ActionDefinition {
        ActionDefinition::new(ActionKind::AppendMultipleRows, "book", "Sheet1").with_rows(rows)
    }

    #[tokio::test]
    async fn test_append_multiple_rows() {
        let book = workbook();
        let mut engine = Engine::new(multi(vec![
            Row::from_cells(["Cid", "QA"]),
            Row::from_cells(["Dee"]),
        ]));

        let outcome = engine.run(&book).await.unwrap();

        assert_eq!(outcome.range.to_string(), "A4:B5");
        assert_eq!(outcome.rows_written, 2);
        assert_eq!(outcome.output["address"], "Sheet1!A4:B5");
        assert!(outcome.output.get("values").is_none());
        assert!(outcome.output.get("formulas").is_none());

        let sheet = book.sheet("Sheet1").unwrap();
        assert_eq!(sheet.len(), 5);
        assert_eq!(sheet[4], vec![CellValue::from("Dee"), CellValue::Null]);

        assert_eq!(book.header_calls(), 1);
        assert_eq!(book.used_range_calls(), 1);
        assert_eq!(book.write_calls(), 1);
    }

    #[tokio::test]
    async fn test_last_row_from_used_range() {
        let book = workbook();
        book.set_used_range("Sheet1!A1:B3");
        let mut engine = Engine::new(multi(vec![
            Row::from_cells(["x", "y"]),
            Row::from_cells(["z", "w"]),
        ]));

        let outcome = engine.run(&book).await.unwrap();
        assert_eq!(outcome.range.to_string(), "A4:B5");
    }

    #[tokio::test]
    async fn test_filtered_to_nothing_skips_write() {
        let book = workbook();
        let def = multi(vec![Row::from_cells(["Cid", "QA"])])
            .with_filter(FilterSpec::new(1, FilterOperator::ExactMatch, "Ops"));
        let mut engine = Engine::new(def);

        let err = engine.run(&book).await.unwrap_err();

        assert!(err.is_configuration());
        assert!(err.to_string().contains("No rows to insert"));
        assert_eq!(book.write_calls(), 0);
        assert_eq!(book.used_range_calls(), 0);
        assert_eq!(
            engine.timeline().unwrap().failed_stage(),
            Some(Stage::Filter)
        );
    }

    #[tokio::test]
    async fn test_filter_keeps_matching_rows_in_order() {
        let book = workbook();
        let def = multi(vec![
            Row::from_cells(["Cid", "qa"]),
            Row::from_cells(["Dee", "Ops"]),
            Row::from_cells(["Eve", " QA "]),
        ])
        .with_filter(FilterSpec::new(1, FilterOperator::MatchesAnyOf, vec!["qa"]));
        let mut engine = Engine::new(def);

        let outcome = engine.run(&book).await.unwrap();
        assert_eq!(outcome.rows_written, 2);

        let sheet = book.sheet("Sheet1").unwrap();
        assert_eq!(sheet[3][0], CellValue::from("Cid"));
        assert_eq!(sheet[4][0], CellValue::from("Eve"));
    }

    #[tokio::test]
    async fn test_incomplete_filter_fails_before_remote_calls() {
        let book = workbook();
        let def = multi(vec![Row::from_cells(["a"])]).with_filter(FilterSpec {
            column: Some(0),
            operator: None,
            value: None,
        });
        let mut engine = Engine::new(def);

        assert!(engine.run(&book).await.unwrap_err().is_configuration());
        assert_eq!(book.header_calls(), 0);
        assert_eq!(book.write_calls(), 0);
    }

    #[tokio::test]
    async fn test_sharepoint_without_library() {
        let book = workbook();
        let def = multi(vec![Row::from_cells(["a"])]).with_storage(StorageSource::SharePoint {
            site_id: Some("site".to_string()),
            document_id: None,
        });

        let err = Engine::new(def).run(&book).await.unwrap_err();
        assert!(err.to_string().contains("SharePoint site and document library"));
        assert_eq!(book.header_calls(), 0);
    }

    #[tokio::test]
    async fn test_malformed_used_range() {
        let book = workbook();
        book.set_used_range("Sheet1!A:B");
        let mut engine = Engine::new(multi(vec![Row::from_cells(["a", "b"])]));

        let err = engine.run(&book).await.unwrap_err();
        assert!(matches!(err, ActionError::MalformedAddress(_)));
        assert_eq!(book.write_calls(), 0);
    }

    #[tokio::test]
    async fn test_remote_failure_propagates() {
        let book = workbook();
        book.fail_with("service unavailable");
        let mut engine = Engine::new(multi(vec![Row::from_cells(["a", "b"])]));

        let err = engine.run(&book).await.unwrap_err();
        assert!(matches!(err, ActionError::Remote(_)));
        assert!(err.to_string().contains("service unavailable"));
        assert_eq!(
            engine.timeline().unwrap().failed_stage(),
            Some(Stage::ReadHeaders)
        );
    }

    #[tokio::test]
    async fn test_empty_header_row() {
        let book = MemoryWorkbook::new();
        book.insert_sheet("Sheet1", Vec::new());
        let mut engine = Engine::new(multi(vec![Row::from_cells(["a"])]));

        let err = engine.run(&book).await.unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(book.write_calls(), 0);
    }

    #[tokio::test]
    async fn test_dry_run_skips_write() {
        let book = workbook();
        let mut engine = Engine::new(multi(vec![Row::from_cells(["a", "b", "c"])]));
        engine.set_dry_run(true);

        let outcome = engine.run(&book).await.unwrap();

        assert!(outcome.dry_run);
        assert_eq!(outcome.output["address"], "Sheet1!A4:B4");
        assert_eq!(outcome.output["values"][0].as_array().unwrap().len(), 2);
        assert_eq!(outcome.output["rowCount"], 1);
        assert_eq!(book.write_calls(), 0);
        assert_eq!(book.sheet("Sheet1").unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_dry_run_preview_pads_rows() {
        let book = MemoryWorkbook::new();
        book.insert_sheet("Sheet1", vec![vec![CellValue::from("Name"), CellValue::from("Team")]]);
        let mut engine = Engine::new(multi(vec![Row::from_cells(["Ann"])]));
        engine.set_dry_run(true);

        let outcome = engine.run(&book).await.unwrap();

        assert_eq!(outcome.output["address"], "Sheet1!A2:B2");
        assert_eq!(outcome.output["values"], serde_json::json!([["Ann", null]]));
    }

    #[tokio::test]
    async fn test_append_row_rejects_column_past_sheet_edge() {
        let book = workbook();
        let row: Row = serde_json::from_str(r#"{"50000000": "x"}"#).unwrap();
        let def = ActionDefinition::new(ActionKind::AppendRow, "book", "Sheet1")
            .with_first_row_headers(true)
            .with_single_row(row);
        let mut engine = Engine::new(def);
        engine.set_dry_run(true);

        let err = engine.run(&book).await.unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(book.write_calls(), 0);
    }

    #[tokio::test]
    async fn test_append_row() {
        let book = workbook();
        let def = ActionDefinition::new(ActionKind::AppendRow, "book", "Sheet1")
            .with_single_row(Row::from_cells(["Fay", "Ops", "extra"]));
        let mut engine = Engine::new(def);

        let outcome = engine.run(&book).await.unwrap();

        assert_eq!(outcome.range.to_string(), "A4:C4");
        assert_eq!(outcome.output["row"], 4);
        assert!(outcome.output.get("values").is_some());
        assert_eq!(book.header_calls(), 0);
        assert_eq!(book.write_calls(), 1);
    }

    #[tokio::test]
    async fn test_append_row_from_header_keyed_values() {
        let book = workbook();
        let row: Row = serde_json::from_str(r#"{"1": "Ops"}"#).unwrap();
        let def = ActionDefinition::new(ActionKind::AppendRow, "book", "Sheet1")
            .with_first_row_headers(true)
            .with_single_row(row);

        let outcome = Engine::new(def).run(&book).await.unwrap();

        assert_eq!(outcome.range.to_string(), "A4:B4");
        let sheet = book.sheet("Sheet1").unwrap();
        assert_eq!(sheet[3], vec![CellValue::Null, CellValue::from("Ops")]);
    }

    #[tokio::test]
    async fn test_timeline_records_stages() {
        let book = workbook();
        let mut engine = Engine::new(multi(vec![Row::from_cells(["a", "b"])]));
        engine.run(&book).await.unwrap();

        assert_eq!(
            engine.timeline().unwrap().completed_stages(),
            vec![
                Stage::Validate,
                Stage::ReadHeaders,
                Stage::Filter,
                Stage::ReadUsedRange,
                Stage::Write
            ]
        );
    }
}
