//! Row Filtering
//!
//! Evaluates a single-column predicate over candidate rows before they are
//! appended. A row missing the filter column is compared as an empty
//! string, never reported as an error.

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use super::model::{CellValue, FilterSpec, FilterValue, Row};
use super::validator::ValidationError;
use crate::error::Result;

/// Comparison applied to the filter column.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    /// Trimmed cell equals the trimmed filter value (case-sensitive).
    #[serde(alias = "TEXT_EXACTLY_MATCHES")]
    ExactMatch,

    #[serde(alias = "TEXT_DOES_NOT_EXACTLY_MATCH")]
    NotExactMatch,

    /// Trimmed, lower-cased cell is one of the lower-cased filter values.
    #[serde(alias = "TEXT_MATCHES_ANY_OF")]
    MatchesAnyOf,

    #[serde(alias = "TEXT_MATCHES_NONE_OF")]
    MatchesNoneOf,
}

impl FilterOperator {
    pub const ALL: [FilterOperator; 4] = [
        Self::ExactMatch,
        Self::NotExactMatch,
        Self::MatchesAnyOf,
        Self::MatchesNoneOf,
    ];

    /// Label shown in operator pickers.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ExactMatch => "(Text) Exactly matches",
            Self::NotExactMatch => "(Text) Does not exactly match",
            Self::MatchesAnyOf => "(Text) Matches any of",
            Self::MatchesNoneOf => "(Text) Matches none of",
        }
    }

    /// Returns true for operators that compare against a set of values.
    pub fn takes_list(&self) -> bool {
        matches!(self, Self::MatchesAnyOf | Self::MatchesNoneOf)
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::ExactMatch => "exact_match",
            Self::NotExactMatch => "not_exact_match",
            Self::MatchesAnyOf => "matches_any_of",
            Self::MatchesNoneOf => "matches_none_of",
        };
        f.write_str(tag)
    }
}

/// A validated filter ready to be applied to rows.
#[derive(Debug, Clone, PartialEq)]
pub struct RowFilter {
    column: usize,
    operator: FilterOperator,
    values: Vec<String>,
}

impl RowFilter {
    /// Builds a filter from user settings.
    ///
    /// Returns `Ok(None)` when no filter column is selected. A selected
    /// column without an operator or value is a configuration error.
    pub fn from_spec(spec: &FilterSpec) -> Result<Option<Self>> {
        let Some(column) = spec.column else {
            return Ok(None);
        };

        let (operator, value) = match (spec.operator, spec.value.as_ref()) {
            (Some(op), Some(value)) if !value.is_missing() => (op, value),
            _ => return Err(ValidationError::IncompleteFilter.into()),
        };

        Ok(Some(Self {
            column,
            operator,
            values: normalize_values(value),
        }))
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn operator(&self) -> FilterOperator {
        self.operator
    }

    /// Tests one row against the predicate.
    pub fn matches(&self, row: &Row) -> bool {
        let text = row.get(self.column).map(CellValue::as_text).unwrap_or_default();
        let cell = text.trim();

        match self.operator {
            FilterOperator::ExactMatch => self.first() == Some(cell),
            FilterOperator::NotExactMatch => self.first() != Some(cell),
            FilterOperator::MatchesAnyOf => self.contains_folded(cell),
            FilterOperator::MatchesNoneOf => !self.contains_folded(cell),
        }
    }

    fn first(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }

    fn contains_folded(&self, cell: &str) -> bool {
        let folded = cell.to_lowercase();
        self.values.iter().any(|v| *v == folded)
    }
}

/// List values are trimmed and lower-cased; a single value is only trimmed.
fn normalize_values(value: &FilterValue) -> Vec<String> {
    match value {
        FilterValue::List(items) => items
            .iter()
            .map(|v| v.as_text().trim().to_lowercase())
            .collect(),
        FilterValue::Single(v) => vec![v.as_text().trim().to_string()],
    }
}

/// Returns the rows that satisfy the filter, preserving their order.
///
/// With no filter column selected the rows are returned unchanged.
pub fn filter_rows(rows: Vec<Row>, spec: &FilterSpec) -> Result<Vec<Row>> {
    let Some(filter) = RowFilter::from_spec(spec)? else {
        return Ok(rows);
    };

    let total = rows.len();
    let kept: Vec<Row> = rows.into_iter().filter(|row| filter.matches(row)).collect();

    debug!(
        "Filter on column {} ({}): kept {} of {} rows",
        filter.column,
        filter.operator,
        kept.len(),
        total
    );

    Ok(kept)
}
