//! Aggregated views and the explicit empty-result signal.

use serde::Serialize;

use super::reduction::Reduction;
use crate::schema::{KeyType, KeyValue};

/// One aggregated row: a unique key and one cell per metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedRow {
    pub key: KeyValue,
    /// `None` marks a missing result cell.
    pub values: Vec<Option<f64>>,
}

/// One row per distinct key, ordered by the rule for its key type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedView {
    pub key_column: String,
    pub metric_columns: Vec<String>,
    pub key_type: KeyType,
    pub reduction: Reduction,
    pub rows: Vec<AggregatedRow>,
    /// Rows in the source table.
    pub source_rows: usize,
    /// Source rows whose key could not be computed.
    pub dropped_rows: usize,
}

impl AggregatedView {
    /// Column names in output order: key first, then metrics.
    pub fn columns(&self) -> Vec<&str> {
        std::iter::once(self.key_column.as_str())
            .chain(self.metric_columns.iter().map(String::as_str))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Key labels in row order.
    pub fn labels(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.key.label()).collect()
    }

    /// Row whose key renders as `label`.
    pub fn row(&self, label: &str) -> Option<&AggregatedRow> {
        self.rows.iter().find(|r| r.key.label() == label)
    }

    /// Cell for a key label and metric name.
    pub fn value(&self, label: &str, metric: &str) -> Option<f64> {
        let index = self.metric_columns.iter().position(|m| m == metric)?;
        self.row(label).and_then(|r| r.values.get(index).copied().flatten())
    }
}

/// Why a run produced no view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyReason {
    /// No usable metric column was selected.
    NoMetrics,
    /// Every source row was dropped, or the table has no rows.
    NoGroups,
    /// The filter removed every aggregated row.
    FilteredOut,
}

impl EmptyReason {
    pub fn describe(&self) -> &'static str {
        match self {
            EmptyReason::NoMetrics => "no metric column selected",
            EmptyReason::NoGroups => "no rows produced a grouping key",
            EmptyReason::FilteredOut => "the filter excludes every row",
        }
    }
}

/// The explicit "no data" state, with the counts known at that point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmptyView {
    pub reason: EmptyReason,
    pub source_rows: usize,
    pub dropped_rows: usize,
    /// Known once aggregation has produced at least one group.
    pub key_type: Option<KeyType>,
}

/// Either a computed view or an explicit empty result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome<T> {
    Empty(EmptyView),
    Ready(T),
}

impl<T> Outcome<T> {
    pub fn is_empty(&self) -> bool {
        matches!(self, Outcome::Empty(_))
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Outcome::Ready(view) => Some(view),
            Outcome::Empty(_) => None,
        }
    }

    pub fn into_ready(self) -> Option<T> {
        match self {
            Outcome::Ready(view) => Some(view),
            Outcome::Empty(_) => None,
        }
    }

    pub fn empty(&self) -> Option<&EmptyView> {
        match self {
            Outcome::Empty(empty) => Some(empty),
            Outcome::Ready(_) => None,
        }
    }
}
