//! Error types for the Rollup library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Rollup operations.
///
/// Configuration errors (an invalid X/Y selection, a derivation mode that
/// does not fit the X column, a filter that does not fit the key) reject the
/// request before any aggregation runs. Cell-level parse failures never show
/// up here; they are folded into ratios and dropped-row counts.
#[derive(Debug, Error)]
pub enum RollupError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Empty file or no data to aggregate.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Rows do not line up with the header.
    #[error("Malformed table: row {row} has {found} cells, expected {expected}")]
    MalformedTable {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A selected column does not exist in the table.
    #[error("Unknown column '{0}'")]
    UnknownColumn(String),

    /// A metric column is also the grouping column.
    #[error("Column '{0}' cannot be both the key and a metric")]
    MetricIsKey(String),

    /// The same metric column was selected twice.
    #[error("Metric column '{0}' selected more than once")]
    DuplicateMetric(String),

    /// More metric columns than the pipeline accepts.
    #[error("At most {max} metric columns may be selected, got {found}")]
    TooManyMetrics { max: usize, found: usize },

    /// A time derivation was requested on a column that is not time-like.
    #[error("Derivation '{mode}' requires a time-like column, but '{column}' is not")]
    DerivationRequiresTemporal { column: String, mode: String },

    /// The filter does not apply to the resolved key type.
    #[error("Filter '{filter}' cannot be applied to a {key_type} key")]
    FilterMismatch { filter: String, key_type: String },

    /// Filter bounds are not usable.
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// Invalid delimiter detected or specified.
    #[error("Invalid delimiter: {0}")]
    InvalidDelimiter(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RollupError {
    /// Returns true if the error rejects a selection rather than signalling a
    /// broken input or environment.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            RollupError::UnknownColumn(_)
                | RollupError::MetricIsKey(_)
                | RollupError::DuplicateMetric(_)
                | RollupError::TooManyMetrics { .. }
                | RollupError::DerivationRequiresTemporal { .. }
                | RollupError::FilterMismatch { .. }
                | RollupError::InvalidFilter(_)
                | RollupError::Config(_)
        )
    }
}

/// Result type alias for Rollup operations.
pub type Result<T> = std::result::Result<T, RollupError>;
