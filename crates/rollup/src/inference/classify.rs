//! Column classification from fuzzy-parse success ratios.

use serde::Serialize;

use super::cell::{ParseFailure, parse_number, parse_timestamp};
use crate::input::DataTable;

/// Thresholds for the parse-ratio heuristic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InferenceConfig {
    /// A column is time-like when strictly more than this share parses as a timestamp.
    pub time_threshold: f64,
    /// A column is numeric-like when strictly more than this share parses as a number.
    pub numeric_threshold: f64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            time_threshold: 0.5,
            numeric_threshold: 0.5,
        }
    }
}

/// What a column can be used as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnClassification {
    /// Numeric-like only.
    Numeric,
    /// Time-like only.
    Temporal,
    /// Neither predicate holds (includes all-missing columns).
    Categorical,
    /// Both time-like and numeric-like, e.g. Unix epoch integers.
    Mixed,
}

impl ColumnClassification {
    pub fn from_flags(time_like: bool, numeric_like: bool) -> Self {
        match (time_like, numeric_like) {
            (true, true) => ColumnClassification::Mixed,
            (true, false) => ColumnClassification::Temporal,
            (false, true) => ColumnClassification::Numeric,
            (false, false) => ColumnClassification::Categorical,
        }
    }

    pub fn is_time_like(&self) -> bool {
        matches!(
            self,
            ColumnClassification::Temporal | ColumnClassification::Mixed
        )
    }

    pub fn is_numeric_like(&self) -> bool {
        matches!(
            self,
            ColumnClassification::Numeric | ColumnClassification::Mixed
        )
    }
}

/// Parse statistics and classification for one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnProfile {
    pub name: String,
    pub position: usize,
    /// Number of cells, missing included.
    pub count: usize,
    pub missing_count: usize,
    /// Share of non-missing cells that parse as a timestamp.
    pub time_parse_ratio: f64,
    /// Share of non-missing cells that parse as a number.
    pub numeric_parse_ratio: f64,
    pub classification: ColumnClassification,
}

impl ColumnProfile {
    pub fn is_time_like(&self) -> bool {
        self.classification.is_time_like()
    }

    pub fn is_numeric_like(&self) -> bool {
        self.classification.is_numeric_like()
    }
}

/// Profiles for every column of a table, in table order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableProfile {
    pub columns: Vec<ColumnProfile>,
}

impl TableProfile {
    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Columns usable as a time-derived X.
    pub fn time_candidates(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.is_time_like())
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Columns usable as a Y metric.
    pub fn numeric_candidates(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.is_numeric_like())
            .map(|c| c.name.as_str())
            .collect()
    }
}

/// Classifies columns by how many of their values parse.
#[derive(Debug, Clone, Default)]
pub struct TypeInference {
    config: InferenceConfig,
}

impl TypeInference {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: InferenceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Profile every column of a table.
    pub fn profile_table(&self, table: &DataTable) -> TableProfile {
        TableProfile {
            columns: (0..table.column_count())
                .map(|i| self.profile_column(table, i))
                .collect(),
        }
    }

    /// Profile one column by position.
    pub fn profile_column(&self, table: &DataTable, position: usize) -> ColumnProfile {
        let name = table.headers.get(position).cloned().unwrap_or_default();
        self.profile_values(name, position, table.column_values(position))
    }

    /// Profile an arbitrary sequence of raw values.
    pub fn profile_values<'a>(
        &self,
        name: String,
        position: usize,
        values: impl IntoIterator<Item = &'a str>,
    ) -> ColumnProfile {
        let mut count = 0;
        let mut missing_count = 0;
        let mut time_hits = 0;
        let mut numeric_hits = 0;

        for value in values {
            count += 1;
            match parse_number(value) {
                Err(ParseFailure::Missing) => {
                    missing_count += 1;
                    continue;
                }
                Ok(_) => numeric_hits += 1,
                Err(ParseFailure::Invalid(_)) => {}
            }
            if parse_timestamp(value).is_ok() {
                time_hits += 1;
            }
        }

        let present = count - missing_count;
        let ratio = |hits: usize| {
            if present == 0 {
                0.0
            } else {
                hits as f64 / present as f64
            }
        };
        let time_parse_ratio = ratio(time_hits);
        let numeric_parse_ratio = ratio(numeric_hits);

        let classification = ColumnClassification::from_flags(
            time_parse_ratio > self.config.time_threshold,
            numeric_parse_ratio > self.config.numeric_threshold,
        );

        ColumnProfile {
            name,
            position,
            count,
            missing_count,
            time_parse_ratio,
            numeric_parse_ratio,
            classification,
        }
    }
}
