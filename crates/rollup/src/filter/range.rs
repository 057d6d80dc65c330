//! Range and category filters over aggregated views.

use chrono::NaiveDate;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregate::{AggregatedRow, AggregatedView, EmptyReason, EmptyView, Outcome};
use crate::error::{Result, RollupError};
use crate::schema::{KeyType, KeyValue};

// ---------------------------------------------------------------------------
// Configuration and filter specs
// ---------------------------------------------------------------------------

/// Configuration for filter domains.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Numeric keys with at most this many distinct values are offered as a
    /// discrete list instead of a continuous range.
    pub discrete_limit: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            discrete_limit: 100,
        }
    }
}

/// A row filter over the key column of an aggregated view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterSpec {
    /// Keep every row.
    #[default]
    All,
    /// Inclusive numeric bounds.
    NumericRange { min: f64, max: f64 },
    /// Inclusive date bounds; timestamps are compared by date.
    DateRange { start: NaiveDate, end: NaiveDate },
    /// Keep rows whose rendered key is in the set.
    Categories { values: Vec<String> },
}

impl FilterSpec {
    pub fn name(&self) -> &'static str {
        match self {
            FilterSpec::All => "all",
            FilterSpec::NumericRange { .. } => "numeric_range",
            FilterSpec::DateRange { .. } => "date_range",
            FilterSpec::Categories { .. } => "categories",
        }
    }

    /// Whether this spec can be applied to keys of `key_type`.
    pub fn fits(&self, key_type: KeyType) -> bool {
        match self {
            FilterSpec::All => true,
            FilterSpec::NumericRange { .. } => key_type == KeyType::Numeric,
            FilterSpec::DateRange { .. } => key_type == KeyType::Date,
            FilterSpec::Categories { .. } => {
                matches!(key_type, KeyType::Categorical | KeyType::FixedCategorical)
            }
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            FilterSpec::NumericRange { min, max } => {
                if min.is_nan() || max.is_nan() {
                    return Err(RollupError::InvalidFilter(
                        "numeric range bounds must be numbers".to_string(),
                    ));
                }
                if min > max {
                    return Err(RollupError::InvalidFilter(format!(
                        "numeric range minimum {min} is greater than maximum {max}"
                    )));
                }
            }
            FilterSpec::DateRange { start, end } if start > end => {
                return Err(RollupError::InvalidFilter(format!(
                    "date range start {start} is after end {end}"
                )));
            }
            _ => {}
        }
        Ok(())
    }

    fn keeps(&self, key: &KeyValue) -> bool {
        match self {
            FilterSpec::All => true,
            FilterSpec::NumericRange { min, max } => {
                key.as_f64().is_some_and(|v| v >= *min && v <= *max)
            }
            FilterSpec::DateRange { start, end } => {
                key.date().is_some_and(|d| d >= *start && d <= *end)
            }
            FilterSpec::Categories { values } => {
                let label = key.label();
                values.iter().any(|v| *v == label)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Filter domains: what a caller can choose from
// ---------------------------------------------------------------------------

/// The values a filter over a view may select from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterDomain {
    /// Few distinct numeric keys, ascending.
    Discrete { values: Vec<f64> },
    /// Many numeric keys, as bounds.
    Continuous { min: f64, max: f64 },
    DateRange { start: NaiveDate, end: NaiveDate },
    /// Distinct labels in view order.
    Categories { values: Vec<String> },
}

impl FilterDomain {
    /// Domain of the key column of `view`.
    pub fn of(view: &AggregatedView, config: &FilterConfig) -> Self {
        match view.key_type {
            KeyType::Numeric => {
                let mut values: Vec<f64> = view.rows.iter().filter_map(|r| r.key.as_f64()).collect();
                values.sort_by(f64::total_cmp);
                values.dedup();
                if values.len() <= config.discrete_limit {
                    FilterDomain::Discrete { values }
                } else {
                    FilterDomain::Continuous {
                        min: values.first().copied().unwrap_or_default(),
                        max: values.last().copied().unwrap_or_default(),
                    }
                }
            }
            KeyType::Date => {
                let dates: Vec<NaiveDate> = view.rows.iter().filter_map(|r| r.key.date()).collect();
                match (dates.iter().min(), dates.iter().max()) {
                    (Some(start), Some(end)) => FilterDomain::DateRange {
                        start: *start,
                        end: *end,
                    },
                    _ => FilterDomain::Categories { values: Vec::new() },
                }
            }
            KeyType::FixedCategorical | KeyType::Categorical => {
                let values: IndexSet<String> = view.rows.iter().map(|r| r.key.label()).collect();
                FilterDomain::Categories {
                    values: values.into_iter().collect(),
                }
            }
        }
    }

    /// A spec that selects the whole domain.
    pub fn default_spec(&self) -> FilterSpec {
        match self {
            FilterDomain::Discrete { values } => FilterSpec::NumericRange {
                min: values.first().copied().unwrap_or_default(),
                max: values.last().copied().unwrap_or_default(),
            },
            FilterDomain::Continuous { min, max } => FilterSpec::NumericRange {
                min: *min,
                max: *max,
            },
            FilterDomain::DateRange { start, end } => FilterSpec::DateRange {
                start: *start,
                end: *end,
            },
            FilterDomain::Categories { values } => FilterSpec::Categories {
                values: values.clone(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Filtered view
// ---------------------------------------------------------------------------

/// Summary counts attached to a pipeline result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ViewMetadata {
    pub source_rows: usize,
    pub dropped_rows: usize,
    pub aggregated_rows: usize,
    pub filtered_rows: usize,
    pub key_type: KeyType,
}

/// An aggregated view restricted to the rows a filter kept.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilteredView {
    pub view: AggregatedView,
    /// Row count before filtering.
    pub aggregated_rows: usize,
}

impl FilteredView {
    /// Wrap an unfiltered view.
    pub fn unfiltered(view: AggregatedView) -> Self {
        let aggregated_rows = view.rows.len();
        Self {
            view,
            aggregated_rows,
        }
    }

    pub fn rows(&self) -> &[AggregatedRow] {
        &self.view.rows
    }

    pub fn metadata(&self) -> ViewMetadata {
        ViewMetadata {
            source_rows: self.view.source_rows,
            dropped_rows: self.view.dropped_rows,
            aggregated_rows: self.aggregated_rows,
            filtered_rows: self.view.rows.len(),
            key_type: self.view.key_type,
        }
    }
}

/// Applies filter specs to aggregated views.
#[derive(Debug, Clone, Default)]
pub struct RangeFilter {
    config: FilterConfig,
}

impl RangeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FilterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Domain a caller may filter `view` over.
    pub fn domain(&self, view: &AggregatedView) -> FilterDomain {
        FilterDomain::of(view, &self.config)
    }

    /// Keep the rows of `view` that `spec` selects, preserving order.
    ///
    /// A spec that does not fit the key type, or has unusable bounds, is an
    /// error. Removing every row yields [`EmptyReason::FilteredOut`].
    pub fn apply(&self, view: &AggregatedView, spec: &FilterSpec) -> Result<Outcome<FilteredView>> {
        if !spec.fits(view.key_type) {
            return Err(RollupError::FilterMismatch {
                filter: spec.name().to_string(),
                key_type: view.key_type.to_string(),
            });
        }
        spec.validate()?;

        let rows: Vec<AggregatedRow> = view
            .rows
            .iter()
            .filter(|row| spec.keeps(&row.key))
            .cloned()
            .collect();

        debug!(
            filter = spec.name(),
            before = view.rows.len(),
            after = rows.len(),
            "applied filter"
        );

        if rows.is_empty() {
            return Ok(Outcome::Empty(EmptyView {
                reason: EmptyReason::FilteredOut,
                source_rows: view.source_rows,
                dropped_rows: view.dropped_rows,
                key_type: Some(view.key_type),
            }));
        }

        Ok(Outcome::Ready(FilteredView {
            aggregated_rows: view.rows.len(),
            view: AggregatedView {
                rows,
                ..view.clone()
            },
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Reduction;
    use chrono::Weekday;

    fn view(key_type: KeyType, keys: Vec<KeyValue>) -> AggregatedView {
        AggregatedView {
            key_column: "k".to_string(),
            metric_columns: vec!["v".to_string()],
            key_type,
            reduction: Reduction::Sum,
            rows: keys
                .into_iter()
                .enumerate()
                .map(|(i, key)| AggregatedRow {
                    key,
                    values: vec![Some(i as f64)],
                })
                .collect(),
            source_rows: 10,
            dropped_rows: 1,
        }
    }

    fn hours() -> AggregatedView {
        view(
            KeyType::Numeric,
            (0..24).map(|h| KeyValue::Number(f64::from(h))).collect(),
        )
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_numeric_range_is_inclusive() {
        let spec = FilterSpec::NumericRange { min: 8.0, max: 9.5 };
        let filtered = RangeFilter::new().apply(&hours(), &spec).unwrap().into_ready().unwrap();

        assert_eq!(filtered.view.labels(), vec!["8", "9"]);
        let meta = filtered.metadata();
        assert_eq!(meta.aggregated_rows, 24);
        assert_eq!(meta.filtered_rows, 2);
        assert_eq!(meta.source_rows, 10);
        assert_eq!(meta.dropped_rows, 1);
    }

    #[test]
    fn test_date_range_compares_timestamps_by_date() {
        let v = view(
            KeyType::Date,
            vec![
                KeyValue::Date(ymd(2024, 1, 1)),
                KeyValue::Timestamp(ymd(2024, 1, 2).and_hms_opt(23, 59, 0).unwrap()),
                KeyValue::Date(ymd(2024, 1, 3)),
            ],
        );
        let spec = FilterSpec::DateRange {
            start: ymd(2024, 1, 2),
            end: ymd(2024, 1, 2),
        };
        let filtered = RangeFilter::new().apply(&v, &spec).unwrap().into_ready().unwrap();
        assert_eq!(filtered.rows().len(), 1);
    }

    #[test]
    fn test_categories_keep_view_order() {
        let v = view(
            KeyType::FixedCategorical,
            vec![
                KeyValue::Weekday(Weekday::Mon),
                KeyValue::Weekday(Weekday::Wed),
                KeyValue::Weekday(Weekday::Fri),
            ],
        );
        let spec = FilterSpec::Categories {
            values: vec!["Friday".into(), "Monday".into()],
        };
        let filtered = RangeFilter::new().apply(&v, &spec).unwrap().into_ready().unwrap();
        assert_eq!(filtered.view.labels(), vec!["Monday", "Friday"]);
    }

    #[test]
    fn test_filter_everything_out() {
        let spec = FilterSpec::NumericRange { min: 100.0, max: 200.0 };
        let outcome = RangeFilter::new().apply(&hours(), &spec).unwrap();
        let empty = outcome.empty().unwrap();
        assert_eq!(empty.reason, EmptyReason::FilteredOut);
        assert_eq!(empty.key_type, Some(KeyType::Numeric));
    }

    #[test]
    fn test_mismatched_and_invalid_specs() {
        let filter = RangeFilter::new();
        let categories = FilterSpec::Categories { values: vec![] };
        assert!(matches!(
            filter.apply(&hours(), &categories),
            Err(RollupError::FilterMismatch { .. })
        ));

        let inverted = FilterSpec::NumericRange { min: 5.0, max: 1.0 };
        assert!(matches!(
            filter.apply(&hours(), &inverted),
            Err(RollupError::InvalidFilter(_))
        ));

        let nan = FilterSpec::NumericRange { min: f64::NAN, max: 1.0 };
        assert!(matches!(filter.apply(&hours(), &nan), Err(RollupError::InvalidFilter(_))));
    }

    #[test]
    fn test_filter_is_idempotent() {
        let filter = RangeFilter::new();
        let spec = FilterSpec::NumericRange { min: 3.0, max: 17.0 };
        let once = filter.apply(&hours(), &spec).unwrap().into_ready().unwrap();
        let twice = filter.apply(&once.view, &spec).unwrap().into_ready().unwrap();
        assert_eq!(once.rows(), twice.rows());
    }

    #[test]
    fn test_domain_switches_to_continuous() {
        let filter = RangeFilter::with_config(FilterConfig { discrete_limit: 10 });
        assert_eq!(
            filter.domain(&hours()),
            FilterDomain::Continuous { min: 0.0, max: 23.0 }
        );

        let small = RangeFilter::new().domain(&hours());
        assert!(matches!(small, FilterDomain::Discrete { ref values } if values.len() == 24));
    }

    #[test]
    fn test_default_spec_selects_everything() {
        let filter = RangeFilter::new();
        let v = hours();
        let spec = filter.domain(&v).default_spec();
        let filtered = filter.apply(&v, &spec).unwrap().into_ready().unwrap();
        assert_eq!(filtered.rows(), v.rows.as_slice());
    }

    #[test]
    fn test_spec_deserializes_from_tagged_json() {
        let spec: FilterSpec =
            serde_json::from_str(r#"{"type":"numeric_range","min":1,"max":2.5}"#).unwrap();
        assert_eq!(spec, FilterSpec::NumericRange { min: 1.0, max: 2.5 });
    }
}
