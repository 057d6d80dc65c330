//! The end-to-end pipeline: aggregate, then filter.

use serde::{Deserialize, Serialize};

use crate::aggregate::{AggregationEngine, AggregationSpec, DerivationMode, Outcome, Reduction};
use crate::error::Result;
use crate::filter::{FilterSpec, FilteredView, RangeFilter};
use crate::input::DataTable;

/// One complete selection: which columns, how to key them, how to reduce,
/// and which rows to keep.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub x_column: String,
    #[serde(default)]
    pub derivation: DerivationMode,
    #[serde(default)]
    pub y_columns: Vec<String>,
    #[serde(default)]
    pub reduction: Reduction,
    #[serde(default)]
    pub filter: FilterSpec,
}

impl PipelineConfig {
    pub fn new(x_column: impl Into<String>) -> Self {
        Self {
            x_column: x_column.into(),
            ..Self::default()
        }
    }

    pub fn derive(mut self, derivation: DerivationMode) -> Self {
        self.derivation = derivation;
        self
    }

    pub fn metric(mut self, column: impl Into<String>) -> Self {
        self.y_columns.push(column.into());
        self
    }

    pub fn metrics<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.y_columns.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn reduce(mut self, reduction: Reduction) -> Self {
        self.reduction = reduction;
        self
    }

    pub fn filter(mut self, filter: FilterSpec) -> Self {
        self.filter = filter;
        self
    }

    pub fn aggregation_spec(&self) -> AggregationSpec<'_> {
        AggregationSpec {
            x_column: &self.x_column,
            derivation: self.derivation,
            y_columns: &self.y_columns,
            reduction: self.reduction,
        }
    }
}

/// Aggregation engine and range filter run back to back.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    engine: AggregationEngine,
    filter: RangeFilter,
}

impl Pipeline {
    pub fn new(engine: AggregationEngine, filter: RangeFilter) -> Self {
        Self { engine, filter }
    }

    pub fn filter(&self) -> &RangeFilter {
        &self.filter
    }

    /// Run `config` over `table`. The table is never modified.
    pub fn run(&self, table: &DataTable, config: &PipelineConfig) -> Result<Outcome<FilteredView>> {
        let view = match self.engine.aggregate(table, config.aggregation_spec())? {
            Outcome::Ready(view) => view,
            Outcome::Empty(empty) => return Ok(Outcome::Empty(empty)),
        };

        if config.filter == FilterSpec::All {
            return Ok(Outcome::Ready(FilteredView::unfiltered(view)));
        }
        self.filter.apply(&view, &config.filter)
    }
}

/// Run `config` over `table` with default inference and filter settings.
pub fn run_pipeline(table: &DataTable, config: &PipelineConfig) -> Result<Outcome<FilteredView>> {
    Pipeline::default().run(table, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::EmptyReason;
    use crate::error::RollupError;

    fn table() -> DataTable {
        DataTable::from_rows(
            vec!["ts".into(), "amount".into()],
            vec![
                vec!["2024-01-01T08:00:00".into(), "10".into()],
                vec!["2024-01-01T09:00:00".into(), "7".into()],
                vec!["2024-01-01T13:00:00".into(), "2".into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_pipeline_applies_filter_after_aggregation() {
        let config = PipelineConfig::new("ts")
            .derive(DerivationMode::Hour)
            .metric("amount")
            .filter(FilterSpec::NumericRange { min: 9.0, max: 23.0 });

        let result = run_pipeline(&table(), &config).unwrap().into_ready().unwrap();
        let meta = result.metadata();
        assert_eq!(result.view.labels(), vec!["9", "13"]);
        assert_eq!(meta.aggregated_rows, 3);
        assert_eq!(meta.filtered_rows, 2);
        assert_eq!(meta.source_rows, 3);
    }

    #[test]
    fn test_empty_aggregation_short_circuits_filter() {
        // An incompatible filter is not checked when there is nothing to filter
        let config = PipelineConfig::new("ts")
            .derive(DerivationMode::Hour)
            .filter(FilterSpec::Categories { values: vec![] });
        let outcome = run_pipeline(&table(), &config).unwrap();
        assert_eq!(outcome.empty().map(|e| e.reason), Some(EmptyReason::NoMetrics));
    }

    #[test]
    fn test_filter_mismatch_is_reported() {
        let config = PipelineConfig::new("ts")
            .derive(DerivationMode::Weekday)
            .metric("amount")
            .filter(FilterSpec::NumericRange { min: 0.0, max: 1.0 });
        assert!(matches!(
            run_pipeline(&table(), &config),
            Err(RollupError::FilterMismatch { .. })
        ));
    }

    #[test]
    fn test_config_from_json_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"x_column":"ts","y_columns":["amount"]}"#).unwrap();
        assert_eq!(config.derivation, DerivationMode::None);
        assert_eq!(config.reduction, Reduction::Sum);
        assert_eq!(config.filter, FilterSpec::All);
    }
}
