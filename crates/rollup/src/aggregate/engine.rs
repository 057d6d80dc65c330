//! Group-by aggregation of metric columns over a derived key.

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::{debug, warn};

use super::derive::{DerivationMode, KeyDeriver};
use super::reduction::{Accumulator, Reduction};
use super::view::{AggregatedRow, AggregatedView, EmptyReason, EmptyView, Outcome};
use crate::error::{Result, RollupError};
use crate::inference::{TypeInference, parse_number};
use crate::input::DataTable;
use crate::schema::{KeyType, KeyValue};

/// Most metric columns one run may reduce.
pub const MAX_METRICS: usize = 3;

/// The aggregation part of a pipeline selection.
#[derive(Debug, Clone, Copy)]
pub struct AggregationSpec<'a> {
    pub x_column: &'a str,
    pub derivation: DerivationMode,
    pub y_columns: &'a [String],
    pub reduction: Reduction,
}

/// Accumulators for one key.
struct Group {
    key: KeyValue,
    accumulators: Vec<Accumulator>,
}

impl Group {
    fn new(key: KeyValue, reduction: Reduction, metrics: usize) -> Self {
        Self {
            key,
            accumulators: (0..metrics).map(|_| Accumulator::new(reduction)).collect(),
        }
    }

    fn finish(self) -> AggregatedRow {
        AggregatedRow {
            key: self.key,
            values: self.accumulators.into_iter().map(Accumulator::finish).collect(),
        }
    }
}

/// Derives keys, coerces metrics, groups, reduces and orders.
#[derive(Debug, Clone, Default)]
pub struct AggregationEngine {
    inference: TypeInference,
}

impl AggregationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inference(inference: TypeInference) -> Self {
        Self { inference }
    }

    /// Aggregate `table` according to `spec`.
    ///
    /// Configuration errors are returned as `Err`; a run that has nothing to
    /// show returns [`Outcome::Empty`].
    pub fn aggregate(
        &self,
        table: &DataTable,
        spec: AggregationSpec<'_>,
    ) -> Result<Outcome<AggregatedView>> {
        table.validate()?;

        let x_index = table
            .column_index(spec.x_column)
            .ok_or_else(|| RollupError::UnknownColumn(spec.x_column.to_string()))?;
        validate_metrics(spec)?;

        let x_profile = self.inference.profile_column(table, x_index);
        let deriver = KeyDeriver::new(&x_profile, spec.derivation)?;

        let metrics: Vec<(usize, &str)> = spec
            .y_columns
            .iter()
            .filter_map(|name| match table.column_index(name) {
                Some(index) => Some((index, name.as_str())),
                None => {
                    warn!(column = %name, "skipping metric column not present in table");
                    None
                }
            })
            .collect();

        let source_rows = table.row_count();
        if metrics.is_empty() {
            return Ok(Outcome::Empty(EmptyView {
                reason: EmptyReason::NoMetrics,
                source_rows,
                dropped_rows: 0,
                key_type: None,
            }));
        }

        let mut groups: IndexMap<String, Group> = IndexMap::new();
        let mut dropped_rows = 0;

        for row in &table.rows {
            let Some(key) = deriver.derive(&row[x_index]) else {
                dropped_rows += 1;
                continue;
            };
            let group = groups
                .entry(key.label())
                .or_insert_with(|| Group::new(key, spec.reduction, metrics.len()));
            for (acc, (index, _)) in group.accumulators.iter_mut().zip(&metrics) {
                acc.add(parse_number(&row[*index]).ok());
            }
        }

        if groups.is_empty() {
            debug!(source_rows, dropped_rows, "aggregation produced no groups");
            return Ok(Outcome::Empty(EmptyView {
                reason: EmptyReason::NoGroups,
                source_rows,
                dropped_rows,
                key_type: None,
            }));
        }

        let mut rows: Vec<AggregatedRow> = groups.into_values().map(Group::finish).collect();
        let key_type = KeyType::resolve(rows.iter().map(|r| &r.key));
        // Stable, so free categorical keys keep first-occurrence order
        rows.sort_by(|a, b| key_type.compare(&a.key, &b.key));

        let metric_columns: Vec<String> = metrics.iter().map(|(_, name)| name.to_string()).collect();
        let key_column = key_column_name(spec.x_column, spec.derivation, &metric_columns);

        debug!(
            x = spec.x_column,
            derivation = %spec.derivation,
            reduction = %spec.reduction,
            %key_type,
            groups = rows.len(),
            source_rows,
            dropped_rows,
            "aggregated table"
        );

        Ok(Outcome::Ready(AggregatedView {
            key_column,
            metric_columns,
            key_type,
            reduction: spec.reduction,
            rows,
            source_rows,
            dropped_rows,
        }))
    }
}

fn validate_metrics(spec: AggregationSpec<'_>) -> Result<()> {
    if spec.y_columns.len() > MAX_METRICS {
        return Err(RollupError::TooManyMetrics {
            max: MAX_METRICS,
            found: spec.y_columns.len(),
        });
    }

    let mut seen = HashSet::new();
    for name in spec.y_columns {
        if name == spec.x_column {
            return Err(RollupError::MetricIsKey(name.clone()));
        }
        if !seen.insert(name.as_str()) {
            return Err(RollupError::DuplicateMetric(name.clone()));
        }
    }
    Ok(())
}

/// X itself without derivation, else the mode name unless a metric already uses it.
fn key_column_name(x_column: &str, derivation: DerivationMode, metrics: &[String]) -> String {
    if derivation.is_none() {
        return x_column.to_string();
    }
    let name = derivation.name();
    if metrics.iter().any(|m| m == name) {
        format!("{x_column}_{name}")
    } else {
        name.to_string()
    }
}
