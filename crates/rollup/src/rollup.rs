//! Main Rollup struct and public API.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::aggregate::{AggregationEngine, Outcome};
use crate::error::Result;
use crate::filter::{FilterConfig, FilteredView, RangeFilter};
use crate::inference::{InferenceConfig, TableProfile, TypeInference};
use crate::input::{DataTable, Parser, ParserConfig, SourceMetadata, TableCache};
use crate::pipeline::{Pipeline, PipelineConfig};

/// Configuration for a Rollup instance.
#[derive(Debug, Clone, Default)]
pub struct RollupConfig {
    /// Parser configuration.
    pub parser: ParserConfig,
    /// Column classification thresholds.
    pub inference: InferenceConfig,
    /// Filter domain settings.
    pub filter: FilterConfig,
}

/// A loaded data source together with its column profile.
#[derive(Debug, Clone, Serialize)]
pub struct LoadedSource {
    pub source: SourceMetadata,
    pub profile: TableProfile,
}

/// Loads tables, profiles them and runs aggregation pipelines.
pub struct Rollup {
    config: RollupConfig,
    inference: TypeInference,
    pipeline: Pipeline,
    cache: TableCache,
}

impl Rollup {
    /// Create a new Rollup instance with default configuration.
    pub fn new() -> Self {
        Self::with_config(RollupConfig::default())
    }

    /// Create a Rollup instance with custom configuration.
    pub fn with_config(config: RollupConfig) -> Self {
        let inference = TypeInference::with_config(config.inference);
        let pipeline = Pipeline::new(
            AggregationEngine::with_inference(inference.clone()),
            RangeFilter::with_config(config.filter.clone()),
        );
        let cache = TableCache::with_parser(Parser::with_config(config.parser.clone()));

        Self {
            config,
            inference,
            pipeline,
            cache,
        }
    }

    pub fn config(&self) -> &RollupConfig {
        &self.config
    }

    /// Read and parse a file.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<(DataTable, SourceMetadata)> {
        Parser::with_config(self.config.parser.clone()).parse_file(path)
    }

    /// Parse raw bytes, reusing the cached table when the same content was
    /// loaded before.
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<Arc<DataTable>> {
        self.cache.load(bytes)
    }

    pub fn cache(&self) -> &TableCache {
        &self.cache
    }

    /// Classify every column of `table`.
    pub fn profile(&self, table: &DataTable) -> TableProfile {
        self.inference.profile_table(table)
    }

    /// Load and profile a file in one step.
    pub fn inspect(&self, path: impl AsRef<Path>) -> Result<LoadedSource> {
        let (table, source) = self.load(path)?;
        let profile = self.profile(&table);
        debug!(
            file = %source.file,
            time_candidates = profile.time_candidates().len(),
            numeric_candidates = profile.numeric_candidates().len(),
            "profiled source"
        );
        Ok(LoadedSource { source, profile })
    }

    /// Run one pipeline selection over `table`.
    pub fn run(&self, table: &DataTable, config: &PipelineConfig) -> Result<Outcome<FilteredView>> {
        self.pipeline.run(table, config)
    }

    /// The range filter configured for this instance.
    pub fn range_filter(&self) -> &RangeFilter {
        self.pipeline.filter()
    }
}

impl Default for Rollup {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::DerivationMode;

    const CSV: &str = "ts,amount\n2024-01-01T08:00:00,10\n2024-01-01T08:30:00,5\n";

    #[test]
    fn test_load_bytes_uses_cache() {
        let mut rollup = Rollup::new();
        let first = rollup.load_bytes(CSV.as_bytes()).unwrap();
        let second = rollup.load_bytes(CSV.as_bytes()).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(rollup.cache().hits(), 1);
        assert_eq!(rollup.cache().misses(), 1);
    }

    #[test]
    fn test_profile_and_run() {
        let mut rollup = Rollup::new();
        let table = rollup.load_bytes(CSV.as_bytes()).unwrap();

        let profile = rollup.profile(&table);
        assert_eq!(profile.time_candidates(), vec!["ts"]);
        assert_eq!(profile.numeric_candidates(), vec!["amount"]);

        let config = PipelineConfig::new("ts")
            .derive(DerivationMode::Hour)
            .metric("amount");
        let result = rollup.run(&table, &config).unwrap().into_ready().unwrap();
        assert_eq!(result.view.value("8", "amount"), Some(15.0));
    }
}
