//! Rollup: group-by aggregation of tabular data over a derived key.
//!
//! Rollup reads a delimited table, works out which columns hold timestamps
//! and which hold numbers, and reduces up to three metric columns per unique
//! value of a grouping key. The key is either a column taken as-is or a
//! time component derived from it (hour, date, weekday, ISO week, month).
//!
//! # Core Principles
//!
//! - **Lenient input**: Cells that fail to parse are counted, never fatal
//! - **Non-destructive**: The source table is never modified
//! - **Explicit empties**: A run with nothing to show says why
//!
//! # Example
//!
//! ```no_run
//! use rollup::{DerivationMode, PipelineConfig, Rollup};
//!
//! let rollup = Rollup::new();
//! let (table, _) = rollup.load("sales.csv").unwrap();
//!
//! let config = PipelineConfig::new("timestamp")
//!     .derive(DerivationMode::Hour)
//!     .metric("amount");
//!
//! if let Some(result) = rollup.run(&table, &config).unwrap().into_ready() {
//!     println!("Groups: {}", result.rows().len());
//! }
//! ```

pub mod aggregate;
pub mod error;
pub mod export;
pub mod filter;
pub mod inference;
pub mod input;
pub mod pipeline;
pub mod schema;

mod rollup;

pub use crate::rollup::{LoadedSource, Rollup, RollupConfig};
pub use aggregate::{
    AggregatedRow, AggregatedView, DerivationMode, EmptyReason, EmptyView, Outcome, Reduction,
};
pub use error::{Result, RollupError};
pub use export::{ExportFormat, ExportOptions};
pub use filter::{FilterConfig, FilterDomain, FilterSpec, FilteredView, ViewMetadata};
pub use inference::{ColumnClassification, ColumnProfile, InferenceConfig, TableProfile};
pub use input::{DataTable, ParserConfig, SourceMetadata};
pub use pipeline::{PipelineConfig, run_pipeline};
pub use schema::{KeyType, KeyValue};
