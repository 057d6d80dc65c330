//! Type inference: per-cell coercion and column classification.

mod cell;
mod classify;

pub use cell::{CellKind, ParseFailure, Temporal, parse_number, parse_timestamp};
pub use classify::{
    ColumnClassification, ColumnProfile, InferenceConfig, TableProfile, TypeInference,
};
