//! Key derivation, grouping and reduction.

mod derive;
mod engine;
mod reduction;
mod view;

pub use derive::{DerivationMode, KeyDeriver};
pub use engine::{AggregationEngine, AggregationSpec, MAX_METRICS};
pub use reduction::{Accumulator, Reduction};
pub use view::{AggregatedRow, AggregatedView, EmptyReason, EmptyView, Outcome};
