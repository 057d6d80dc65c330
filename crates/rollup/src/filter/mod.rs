//! Range filtering over the key column of an aggregated view.

mod range;

pub use range::{FilterConfig, FilterDomain, FilterSpec, FilteredView, RangeFilter, ViewMetadata};
