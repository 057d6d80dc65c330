//! Key types shared by the aggregation engine and the range filter.

mod key;

pub use key::{KeyType, KeyValue, format_number, weekday_name};
