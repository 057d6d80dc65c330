//! Input parsing and data source handling.

mod cache;
mod parser;
mod source;

pub use cache::TableCache;
pub use parser::{Parser, ParserConfig, content_hash};
pub use source::{DataTable, SourceMetadata};
