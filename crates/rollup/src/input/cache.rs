//! Content-addressed memoisation of parsed tables.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::parser::{Parser, content_hash};
use super::source::DataTable;
use crate::error::Result;

/// Maps `sha256(bytes)` to the table parsed from those bytes.
///
/// Re-uploading identical bytes returns the already-parsed table. Cached
/// tables are shared read-only; a different upload gets a different entry.
#[derive(Debug, Default)]
pub struct TableCache {
    parser: Parser,
    entries: HashMap<String, Arc<DataTable>>,
    hits: usize,
    misses: usize,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parser(parser: Parser) -> Self {
        Self {
            parser,
            ..Self::default()
        }
    }

    /// Return the table for `bytes`, parsing only on a cache miss.
    pub fn load(&mut self, bytes: &[u8]) -> Result<Arc<DataTable>> {
        let hash = content_hash(bytes);
        if let Some(table) = self.entries.get(&hash) {
            self.hits += 1;
            debug!(%hash, "table cache hit");
            return Ok(Arc::clone(table));
        }

        let (table, _) = self.parser.parse_bytes(bytes)?;
        let table = Arc::new(table);
        self.misses += 1;
        debug!(%hash, rows = table.row_count(), "table cache miss");
        self.entries.insert(hash, Arc::clone(&table));
        Ok(table)
    }

    /// Look up a table by its content hash without parsing.
    pub fn get(&self, hash: &str) -> Option<Arc<DataTable>> {
        self.entries.get(hash).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
