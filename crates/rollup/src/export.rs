//! Writing aggregated views as delimited text or JSON.

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::aggregate::AggregatedView;
use crate::error::Result;
use crate::input::{DataTable, Parser};
use crate::schema::{KeyValue, format_number};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Output format for exported views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Tsv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Tsv => "tsv",
            ExportFormat::Json => "json",
        }
    }

    fn delimiter(&self) -> Option<u8> {
        match self {
            ExportFormat::Csv => Some(b','),
            ExportFormat::Tsv => Some(b'\t'),
            ExportFormat::Json => None,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "tsv" | "tab" => Ok(ExportFormat::Tsv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(format!("Unknown export format: {s}. Use csv, tsv, or json.")),
        }
    }
}

/// How a view is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOptions {
    pub format: ExportFormat,
    /// Prefix the output with a UTF-8 byte order mark, which spreadsheet
    /// tools use to detect the encoding.
    pub bom: bool,
}

impl ExportOptions {
    pub fn new(format: ExportFormat) -> Self {
        Self { format, bom: false }
    }

    pub fn with_bom(mut self, bom: bool) -> Self {
        self.bom = bom;
        self
    }
}

/// Write `view` to `writer`: a `key, metrics...` header then one line per row.
pub fn write_view<W: Write>(view: &AggregatedView, options: ExportOptions, mut writer: W) -> Result<()> {
    if options.bom {
        writer.write_all(UTF8_BOM).map_err(csv::Error::from)?;
    }

    match options.format.delimiter() {
        Some(delimiter) => write_delimited(view, delimiter, writer),
        None => {
            serde_json::to_writer_pretty(&mut writer, &records(view))?;
            writer.write_all(b"\n").map_err(csv::Error::from)?;
            Ok(())
        }
    }
}

/// Render `view` into a byte buffer.
pub fn to_bytes(view: &AggregatedView, options: ExportOptions) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_view(view, options, &mut buffer)?;
    Ok(buffer)
}

/// Parse delimited export output back into a table, e.g. to check that an
/// export reproduces its view.
pub fn read_back(bytes: &[u8]) -> Result<DataTable> {
    Parser::new().parse_bytes(bytes).map(|(table, _)| table)
}

fn write_delimited<W: Write>(view: &AggregatedView, delimiter: u8, writer: W) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);

    csv_writer.write_record(view.columns())?;
    for row in &view.rows {
        let record = std::iter::once(row.key.label())
            .chain(row.values.iter().map(|v| v.map(format_number).unwrap_or_default()));
        csv_writer.write_record(record)?;
    }
    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

fn records(view: &AggregatedView) -> Vec<IndexMap<&str, Value>> {
    view.rows
        .iter()
        .map(|row| {
            let mut record = IndexMap::with_capacity(view.metric_columns.len() + 1);
            let key = match &row.key {
                KeyValue::Number(v) => number(*v),
                other => Value::String(other.label()),
            };
            record.insert(view.key_column.as_str(), key);
            for (name, value) in view.metric_columns.iter().zip(&row.values) {
                record.insert(name.as_str(), value.map(number).unwrap_or(Value::Null));
            }
            record
        })
        .collect()
}

/// Whole numbers are written as integers.
fn number(v: f64) -> Value {
    if v.fract() == 0.0 && v.abs() < 9.0e15 {
        Value::from(v as i64)
    } else {
        serde_json::Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
    }
}
