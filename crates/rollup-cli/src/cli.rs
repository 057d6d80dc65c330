//! CLI argument definitions using clap.

use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use rollup::{DerivationMode, ExportFormat, Reduction};

/// Rollup: group-by aggregation for tabular data
#[derive(Parser)]
#[command(name = "rollup")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file (default: ./rollup.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show how each column was classified
    Inspect {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Aggregate metric columns over a grouping key
    Aggregate(AggregateArgs),

    /// Write a settings file with every default filled in
    InitConfig {
        /// Where to write the settings
        #[arg(short, long, default_value = "rollup.toml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
pub struct AggregateArgs {
    /// Path to the data file (CSV/TSV)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Grouping column
    #[arg(short = 'x', long = "x", value_name = "COLUMN")]
    pub x_column: String,

    /// Time component to group by (none, hour, date, weekday, week, month)
    #[arg(short, long = "derive", default_value = "none")]
    pub derivation: DerivationMode,

    /// Metric column; repeat for up to three
    #[arg(short = 'y', long = "y", value_name = "COLUMN")]
    pub y_columns: Vec<String>,

    /// Reduction (sum, mean, median, max, min, count)
    #[arg(short, long = "agg", default_value = "sum")]
    pub reduction: Reduction,

    /// Keep numeric keys within MIN..MAX (inclusive)
    #[arg(long, value_name = "MIN..MAX", conflicts_with_all = ["from", "to", "include"])]
    pub range: Option<KeyRange>,

    /// Keep date keys on or after this date
    #[arg(long, value_name = "YYYY-MM-DD", conflicts_with = "include")]
    pub from: Option<NaiveDate>,

    /// Keep date keys on or before this date
    #[arg(long, value_name = "YYYY-MM-DD", conflicts_with = "include")]
    pub to: Option<NaiveDate>,

    /// Keep only this key label; repeat to keep several
    #[arg(long, value_name = "LABEL")]
    pub include: Option<Vec<String>>,

    /// Write the result to a file instead of printing it
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Export format (csv, tsv, json); defaults to the output extension
    #[arg(short, long)]
    pub format: Option<ExportFormat>,

    /// Prefix exported text with a UTF-8 byte order mark
    #[arg(long)]
    pub bom: bool,

    /// Print the result as JSON
    #[arg(long, conflicts_with = "output")]
    pub json: bool,
}

/// Inclusive numeric bounds written `MIN..MAX`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KeyRange {
    pub min: f64,
    pub max: f64,
}

impl FromStr for KeyRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (min, max) = s
            .split_once("..")
            .ok_or_else(|| format!("Invalid range: {}. Use MIN..MAX.", s))?;
        let bound = |v: &str| {
            v.trim()
                .parse::<f64>()
                .map_err(|_| format!("Invalid range bound: {}", v))
        };
        Ok(KeyRange {
            min: bound(min)?,
            max: bound(max)?,
        })
    }
}
